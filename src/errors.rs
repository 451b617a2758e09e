use std::time::Duration;

use thiserror::Error;

use crate::models::MealPlan;

/// Failures of the plan pipeline. Every variant is scoped to one request.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Form input rejected before any calculation runs
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport, auth or decoding failure on the live provider
    #[error("plan provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("plan provider did not answer within {0:?}")]
    ProviderTimeout(Duration),

    /// Fewer than 7 usable days could be recovered from the raw response.
    /// `partial` holds whatever was recovered, sorted by day.
    #[error("incomplete plan: recovered {found} of 7 days")]
    IncompletePlan {
        found: usize,
        partial: Box<MealPlan>,
    },
}

impl PlanError {
    /// Live-provider failures that the handler answers with mock mode
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            PlanError::ProviderUnavailable(_) | PlanError::ProviderTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_failure_classification() {
        assert!(PlanError::ProviderUnavailable("down".into()).is_provider_failure());
        assert!(PlanError::ProviderTimeout(Duration::from_secs(30)).is_provider_failure());
        assert!(!PlanError::InvalidInput("height".into()).is_provider_failure());
    }

    #[test]
    fn test_incomplete_plan_message() {
        let err = PlanError::IncompletePlan {
            found: 4,
            partial: Box::new(MealPlan::default()),
        };
        assert_eq!(err.to_string(), "incomplete plan: recovered 4 of 7 days");
    }
}
