use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::PlanError;
use crate::models::{
    ActivityLevel, Diet, Goal, MealPlan, Metrics, PlanSource, Sex, UserProfile, DEFAULT_CUISINE,
};
use crate::services::{metrics, normalizer, prompt, MockPlanService, PlanService};

/// Raw form fields as submitted. Everything is text so that validation
/// can report which field was wrong.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanForm {
    pub weight: String,
    pub height: String,
    pub age: String,
    pub sex: String,
    pub activity: String,
    pub goal: String,
    pub units: String,
    pub diet: String,
    pub cuisine: String,
}

fn parse_positive(field: &str, value: &str) -> Result<f64, PlanError> {
    let parsed = value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| PlanError::InvalidInput(format!("{} must be a number, got '{}'", field, value.trim())))?;

    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(PlanError::InvalidInput(format!("{} must be greater than zero", field)));
    }
    Ok(parsed)
}

impl PlanForm {
    pub fn into_profile(self) -> Result<UserProfile, PlanError> {
        let imperial = match self.units.trim().to_lowercase().as_str() {
            "" | "metric" => false,
            "imperial" => true,
            other => {
                return Err(PlanError::InvalidInput(format!("unknown units '{}'", other)));
            }
        };

        let weight = parse_positive("weight", &self.weight)?;
        let height = parse_positive("height", &self.height)?;
        let (weight_kg, height_cm) = if imperial {
            (metrics::lbs_to_kg(weight), metrics::inches_to_cm(height))
        } else {
            (weight, height)
        };

        let age = self
            .age
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|a| *a > 0)
            .ok_or_else(|| PlanError::InvalidInput(format!("age must be a positive whole number, got '{}'", self.age.trim())))?;

        let sex = Sex::from_string(&self.sex)
            .ok_or_else(|| PlanError::InvalidInput(format!("unknown sex '{}'", self.sex.trim())))?;

        let activity = ActivityLevel::from_string(&self.activity).ok_or_else(|| {
            PlanError::InvalidInput(format!("unknown activity level '{}'", self.activity.trim()))
        })?;

        let goal = Goal::from_string(&self.goal)
            .ok_or_else(|| PlanError::InvalidInput(format!("unknown goal '{}'", self.goal.trim())))?;

        let diet = Diet::from_string(&self.diet)
            .ok_or_else(|| PlanError::InvalidInput(format!("unknown diet '{}'", self.diet.trim())))?;

        let cuisine = match self.cuisine.trim() {
            "" => DEFAULT_CUISINE.to_string(),
            c => c.to_string(),
        };

        Ok(UserProfile {
            height_cm,
            weight_kg,
            age,
            sex,
            activity,
            goal,
            diet,
            cuisine,
        })
    }
}

/// What the user gets back for one submission
#[derive(Debug, Clone, Serialize)]
pub struct PlanResult {
    pub metrics: Metrics,
    pub plan: MealPlan,
    pub source: PlanSource,
    /// False when fewer than 7 days could be recovered
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub generated_at: DateTime<Utc>,
}

pub struct PlanHandler {
    provider: Arc<dyn PlanService>,
    fallback: MockPlanService,
}

impl PlanHandler {
    pub fn new(provider: Arc<dyn PlanService>) -> Self {
        Self {
            provider,
            fallback: MockPlanService::new(),
        }
    }

    /// Validates the form, then runs the pipeline
    pub async fn handle_form(&self, form: PlanForm) -> Result<PlanResult, PlanError> {
        let profile = form.into_profile()?;
        self.create_plan(&profile).await
    }

    pub async fn create_plan(&self, profile: &UserProfile) -> Result<PlanResult, PlanError> {
        let metrics = metrics::compute(profile);
        log::info!(
            "📊 BMI {:.1} ({}), TDEE {:.0} kcal, target {:.0} kcal, goal: {}",
            metrics.bmi,
            metrics.classification,
            metrics.tdee,
            metrics.target_calories,
            metrics.goal
        );

        let request = prompt::build_prompt(&metrics, profile);

        let mut notice = None;
        let raw = match self.provider.generate(&request).await {
            Ok(raw) => raw,
            Err(e) if e.is_provider_failure() => {
                log::warn!("⚠️ Live provider failed, falling back to mock plan: {}", e);
                notice = Some(format!(
                    "The AI provider could not be reached ({}); showing a sample plan instead.",
                    e
                ));
                self.fallback.generate(&request).await?
            }
            Err(e) => return Err(e),
        };

        let plan = match normalizer::normalize(&raw) {
            Ok(plan) => plan,
            Err(PlanError::IncompletePlan { found, partial }) => {
                notice = Some(format!(
                    "The generated plan was cut short: only {} of 7 days could be read.",
                    found
                ));
                *partial
            }
            Err(e) => return Err(e),
        };
        let complete = plan.is_complete();

        log::info!(
            "✅ Plan ready ({} source, {} days, complete: {})",
            raw.source,
            plan.days.len(),
            complete
        );

        Ok(PlanResult {
            metrics,
            plan,
            source: raw.source,
            complete,
            notice,
            generated_at: Utc::now(),
        })
    }
}
