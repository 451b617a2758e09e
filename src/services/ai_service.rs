use crate::config::Config;
use crate::errors::PlanError;
use crate::models::{PlanRequest, PlanSource, RawPlanResponse};

use super::gemini::GeminiService;
use super::mock::MockPlanService;

/// Anything that can turn a plan prompt into a raw plan text
#[async_trait::async_trait]
pub trait PlanService: Send + Sync {
    async fn generate(&self, request: &PlanRequest) -> Result<RawPlanResponse, PlanError>;
}

/// Live or mock, chosen once from the configured credential
pub enum PlanProvider {
    Live(GeminiService),
    Mock(MockPlanService),
}

impl PlanProvider {
    pub fn from_config(config: &Config) -> Result<Self, PlanError> {
        match config.gemini_api_key.as_deref() {
            Some(api_key) => {
                log::info!("🤖 Plan provider: Gemini ({})", config.gemini_model);
                Ok(PlanProvider::Live(GeminiService::new(
                    api_key.to_string(),
                    config.gemini_api_url.clone(),
                    config.gemini_model.clone(),
                    config.provider_timeout,
                )?))
            }
            None => {
                log::info!("🧪 GEMINI_API_KEY not set, plan provider running in mock mode");
                Ok(PlanProvider::Mock(MockPlanService::new()))
            }
        }
    }

    pub fn source(&self) -> PlanSource {
        match self {
            PlanProvider::Live(_) => PlanSource::Live,
            PlanProvider::Mock(_) => PlanSource::Mock,
        }
    }
}

#[async_trait::async_trait]
impl PlanService for PlanProvider {
    async fn generate(&self, request: &PlanRequest) -> Result<RawPlanResponse, PlanError> {
        match self {
            PlanProvider::Live(service) => service.generate(request).await,
            PlanProvider::Mock(service) => service.generate(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_selects_mock() {
        let provider = PlanProvider::from_config(&Config::default()).unwrap();
        assert_eq!(provider.source(), PlanSource::Mock);
    }

    #[test]
    fn test_key_selects_live() {
        let config = Config {
            gemini_api_key: Some("test_key".to_string()),
            ..Config::default()
        };
        let provider = PlanProvider::from_config(&config).unwrap();
        assert_eq!(provider.source(), PlanSource::Live);
    }
}
