pub mod ai_service; // Provider trait + live/mock selection
pub mod gemini; // Google Gemini generateContent client
pub mod metrics;
pub mod mock; // Deterministic offline plans
pub mod normalizer;
pub mod prompt;

pub use ai_service::{PlanProvider, PlanService};
pub use mock::MockPlanService;
