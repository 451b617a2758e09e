pub mod export; // CSV rendering
pub mod plan_handler;

pub use plan_handler::{PlanForm, PlanHandler};
