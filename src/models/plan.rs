use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Metrics, UserProfile};

pub const PLAN_DAYS: usize = 7;

/// Meal slots in the order a day is eaten (and rendered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Snack,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Snack,
        MealSlot::Dinner,
    ];

    pub fn from_string(s: &str) -> Option<Self> {
        let normalized = s.trim().trim_matches('*').trim().to_lowercase();

        match normalized.as_str() {
            "breakfast" | "morning" | "bữa sáng" | "sáng" => Some(MealSlot::Breakfast),
            "lunch" | "midday" | "bữa trưa" | "trưa" => Some(MealSlot::Lunch),
            "snack" | "snacks" | "bữa phụ" | "phụ" => Some(MealSlot::Snack),
            "dinner" | "supper" | "evening" | "bữa tối" | "tối" => Some(MealSlot::Dinner),
            _ => None,
        }
    }

    /// Share of the daily target eaten at this slot
    pub fn calorie_share(self) -> f64 {
        match self {
            MealSlot::Breakfast => 0.25,
            MealSlot::Lunch => 0.35,
            MealSlot::Snack => 0.10,
            MealSlot::Dinner => 0.30,
        }
    }
}

impl std::fmt::Display for MealSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Snack => "Snack",
            MealSlot::Dinner => "Dinner",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kcal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion_grams: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<Macros>,
}

impl Meal {
    pub fn text(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            kcal: None,
            portion_grams: None,
            macros: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// 1-based day index
    pub day: u8,
    pub meals: BTreeMap<MealSlot, Meal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_kcal: Option<f64>,
}

impl DayPlan {
    /// A day counts as recovered only if some slot has real content
    pub fn has_meals(&self) -> bool {
        self.meals.values().any(|m| !m.description.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingGroup {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub exercise: Vec<String>,
    #[serde(default)]
    pub shopping_list: Vec<ShoppingGroup>,
    #[serde(default)]
    pub health_warning: String,
}

impl MealPlan {
    pub fn is_complete(&self) -> bool {
        self.days.len() == PLAN_DAYS
            && self
                .days
                .iter()
                .enumerate()
                .all(|(i, d)| d.day as usize == i + 1 && d.has_meals())
    }
}

/// What the provider's answer must contain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanContract {
    pub days: usize,
    pub meal_slots: Vec<MealSlot>,
    pub macro_targets: bool,
    pub shopping_list: bool,
    pub exercise_suggestions: bool,
    /// Required for underweight and obese profiles
    pub bmi_warning: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub prompt: String,
    pub contract: PlanContract,
    pub metrics: Metrics,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Live,
    Mock,
}

impl std::fmt::Display for PlanSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PlanSource::Live => "live",
            PlanSource::Mock => "mock",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPlanResponse {
    pub body: String,
    pub source: PlanSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_slot_from_string() {
        assert_eq!(MealSlot::from_string("Breakfast"), Some(MealSlot::Breakfast));
        assert_eq!(MealSlot::from_string("**Dinner**"), Some(MealSlot::Dinner));
        assert_eq!(MealSlot::from_string("Bữa trưa"), Some(MealSlot::Lunch));
        assert_eq!(MealSlot::from_string("brunch"), None);
    }

    #[test]
    fn test_calorie_shares_sum_to_one() {
        let total: f64 = MealSlot::ALL.iter().map(|s| s.calorie_share()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_day_without_content_is_not_counted() {
        let mut meals = BTreeMap::new();
        meals.insert(MealSlot::Lunch, Meal::text("  "));
        let day = DayPlan { day: 1, meals, total_kcal: None };
        assert!(!day.has_meals());
    }
}
