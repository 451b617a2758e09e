mod plan;

pub use plan::{PLAN_DAYS, DayPlan, Macros, Meal, MealPlan, MealSlot, PlanContract, PlanRequest, PlanSource, RawPlanResponse, ShoppingGroup};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CUISINE: &str = "Vietnamese";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Sex::Male),
            "female" | "f" => Some(Sex::Female),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Sex::Male => "male",
            Sex::Female => "female",
        };
        write!(f, "{}", s)
    }
}

/// Activity ordinal 1 (sedentary) ..= 5 (very active)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn from_ordinal(level: u8) -> Option<Self> {
        match level {
            1 => Some(ActivityLevel::Sedentary),
            2 => Some(ActivityLevel::Light),
            3 => Some(ActivityLevel::Moderate),
            4 => Some(ActivityLevel::Active),
            5 => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }

    /// Accepts the ordinal ("1".."5") or the form names used by the web page
    pub fn from_string(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        if let Ok(level) = normalized.parse::<u8>() {
            return Self::from_ordinal(level);
        }
        match normalized.as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very" | "very_active" | "very active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "lightly active",
            ActivityLevel::Moderate => "moderately active",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very active",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
    /// Resolved from the BMI classification by the metric calculator
    Auto,
}

impl Goal {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "lose" | "loss" => Some(Goal::Lose),
            "maintain" => Some(Goal::Maintain),
            "gain" => Some(Goal::Gain),
            "auto" | "" => Some(Goal::Auto),
            _ => None,
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Goal::Lose => "lose weight",
            Goal::Maintain => "maintain weight",
            Goal::Gain => "gain weight",
            Goal::Auto => "auto",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Diet {
    #[default]
    Omnivore,
    Vegetarian,
}

impl Diet {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" | "omnivore" => Some(Diet::Omnivore),
            "vegetarian" | "chay" => Some(Diet::Vegetarian),
            _ => None,
        }
    }
}

/// One person's inputs, already converted to metric and range-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub age: u32,
    pub sex: Sex,
    pub activity: ActivityLevel,
    pub goal: Goal,
    #[serde(default)]
    pub diet: Diet,
    pub cuisine: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiClass {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl std::fmt::Display for BmiClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BmiClass::Underweight => "underweight",
            BmiClass::Normal => "normal",
            BmiClass::Overweight => "overweight",
            BmiClass::Obese => "obese",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub bmi: f64,
    pub classification: BmiClass,
    pub bmr: f64,
    pub tdee: f64,
    pub target_calories: f64,
    /// Goal the target was computed for; never `Goal::Auto`
    pub goal: Goal,
}
