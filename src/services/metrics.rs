//! BMI, BMR (Mifflin-St Jeor), TDEE and calorie targets.
//!
//! Everything here is pure arithmetic on an already validated
//! [`UserProfile`]; range checks live in the plan handler.

use crate::models::{ActivityLevel, BmiClass, Goal, Metrics, Sex, UserProfile};

pub const LBS_TO_KG: f64 = 0.453_592_37;
pub const INCHES_TO_CM: f64 = 2.54;

pub const UNDERWEIGHT_BELOW: f64 = 18.5;
pub const OVERWEIGHT_FROM: f64 = 25.0;
pub const OBESE_FROM: f64 = 30.0;
/// Below this the warning escalates to medical supervision
pub const SEVERE_THINNESS_BELOW: f64 = 16.0;

pub const WEIGHT_LOSS_DEFICIT_KCAL: f64 = 500.0;
pub const WEIGHT_GAIN_SURPLUS_KCAL: f64 = 300.0;
/// No target is ever set below this
pub const MIN_SAFE_CALORIES: f64 = 1200.0;

pub fn lbs_to_kg(lbs: f64) -> f64 {
    lbs * LBS_TO_KG
}

pub fn inches_to_cm(inches: f64) -> f64 {
    inches * INCHES_TO_CM
}

pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Lower bounds inclusive, upper bounds exclusive
pub fn classify(bmi: f64) -> BmiClass {
    if bmi < UNDERWEIGHT_BELOW {
        BmiClass::Underweight
    } else if bmi < OVERWEIGHT_FROM {
        BmiClass::Normal
    } else if bmi < OBESE_FROM {
        BmiClass::Overweight
    } else {
        BmiClass::Obese
    }
}

pub fn bmr(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64;
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female => base - 161.0,
    }
}

pub fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

/// `Auto` picks the goal a clinician would suggest for the classification
pub fn resolve_goal(goal: Goal, classification: BmiClass) -> Goal {
    match goal {
        Goal::Auto => match classification {
            BmiClass::Underweight => Goal::Gain,
            BmiClass::Normal => Goal::Maintain,
            BmiClass::Overweight | BmiClass::Obese => Goal::Lose,
        },
        other => other,
    }
}

pub fn target_calories(tdee: f64, goal: Goal) -> f64 {
    let target = match goal {
        Goal::Lose => tdee - WEIGHT_LOSS_DEFICIT_KCAL,
        Goal::Gain => tdee + WEIGHT_GAIN_SURPLUS_KCAL,
        Goal::Maintain | Goal::Auto => tdee,
    };
    target.max(MIN_SAFE_CALORIES)
}

pub fn compute(profile: &UserProfile) -> Metrics {
    let bmi = bmi(profile.weight_kg, profile.height_cm);
    let classification = classify(bmi);
    let bmr = bmr(profile.weight_kg, profile.height_cm, profile.age, profile.sex);
    let tdee = bmr * activity_factor(profile.activity);
    let goal = resolve_goal(profile.goal, classification);

    Metrics {
        bmi,
        classification,
        bmr,
        tdee,
        target_calories: target_calories(tdee, goal),
        goal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diet, DEFAULT_CUISINE};

    fn profile(height_cm: f64, weight_kg: f64, age: u32, sex: Sex, activity: u8, goal: Goal) -> UserProfile {
        UserProfile {
            height_cm,
            weight_kg,
            age,
            sex,
            activity: ActivityLevel::from_ordinal(activity).unwrap(),
            goal,
            diet: Diet::Omnivore,
            cuisine: DEFAULT_CUISINE.to_string(),
        }
    }

    #[test]
    fn test_bmi_is_weight_over_height_squared() {
        assert_eq!(bmi(70.0, 175.0), 70.0 / (1.75 * 1.75));
        assert_eq!(bmi(100.0, 200.0), 25.0);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify(18.49), BmiClass::Underweight);
        assert_eq!(classify(18.5), BmiClass::Normal);
        assert_eq!(classify(24.99), BmiClass::Normal);
        assert_eq!(classify(25.0), BmiClass::Overweight);
        assert_eq!(classify(29.99), BmiClass::Overweight);
        assert_eq!(classify(30.0), BmiClass::Obese);
        assert_eq!(classify(55.0), BmiClass::Obese);
    }

    #[test]
    fn test_mifflin_st_jeor_reference_values() {
        // 10*70 + 6.25*175 - 5*25 + 5
        assert_eq!(bmr(70.0, 175.0, 25, Sex::Male), 1673.75);
        assert_eq!(bmr(70.0, 175.0, 25, Sex::Female), 1507.75);
    }

    #[test]
    fn test_tdee_uses_activity_table() {
        let m = compute(&profile(175.0, 70.0, 25, Sex::Male, 1, Goal::Maintain));
        assert_eq!(m.tdee, 1673.75 * 1.2);

        let m = compute(&profile(175.0, 70.0, 25, Sex::Male, 5, Goal::Maintain));
        assert_eq!(m.tdee, 1673.75 * 1.9);
        assert_eq!(m.target_calories, m.tdee);
    }

    #[test]
    fn test_activity_factors_increase_monotonically() {
        let factors: Vec<f64> = (1..=5)
            .map(|l| activity_factor(ActivityLevel::from_ordinal(l).unwrap()))
            .collect();
        assert!(factors.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(factors[0], 1.2);
        assert_eq!(factors[4], 1.9);
    }

    #[test]
    fn test_goal_offsets() {
        assert_eq!(target_calories(2500.0, Goal::Lose), 2000.0);
        assert_eq!(target_calories(2500.0, Goal::Gain), 2800.0);
        assert_eq!(target_calories(2500.0, Goal::Maintain), 2500.0);
    }

    #[test]
    fn test_lose_never_drops_below_floor() {
        for tdee in [0.0, 900.0, 1500.0, 1699.0, 1700.0] {
            assert!(target_calories(tdee, Goal::Lose) >= MIN_SAFE_CALORIES);
        }
        assert_eq!(target_calories(1500.0, Goal::Lose), MIN_SAFE_CALORIES);

        // Small elderly sedentary woman: TDEE well under 1700
        let m = compute(&profile(145.0, 40.0, 85, Sex::Female, 1, Goal::Lose));
        assert!(m.tdee - WEIGHT_LOSS_DEFICIT_KCAL < MIN_SAFE_CALORIES);
        assert_eq!(m.target_calories, MIN_SAFE_CALORIES);
    }

    #[test]
    fn test_floor_applies_to_every_goal() {
        assert_eq!(target_calories(900.0, Goal::Maintain), MIN_SAFE_CALORIES);
        assert_eq!(target_calories(800.0, Goal::Gain), MIN_SAFE_CALORIES);
    }

    #[test]
    fn test_auto_goal_resolution() {
        let obese = compute(&profile(170.0, 95.0, 40, Sex::Male, 2, Goal::Auto));
        assert_eq!(obese.classification, BmiClass::Obese);
        assert_eq!(obese.goal, Goal::Lose);

        let thin = compute(&profile(170.0, 50.0, 25, Sex::Female, 3, Goal::Auto));
        assert_eq!(thin.goal, Goal::Gain);

        let normal = compute(&profile(175.0, 70.0, 25, Sex::Male, 3, Goal::Auto));
        assert_eq!(normal.goal, Goal::Maintain);
    }

    #[test]
    fn test_underweight_scenario() {
        let m = compute(&profile(170.0, 50.0, 25, Sex::Female, 3, Goal::Maintain));
        assert!((m.bmi - 17.3).abs() < 0.05);
        assert_eq!(m.classification, BmiClass::Underweight);
        assert_eq!(m.goal, Goal::Maintain);
    }

    #[test]
    fn test_imperial_conversion() {
        assert!((lbs_to_kg(100.0) - 45.359237).abs() < 1e-9);
        assert!((inches_to_cm(10.0) - 25.4).abs() < 1e-9);
    }
}
