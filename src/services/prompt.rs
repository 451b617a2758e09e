use crate::models::{BmiClass, Diet, MealSlot, Metrics, PlanContract, PlanRequest, UserProfile, PLAN_DAYS};
use crate::services::metrics::SEVERE_THINNESS_BELOW;

use super::normalizer::{SECTION_BMI, SECTION_EXERCISE, SECTION_MEALS, SECTION_SHOPPING};

fn exercise_guidance(class: BmiClass) -> &'static str {
    match class {
        BmiClass::Obese => {
            "Emphasise low-impact cardio (brisk walking, cycling, swimming) with gradual progression; \
             avoid running and jumping; add light resistance work twice a week."
        }
        BmiClass::Overweight => {
            "Emphasise moderate cardio (brisk walking, cycling, light jogging) combined with \
             bodyweight strength work (squats, plank)."
        }
        BmiClass::Underweight => {
            "Emphasise strength training (light weights, bodyweight) for the large muscle groups, \
             keep cardio short and light, and schedule rest days for recovery."
        }
        BmiClass::Normal => {
            "Balance cardio, strength training and yoga or stretching across the week."
        }
    }
}

fn bmi_guidance(metrics: &Metrics) -> String {
    match metrics.classification {
        BmiClass::Underweight if metrics.bmi < SEVERE_THINNESS_BELOW => format!(
            "REQUIRED: BMI {:.1} indicates severe thinness. Write a warning paragraph listing the \
             health risks (malnutrition, weakened immunity, osteoporosis) and advise seeing a doctor \
             before changing diet; calorie increases must be gradual and supervised.",
            metrics.bmi
        ),
        BmiClass::Underweight => format!(
            "REQUIRED: BMI {:.1} is underweight. Write a warning paragraph listing the health risks \
             (nutrient deficiency, weakened immunity, fatigue) and recommend energy-dense foods and \
             5-6 smaller meals per day.",
            metrics.bmi
        ),
        BmiClass::Obese => format!(
            "REQUIRED: BMI {:.1} is in the obese range. Write a warning paragraph listing the health \
             risks (type 2 diabetes, high blood pressure, heart disease, joint strain) and recommend \
             consulting a doctor; weight loss should be gradual (0.5-1 kg per week).",
            metrics.bmi
        ),
        BmiClass::Overweight => format!(
            "BMI {:.1} is overweight. Write a short advisory note on cardiovascular and metabolic \
             risk and safe, moderate calorie reduction.",
            metrics.bmi
        ),
        BmiClass::Normal => format!(
            "BMI {:.1} is in the healthy range. Write one or two sentences encouraging the user to \
             maintain it.",
            metrics.bmi
        ),
    }
}

/// Renders the provider prompt. Pure string construction.
pub fn build_prompt(metrics: &Metrics, profile: &UserProfile) -> PlanRequest {
    let target = metrics.target_calories.round() as i64;
    let tdee = metrics.tdee.round() as i64;
    let slots = MealSlot::ALL
        .iter()
        .map(|s| s.to_string().to_lowercase())
        .collect::<Vec<_>>()
        .join(", ");

    let diet_line = match profile.diet {
        Diet::Vegetarian => "Diet: vegetarian. Do not use meat or fish in any meal.\n",
        Diet::Omnivore => "",
    };

    let mut prompt = format!(
        "Create a {days}-day meal plan in {cuisine} cuisine style at about {target} kcal per day.\n\
         User profile: BMI {bmi:.1} ({class}), TDEE ~{tdee} kcal, target {target} kcal, goal: {goal}, \
         activity: {activity}, sex: {sex}, age: {age}.\n\
         {diet_line}\
         Each day must have exactly these meals: {slots}. Give portions in household units \
         (bowls, cups, slices, pieces) with grams where sensible, a rough protein/carbs/fat split \
         per meal, and short, easy recipes.\n\
         The plan must cover exactly {days} days, numbered Day 1 to Day {days}. Do not stop early.\n\n",
        days = PLAN_DAYS,
        cuisine = profile.cuisine,
        target = target,
        bmi = metrics.bmi,
        class = metrics.classification,
        tdee = tdee,
        goal = metrics.goal,
        activity = profile.activity,
        sex = profile.sex,
        age = profile.age,
        diet_line = diet_line,
        slots = slots,
    );

    prompt.push_str("Format the answer with exactly these sections:\n\n");

    prompt.push_str(&format!(
        "## {}\n\
         [One line per day, in this exact format:\n\
         Day N: breakfast | lunch | snack | dinner | ~total kcal]\n\n",
        SECTION_MEALS
    ));

    prompt.push_str(&format!(
        "## {}\n\
         [All ingredients for the {} days with estimated quantities (kg/g), grouped by category \
         as **Category:** followed by '- item' lines]\n\n",
        SECTION_SHOPPING, PLAN_DAYS
    ));

    prompt.push_str(&format!(
        "## {}\n\
         [One '- Day N: ...' line per day with exercise type, duration and intensity.\n\
         {}\n\
         Include safety notes.]\n\n",
        SECTION_EXERCISE,
        exercise_guidance(metrics.classification)
    ));

    prompt.push_str(&format!(
        "## {}\n\
         [{}]\n",
        SECTION_BMI,
        bmi_guidance(metrics)
    ));

    let contract = PlanContract {
        days: PLAN_DAYS,
        meal_slots: MealSlot::ALL.to_vec(),
        macro_targets: true,
        shopping_list: true,
        exercise_suggestions: true,
        bmi_warning: matches!(
            metrics.classification,
            BmiClass::Underweight | BmiClass::Obese
        ),
    };

    PlanRequest {
        prompt,
        contract,
        metrics: *metrics,
        profile: profile.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Goal, Sex, DEFAULT_CUISINE};
    use crate::services::metrics;

    fn profile(weight_kg: f64, diet: Diet) -> UserProfile {
        UserProfile {
            height_cm: 170.0,
            weight_kg,
            age: 30,
            sex: Sex::Female,
            activity: ActivityLevel::Moderate,
            goal: Goal::Auto,
            diet,
            cuisine: DEFAULT_CUISINE.to_string(),
        }
    }

    fn request(weight_kg: f64, diet: Diet) -> PlanRequest {
        let p = profile(weight_kg, diet);
        build_prompt(&metrics::compute(&p), &p)
    }

    #[test]
    fn test_prompt_embeds_metrics() {
        let p = profile(65.0, Diet::Omnivore);
        let m = metrics::compute(&p);
        let req = build_prompt(&m, &p);

        assert!(req.prompt.contains(&format!("BMI {:.1}", m.bmi)));
        assert!(req.prompt.contains("(normal)"));
        assert!(req.prompt.contains(&format!("TDEE ~{} kcal", m.tdee.round() as i64)));
        assert!(req.prompt.contains(&format!("{} kcal per day", m.target_calories.round() as i64)));
        assert!(req.prompt.contains("goal: maintain weight"));
        assert!(req.prompt.contains("Vietnamese cuisine"));
        assert!(req.prompt.contains("exactly 7 days"));
        assert!(req.prompt.contains("## SHOPPING LIST"));
        assert_eq!(req.contract.days, 7);
        assert!(!req.contract.bmi_warning);
    }

    #[test]
    fn test_exercise_emphasis_follows_classification() {
        let heavy = request(100.0, Diet::Omnivore);
        assert!(heavy.prompt.contains("low-impact cardio"));
        assert!(heavy.contract.bmi_warning);

        let thin = request(50.0, Diet::Omnivore);
        assert!(thin.prompt.contains("strength training"));
        assert!(thin.prompt.contains("REQUIRED: BMI 17.3 is underweight"));
        assert!(thin.contract.bmi_warning);
    }

    #[test]
    fn test_severe_thinness_warning() {
        let req = request(44.0, Diet::Omnivore);
        assert!(req.prompt.contains("severe thinness"));
    }

    #[test]
    fn test_vegetarian_line() {
        assert!(request(65.0, Diet::Vegetarian).prompt.contains("Diet: vegetarian"));
        assert!(!request(65.0, Diet::Omnivore).prompt.contains("Diet: vegetarian"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(request(72.0, Diet::Omnivore), request(72.0, Diet::Omnivore));
    }
}
