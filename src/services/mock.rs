//! Offline plan synthesis used when no Gemini key is configured, and as the
//! fallback when the live call fails.
//!
//! Output depends only on the [`PlanRequest`]: the same profile always yields
//! the same plan.

use std::collections::BTreeMap;

use crate::errors::PlanError;
use crate::models::{
    BmiClass, DayPlan, Diet, Goal, Macros, Meal, MealPlan, MealSlot, Metrics, PlanRequest, PlanSource,
    RawPlanResponse, ShoppingGroup,
};
use crate::services::metrics::SEVERE_THINNESS_BELOW;

use super::ai_service::PlanService;

/// A dish as listed in a pool: description, reference portion and its energy
struct Dish {
    name: &'static str,
    grams: f64,
    kcal: f64,
}

const fn dish(name: &'static str, grams: f64, kcal: f64) -> Dish {
    Dish { name, grams, kcal }
}

static BREAKFASTS: [Dish; 6] = [
    dish("Small bowl of chicken pho + 1 banana", 450.0, 420.0),
    dish("Small bowl of crab noodle soup (bun rieu)", 400.0, 380.0),
    dish("Oat porridge + 1 banana", 350.0, 350.0),
    dish("Banh mi with fried egg and vegetables", 220.0, 450.0),
    dish("Oatmeal with milk", 300.0, 320.0),
    dish("Steamed rice rolls (banh cuon) with light dipping sauce", 300.0, 400.0),
];

static VEGETARIAN_BREAKFASTS: [Dish; 6] = [
    dish("Small bowl of vegetarian pho with tofu + 1 banana", 450.0, 400.0),
    dish("Sticky rice with mung beans and peanuts", 250.0, 450.0),
    dish("Oat porridge + 1 banana", 350.0, 350.0),
    dish("Banh mi with fried egg and vegetables", 220.0, 450.0),
    dish("Oatmeal with milk", 300.0, 320.0),
    dish("Steamed rice rolls filled with mushrooms", 300.0, 380.0),
];

static LUNCHES: [Dish; 6] = [
    dish("1 bowl of rice + stir-fried chicken breast with vegetables", 400.0, 600.0),
    dish("1 bowl of rice + grilled fish + boiled greens", 420.0, 580.0),
    dish("Chicken pho, light on oil", 500.0, 520.0),
    dish("1 bowl of rice + stir-fried tofu with vegetables", 400.0, 550.0),
    dish("1 bowl of rice + tuna salad", 380.0, 560.0),
    dish("1 bowl of rice + stir-fried beef with vegetables", 420.0, 650.0),
];

static SNACKS: [Dish; 5] = [
    dish("1 cup of yogurt", 150.0, 140.0),
    dish("1 apple + a few nuts", 180.0, 180.0),
    dish("A handful of cashews", 30.0, 170.0),
    dish("Small avocado smoothie", 250.0, 220.0),
    dish("1 banana", 120.0, 105.0),
];

static DINNERS: [Dish; 6] = [
    dish("1 bowl of rice + braised fish + vegetable soup", 450.0, 650.0),
    dish("1 bowl of rice + pan-seared chicken + clear soup", 450.0, 680.0),
    dish("1 bowl of rice + stir-fried tofu + greens", 420.0, 560.0),
    dish("1 bowl of rice + grilled fish + greens", 430.0, 600.0),
    dish("Small plate of spaghetti (light sauce) + salad", 380.0, 620.0),
    dish("1 bowl of rice + roast fish + vegetables", 440.0, 640.0),
];

static VEGETARIAN_LUNCHES: [Dish; 6] = [
    dish("1 bowl of rice + stir-fried tofu with vegetables", 400.0, 550.0),
    dish("1 bowl of rice + lemongrass tofu + boiled greens", 420.0, 560.0),
    dish("Vegetarian pho with tofu and mushrooms", 500.0, 480.0),
    dish("1 bowl of rice + braised mushrooms and eggplant", 420.0, 520.0),
    dish("1 bowl of rice + tofu and chickpea salad", 400.0, 580.0),
    dish("Rice noodles with fried tofu and herbs", 450.0, 600.0),
];

static VEGETARIAN_DINNERS: [Dish; 6] = [
    dish("1 bowl of rice + braised tofu + vegetable soup", 450.0, 600.0),
    dish("1 bowl of rice + stir-fried tofu + greens", 420.0, 560.0),
    dish("1 bowl of rice + mushroom and tofu hot pot", 480.0, 620.0),
    dish("1 bowl of rice + stuffed tofu in tomato sauce", 450.0, 610.0),
    dish("Small plate of spaghetti (tomato sauce) + salad", 380.0, 600.0),
    dish("1 bowl of rice + stir-fried vegetables with cashews", 430.0, 630.0),
];

/// Portion multiplier: heavier classes eat smaller portions
fn portion_scale(class: BmiClass) -> f64 {
    match class {
        BmiClass::Underweight => 1.25,
        BmiClass::Normal => 1.0,
        BmiClass::Overweight => 0.9,
        BmiClass::Obese => 0.8,
    }
}

/// Protein / carbs / fat share of energy
fn macro_split(goal: Goal) -> (f64, f64, f64) {
    match goal {
        Goal::Lose => (0.30, 0.40, 0.30),
        Goal::Gain => (0.25, 0.45, 0.30),
        Goal::Maintain | Goal::Auto => (0.25, 0.50, 0.25),
    }
}

fn exercise_plan(class: BmiClass) -> Vec<String> {
    let lines: [&str; 8] = match class {
        BmiClass::Normal => [
            "Day 1: Brisk walk 30 min (5-6 km/h)",
            "Day 2: Yoga 25 min (basic poses)",
            "Day 3: Light jog 20 min + 10 min stretching",
            "Day 4: Rest or easy walk 15 min",
            "Day 5: Strength training (light weights or bodyweight) 30 min",
            "Day 6: Walk 30 min + yoga 15 min",
            "Day 7: Active rest (gentle stretching)",
            "Note: mix cardio, strength and flexibility; sleep 7-8 hours.",
        ],
        BmiClass::Overweight => [
            "Day 1: Brisk walk 40 min (60-70% max heart rate)",
            "Day 2: Cycling or swimming 30 min",
            "Day 3: Brisk walk 35 min + light weights 15 min",
            "Day 4: Yoga or stretching 30 min",
            "Day 5: Light cardio (walking or cycling) 45 min",
            "Day 6: Endurance circuit (squats, plank) 25 min",
            "Day 7: Rest or easy walk 20 min",
            "Note: build intensity gradually and stay hydrated.",
        ],
        BmiClass::Obese => [
            "Day 1: Easy walk 20-30 min at a conversational pace",
            "Day 2: Stationary cycling 20 min, low resistance",
            "Day 3: Water walking or swimming 30 min",
            "Day 4: Chair-supported stretching 20 min",
            "Day 5: Easy walk 30 min",
            "Day 6: Light resistance bands 15 min + walk 15 min",
            "Day 7: Rest",
            "Note: low-impact only; stop and see a doctor if you feel chest pain or joint pain.",
        ],
        BmiClass::Underweight => [
            "Day 1: Light weights (large muscle groups) 30 min",
            "Day 2: Easy walk 20 min (no hard cardio)",
            "Day 3: Rest, focus on recovery",
            "Day 4: Bodyweight strength 25 min",
            "Day 5: Gentle yoga 20 min",
            "Day 6: Light weights 30 min",
            "Day 7: Full rest",
            "Note: avoid hard cardio that burns extra calories; sleep 8-9 hours.",
        ],
    };
    lines.iter().map(|l| l.to_string()).collect()
}

fn health_warning(metrics: &Metrics) -> String {
    let bmi = metrics.bmi;
    match metrics.classification {
        BmiClass::Underweight if bmi < SEVERE_THINNESS_BELOW => format!(
            "Severe thinness (BMI {:.1}). Risks: serious malnutrition, weakened immunity, osteoporosis, \
             hormonal and heart rhythm problems. See a doctor or dietitian now and raise calories gradually \
             under medical supervision.",
            bmi
        ),
        BmiClass::Underweight => format!(
            "Underweight (BMI {:.1}). Risks: nutrient and vitamin deficiency, weakened immunity, fatigue and \
             dizziness. Increase portions, favour energy-dense foods (nuts, avocado, milk, lean meat) and eat \
             5-6 smaller meals a day.",
            bmi
        ),
        BmiClass::Overweight => format!(
            "Overweight (BMI {:.1}). Risks: higher cardiovascular and metabolic risk, joint strain. Reduce \
             calories moderately (300-500 kcal/day), favour greens and lean protein, cut refined carbs.",
            bmi
        ),
        BmiClass::Obese => format!(
            "Obese (BMI {:.1}). Risks: heart disease, stroke, type 2 diabetes, high blood pressure, sleep apnea, \
             joint degeneration. Consult a doctor; aim for gradual loss of 0.5-1 kg per week with regular \
             low-impact activity.",
            bmi
        ),
        BmiClass::Normal => String::new(),
    }
}

fn shopping_list(diet: Diet) -> Vec<ShoppingGroup> {
    let group = |category: &str, items: &[&str]| ShoppingGroup {
        category: category.to_string(),
        items: items.iter().map(|i| i.to_string()).collect(),
    };

    let mut groups = vec![group(
        "Starches",
        &["Rice: 2-3 kg", "Dry rice noodles / pho: 500 g", "Oats: 500 g", "Wholegrain bread: 1 loaf"],
    )];
    if diet == Diet::Omnivore {
        groups.push(group(
            "Animal protein",
            &["Chicken breast: 700 g", "Fish (salmon or tilapia): 800 g", "Eggs: 10"],
        ));
    }
    groups.push(group(
        "Plant protein & dairy",
        &["Tofu: 500 g", "Cashews: 200 g", "Yogurt: 7 cups"],
    ));
    groups.push(group(
        "Fruit & vegetables",
        &["Mixed greens: 1.5 kg", "Bananas: 7", "Apples: 3", "Avocados: 2"],
    ));
    groups.push(group(
        "Seasoning & other",
        &["Cooking oil, salt, pepper, chili sauce", "Fish sauce (or soy sauce), garlic, shallots"],
    ));
    groups
}

fn pick(pool: &[Dish], seed: usize, day: usize, salt: usize) -> &Dish {
    &pool[(seed.wrapping_mul(31) + day * 7 + salt * 13) % pool.len()]
}

/// Deterministic stand-in for the live provider. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MockPlanService;

impl MockPlanService {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, request: &PlanRequest) -> MealPlan {
        let metrics = &request.metrics;
        let target = metrics.target_calories;
        let seed = target.round() as usize;
        let scale = portion_scale(metrics.classification);
        let (protein, carbs, fat) = macro_split(metrics.goal);

        let (breakfasts, lunches, dinners): (&[Dish], &[Dish], &[Dish]) = match request.profile.diet {
            Diet::Vegetarian => (&VEGETARIAN_BREAKFASTS[..], &VEGETARIAN_LUNCHES[..], &VEGETARIAN_DINNERS[..]),
            Diet::Omnivore => (&BREAKFASTS[..], &LUNCHES[..], &DINNERS[..]),
        };

        let days = (0..request.contract.days)
            .map(|i| {
                let mut meals = BTreeMap::new();
                for (salt, slot) in MealSlot::ALL.iter().enumerate() {
                    let pool: &[Dish] = match slot {
                        MealSlot::Breakfast => breakfasts,
                        MealSlot::Lunch => lunches,
                        MealSlot::Snack => &SNACKS[..],
                        MealSlot::Dinner => dinners,
                    };
                    let dish = pick(pool, seed, i, salt);
                    let kcal = (target * slot.calorie_share()).round();
                    let grams = dish.grams * (kcal / dish.kcal) * scale;

                    meals.insert(
                        *slot,
                        Meal {
                            description: dish.name.to_string(),
                            kcal: Some(kcal),
                            portion_grams: Some(grams.round() as u32),
                            macros: Some(Macros {
                                protein_g: (kcal * protein / 4.0).round(),
                                carbs_g: (kcal * carbs / 4.0).round(),
                                fat_g: (kcal * fat / 9.0).round(),
                            }),
                        },
                    );
                }
                let total = meals.values().filter_map(|m| m.kcal).sum();

                DayPlan {
                    day: (i + 1) as u8,
                    meals,
                    total_kcal: Some(total),
                }
            })
            .collect();

        MealPlan {
            days,
            exercise: exercise_plan(metrics.classification),
            shopping_list: shopping_list(request.profile.diet),
            health_warning: health_warning(metrics),
        }
    }
}

#[async_trait::async_trait]
impl PlanService for MockPlanService {
    async fn generate(&self, request: &PlanRequest) -> Result<RawPlanResponse, PlanError> {
        log::info!(
            "🧪 Synthesizing mock plan for {:.0} kcal ({})",
            request.metrics.target_calories,
            request.metrics.classification
        );

        let body = serde_json::to_string(&self.plan(request))
            .map_err(|e| PlanError::ProviderUnavailable(format!("mock plan serialization: {}", e)))?;

        Ok(RawPlanResponse {
            body,
            source: PlanSource::Mock,
        })
    }
}
