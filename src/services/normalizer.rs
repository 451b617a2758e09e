//! Turns raw provider output into a validated 7-day [`MealPlan`].
//!
//! Parsers share the [`PlanParser`] trait and are tried in order, strict
//! JSON first, then the `## SECTION` text format the prompt asks for. A
//! schema-constrained provider mode would slot in as one more parser.
//!
//! Incomplete output is never padded: fewer than 7 usable days is an
//! [`PlanError::IncompletePlan`] carrying what was recovered.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::PlanError;
use crate::models::{DayPlan, Macros, Meal, MealPlan, MealSlot, RawPlanResponse, ShoppingGroup, PLAN_DAYS};

pub const SECTION_MEALS: &str = "MEAL PLAN";
pub const SECTION_SHOPPING: &str = "SHOPPING LIST";
pub const SECTION_EXERCISE: &str = "EXERCISE PLAN";
pub const SECTION_BMI: &str = "BMI ANALYSIS";

const DEFAULT_SHOPPING_GROUP: &str = "Shopping list";

lazy_static! {
    static ref DAY_HEADER: Regex =
        Regex::new(r"(?i)^(?:day|ngày)\s*(\d{1,2})\b[\s:.)\-–*]*(.*)$").unwrap();
    static ref LABELLED: Regex = Regex::new(r"^([^:]{1,24}):\s*(.*)$").unwrap();
    static ref KCAL: Regex = Regex::new(r"(?i)(\d[\d,.]*)\s*kcal").unwrap();
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
    // "(Sunday):", "- Monday", "Thứ Hai" after a day number
    static ref DAY_SUFFIX: Regex = Regex::new(
        r"(?i)^(?:\([^)]*\)|(?:mon|tues|wednes|thurs|fri|satur|sun)day\b|thứ\s+\w+|chủ\s+nhật)[\s:.\-–*)]*"
    )
    .unwrap();
}

/// One way of reading provider output
pub trait PlanParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the text is not in this parser's format. Days may be
    /// partial, unsorted or duplicated; validation happens afterwards.
    fn parse(&self, text: &str) -> Option<MealPlan>;
}

pub struct Normalizer {
    parsers: Vec<Box<dyn PlanParser>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(vec![Box::new(JsonPlanParser), Box::new(SectionTextParser)])
    }
}

impl Normalizer {
    pub fn new(parsers: Vec<Box<dyn PlanParser>>) -> Self {
        Self { parsers }
    }

    pub fn normalize(&self, raw: &RawPlanResponse) -> Result<MealPlan, PlanError> {
        for parser in &self.parsers {
            if let Some(plan) = parser.parse(&raw.body) {
                log::debug!(
                    "🧩 {} response parsed by {} ({} day entries)",
                    raw.source,
                    parser.name(),
                    plan.days.len()
                );
                return validate(plan);
            }
        }

        log::warn!("⚠️ No parser could read the {} response", raw.source);
        validate(MealPlan::default())
    }
}

/// Normalizes with the default parser chain
pub fn normalize(raw: &RawPlanResponse) -> Result<MealPlan, PlanError> {
    Normalizer::default().normalize(raw)
}

/// Keeps days 1..=7 that have content (first occurrence wins), sorts them and
/// checks that all seven are present.
fn validate(plan: MealPlan) -> Result<MealPlan, PlanError> {
    let mut by_day: BTreeMap<u8, DayPlan> = BTreeMap::new();
    for day in plan.days {
        if day.day == 0 || day.day as usize > PLAN_DAYS || !day.has_meals() {
            continue;
        }
        by_day.entry(day.day).or_insert(day);
    }

    let plan = MealPlan {
        days: by_day.into_values().collect(),
        exercise: plan
            .exercise
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        shopping_list: plan
            .shopping_list
            .into_iter()
            .filter(|g| !g.items.is_empty())
            .collect(),
        health_warning: plan.health_warning.trim().to_string(),
    };

    let found = plan.days.len();
    if found < PLAN_DAYS {
        log::warn!("⚠️ Plan incomplete: {} of {} days recovered", found, PLAN_DAYS);
        return Err(PlanError::IncompletePlan {
            found,
            partial: Box::new(plan),
        });
    }

    Ok(plan)
}

fn parse_kcal(text: &str) -> Option<f64> {
    KCAL.captures(text)
        .and_then(|c| c[1].replace(',', "").trim_end_matches('.').parse::<f64>().ok())
}

// ---------------------------------------------------------------------------
// JSON

#[derive(Debug, Deserialize)]
struct WirePlan {
    days: Vec<WireDay>,
    #[serde(default, alias = "exercises", alias = "exercise_plan")]
    exercise: Option<Value>,
    #[serde(default, alias = "shopping")]
    shopping_list: Option<Value>,
    #[serde(default, alias = "bmi_warning", alias = "warning")]
    health_warning: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireDayIndex {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct WireDay {
    #[serde(default, alias = "index")]
    day: Option<WireDayIndex>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    meals: WireMeals,
    #[serde(default)]
    breakfast: Option<WireMeal>,
    #[serde(default)]
    lunch: Option<WireMeal>,
    #[serde(default)]
    snack: Option<WireMeal>,
    #[serde(default)]
    dinner: Option<WireMeal>,
    #[serde(default, alias = "kcal", alias = "total_calories")]
    total_kcal: Option<f64>,
}

/// `{"breakfast": ..}` or `[{"type": "breakfast", "name": ..}, ..]`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMeals {
    Keyed(BTreeMap<String, WireMeal>),
    Listed(Vec<Value>),
}

impl Default for WireMeals {
    fn default() -> Self {
        WireMeals::Keyed(BTreeMap::new())
    }
}

const SLOT_KEYS: [&str; 5] = ["type", "slot", "meal_type", "meal", "time"];

impl WireMeals {
    fn into_slots(self) -> BTreeMap<MealSlot, Meal> {
        let mut meals = BTreeMap::new();
        match self {
            WireMeals::Keyed(map) => {
                for (key, meal) in map {
                    if let Some(slot) = MealSlot::from_string(&key) {
                        meals.insert(slot, Meal::from(meal));
                    }
                }
            }
            WireMeals::Listed(items) => {
                for item in items {
                    let slot = SLOT_KEYS
                        .iter()
                        .filter_map(|k| item.get(*k).and_then(Value::as_str))
                        .find_map(MealSlot::from_string);
                    let Some(slot) = slot else {
                        continue;
                    };
                    match serde_json::from_value::<WireMealDetail>(item) {
                        Ok(detail) => {
                            meals.entry(slot).or_insert_with(|| Meal::from(WireMeal::Detailed(detail)));
                        }
                        Err(e) => log::debug!("Skipping unreadable {} entry: {}", slot, e),
                    }
                }
            }
        }
        meals
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireMeal {
    Text(String),
    Detailed(WireMealDetail),
}

#[derive(Debug, Deserialize)]
struct WireMealDetail {
    #[serde(default, alias = "name", alias = "text", alias = "dish")]
    description: String,
    #[serde(default, alias = "calories")]
    kcal: Option<f64>,
    #[serde(default)]
    portion_grams: Option<f64>,
    #[serde(default)]
    macros: Option<WireMacros>,
}

#[derive(Debug, Deserialize)]
struct WireMacros {
    #[serde(default, alias = "protein")]
    protein_g: f64,
    #[serde(default, alias = "carbs", alias = "carbohydrates")]
    carbs_g: f64,
    #[serde(default, alias = "fat")]
    fat_g: f64,
}

impl From<WireMeal> for Meal {
    fn from(wire: WireMeal) -> Self {
        match wire {
            WireMeal::Text(text) => Meal {
                kcal: parse_kcal(&text),
                ..Meal::text(text.trim())
            },
            WireMeal::Detailed(detail) => Meal {
                description: detail.description.trim().to_string(),
                kcal: detail.kcal,
                portion_grams: detail.portion_grams.map(|g| g.round() as u32),
                macros: detail.macros.map(|m| Macros {
                    protein_g: m.protein_g,
                    carbs_g: m.carbs_g,
                    fat_g: m.fat_g,
                }),
            },
        }
    }
}

fn day_number(text: &str) -> Option<u8> {
    DIGITS.find(text).and_then(|m| m.as_str().parse().ok())
}

impl WireDay {
    fn into_day(self, position: usize) -> DayPlan {
        let day = match (&self.day, &self.label) {
            (Some(WireDayIndex::Number(n)), _) => u8::try_from(*n).unwrap_or(0),
            (Some(WireDayIndex::Text(t)), _) => day_number(t).unwrap_or(0),
            (None, Some(label)) => day_number(label).unwrap_or(0),
            (None, None) => (position + 1) as u8,
        };

        let mut meals = self.meals.into_slots();
        let flat = [
            (MealSlot::Breakfast, self.breakfast),
            (MealSlot::Lunch, self.lunch),
            (MealSlot::Snack, self.snack),
            (MealSlot::Dinner, self.dinner),
        ];
        for (slot, meal) in flat {
            if let Some(meal) = meal {
                meals.entry(slot).or_insert_with(|| Meal::from(meal));
            }
        }

        DayPlan {
            day,
            meals,
            total_kcal: self.total_kcal,
        }
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            let parts: Vec<String> = map
                .values()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join(" - "))
        }
        _ => None,
    }
}

fn wire_exercise(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        Some(Value::String(s)) => s.lines().map(|l| clean_line(l).to_string()).collect(),
        _ => Vec::new(),
    }
}

fn string_items(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(value_text).collect())
        .unwrap_or_default()
}

fn wire_shopping(value: Option<Value>) -> Vec<ShoppingGroup> {
    match value {
        Some(Value::Array(items)) => {
            let mut groups = Vec::new();
            let mut loose = Vec::new();
            for item in &items {
                match item.get("items") {
                    Some(list) => groups.push(ShoppingGroup {
                        category: item
                            .get("category")
                            .and_then(Value::as_str)
                            .unwrap_or(DEFAULT_SHOPPING_GROUP)
                            .to_string(),
                        items: string_items(list),
                    }),
                    None => loose.extend(value_text(item)),
                }
            }
            if !loose.is_empty() {
                groups.push(ShoppingGroup {
                    category: DEFAULT_SHOPPING_GROUP.to_string(),
                    items: loose,
                });
            }
            groups
        }
        Some(Value::Object(map)) => map
            .iter()
            .map(|(category, list)| ShoppingGroup {
                category: category.clone(),
                items: string_items(list),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Reads the first `{` .. last `}` slice as a plan object with a `days` array.
/// Tolerates code fences and prose around the object.
pub struct JsonPlanParser;

impl PlanParser for JsonPlanParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, text: &str) -> Option<MealPlan> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }

        let wire: WirePlan = match serde_json::from_str(&text[start..=end]) {
            Ok(w) => w,
            Err(e) => {
                log::debug!("JSON plan parse failed, falling back: {}", e);
                return None;
            }
        };

        Some(MealPlan {
            days: wire
                .days
                .into_iter()
                .enumerate()
                .map(|(i, d)| d.into_day(i))
                .collect(),
            exercise: wire_exercise(wire.exercise),
            shopping_list: wire_shopping(wire.shopping_list),
            health_warning: wire.health_warning.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Structured text

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Meals,
    Shopping,
    Exercise,
    Warning,
    Other,
}

fn classify_header(header: &str) -> Section {
    let upper = header.to_uppercase();
    let has = |words: &[&str]| words.iter().any(|w| upper.contains(w));

    if has(&["SHOPPING", "GROCER", "MUA SẮM"]) {
        Section::Shopping
    } else if has(&["EXERCISE", "WORKOUT", "TRAINING", "LUYỆN TẬP"]) {
        Section::Exercise
    } else if has(&["BMI", "WARNING", "HEALTH", "CẢNH BÁO"]) {
        Section::Warning
    } else if has(&["MEAL", "MENU", "DIET", "PLAN", "ĂN"]) {
        Section::Meals
    } else {
        Section::Other
    }
}

fn is_bullet(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with('-') || t.starts_with('•') || (t.starts_with('*') && !t.starts_with("**"))
}

/// Drops list markers and bold markers around a line
fn clean_line(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
}

fn split_sections(text: &str) -> Vec<(Section, Vec<&str>)> {
    let mut sections = vec![(Section::Other, Vec::new())];
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            let header = trimmed.trim_start_matches('#').trim().trim_matches('*');
            sections.push((classify_header(header), Vec::new()));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }
    sections
}

fn lines_of<'a>(sections: &[(Section, Vec<&'a str>)], kind: Section) -> Vec<&'a str> {
    sections
        .iter()
        .filter(|(s, _)| *s == kind)
        .flat_map(|(_, lines)| lines.iter().copied())
        .collect()
}

fn text_meal(text: &str) -> Meal {
    Meal {
        kcal: parse_kcal(text),
        ..Meal::text(text.trim())
    }
}

fn next_free_slot(meals: &BTreeMap<MealSlot, Meal>) -> Option<MealSlot> {
    MealSlot::ALL.iter().copied().find(|s| !meals.contains_key(s))
}

/// Pipe lines, `Slot:` lines and `Total:` lines. Returns false for anything else.
fn apply_structured_line(day: &mut DayPlan, line: &str) -> bool {
    if line.contains('|') {
        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        for (slot, part) in MealSlot::ALL.iter().zip(parts.iter()) {
            if !part.is_empty() {
                day.meals.insert(*slot, text_meal(part));
            }
        }
        if let Some(kcal) = parts.get(MealSlot::ALL.len()).and_then(|p| parse_kcal(p)) {
            day.total_kcal = Some(kcal);
        }
        return true;
    }

    if let Some(caps) = LABELLED.captures(line) {
        let label = caps[1].trim().trim_matches('*');
        let content = caps[2].trim().trim_start_matches('*').trim();
        if let Some(slot) = MealSlot::from_string(label) {
            if !content.is_empty() {
                day.meals.insert(slot, text_meal(content));
            }
            return true;
        }
        let label = label.to_lowercase();
        if label.starts_with("total") || label.starts_with("tổng") {
            day.total_kcal = parse_kcal(content);
            return true;
        }
    }

    false
}

/// Applies one body line of a day block: structured, or the next free slot
fn apply_day_line(day: &mut DayPlan, line: &str) {
    let line = clean_line(line);
    if line.is_empty() || apply_structured_line(day, line) {
        return;
    }

    if let Some(slot) = next_free_slot(&day.meals) {
        day.meals.insert(slot, text_meal(line));
    }
}

/// Text after `Day N` only counts when it carries meals itself. Weekday and
/// parenthesised suffixes are dropped; a bare title never fills a slot.
fn apply_header_rest(day: &mut DayPlan, rest: &str) {
    let rest = clean_line(rest);
    let rest = match DAY_SUFFIX.find(rest) {
        Some(m) => rest[m.end()..].trim(),
        None => rest,
    };
    if !rest.is_empty() {
        apply_structured_line(day, rest);
    }
}

fn parse_days(lines: &[&str]) -> Vec<DayPlan> {
    let mut days: Vec<DayPlan> = Vec::new();

    for line in lines {
        let cleaned = clean_line(line);
        if let Some(caps) = DAY_HEADER.captures(cleaned) {
            let mut day = DayPlan {
                day: caps[1].parse().unwrap_or(0),
                meals: BTreeMap::new(),
                total_kcal: None,
            };
            apply_header_rest(&mut day, &caps[2]);
            days.push(day);
        } else if let Some(day) = days.last_mut() {
            apply_day_line(day, line);
        }
    }

    days
}

fn parse_shopping(lines: &[&str]) -> Vec<ShoppingGroup> {
    let mut groups: Vec<ShoppingGroup> = Vec::new();

    for line in lines {
        let cleaned = clean_line(line);
        if cleaned.is_empty() {
            continue;
        }
        if !is_bullet(line) && cleaned.ends_with(':') {
            groups.push(ShoppingGroup {
                category: cleaned.trim_end_matches(':').trim().to_string(),
                items: Vec::new(),
            });
            continue;
        }
        if groups.is_empty() {
            groups.push(ShoppingGroup {
                category: DEFAULT_SHOPPING_GROUP.to_string(),
                items: Vec::new(),
            });
        }
        if let Some(group) = groups.last_mut() {
            group.items.push(cleaned.to_string());
        }
    }

    groups
}

fn parse_paragraphs(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| l.trim().replace("**", ""))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Reads `## SECTION` text: day headers (`Day N` / `Ngày N`), pipe lines,
/// `Breakfast:` labelled lines and bullet lists. Always yields a plan,
/// possibly with no days, so it closes the parser chain.
pub struct SectionTextParser;

impl PlanParser for SectionTextParser {
    fn name(&self) -> &'static str {
        "section-text"
    }

    fn parse(&self, text: &str) -> Option<MealPlan> {
        let sections = split_sections(text);

        let has_meal_section = sections.iter().any(|(s, _)| *s == Section::Meals);
        let meal_lines = if has_meal_section {
            lines_of(&sections, Section::Meals)
        } else {
            lines_of(&sections, Section::Other)
        };

        Some(MealPlan {
            days: parse_days(&meal_lines),
            exercise: lines_of(&sections, Section::Exercise)
                .into_iter()
                .map(|l| clean_line(l).replace("**", ""))
                .collect(),
            shopping_list: parse_shopping(&lines_of(&sections, Section::Shopping)),
            health_warning: parse_paragraphs(&lines_of(&sections, Section::Warning)),
        })
    }
}
