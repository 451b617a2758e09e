use anyhow::{anyhow, Context, Result};

use crate::models::{MealPlan, MealSlot};

pub const CSV_HEADER: [&str; 6] = ["Day", "Breakfast", "Lunch", "Snack", "Dinner", "Kcal"];

/// One row per day, meal slots as columns
pub fn to_csv(plan: &MealPlan) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;

    for day in &plan.days {
        let mut row = vec![format!("Day {}", day.day)];
        for slot in MealSlot::ALL {
            row.push(
                day.meals
                    .get(&slot)
                    .map(|m| m.description.clone())
                    .unwrap_or_default(),
            );
        }
        row.push(day.total_kcal.map(|k| format!("{:.0}", k)).unwrap_or_default());

        writer
            .write_record(&row)
            .with_context(|| format!("writing CSV row for day {}", day.day))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayPlan, Meal};
    use std::collections::BTreeMap;

    fn day(n: u8, breakfast: &str) -> DayPlan {
        let mut meals = BTreeMap::new();
        meals.insert(MealSlot::Breakfast, Meal::text(breakfast));
        meals.insert(MealSlot::Dinner, Meal::text("Grilled fish"));
        DayPlan {
            day: n,
            meals,
            total_kcal: Some(1799.6),
        }
    }

    fn read_back(csv: &str) -> Vec<csv::StringRecord> {
        csv::Reader::from_reader(csv.as_bytes())
            .records()
            .collect::<std::result::Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_header_and_one_row_per_day() {
        let plan = MealPlan {
            days: (1..=7).map(|n| day(n, "Pho")).collect(),
            ..MealPlan::default()
        };

        let csv = to_csv(&plan).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert_eq!(lines[1], "Day 1,Pho,,,Grilled fish,1800");
        assert!(lines[7].starts_with("Day 7,"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let plan = MealPlan {
            days: vec![day(1, "Rice, egg and \"nuoc cham\"")],
            ..MealPlan::default()
        };

        let csv = to_csv(&plan).unwrap();
        assert!(csv.contains("\"Rice, egg and \"\"nuoc cham\"\"\""));
        assert_eq!(&read_back(&csv)[0][1], "Rice, egg and \"nuoc cham\"");
    }

    #[test]
    fn test_crlf_in_description_stays_in_one_record() {
        let plan = MealPlan {
            days: vec![day(1, "Pho\r\nwith herbs"), day(2, "Oats\r")],
            ..MealPlan::default()
        };

        let records = read_back(&to_csv(&plan).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][1], "Pho\r\nwith herbs");
        assert_eq!(&records[1][1], "Oats\r");
        assert_eq!(&records[1][5], "1800");
    }
}
