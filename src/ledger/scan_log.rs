use std::collections::VecDeque;

use serde::Serialize;
use time::OffsetDateTime;

use super::quantity::Quantity;
use crate::analysis::dto::{AnalysisContext, NutritionRecord};

pub const SCAN_LOG_CAPACITY: usize = 10;

/// One successful analysis as the session remembers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanLogEntry {
    /// Creation time in epoch milliseconds, strictly increasing per log.
    pub id: i64,
    #[serde(flatten)]
    pub record: NutritionRecord,
    pub image_preview: Option<String>,
    pub meal_context: String,
    pub goal_context: String,
}

/// Newest-first log of at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct ScanLog {
    entries: VecDeque<ScanLogEntry>,
    capacity: usize,
    last_id: i64,
}

impl Default for ScanLog {
    fn default() -> Self {
        Self::with_capacity(SCAN_LOG_CAPACITY)
    }
}

impl ScanLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            last_id: 0,
        }
    }

    /// Prepends an entry, evicting the oldest one first when full.
    pub fn append(
        &mut self,
        record: NutritionRecord,
        image_preview: Option<String>,
        context: &AnalysisContext,
    ) -> &ScanLogEntry {
        let id = self.next_id();
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(ScanLogEntry {
            id,
            record,
            image_preview,
            meal_context: context.meal_type.clone(),
            goal_context: context.diet_goal.clone(),
        });
        &self.entries[0]
    }

    fn next_id(&mut self) -> i64 {
        let now_ms = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        self.last_id = now_ms.max(self.last_id + 1);
        self.last_id
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanLogEntry> {
        self.entries.iter()
    }

    pub fn get(&self, id: i64) -> Option<&ScanLogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn latest(&self) -> Option<&ScanLogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn daily_total(&self) -> i64 {
        compute_daily_total(self.entries.iter())
    }
}

/// Sum of calories over entries; unreadable values count as 0.
pub fn compute_daily_total<'a>(entries: impl IntoIterator<Item = &'a ScanLogEntry>) -> i64 {
    entries.into_iter().fold(0i64, |acc, entry| {
        let calories = Quantity::of(entry.record.calories.as_deref()).amount_or_zero();
        acc.saturating_add(calories)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, calories: &str) -> NutritionRecord {
        NutritionRecord {
            food_name: Some(name.into()),
            calories: Some(calories.into()),
            ..NutritionRecord::default()
        }
    }

    #[test]
    fn eleventh_append_evicts_the_oldest() {
        let mut log = ScanLog::new();
        let ctx = AnalysisContext::default();
        for i in 1..=11 {
            log.append(record(&format!("food-{i}"), "100 kcal"), None, &ctx);
        }

        assert_eq!(log.len(), 10);
        assert_eq!(log.latest().unwrap().record.food_name.as_deref(), Some("food-11"));
        assert!(log.iter().all(|e| e.record.food_name.as_deref() != Some("food-1")));
        assert_eq!(log.iter().last().unwrap().record.food_name.as_deref(), Some("food-2"));
    }

    #[test]
    fn ids_strictly_increase() {
        let mut log = ScanLog::new();
        let ctx = AnalysisContext::default();
        let first = log.append(record("a", "1"), None, &ctx).id;
        let second = log.append(record("b", "1"), None, &ctx).id;
        let third = log.append(record("c", "1"), None, &ctx).id;
        assert!(first < second && second < third);
        assert!(log.get(second).is_some());
    }

    #[test]
    fn daily_total_ignores_unparsable_calories() {
        let mut log = ScanLog::new();
        let ctx = AnalysisContext::default();
        log.append(record("a", "250 kcal"), None, &ctx);
        log.append(record("b", "not a number"), None, &ctx);
        log.append(record("c", "100kcal"), None, &ctx);
        log.append(NutritionRecord::default(), None, &ctx);
        assert_eq!(log.daily_total(), 350);
    }

    #[test]
    fn entry_snapshots_context() {
        let mut log = ScanLog::new();
        let ctx = AnalysisContext {
            meal_type: "Dinner".into(),
            diet_goal: "Keto / Low Carb".into(),
        };
        let entry = log
            .append(record("Pizza Slice", "285 kcal"), Some("data:image/jpeg;base64,AA==".into()), &ctx)
            .clone();
        assert_eq!(entry.meal_context, "Dinner");
        assert_eq!(entry.goal_context, "Keto / Low Carb");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["foodName"], "Pizza Slice");
        assert_eq!(json["mealContext"], "Dinner");
        assert_eq!(json["goalContext"], "Keto / Low Carb");
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut log = ScanLog::with_capacity(3);
        let ctx = AnalysisContext::default();
        for i in 0..50 {
            log.append(record(&i.to_string(), "1"), None, &ctx);
            assert!(log.len() <= 3);
        }
        assert_eq!(log.len(), 3);
    }
}
