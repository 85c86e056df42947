//! Anonymous, local-only drawing streaks.
//!
//! A streak counts visits that follow each other within 24 hours. Nothing
//! leaves the device: the record, a 30-day visit history and the reached
//! milestones all live in the key-value store.

use crate::clock::Clock;
use crate::storage::{
    DAILY_HISTORY_KEY, KeyValueStore, MILESTONES_KEY, STREAK_KEY, load_json, save_json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

const DAY_MS: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const HISTORY_DAYS: i64 = 30;
pub const MILESTONES: [u32; 6] = [3, 7, 14, 30, 60, 100];

/// Persisted streak record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreakStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_visit_ms: Option<f64>,
    pub total_visits: u32,
    pub streak_start_ms: Option<f64>,
}

pub struct StreakTracker {
    clock: Rc<dyn Clock>,
    store: Rc<dyn KeyValueStore>,
    stats: StreakStats,
}

impl StreakTracker {
    /// Load the stored streak, expiring it if the last visit is a day old.
    pub fn load(clock: Rc<dyn Clock>, store: Rc<dyn KeyValueStore>) -> Self {
        let stats = load_json::<StreakStats>(store.as_ref(), STREAK_KEY).unwrap_or_default();
        let mut tracker = Self {
            clock,
            store,
            stats,
        };
        tracker.expire_if_stale();
        tracker
    }

    pub fn stats(&self) -> &StreakStats {
        &self.stats
    }

    fn hours_since_last_visit(&self, now: f64) -> Option<f64> {
        self.stats.last_visit_ms.map(|last| (now - last) / DAY_MS * 24.0)
    }

    fn expire_if_stale(&mut self) {
        let now = self.clock.now_ms();
        if let Some(hours) = self.hours_since_last_visit(now)
            && hours >= 24.0
            && self.stats.current_streak > 0
        {
            log::debug!("streak expired after {hours:.1}h");
            self.stats.current_streak = 0;
            self.stats.streak_start_ms = None;
            self.persist();
        }
    }

    /// Count a visit. Returns the milestone reached by this visit, if any.
    pub fn record_visit(&mut self) -> Option<u32> {
        let now = self.clock.now_ms();
        let stale = self.hours_since_last_visit(now).is_none_or(|h| h >= 24.0);

        if stale || self.stats.current_streak == 0 {
            self.stats.current_streak = 1;
            self.stats.streak_start_ms = Some(now);
        } else {
            self.stats.current_streak += 1;
        }
        self.stats.total_visits += 1;
        self.stats.longest_streak = self.stats.longest_streak.max(self.stats.current_streak);
        self.stats.last_visit_ms = Some(now);
        self.persist();

        self.record_day(now);

        let reached = MILESTONES
            .iter()
            .copied()
            .find(|m| *m == self.stats.current_streak);
        if let Some(milestone) = reached {
            self.record_milestone(milestone);
        }
        reached
    }

    /// Zero the current streak, keeping totals and the longest streak.
    pub fn reset(&mut self) {
        self.stats.current_streak = 0;
        self.stats.streak_start_ms = None;
        self.persist();
    }

    /// Days (`YYYY-MM-DD`, UTC) with at least one visit in the last 30 days.
    pub fn history(&self) -> Vec<String> {
        load_json::<BTreeMap<String, bool>>(self.store.as_ref(), DAILY_HISTORY_KEY)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(day, seen)| seen.then_some(day))
            .collect()
    }

    pub fn milestones(&self) -> Vec<u32> {
        load_json(self.store.as_ref(), MILESTONES_KEY).unwrap_or_default()
    }

    fn persist(&self) {
        save_json(self.store.as_ref(), STREAK_KEY, &self.stats);
    }

    fn record_day(&self, now: f64) {
        let Some(today) = utc_datetime(now) else {
            return;
        };
        let cutoff = (today - Duration::days(HISTORY_DAYS)).format("%Y-%m-%d").to_string();

        let mut history: BTreeMap<String, bool> =
            load_json(self.store.as_ref(), DAILY_HISTORY_KEY).unwrap_or_default();
        history.insert(today.format("%Y-%m-%d").to_string(), true);
        history.retain(|day, _| day.as_str() >= cutoff.as_str());
        save_json(self.store.as_ref(), DAILY_HISTORY_KEY, &history);
    }

    fn record_milestone(&self, milestone: u32) {
        let mut reached: Vec<u32> = self.milestones();
        if !reached.contains(&milestone) {
            reached.push(milestone);
            save_json(self.store.as_ref(), MILESTONES_KEY, &reached);
        }
    }
}

fn utc_datetime(epoch_ms: f64) -> Option<DateTime<Utc>> {
    if !epoch_ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(epoch_ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use pretty_assertions::assert_eq;

    const HOUR: f64 = 60.0 * 60.0 * 1000.0;
    // 2026-03-01T12:00:00Z
    const T0: f64 = 1_772_366_400_000.0;

    fn setup() -> (Rc<ManualClock>, Rc<MemoryStore>) {
        (Rc::new(ManualClock::new(T0)), Rc::new(MemoryStore::new()))
    }

    #[test]
    fn first_visit_starts_streak() {
        let (clock, store) = setup();
        let mut tracker = StreakTracker::load(clock.clone(), store.clone());
        tracker.record_visit();
        assert_eq!(tracker.stats().current_streak, 1);
        assert_eq!(tracker.stats().total_visits, 1);
        assert_eq!(tracker.stats().streak_start_ms, Some(T0));
        assert_eq!(tracker.history(), vec!["2026-03-01".to_string()]);
    }

    #[test]
    fn visits_within_a_day_extend_streak() {
        let (clock, store) = setup();
        let mut tracker = StreakTracker::load(clock.clone(), store.clone());
        tracker.record_visit();
        clock.advance(20.0 * HOUR);
        tracker.record_visit();
        clock.advance(20.0 * HOUR);
        let milestone = tracker.record_visit();
        assert_eq!(tracker.stats().current_streak, 3);
        assert_eq!(tracker.stats().longest_streak, 3);
        assert_eq!(milestone, Some(3));
        assert_eq!(tracker.milestones(), vec![3]);
    }

    #[test]
    fn gap_of_a_day_restarts_on_load() {
        let (clock, store) = setup();
        {
            let mut tracker = StreakTracker::load(clock.clone(), store.clone());
            tracker.record_visit();
            clock.advance(10.0 * HOUR);
            tracker.record_visit();
        }
        clock.advance(25.0 * HOUR);
        let mut tracker = StreakTracker::load(clock.clone(), store.clone());
        assert_eq!(tracker.stats().current_streak, 0);
        assert_eq!(tracker.stats().longest_streak, 2);

        tracker.record_visit();
        assert_eq!(tracker.stats().current_streak, 1);
        assert_eq!(tracker.stats().total_visits, 3);
    }

    #[test]
    fn history_keeps_thirty_days() {
        let (clock, store) = setup();
        let mut tracker = StreakTracker::load(clock.clone(), store.clone());
        tracker.record_visit();
        clock.advance(40.0 * 24.0 * HOUR);
        tracker.record_visit();
        assert_eq!(tracker.history(), vec!["2026-04-10".to_string()]);
    }

    #[test]
    fn reset_keeps_totals() {
        let (clock, store) = setup();
        let mut tracker = StreakTracker::load(clock, store);
        tracker.record_visit();
        tracker.reset();
        assert_eq!(tracker.stats().current_streak, 0);
        assert_eq!(tracker.stats().total_visits, 1);
        assert_eq!(tracker.stats().longest_streak, 1);
    }
}
