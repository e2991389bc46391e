//! Streak and history calculation
//!
//! Pure functions over a habit's check-in list. The reference date is
//! always an explicit parameter so "today" never leaks in implicitly;
//! callers pass the current date (or any date they want the answer as of).

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;

use crate::data::{CheckIn, Habit};

/// One day of a habit's recent history
#[derive(Debug, Clone, Serialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u32>,
}

/// Length of the consecutive run of checked days ending at `as_of`.
///
/// An unchecked `as_of` yields 0 even when an unbroken run ends the day
/// before; query with `as_of` = yesterday to see that run.
pub fn streak(check_ins: &[CheckIn], as_of: NaiveDate) -> u32 {
    let checked: HashSet<NaiveDate> = check_ins.iter().map(|c| c.date).collect();

    let mut run = 0;
    let mut day = as_of;
    while checked.contains(&day) {
        run += 1;
        match day.checked_sub_days(Days::new(1)) {
            Some(prev) => day = prev,
            None => break,
        }
    }
    run
}

/// The habit's last `window_days` calendar days ending at `as_of`,
/// oldest first. Always exactly `window_days` entries, regardless of how
/// young the habit is.
pub fn recent_history(habit: &Habit, window_days: u32, as_of: NaiveDate) -> Vec<DayRecord> {
    (0..window_days)
        .rev()
        .filter_map(|offset| as_of.checked_sub_days(Days::new(offset as u64)))
        .map(|date| {
            let check_in = habit.check_ins.iter().find(|c| c.date == date);
            DayRecord {
                date,
                checked: check_in.is_some(),
                time_spent: check_in.and_then(|c| c.time_spent),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn check_ins(dates: &[&str]) -> Vec<CheckIn> {
        dates.iter().map(|d| CheckIn::new(date(d))).collect()
    }

    fn habit_with(dates: &[&str]) -> Habit {
        Habit {
            id: 1,
            title: "Run".to_string(),
            description: String::new(),
            priority: Default::default(),
            frequency: Default::default(),
            check_ins: check_ins(dates),
            track_time: false,
            goal_id: None,
            created_at: "2024-01-01T08:00:00".parse::<NaiveDateTime>().unwrap(),
        }
    }

    #[test]
    fn test_streak_empty_is_zero() {
        assert_eq!(streak(&[], date("2024-06-10")), 0);
    }

    #[test]
    fn test_streak_counts_consecutive_run() {
        let ins = check_ins(&["2024-06-08", "2024-06-09", "2024-06-10"]);
        assert_eq!(streak(&ins, date("2024-06-10")), 3);
    }

    #[test]
    fn test_streak_unchecked_as_of_is_zero() {
        // Run ends the day before the reference date.
        let ins = check_ins(&["2024-06-07", "2024-06-08", "2024-06-09"]);
        assert_eq!(streak(&ins, date("2024-06-10")), 0);
        assert_eq!(streak(&ins, date("2024-06-09")), 3);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let ins = check_ins(&["2024-06-05", "2024-06-07", "2024-06-08"]);
        assert_eq!(streak(&ins, date("2024-06-08")), 2);
    }

    #[test]
    fn test_streak_ignores_future_check_ins() {
        let ins = check_ins(&["2024-06-09", "2024-06-10", "2024-06-11"]);
        assert_eq!(streak(&ins, date("2024-06-10")), 2);
    }

    #[test]
    fn test_history_fixed_window_oldest_first() {
        let habit = habit_with(&["2024-06-01"]);
        let history = recent_history(&habit, 7, date("2024-06-01"));

        assert_eq!(history.len(), 7);
        assert_eq!(history[0].date, date("2024-05-26"));
        assert_eq!(history[6].date, date("2024-06-01"));
        assert!(history[6].checked);
        assert_eq!(history.iter().filter(|d| d.checked).count(), 1);
    }

    #[test]
    fn test_history_carries_time_spent() {
        let mut habit = habit_with(&["2024-06-01"]);
        habit.check_ins[0].time_spent = Some(25);

        let history = recent_history(&habit, 3, date("2024-06-02"));
        assert_eq!(history[1].time_spent, Some(25));
        assert_eq!(history[2].time_spent, None);
    }
}
