//! Entity models
//!
//! Plain serializable records for tasks, habits, goals, and journal
//! entries, matching the on-disk JSON document shape. Deserialization is
//! lenient where old documents omitted fields; serialization always writes
//! the current shape, so legacy records are upgraded on the next save.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Priority level, ordered from most to least urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Now,
    Next,
    Later,
}

impl Priority {
    /// All levels in display order
    pub const ALL: [Priority; 3] = [Priority::Now, Priority::Next, Priority::Later];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Now => "Now",
            Priority::Next => "Next",
            Priority::Later => "Later",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Next
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Now" | "now" => Ok(Priority::Now),
            "Next" | "next" => Ok(Priority::Next),
            "Later" | "later" => Ok(Priority::Later),
            other => Err(AppError::Validation(format!(
                "Unknown priority '{}', expected Now, Next, or Later",
                other
            ))),
        }
    }
}

/// How often a habit is meant to be performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Custom,
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Daily
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Custom => "custom",
        };
        f.write_str(s)
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "custom" => Ok(Frequency::Custom),
            other => Err(AppError::Validation(format!(
                "Unknown frequency '{}', expected daily, weekly, or custom",
                other
            ))),
        }
    }
}

/// One habit check-in: the habit was performed on `date`, optionally with
/// minutes spent.
///
/// Old documents stored check-ins as bare ISO date strings. Both forms are
/// accepted on read; writing always produces the structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CheckInForm")]
pub struct CheckIn {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<u32>,
}

impl CheckIn {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            time_spent: None,
        }
    }
}

/// Accepts both on-disk check-in shapes
#[derive(Deserialize)]
#[serde(untagged)]
enum CheckInForm {
    Record {
        date: NaiveDate,
        #[serde(default)]
        time_spent: Option<u32>,
    },
    Legacy(NaiveDate),
}

impl From<CheckInForm> for CheckIn {
    fn from(form: CheckInForm) -> Self {
        match form {
            CheckInForm::Record { date, time_spent } => CheckIn { date, time_spent },
            CheckInForm::Legacy(date) => CheckIn {
                date,
                time_spent: None,
            },
        }
    }
}

/// A one-off task with a terminal completed state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub goal_id: Option<u64>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
}

/// A recurring habit tracked by daily check-ins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub check_ins: Vec<CheckIn>,
    #[serde(default)]
    pub track_time: bool,
    #[serde(default)]
    pub goal_id: Option<u64>,
    pub created_at: NaiveDateTime,
}

impl Habit {
    /// Whether the habit has a check-in for the given date
    pub fn checked_on(&self, date: NaiveDate) -> bool {
        self.check_ins.iter().any(|c| c.date == date)
    }
}

/// A grouping objective that tasks and habits link to via `goal_id`.
/// Membership is inferred by scanning the entity collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub created_at: NaiveDateTime,
}

/// An append-only journal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub content: String,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub continued: bool,
    pub created_at: NaiveDateTime,
}

// ===== Creation Requests =====

/// Fields for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub goal_id: Option<u64>,
}

/// Fields for creating a habit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHabit {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub goal_id: Option<u64>,
    #[serde(default)]
    pub track_time: bool,
}

/// Fields for creating a goal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

// ===== Partial Updates =====
//
// A `None` field means "leave untouched". Fields that are themselves
// optional on the entity use a nested Option so "clear the value" and
// "leave untouched" stay distinct.

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub goal_id: Option<Option<u64>>,
}

#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub frequency: Option<Frequency>,
    pub goal_id: Option<Option<u64>>,
    pub track_time: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

// ===== Filters =====
//
// AND-combined exact-match criteria; `None` means the criterion is not
// applied, so `completed: Some(false)` is distinct from "no filter".

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub due_date: Option<NaiveDate>,
    pub goal_id: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct HabitFilter {
    pub priority: Option<Priority>,
    pub frequency: Option<Frequency>,
    pub goal_id: Option<u64>,
}

/// Old task documents stored missing due dates as empty strings
fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_in_legacy_form() {
        let check_in: CheckIn = serde_json::from_str(r#""2024-01-01""#).unwrap();
        assert_eq!(check_in.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(check_in.time_spent, None);
    }

    #[test]
    fn test_check_in_record_form() {
        let check_in: CheckIn =
            serde_json::from_str(r#"{"date": "2024-01-01", "time_spent": 25}"#).unwrap();
        assert_eq!(check_in.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(check_in.time_spent, Some(25));
    }

    #[test]
    fn test_check_in_forms_equivalent() {
        let legacy: CheckIn = serde_json::from_str(r#""2024-01-01""#).unwrap();
        let record: CheckIn =
            serde_json::from_str(r#"{"date": "2024-01-01", "time_spent": null}"#).unwrap();
        assert_eq!(legacy, record);
    }

    #[test]
    fn test_check_in_upgrades_on_write() {
        let legacy: CheckIn = serde_json::from_str(r#""2024-01-01""#).unwrap();
        let written = serde_json::to_string(&legacy).unwrap();
        assert_eq!(written, r#"{"date":"2024-01-01"}"#);
    }

    #[test]
    fn test_task_empty_due_date_reads_as_none() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": 1,
                "title": "Old task",
                "description": "",
                "priority": "Next",
                "due_date": "",
                "completed": false,
                "created_at": "2024-12-01T10:00:00",
                "completed_at": null
            }"#,
        )
        .unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.goal_id, None);
    }

    #[test]
    fn test_habit_missing_fields_default() {
        let habit: Habit = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "Read",
                "priority": "Now",
                "created_at": "2024-12-01T10:00:00"
            }"#,
        )
        .unwrap();
        assert!(habit.check_ins.is_empty());
        assert!(!habit.track_time);
        assert_eq!(habit.frequency, Frequency::Daily);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("Now".parse::<Priority>().unwrap(), Priority::Now);
        assert_eq!("later".parse::<Priority>().unwrap(), Priority::Later);
        assert!("Urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Now < Priority::Next);
        assert!(Priority::Next < Priority::Later);
    }
}
