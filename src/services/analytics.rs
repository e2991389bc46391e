//! Analytics aggregation
//!
//! Read-only summaries over the full task, habit, and goal collections.
//! Everything here is recomputed from scratch on every call; collections
//! are small enough that caching would only add staleness bugs. Every
//! ratio guards the zero-denominator case.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;

use super::goals::round2;
use crate::config::{DISTRIBUTION_TOP_N, DUE_SOON_DAYS, MIN_GOAL_SAMPLE};
use crate::data::{Goal, Habit, Priority, Repository, Task};
use crate::error::AppError;

/// Four-field completion summary used by every grouping
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompletionSummary {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub completion_percentage: f64,
}

impl CompletionSummary {
    fn from_counts(total: usize, completed: usize) -> Self {
        let percentage = if total > 0 {
            round2(completed as f64 / total as f64 * 100.0)
        } else {
            0.0
        };
        Self {
            total,
            completed,
            incomplete: total - completed,
            completion_percentage: percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrioritySummary {
    pub priority: Priority,
    #[serde(flatten)]
    pub summary: CompletionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalSummary {
    pub goal_id: u64,
    pub goal_name: String,
    #[serde(flatten)]
    pub summary: CompletionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ByGoal {
    pub goals: Vec<GoalSummary>,
    pub tasks_with_goals: usize,
    pub tasks_without_goals: usize,
    pub total_goals: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeStats {
    pub overdue_count: usize,
    pub due_soon_count: usize,
    pub completed_today: usize,
    pub created_today: usize,
    pub avg_completion_days: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalShare {
    pub goal_name: String,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Productivity {
    pub most_productive_goal: Option<String>,
    pub most_productive_completion_rate: f64,
    pub goal_with_most_tasks: Option<String>,
    pub max_tasks_in_goal: usize,
    pub goal_distribution: Vec<GoalShare>,
}

/// Full analytics document returned to the UI collaborator
#[derive(Debug, Clone, Serialize)]
pub struct Analytics {
    pub overall: CompletionSummary,
    pub by_priority: Vec<PrioritySummary>,
    pub by_goal: ByGoal,
    pub time_stats: TimeStats,
    pub productivity: Productivity,
}

// ===== Time analytics (habit variant) =====

#[derive(Debug, Clone, Serialize)]
pub struct HabitMinutes {
    pub habit_id: u64,
    pub title: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalMinutes {
    pub goal_name: String,
    pub minutes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSummary {
    pub total_minutes: u64,
    pub by_habit: Vec<HabitMinutes>,
    pub by_goal: Vec<GoalMinutes>,
}

/// Granularity of the time-tracking trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendBucket {
    Day,
    Week,
    Month,
}

impl fmt::Display for TrendBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrendBucket::Day => "day",
            TrendBucket::Week => "week",
            TrendBucket::Month => "month",
        };
        f.write_str(s)
    }
}

impl FromStr for TrendBucket {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(TrendBucket::Day),
            "week" => Ok(TrendBucket::Week),
            "month" => Ok(TrendBucket::Month),
            other => Err(AppError::Validation(format!(
                "Unknown trend bucket '{}', expected day, week, or month",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub bucket_start: NaiveDate,
    pub minutes: u64,
}

/// Service computing analytics over the repository's collections
#[derive(Clone)]
pub struct AnalyticsService {
    repo: Repository,
}

impl AnalyticsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Full analytics document as of `now`
    pub async fn analytics(&self, now: NaiveDateTime) -> Analytics {
        let tasks = self.repo.list_tasks().await;
        let goals = self.repo.list_goals().await;
        compute_analytics(&tasks, &goals, now)
    }

    /// Total tracked minutes broken down by habit and by goal
    pub async fn time_summary(&self) -> TimeSummary {
        let habits = self.repo.list_habits().await;
        let goals = self.repo.list_goals().await;
        compute_time_summary(&habits, &goals)
    }

    /// Tracked-minutes trend over the trailing `days` ending at `as_of`
    pub async fn time_trend(
        &self,
        bucket: TrendBucket,
        days: u32,
        as_of: NaiveDate,
    ) -> Vec<TrendPoint> {
        let habits = self.repo.list_habits().await;
        compute_time_trend(&habits, bucket, days, as_of)
    }
}

/// Compute the full analytics document from loaded collections
pub fn compute_analytics(tasks: &[Task], goals: &[Goal], now: NaiveDateTime) -> Analytics {
    let overall = overall_summary(tasks);
    let goal_summaries = goal_summaries(tasks, goals);

    Analytics {
        productivity: productivity(&goal_summaries, tasks.len()),
        by_priority: priority_summaries(tasks),
        by_goal: by_goal(tasks, goals, goal_summaries),
        time_stats: time_stats(tasks, now),
        overall,
    }
}

pub fn overall_summary(tasks: &[Task]) -> CompletionSummary {
    let completed = tasks.iter().filter(|t| t.completed).count();
    CompletionSummary::from_counts(tasks.len(), completed)
}

/// One summary per priority level, always covering all three levels so
/// the per-level totals sum to the overall total.
pub fn priority_summaries(tasks: &[Task]) -> Vec<PrioritySummary> {
    Priority::ALL
        .iter()
        .map(|&priority| {
            let subset: Vec<&Task> = tasks.iter().filter(|t| t.priority == priority).collect();
            let completed = subset.iter().filter(|t| t.completed).count();
            PrioritySummary {
                priority,
                summary: CompletionSummary::from_counts(subset.len(), completed),
            }
        })
        .collect()
}

fn goal_summaries(tasks: &[Task], goals: &[Goal]) -> Vec<GoalSummary> {
    goals
        .iter()
        .map(|goal| {
            let subset: Vec<&Task> = tasks.iter().filter(|t| t.goal_id == Some(goal.id)).collect();
            let completed = subset.iter().filter(|t| t.completed).count();
            GoalSummary {
                goal_id: goal.id,
                goal_name: goal.title.clone(),
                summary: CompletionSummary::from_counts(subset.len(), completed),
            }
        })
        .collect()
}

fn by_goal(tasks: &[Task], goals: &[Goal], summaries: Vec<GoalSummary>) -> ByGoal {
    let tasks_with_goals = tasks.iter().filter(|t| t.goal_id.is_some()).count();
    ByGoal {
        goals: summaries,
        tasks_with_goals,
        tasks_without_goals: tasks.len() - tasks_with_goals,
        total_goals: goals.len(),
    }
}

pub fn time_stats(tasks: &[Task], now: NaiveDateTime) -> TimeStats {
    let today = now.date();
    let mut overdue_count = 0;
    let mut due_soon_count = 0;
    let mut completed_today = 0;
    let mut created_today = 0;
    let mut completion_spans: Vec<i64> = Vec::new();

    for task in tasks {
        if let Some(due) = task.due_date {
            if !task.completed {
                if due < today {
                    overdue_count += 1;
                }
                let days_until = (due - today).num_days();
                if (0..=DUE_SOON_DAYS).contains(&days_until) {
                    due_soon_count += 1;
                }
            }
        }

        if let Some(completed_at) = task.completed_at {
            if completed_at.date() == today {
                completed_today += 1;
            }
            let span = (completed_at.date() - task.created_at.date()).num_days();
            if span >= 0 {
                completion_spans.push(span);
            }
        }

        if task.created_at.date() == today {
            created_today += 1;
        }
    }

    let avg_completion_days = if completion_spans.is_empty() {
        0.0
    } else {
        round1(completion_spans.iter().sum::<i64>() as f64 / completion_spans.len() as f64)
    };

    TimeStats {
        overdue_count,
        due_soon_count,
        completed_today,
        created_today,
        avg_completion_days,
    }
}

fn productivity(summaries: &[GoalSummary], total_tasks: usize) -> Productivity {
    // Highest completion rate, but only among goals with a meaningful
    // sample size. First match wins ties.
    let most_productive = summaries
        .iter()
        .filter(|g| g.summary.total >= MIN_GOAL_SAMPLE)
        .fold(None::<&GoalSummary>, |best, g| match best {
            Some(b) if g.summary.completion_percentage <= b.summary.completion_percentage => {
                Some(b)
            }
            _ if g.summary.completion_percentage > 0.0 => Some(g),
            _ => best,
        });

    let busiest = summaries
        .iter()
        .filter(|g| g.summary.total > 0)
        .fold(None::<&GoalSummary>, |best, g| match best {
            Some(b) if g.summary.total <= b.summary.total => Some(b),
            _ => Some(g),
        });

    let mut goal_distribution: Vec<GoalShare> = summaries
        .iter()
        .map(|g| GoalShare {
            goal_name: g.goal_name.clone(),
            share: if total_tasks > 0 {
                round2(g.summary.total as f64 / total_tasks as f64 * 100.0)
            } else {
                0.0
            },
        })
        .collect();
    goal_distribution.sort_by(|a, b| b.share.total_cmp(&a.share));
    goal_distribution.truncate(DISTRIBUTION_TOP_N);

    Productivity {
        most_productive_goal: most_productive.map(|g| g.goal_name.clone()),
        most_productive_completion_rate: most_productive
            .map(|g| g.summary.completion_percentage)
            .unwrap_or(0.0),
        goal_with_most_tasks: busiest.map(|g| g.goal_name.clone()),
        max_tasks_in_goal: busiest.map(|g| g.summary.total).unwrap_or(0),
        goal_distribution,
    }
}

pub fn compute_time_summary(habits: &[Habit], goals: &[Goal]) -> TimeSummary {
    let mut total_minutes = 0u64;
    let mut by_habit = Vec::new();
    let mut goal_minutes: BTreeMap<Option<u64>, u64> = BTreeMap::new();

    for habit in habits {
        let minutes: u64 = habit
            .check_ins
            .iter()
            .filter_map(|c| c.time_spent)
            .map(u64::from)
            .sum();
        if minutes == 0 {
            continue;
        }

        total_minutes += minutes;
        by_habit.push(HabitMinutes {
            habit_id: habit.id,
            title: habit.title.clone(),
            minutes,
        });
        *goal_minutes.entry(habit.goal_id).or_default() += minutes;
    }

    let by_goal = goal_minutes
        .into_iter()
        .map(|(goal_id, minutes)| GoalMinutes {
            goal_name: goal_id
                .and_then(|id| goals.iter().find(|g| g.id == id))
                .map(|g| g.title.clone())
                .unwrap_or_else(|| "Misc".to_string()),
            minutes,
        })
        .collect();

    TimeSummary {
        total_minutes,
        by_habit,
        by_goal,
    }
}

/// Zero-filled trend series of tracked minutes over the trailing `days`
/// calendar days ending at `as_of`, grouped into the requested buckets.
pub fn compute_time_trend(
    habits: &[Habit],
    bucket: TrendBucket,
    days: u32,
    as_of: NaiveDate,
) -> Vec<TrendPoint> {
    if days == 0 {
        return Vec::new();
    }

    let period_start = as_of
        .checked_sub_days(Days::new(u64::from(days) - 1))
        .unwrap_or(as_of);

    let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut start = bucket_start(bucket, period_start);
    while start <= as_of {
        totals.insert(start, 0);
        start = next_bucket(bucket, start);
    }

    for habit in habits {
        for check_in in &habit.check_ins {
            let Some(minutes) = check_in.time_spent else {
                continue;
            };
            if check_in.date < period_start || check_in.date > as_of {
                continue;
            }
            *totals.entry(bucket_start(bucket, check_in.date)).or_default() +=
                u64::from(minutes);
        }
    }

    totals
        .into_iter()
        .map(|(bucket_start, minutes)| TrendPoint {
            bucket_start,
            minutes,
        })
        .collect()
}

fn bucket_start(bucket: TrendBucket, date: NaiveDate) -> NaiveDate {
    match bucket {
        TrendBucket::Day => date,
        TrendBucket::Week => date.week(Weekday::Mon).first_day(),
        TrendBucket::Month => date.with_day(1).unwrap_or(date),
    }
}

fn next_bucket(bucket: TrendBucket, start: NaiveDate) -> NaiveDate {
    match bucket {
        TrendBucket::Day => start + chrono::Duration::days(1),
        TrendBucket::Week => start + chrono::Duration::days(7),
        TrendBucket::Month => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(start)
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CheckIn, Frequency};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn datetime(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    fn task(id: u64, priority: Priority, goal_id: Option<u64>, completed: bool) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: String::new(),
            priority,
            due_date: None,
            goal_id,
            completed,
            created_at: datetime("2024-06-01T09:00:00"),
            completed_at: completed.then(|| datetime("2024-06-03T17:00:00")),
        }
    }

    fn goal(id: u64, title: &str) -> Goal {
        Goal {
            id,
            title: title.to_string(),
            description: String::new(),
            created_at: datetime("2024-01-01T09:00:00"),
        }
    }

    fn habit(id: u64, goal_id: Option<u64>, check_ins: Vec<CheckIn>) -> Habit {
        Habit {
            id,
            title: format!("Habit {}", id),
            description: String::new(),
            priority: Priority::Next,
            frequency: Frequency::Daily,
            check_ins,
            track_time: true,
            goal_id,
            created_at: datetime("2024-01-01T09:00:00"),
        }
    }

    fn timed(date_str: &str, minutes: u32) -> CheckIn {
        CheckIn {
            date: date(date_str),
            time_spent: Some(minutes),
        }
    }

    #[test]
    fn test_overall_empty_collection() {
        let summary = overall_summary(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_percentage, 0.0);
        assert!(summary.completion_percentage.is_finite());
    }

    #[test]
    fn test_overall_percentage_rounded() {
        let tasks = vec![
            task(1, Priority::Now, None, true),
            task(2, Priority::Now, None, false),
            task(3, Priority::Now, None, false),
        ];
        let summary = overall_summary(&tasks);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.incomplete, 2);
        assert_eq!(summary.completion_percentage, 33.33);
    }

    #[test]
    fn test_priority_totals_sum_to_overall() {
        let tasks = vec![
            task(1, Priority::Now, None, true),
            task(2, Priority::Next, None, false),
            task(3, Priority::Next, None, true),
            task(4, Priority::Later, None, false),
        ];

        let by_priority = priority_summaries(&tasks);
        assert_eq!(by_priority.len(), 3);

        let sum: usize = by_priority.iter().map(|p| p.summary.total).sum();
        assert_eq!(sum, overall_summary(&tasks).total);
    }

    #[test]
    fn test_by_goal_counts_partition_tasks() {
        let goals = vec![goal(1, "Fitness"), goal(2, "Career")];
        let tasks = vec![
            task(1, Priority::Now, Some(1), true),
            task(2, Priority::Next, Some(2), false),
            task(3, Priority::Later, None, false),
        ];

        let analytics = compute_analytics(&tasks, &goals, datetime("2024-06-10T12:00:00"));
        assert_eq!(analytics.by_goal.tasks_with_goals, 2);
        assert_eq!(analytics.by_goal.tasks_without_goals, 1);
        assert_eq!(
            analytics.by_goal.tasks_with_goals + analytics.by_goal.tasks_without_goals,
            analytics.overall.total
        );
        assert_eq!(analytics.by_goal.total_goals, 2);
    }

    #[test]
    fn test_time_stats_windows() {
        let now = datetime("2024-06-10T12:00:00");
        let mut overdue = task(1, Priority::Now, None, false);
        overdue.due_date = Some(date("2024-06-01"));
        let mut due_today = task(2, Priority::Now, None, false);
        due_today.due_date = Some(date("2024-06-10"));
        let mut due_next_week = task(3, Priority::Now, None, false);
        due_next_week.due_date = Some(date("2024-06-17"));
        let mut far_future = task(4, Priority::Now, None, false);
        far_future.due_date = Some(date("2024-07-10"));
        // Overdue date but completed: counts in neither bucket.
        let mut done_late = task(5, Priority::Now, None, true);
        done_late.due_date = Some(date("2024-06-01"));

        let stats = time_stats(
            &[overdue, due_today, due_next_week, far_future, done_late],
            now,
        );
        assert_eq!(stats.overdue_count, 1);
        assert_eq!(stats.due_soon_count, 2);
    }

    #[test]
    fn test_time_stats_avg_completion_days() {
        // Created 2024-06-01, completed 2024-06-03: a 2-day span.
        let tasks = vec![task(1, Priority::Now, None, true)];
        let stats = time_stats(&tasks, datetime("2024-06-10T12:00:00"));
        assert_eq!(stats.avg_completion_days, 2.0);

        let stats = time_stats(&[], datetime("2024-06-10T12:00:00"));
        assert_eq!(stats.avg_completion_days, 0.0);
    }

    #[test]
    fn test_productivity_requires_sample_size() {
        let goals = vec![goal(1, "Tiny"), goal(2, "Big")];
        // Goal 1: one task, 100% complete, but below the sample floor.
        // Goal 2: three tasks, two complete.
        let tasks = vec![
            task(1, Priority::Now, Some(1), true),
            task(2, Priority::Now, Some(2), true),
            task(3, Priority::Now, Some(2), true),
            task(4, Priority::Now, Some(2), false),
        ];

        let analytics = compute_analytics(&tasks, &goals, datetime("2024-06-10T12:00:00"));
        assert_eq!(
            analytics.productivity.most_productive_goal,
            Some("Big".to_string())
        );
        assert_eq!(analytics.productivity.most_productive_completion_rate, 66.67);
        assert_eq!(
            analytics.productivity.goal_with_most_tasks,
            Some("Big".to_string())
        );
        assert_eq!(analytics.productivity.max_tasks_in_goal, 3);
    }

    #[test]
    fn test_productivity_empty_is_quiet() {
        let analytics = compute_analytics(&[], &[], datetime("2024-06-10T12:00:00"));
        assert_eq!(analytics.productivity.most_productive_goal, None);
        assert_eq!(analytics.productivity.most_productive_completion_rate, 0.0);
        assert_eq!(analytics.productivity.goal_with_most_tasks, None);
        assert!(analytics.productivity.goal_distribution.is_empty());
    }

    #[test]
    fn test_distribution_sorted_by_share() {
        let goals = vec![goal(1, "Small"), goal(2, "Large")];
        let tasks = vec![
            task(1, Priority::Now, Some(1), false),
            task(2, Priority::Now, Some(2), false),
            task(3, Priority::Now, Some(2), false),
            task(4, Priority::Now, Some(2), false),
        ];

        let analytics = compute_analytics(&tasks, &goals, datetime("2024-06-10T12:00:00"));
        let distribution = &analytics.productivity.goal_distribution;
        assert_eq!(distribution[0].goal_name, "Large");
        assert_eq!(distribution[0].share, 75.0);
        assert_eq!(distribution[1].share, 25.0);
    }

    #[test]
    fn test_time_summary_by_habit_and_goal() {
        let goals = vec![goal(1, "Fitness")];
        let habits = vec![
            habit(1, Some(1), vec![timed("2024-06-01", 30), timed("2024-06-02", 15)]),
            habit(2, None, vec![timed("2024-06-01", 20)]),
            // No tracked minutes: left out of the breakdown.
            habit(3, Some(1), vec![CheckIn::new(date("2024-06-01"))]),
        ];

        let summary = compute_time_summary(&habits, &goals);
        assert_eq!(summary.total_minutes, 65);
        assert_eq!(summary.by_habit.len(), 2);
        assert_eq!(summary.by_habit[0].minutes, 45);

        let fitness = summary
            .by_goal
            .iter()
            .find(|g| g.goal_name == "Fitness")
            .unwrap();
        assert_eq!(fitness.minutes, 45);
        let misc = summary.by_goal.iter().find(|g| g.goal_name == "Misc").unwrap();
        assert_eq!(misc.minutes, 20);
    }

    #[test]
    fn test_trend_daily_buckets_zero_filled() {
        let habits = vec![habit(1, None, vec![timed("2024-06-09", 30)])];

        let trend = compute_time_trend(&habits, TrendBucket::Day, 3, date("2024-06-10"));
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].bucket_start, date("2024-06-08"));
        assert_eq!(trend[0].minutes, 0);
        assert_eq!(trend[1].minutes, 30);
        assert_eq!(trend[2].minutes, 0);
    }

    #[test]
    fn test_trend_weekly_buckets_start_monday() {
        let habits = vec![habit(
            1,
            None,
            vec![timed("2024-06-04", 10), timed("2024-06-11", 20)],
        )];

        // 2024-06-10 is a Monday.
        let trend = compute_time_trend(&habits, TrendBucket::Week, 14, date("2024-06-11"));
        assert_eq!(trend.len(), 3);
        assert_eq!(trend[0].bucket_start, date("2024-05-27"));
        assert_eq!(trend[1].bucket_start, date("2024-06-03"));
        assert_eq!(trend[1].minutes, 10);
        assert_eq!(trend[2].bucket_start, date("2024-06-10"));
        assert_eq!(trend[2].minutes, 20);
    }

    #[test]
    fn test_trend_monthly_buckets_cross_year() {
        let habits = vec![habit(
            1,
            None,
            vec![timed("2023-12-20", 40), timed("2024-01-05", 5)],
        )];

        let trend = compute_time_trend(&habits, TrendBucket::Month, 30, date("2024-01-10"));
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].bucket_start, date("2023-12-01"));
        assert_eq!(trend[0].minutes, 40);
        assert_eq!(trend[1].bucket_start, date("2024-01-01"));
        assert_eq!(trend[1].minutes, 5);
    }

    #[test]
    fn test_trend_excludes_outside_period() {
        let habits = vec![habit(
            1,
            None,
            vec![timed("2024-06-01", 60), timed("2024-06-10", 10)],
        )];

        let trend = compute_time_trend(&habits, TrendBucket::Day, 3, date("2024-06-10"));
        let total: u64 = trend.iter().map(|p| p.minutes).sum();
        assert_eq!(total, 10);
    }
}
