//! Services layer
//!
//! High-level business logic built on the repository.

pub mod analytics;
pub mod goals;
pub mod habits;
pub mod journal;
pub mod streaks;
pub mod tasks;

pub use analytics::AnalyticsService;
pub use goals::GoalService;
pub use habits::HabitService;
pub use journal::JournalService;
pub use tasks::TaskService;
