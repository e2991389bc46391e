//! trackdesk library
//!
//! Core of a single-user desktop habit/task tracker: CRUD over locally
//! persisted JSON collections plus the derived-statistics engine
//! (streaks, goal progress, analytics) built on top of them.

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod services;
pub mod storage;
