//! Storage layer
//!
//! Whole-collection JSON persistence.

mod json_store;

pub use json_store::JsonStore;
