//! Dashboard UI Module
//!
//! Single-screen probe window: profile selector, recognition triggers, the
//! status label and the two image views.

pub mod app;
pub mod components;
pub mod theme;

pub use app::run_dashboard;
