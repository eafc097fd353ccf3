//! BrightStone Finance: a terminal dashboard for AI-generated financial
//! analysis, with Quixy as the conversational analyst.

pub mod ai;
pub mod charts;
pub mod config;
pub mod models;
pub mod store;
pub mod ui;
