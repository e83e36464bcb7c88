//! periodiza - cycle planner for youth volleyball classes
//!
//! Generates mesocycle plans per age band, keeps coach edits apart from
//! generated weeks, and watches training load.

pub mod age_band;
pub mod db;
pub mod planner;
pub mod templates;

pub use age_band::resolve_plan_band;
pub use db::{ClassGroup, ClassPlan, Database, PlanStore, SessionLog};
