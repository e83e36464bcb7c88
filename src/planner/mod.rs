//! Planner module - periodization engine for a class's mesocycle
//!
//! Features:
//! - Phase classification and RPE targets per week
//! - Deterministic plan generation from age band and base templates
//! - AUTO/MANUAL provenance with regeneration modes
//! - Acute:chronic workload ratio and load warnings
//! - Weekday session layout

pub mod cycle;
pub mod generator;
pub mod phase;
pub mod schedule;
pub mod workload;

pub use cycle::{RegenerateMode, RegenerationReport, regenerate_cycle};
pub use generator::{CycleParams, PlanParams, WeekPlan, build_class_plan, build_week_plans, to_class_plans};
pub use phase::{Phase, phase_for_week};
pub use schedule::{ScheduleDay, week_schedule};
pub use workload::{AcwrReading, LoadStatus, WorkloadReport, compute_acwr};
