//! Plan generation from age band, template and phase

use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::age_band::{PlanBand, resolve_plan_band};
use crate::db::{ClassGroup, ClassPlan, PlanSource};
use crate::templates::{MvLevel, Volume, band_template};
use super::phase::{Phase, phase_for_week};

/// Inputs for a single generated week
#[derive(Debug, Clone)]
pub struct PlanParams {
    pub class_id: i64,
    pub age_band: String,
    pub start_date: NaiveDate,
    pub week_number: u32,
    pub source: PlanSource,
    pub mv_level: Option<MvLevel>,
    pub cycle_length: u32,
}

/// Inputs for a whole mesocycle
#[derive(Debug, Clone)]
pub struct CycleParams {
    pub class_id: i64,
    pub age_band: String,
    pub start_date: NaiveDate,
    pub cycle_length: u32,
    pub mv_level: Option<MvLevel>,
}

impl CycleParams {
    /// Cycle parameters of a stored class.
    ///
    /// Without a class start date the cycle keeps the date its stored plans
    /// carry; `today` is only used for a class with no plans yet.
    pub fn from_class(class: &ClassGroup, stored: &[ClassPlan], today: NaiveDate) -> Result<Self> {
        let Some(class_id) = class.id else {
            bail!("Class '{}' has not been saved yet", class.name);
        };
        if class.cycle_length_weeks == 0 {
            bail!("Class '{}' has an empty cycle", class.name);
        }
        Ok(Self {
            class_id,
            age_band: class.age_band.clone(),
            start_date: resolve_start_date(class.cycle_start_date, stored, today),
            cycle_length: class.cycle_length_weeks,
            mv_level: class.mv_level,
        })
    }

    pub fn week(&self, week_number: u32, source: PlanSource) -> PlanParams {
        PlanParams {
            class_id: self.class_id,
            age_band: self.age_band.clone(),
            start_date: self.start_date,
            week_number,
            source,
            mv_level: self.mv_level,
            cycle_length: self.cycle_length,
        }
    }

    pub fn contains_week(&self, week_number: u32) -> bool {
        (1..=self.cycle_length).contains(&week_number)
    }
}

/// Start date: class setting, then the earliest stored plan's, then today
pub fn resolve_start_date(
    explicit: Option<NaiveDate>,
    stored: &[ClassPlan],
    today: NaiveDate,
) -> NaiveDate {
    explicit
        .or_else(|| stored.iter().map(|p| p.start_date).min())
        .unwrap_or(today)
}

/// Skill level: explicit override, then the band default
pub fn resolve_mv_level(explicit: Option<MvLevel>, band: PlanBand) -> MvLevel {
    explicit.unwrap_or_else(|| MvLevel::default_for_band(band))
}

/// Jump target: from the resolved skill level
pub fn resolve_jump_target(explicit: Option<MvLevel>, band: PlanBand) -> &'static str {
    resolve_mv_level(explicit, band).jump_target()
}

/// Build one week's plan
pub fn build_class_plan(params: &PlanParams) -> ClassPlan {
    let band = resolve_plan_band(&params.age_band);
    let template = band_template(band);
    let week = template.week(params.week_number);
    let phase = phase_for_week(params.week_number, params.cycle_length);
    let level = resolve_mv_level(params.mv_level, band);
    let now = Utc::now();

    ClassPlan {
        id: None,
        class_id: params.class_id,
        start_date: params.start_date,
        week_number: params.week_number,
        phase,
        theme: week.title.to_string(),
        technical_focus: week.focus.to_string(),
        physical_focus: template.physical_focus.to_string(),
        constraints: template.constraints.to_string(),
        mv_format: level.game_format().to_string(),
        warmup_profile: template.warmup_profile.to_string(),
        jump_target: resolve_jump_target(params.mv_level, band).to_string(),
        rpe_target: phase.rpe_target().to_string(),
        source: params.source,
        created_at: now,
        updated_at: now,
    }
}

/// Build the whole cycle as AUTO plans
pub fn to_class_plans(params: &CycleParams) -> Vec<ClassPlan> {
    (1..=params.cycle_length)
        .map(|week| build_class_plan(&params.week(week, PlanSource::Auto)))
        .collect()
}

/// Week containing `today`, clamped into the cycle
pub fn current_week_number(start_date: NaiveDate, today: NaiveDate, cycle_length: u32) -> u32 {
    let days = (today - start_date).num_days();
    if days < 0 {
        return 1;
    }
    let week = (days / 7 + 1).min(cycle_length.max(1) as i64);
    week as u32
}

/// A week as shown to the coach: stored plan or generated stand-in, plus volume
#[derive(Debug, Clone, Serialize)]
pub struct WeekPlan {
    pub week_number: u32,
    pub phase: Phase,
    pub volume: Volume,
    /// Whether `plan` comes from the store
    pub persisted: bool,
    pub plan: ClassPlan,
}

impl WeekPlan {
    /// Title used when the focus text is empty
    pub fn title(&self) -> &str {
        &self.plan.theme
    }

    pub fn focus(&self) -> &str {
        &self.plan.technical_focus
    }
}

/// One `WeekPlan` per cycle week, in order
pub fn build_week_plans(params: &CycleParams, persisted: &[ClassPlan]) -> Vec<WeekPlan> {
    let template = band_template(resolve_plan_band(&params.age_band));

    (1..=params.cycle_length)
        .map(|week_number| {
            let stored = persisted.iter().find(|p| p.week_number == week_number);
            let plan = match stored {
                Some(plan) => plan.clone(),
                None => build_class_plan(&params.week(week_number, PlanSource::Auto)),
            };
            WeekPlan {
                week_number,
                phase: plan.phase,
                volume: template.week(week_number).volume,
                persisted: stored.is_some(),
                plan,
            }
        })
        .collect()
}
