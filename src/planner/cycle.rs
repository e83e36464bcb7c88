//! Cycle maintenance against the plan store: regeneration, coach edits, resets
//!
//! Batches issue one store call per week, in week order. A failure midway
//! leaves earlier weeks written; every operation here except a full reset
//! can simply be run again.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::db::{ClassPlan, PlanContent, PlanSource, PlanStore};
use super::generator::{CycleParams, build_class_plan, to_class_plans};

/// How existing weeks are treated when regenerating a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerateMode {
    /// Create weeks without a plan, leave the rest alone
    FillMissing,
    /// Recompute AUTO weeks and create missing ones; MANUAL weeks stay
    AutoOnly,
    /// Delete every plan and rebuild the cycle. Discards coach edits.
    All,
}

impl fmt::Display for RegenerateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegenerateMode::FillMissing => write!(f, "fill"),
            RegenerateMode::AutoOnly => write!(f, "auto"),
            RegenerateMode::All => write!(f, "all"),
        }
    }
}

impl FromStr for RegenerateMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fill" => Ok(RegenerateMode::FillMissing),
            "auto" => Ok(RegenerateMode::AutoOnly),
            "all" => Ok(RegenerateMode::All),
            other => bail!("Unknown regenerate mode: {} (expected fill, auto or all)", other),
        }
    }
}

/// Weeks touched by a regeneration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationReport {
    pub created: Vec<u32>,
    pub updated: Vec<u32>,
    pub kept: Vec<u32>,
}

/// Fresh AUTO content for a week, keeping the stored row's identity
fn regenerated(params: &CycleParams, previous: &ClassPlan) -> ClassPlan {
    let mut plan = build_class_plan(&params.week(previous.week_number, PlanSource::Auto));
    plan.id = previous.id;
    plan.created_at = previous.created_at;
    plan
}

/// Bring the stored cycle in line with the generator.
///
/// `RegenerateMode::All` refuses to run unless `confirmed` is set.
pub fn regenerate_cycle<S: PlanStore + ?Sized>(
    store: &S,
    params: &CycleParams,
    mode: RegenerateMode,
    confirmed: bool,
) -> Result<RegenerationReport> {
    let mut report = RegenerationReport::default();

    if mode == RegenerateMode::All {
        if !confirmed {
            bail!("Regenerating all weeks discards manual edits and must be confirmed");
        }
        warn!(class_id = params.class_id, "resetting whole cycle");
        store
            .delete_plans_by_class(params.class_id)
            .with_context(|| format!("Failed to clear plans of class {}", params.class_id))?;
        let plans = to_class_plans(params);
        store.create_plans(&plans)?;
        report.created = plans.iter().map(|p| p.week_number).collect();
        info!(class_id = params.class_id, weeks = plans.len(), "cycle rebuilt");
        return Ok(report);
    }

    let existing = store.list_plans(params.class_id)?;

    for week in 1..=params.cycle_length {
        match existing.iter().find(|p| p.week_number == week) {
            None => {
                store.create_plan(&build_class_plan(&params.week(week, PlanSource::Auto)))?;
                report.created.push(week);
            }
            Some(plan) if mode == RegenerateMode::AutoOnly && plan.source == PlanSource::Auto => {
                store.update_plan(&regenerated(params, plan))?;
                report.updated.push(week);
            }
            Some(_) => report.kept.push(week),
        }
    }

    info!(
        class_id = params.class_id,
        %mode,
        created = report.created.len(),
        updated = report.updated.len(),
        kept = report.kept.len(),
        "cycle regenerated"
    );
    Ok(report)
}

/// Provenance after an edit: any changed field makes the week MANUAL
pub fn resolve_source(previous: &ClassPlan, draft: &PlanContent) -> PlanSource {
    if previous.content() != *draft {
        PlanSource::Manual
    } else {
        previous.source
    }
}

fn check_week(params: &CycleParams, week_number: u32) -> Result<()> {
    if !params.contains_week(week_number) {
        bail!(
            "Week {} is outside the {}-week cycle",
            week_number,
            params.cycle_length
        );
    }
    Ok(())
}

fn find_week(plans: Vec<ClassPlan>, week_number: u32) -> Option<ClassPlan> {
    plans.into_iter().find(|p| p.week_number == week_number)
}

/// Content the coach starts editing from: stored plan, else generated
pub fn current_content<S: PlanStore + ?Sized>(
    store: &S,
    params: &CycleParams,
    week_number: u32,
) -> Result<PlanContent> {
    check_week(params, week_number)?;
    let content = match find_week(store.list_plans(params.class_id)?, week_number) {
        Some(plan) => plan.content(),
        None => build_class_plan(&params.week(week_number, PlanSource::Auto)).content(),
    };
    Ok(content)
}

/// Store a coach's draft for one week
pub fn save_week_edit<S: PlanStore + ?Sized>(
    store: &S,
    params: &CycleParams,
    week_number: u32,
    draft: PlanContent,
) -> Result<ClassPlan> {
    check_week(params, week_number)?;

    match find_week(store.list_plans(params.class_id)?, week_number) {
        Some(previous) => {
            let mut plan = previous.clone();
            plan.source = resolve_source(&previous, &draft);
            plan.set_content(draft);
            plan.updated_at = Utc::now();
            store.update_plan(&plan)?;
            debug!(week = week_number, source = plan.source.as_str(), "week edited");
            Ok(plan)
        }
        None => {
            let mut plan = build_class_plan(&params.week(week_number, PlanSource::Manual));
            plan.set_content(draft);
            plan.id = Some(store.create_plan(&plan)?);
            debug!(week = week_number, "manual week created");
            Ok(plan)
        }
    }
}

/// Discard edits on a week and put generated AUTO content back
pub fn reset_week<S: PlanStore + ?Sized>(
    store: &S,
    params: &CycleParams,
    week_number: u32,
) -> Result<ClassPlan> {
    check_week(params, week_number)?;

    match find_week(store.list_plans(params.class_id)?, week_number) {
        Some(previous) => {
            let plan = regenerated(params, &previous);
            store.update_plan(&plan)?;
            info!(week = week_number, "week reset to AUTO");
            Ok(plan)
        }
        None => {
            let mut plan = build_class_plan(&params.week(week_number, PlanSource::Auto));
            plan.id = Some(store.create_plan(&plan)?);
            Ok(plan)
        }
    }
}

/// Copy a draft onto other weeks as MANUAL plans.
///
/// The edited week and weeks outside the cycle are skipped. Returns the
/// weeks written, ascending.
pub fn apply_to_weeks<S: PlanStore + ?Sized>(
    store: &S,
    params: &CycleParams,
    from_week: u32,
    draft: &PlanContent,
    targets: &[u32],
) -> Result<Vec<u32>> {
    let weeks: BTreeSet<u32> = targets
        .iter()
        .copied()
        .filter(|w| *w != from_week && params.contains_week(*w))
        .collect();
    if weeks.is_empty() {
        return Ok(Vec::new());
    }

    let existing = store.list_plans(params.class_id)?;
    let now = Utc::now();

    for &week in &weeks {
        match existing.iter().find(|p| p.week_number == week) {
            Some(previous) => {
                let mut plan = previous.clone();
                plan.set_content(draft.clone());
                plan.source = PlanSource::Manual;
                plan.updated_at = now;
                store.update_plan(&plan)?;
            }
            None => {
                let mut plan = build_class_plan(&params.week(week, PlanSource::Manual));
                plan.set_content(draft.clone());
                store.create_plan(&plan)?;
            }
        }
    }

    info!(from_week, applied = weeks.len(), "draft copied to other weeks");
    Ok(weeks.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ClassGroup, Database};
    use crate::planner::Phase;
    use chrono::NaiveDate;

    fn cycle(cycle_length: u32) -> CycleParams {
        CycleParams {
            class_id: 1,
            age_band: "9-11".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            cycle_length,
            mv_level: None,
        }
    }

    fn plan_for(db: &Database, week: u32) -> ClassPlan {
        db.list_plans(1)
            .unwrap()
            .into_iter()
            .find(|p| p.week_number == week)
            .unwrap()
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("fill".parse::<RegenerateMode>().unwrap(), RegenerateMode::FillMissing);
        assert_eq!("auto".parse::<RegenerateMode>().unwrap(), RegenerateMode::AutoOnly);
        assert_eq!("all".parse::<RegenerateMode>().unwrap(), RegenerateMode::All);
        assert!("everything".parse::<RegenerateMode>().is_err());
    }

    #[test]
    fn test_fill_missing_creates_whole_cycle() {
        let db = Database::open(":memory:").unwrap();
        let report = regenerate_cycle(&db, &cycle(6), RegenerateMode::FillMissing, false).unwrap();
        assert_eq!(report.created, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(db.list_plans(1).unwrap().len(), 6);
    }

    #[test]
    fn test_fill_missing_is_retry_safe() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        let report = regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.kept, vec![1, 2, 3, 4]);
        assert_eq!(db.list_plans(1).unwrap().len(), 4);
    }

    #[test]
    fn test_fill_missing_leaves_auto_weeks_alone() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();

        // Simulate stale AUTO content
        let mut stale = plan_for(&db, 2);
        stale.theme = "Antigo".to_string();
        db.update_plan(&stale).unwrap();

        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        assert_eq!(plan_for(&db, 2).theme, "Antigo");
    }

    #[test]
    fn test_auto_only_keeps_manual_weeks() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(2);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();

        let mut draft = current_content(&db, &params, 1).unwrap();
        draft.theme = "Semana do coach".to_string();
        save_week_edit(&db, &params, 1, draft).unwrap();
        let manual_before = plan_for(&db, 1);

        let mut stale = plan_for(&db, 2);
        stale.theme = "Antigo".to_string();
        db.update_plan(&stale).unwrap();

        let report = regenerate_cycle(&db, &params, RegenerateMode::AutoOnly, false).unwrap();
        assert_eq!(report.kept, vec![1]);
        assert_eq!(report.updated, vec![2]);

        assert_eq!(plan_for(&db, 1), manual_before);
        let auto = plan_for(&db, 2);
        assert_eq!(auto.theme, "Continuidade");
        assert_eq!(auto.id, stale.id);
    }

    #[test]
    fn test_auto_only_fills_gaps() {
        let db = Database::open(":memory:").unwrap();
        let report = regenerate_cycle(&db, &cycle(3), RegenerateMode::AutoOnly, false).unwrap();
        assert_eq!(report.created, vec![1, 2, 3]);
    }

    #[test]
    fn test_regenerate_all_requires_confirmation() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        assert!(regenerate_cycle(&db, &params, RegenerateMode::All, false).is_err());
        assert_eq!(db.list_plans(1).unwrap().len(), 4);
    }

    #[test]
    fn test_regenerate_all_discards_manual_weeks() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        let mut draft = current_content(&db, &params, 3).unwrap();
        draft.theme = "Semana do coach".to_string();
        save_week_edit(&db, &params, 3, draft).unwrap();

        let report = regenerate_cycle(&db, &params, RegenerateMode::All, true).unwrap();
        assert_eq!(report.created, vec![1, 2, 3, 4]);
        let plans = db.list_plans(1).unwrap();
        assert_eq!(plans.len(), 4);
        assert!(plans.iter().all(|p| p.source == PlanSource::Auto));
    }

    #[test]
    fn test_theme_edit_flips_to_manual() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();

        let mut draft = current_content(&db, &params, 2).unwrap();
        draft.theme = "Jogo com regras novas".to_string();
        let saved = save_week_edit(&db, &params, 2, draft).unwrap();

        assert_eq!(saved.source, PlanSource::Manual);
        assert_eq!(plan_for(&db, 2).source, PlanSource::Manual);
        assert_eq!(plan_for(&db, 2).theme, "Jogo com regras novas");
    }

    #[test]
    fn test_identical_draft_keeps_source() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();

        let draft = current_content(&db, &params, 2).unwrap();
        let saved = save_week_edit(&db, &params, 2, draft).unwrap();
        assert_eq!(saved.source, PlanSource::Auto);

        let mut manual = plan_for(&db, 3);
        manual.source = PlanSource::Manual;
        db.update_plan(&manual).unwrap();
        let saved = save_week_edit(&db, &params, 3, manual.content()).unwrap();
        assert_eq!(saved.source, PlanSource::Manual);
    }

    #[test]
    fn test_resolve_source_checks_every_field() {
        let params = cycle(4);
        let previous = build_class_plan(&params.week(1, PlanSource::Auto));

        let mut draft = previous.content();
        draft.rpe_target = "5-6".to_string();
        assert_eq!(resolve_source(&previous, &draft), PlanSource::Manual);

        let mut draft = previous.content();
        draft.phase = Phase::Consolidacao;
        assert_eq!(resolve_source(&previous, &draft), PlanSource::Manual);

        assert_eq!(resolve_source(&previous, &previous.content()), PlanSource::Auto);
    }

    #[test]
    fn test_edit_of_missing_week_creates_manual_plan() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        let draft = current_content(&db, &params, 4).unwrap();
        let saved = save_week_edit(&db, &params, 4, draft).unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.source, PlanSource::Manual);
    }

    #[test]
    fn test_edit_outside_cycle_fails() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        let draft = build_class_plan(&params.week(1, PlanSource::Auto)).content();
        assert!(save_week_edit(&db, &params, 5, draft.clone()).is_err());
        assert!(save_week_edit(&db, &params, 0, draft).is_err());
    }

    #[test]
    fn test_reset_week_restores_auto_content() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        let original = plan_for(&db, 1);

        let mut draft = original.content();
        draft.constraints = "Sem rede".to_string();
        save_week_edit(&db, &params, 1, draft).unwrap();

        let reset = reset_week(&db, &params, 1).unwrap();
        assert_eq!(reset.source, PlanSource::Auto);
        assert_eq!(reset.id, original.id);
        assert_eq!(plan_for(&db, 1).content(), original.content());
    }

    #[test]
    fn test_apply_to_weeks_skips_source_and_out_of_range() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        db.create_plan(&build_class_plan(&params.week(2, PlanSource::Auto))).unwrap();

        let mut draft = current_content(&db, &params, 1).unwrap();
        draft.technical_focus = "Saque flutuante".to_string();

        let applied = apply_to_weeks(&db, &params, 1, &draft, &[1, 2, 3, 3, 0, 9]).unwrap();
        assert_eq!(applied, vec![2, 3]);

        let plans = db.list_plans(1).unwrap();
        assert_eq!(plans.len(), 2);
        for plan in plans {
            assert_eq!(plan.source, PlanSource::Manual);
            assert_eq!(plan.technical_focus, "Saque flutuante");
        }
    }

    #[test]
    fn test_apply_to_no_valid_weeks() {
        let db = Database::open(":memory:").unwrap();
        let params = cycle(4);
        let draft = current_content(&db, &params, 1).unwrap();
        assert!(apply_to_weeks(&db, &params, 1, &draft, &[1, 7]).unwrap().is_empty());
        assert!(db.list_plans(1).unwrap().is_empty());
    }

    #[test]
    fn test_auto_only_on_later_day_keeps_cycle_start() {
        let db = Database::open(":memory:").unwrap();
        let class = ClassGroup {
            id: Some(1),
            name: "Sub 11".to_string(),
            age_band: "9-11".to_string(),
            cycle_start_date: None,
            cycle_length_weeks: 4,
            sessions_per_week: 2,
            mv_level: None,
            days_of_week: vec![],
            duration_minutes: 60,
        };
        let first_day = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        let later_day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let params = CycleParams::from_class(&class, &db.list_plans(1).unwrap(), first_day).unwrap();
        regenerate_cycle(&db, &params, RegenerateMode::FillMissing, false).unwrap();
        let mut draft = current_content(&db, &params, 1).unwrap();
        draft.theme = "Semana do coach".to_string();
        save_week_edit(&db, &params, 1, draft).unwrap();

        let params = CycleParams::from_class(&class, &db.list_plans(1).unwrap(), later_day).unwrap();
        assert_eq!(params.start_date, first_day);
        let report = regenerate_cycle(&db, &params, RegenerateMode::AutoOnly, false).unwrap();
        assert_eq!(report.updated, vec![2, 3, 4]);

        let plans = db.list_plans(1).unwrap();
        assert!(plans.iter().all(|p| p.start_date == first_day));
    }
}
