//! Database module - plan store boundary and its SQLite implementation

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::planner::Phase;
use crate::templates::MvLevel;

/// Class descriptor the planner reads from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: Option<i64>,
    pub name: String,
    pub age_band: String,
    pub cycle_start_date: Option<NaiveDate>,
    pub cycle_length_weeks: u32,
    pub sessions_per_week: u32,
    pub mv_level: Option<MvLevel>,
    pub days_of_week: Vec<u8>, // 0=Sunday..6=Saturday
    pub duration_minutes: u32,
}

/// Default nominal session length
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Perceived effort scale
pub const PSE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// Who produced a plan's content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanSource {
    Auto,
    Manual,
}

impl PlanSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanSource::Auto => "AUTO",
            PlanSource::Manual => "MANUAL",
        }
    }
}

impl FromStr for PlanSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTO" => Ok(PlanSource::Auto),
            "MANUAL" => Ok(PlanSource::Manual),
            other => bail!("Unknown plan source: {}", other),
        }
    }
}

/// One week of a class's cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPlan {
    pub id: Option<i64>,
    pub class_id: i64,
    pub start_date: NaiveDate,
    pub week_number: u32,
    pub phase: Phase,
    pub theme: String,
    pub technical_focus: String,
    pub physical_focus: String,
    pub constraints: String,
    pub mv_format: String,
    pub warmup_profile: String,
    pub jump_target: String,
    pub rpe_target: String,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The coach-editable fields of a plan, compared as a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanContent {
    pub phase: Phase,
    pub theme: String,
    pub technical_focus: String,
    pub physical_focus: String,
    pub constraints: String,
    pub mv_format: String,
    pub warmup_profile: String,
    pub jump_target: String,
    pub rpe_target: String,
}

impl ClassPlan {
    pub fn content(&self) -> PlanContent {
        PlanContent {
            phase: self.phase,
            theme: self.theme.clone(),
            technical_focus: self.technical_focus.clone(),
            physical_focus: self.physical_focus.clone(),
            constraints: self.constraints.clone(),
            mv_format: self.mv_format.clone(),
            warmup_profile: self.warmup_profile.clone(),
            jump_target: self.jump_target.clone(),
            rpe_target: self.rpe_target.clone(),
        }
    }

    /// Overwrite the editable fields, leaving identity and provenance alone
    pub fn set_content(&mut self, content: PlanContent) {
        self.phase = content.phase;
        self.theme = content.theme;
        self.technical_focus = content.technical_focus;
        self.physical_focus = content.physical_focus;
        self.constraints = content.constraints;
        self.mv_format = content.mv_format;
        self.warmup_profile = content.warmup_profile;
        self.jump_target = content.jump_target;
        self.rpe_target = content.rpe_target;
    }
}

/// Post-session effort report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: Option<i64>,
    pub class_id: i64,
    pub created_at: DateTime<Utc>,
    pub pse: f64,
    pub pain_score: Option<u8>,
}

/// Persistence boundary used by the planner
pub trait PlanStore {
    fn list_plans(&self, class_id: i64) -> Result<Vec<ClassPlan>>;

    /// Insert a plan, returning its new id
    fn create_plan(&self, plan: &ClassPlan) -> Result<i64>;

    fn create_plans(&self, plans: &[ClassPlan]) -> Result<()> {
        for plan in plans {
            self.create_plan(plan)?;
        }
        Ok(())
    }

    /// Update a plan matched by its id
    fn update_plan(&self, plan: &ClassPlan) -> Result<()>;

    fn delete_plans_by_class(&self, class_id: i64) -> Result<()>;

    /// Logs of every class created within `[start, end]`
    fn list_session_logs(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SessionLog>>;
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Read a text column through `FromStr`
fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let text: String = row.get(idx)?;
    text.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn optional_column<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|t| {
        t.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
    })
    .transpose()
}

const CLASS_COLUMNS: &str = "id, name, age_band, cycle_start_date, cycle_length_weeks, sessions_per_week, mv_level, days_of_week, duration_minutes";

const PLAN_COLUMNS: &str = "id, class_id, start_date, week_number, phase, theme, technical_focus, physical_focus, constraints, mv_format, warmup_profile, jump_target, rpe_target, source, created_at, updated_at";

fn class_from_row(row: &Row) -> rusqlite::Result<ClassGroup> {
    let days_json: String = row.get(7)?;
    let days_of_week: Vec<u8> = serde_json::from_str(&days_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into()))?;
    Ok(ClassGroup {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        age_band: row.get(2)?,
        cycle_start_date: optional_column(row, 3)?,
        cycle_length_weeks: row.get(4)?,
        sessions_per_week: row.get(5)?,
        mv_level: optional_column(row, 6)?,
        days_of_week,
        duration_minutes: row.get(8)?,
    })
}

fn plan_from_row(row: &Row) -> rusqlite::Result<ClassPlan> {
    Ok(ClassPlan {
        id: Some(row.get(0)?),
        class_id: row.get(1)?,
        start_date: parse_column(row, 2)?,
        week_number: row.get(3)?,
        phase: parse_column(row, 4)?,
        theme: row.get(5)?,
        technical_focus: row.get(6)?,
        physical_focus: row.get(7)?,
        constraints: row.get(8)?,
        mv_format: row.get(9)?,
        warmup_profile: row.get(10)?,
        jump_target: row.get(11)?,
        rpe_target: row.get(12)?,
        source: parse_column(row, 13)?,
        created_at: parse_column(row, 14)?,
        updated_at: parse_column(row, 15)?,
    })
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path))?;
        let db = Self { conn };
        db.init_schema()?;
        debug!(path, "database ready");
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS classes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age_band TEXT NOT NULL,
                cycle_start_date TEXT,
                cycle_length_weeks INTEGER NOT NULL,
                sessions_per_week INTEGER NOT NULL,
                mv_level TEXT,
                days_of_week TEXT NOT NULL DEFAULT '[]',
                duration_minutes INTEGER NOT NULL DEFAULT 60
            );
            CREATE TABLE IF NOT EXISTS class_plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                week_number INTEGER NOT NULL,
                phase TEXT NOT NULL,
                theme TEXT NOT NULL,
                technical_focus TEXT NOT NULL,
                physical_focus TEXT NOT NULL,
                constraints TEXT NOT NULL,
                mv_format TEXT NOT NULL,
                warmup_profile TEXT NOT NULL,
                jump_target TEXT NOT NULL,
                rpe_target TEXT NOT NULL,
                source TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (class_id, week_number)
            );
            CREATE TABLE IF NOT EXISTS session_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                class_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                pse REAL NOT NULL,
                pain_score INTEGER
            );",
        )?;
        Ok(())
    }

    /// Add new class, returning its id
    pub fn add_class(&self, class: &ClassGroup) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO classes (name, age_band, cycle_start_date, cycle_length_weeks, sessions_per_week, mv_level, days_of_week, duration_minutes) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                class.name,
                class.age_band,
                class.cycle_start_date.map(|d| d.to_string()),
                class.cycle_length_weeks,
                class.sessions_per_week,
                class.mv_level.map(|l| l.as_str()),
                serde_json::to_string(&class.days_of_week)?,
                class.duration_minutes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(id, name = %class.name, "class created");
        Ok(id)
    }

    pub fn get_class(&self, id: i64) -> Result<Option<ClassGroup>> {
        let class = self
            .conn
            .query_row(
                &format!("SELECT {} FROM classes WHERE id = ?1", CLASS_COLUMNS),
                [id],
                class_from_row,
            )
            .optional()?;
        Ok(class)
    }

    pub fn list_classes(&self) -> Result<Vec<ClassGroup>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM classes ORDER BY name", CLASS_COLUMNS))?;
        let classes = stmt
            .query_map([], class_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(classes)
    }

    /// Record a session's perceived effort
    pub fn add_session_log(&self, log: &SessionLog) -> Result<i64> {
        if !PSE_RANGE.contains(&log.pse) {
            bail!("PSE must be between 0 and 10, got {}", log.pse);
        }
        self.conn.execute(
            "INSERT INTO session_logs (class_id, created_at, pse, pain_score) VALUES (?1, ?2, ?3, ?4)",
            params![log.class_id, timestamp(&log.created_at), log.pse, log.pain_score],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl PlanStore for Database {
    fn list_plans(&self, class_id: i64) -> Result<Vec<ClassPlan>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM class_plans WHERE class_id = ?1 ORDER BY week_number",
            PLAN_COLUMNS
        ))?;
        let plans = stmt
            .query_map([class_id], plan_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list plans for class {}", class_id))?;
        Ok(plans)
    }

    fn create_plan(&self, plan: &ClassPlan) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO class_plans (class_id, start_date, week_number, phase, theme, technical_focus, physical_focus, constraints, mv_format, warmup_profile, jump_target, rpe_target, source, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    plan.class_id,
                    plan.start_date.to_string(),
                    plan.week_number,
                    plan.phase.as_str(),
                    plan.theme,
                    plan.technical_focus,
                    plan.physical_focus,
                    plan.constraints,
                    plan.mv_format,
                    plan.warmup_profile,
                    plan.jump_target,
                    plan.rpe_target,
                    plan.source.as_str(),
                    timestamp(&plan.created_at),
                    timestamp(&plan.updated_at),
                ],
            )
            .with_context(|| {
                format!("Failed to create plan for class {} week {}", plan.class_id, plan.week_number)
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_plan(&self, plan: &ClassPlan) -> Result<()> {
        let Some(id) = plan.id else {
            bail!("Cannot update plan for week {} without an id", plan.week_number);
        };
        let changed = self.conn.execute(
            "UPDATE class_plans SET class_id = ?1, start_date = ?2, week_number = ?3, phase = ?4, theme = ?5, technical_focus = ?6, physical_focus = ?7, constraints = ?8, mv_format = ?9, warmup_profile = ?10, jump_target = ?11, rpe_target = ?12, source = ?13, updated_at = ?14 WHERE id = ?15",
            params![
                plan.class_id,
                plan.start_date.to_string(),
                plan.week_number,
                plan.phase.as_str(),
                plan.theme,
                plan.technical_focus,
                plan.physical_focus,
                plan.constraints,
                plan.mv_format,
                plan.warmup_profile,
                plan.jump_target,
                plan.rpe_target,
                plan.source.as_str(),
                timestamp(&plan.updated_at),
                id,
            ],
        )?;
        if changed == 0 {
            bail!("Plan {} not found", id);
        }
        Ok(())
    }

    fn delete_plans_by_class(&self, class_id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM class_plans WHERE class_id = ?1", [class_id])?;
        info!(class_id, deleted, "plans deleted");
        Ok(())
    }

    fn list_session_logs(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<SessionLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, class_id, created_at, pse, pain_score FROM session_logs WHERE created_at >= ?1 AND created_at <= ?2 ORDER BY created_at DESC",
        )?;
        let logs = stmt
            .query_map(params![timestamp(&start), timestamp(&end)], |row| {
                Ok(SessionLog {
                    id: Some(row.get(0)?),
                    class_id: row.get(1)?,
                    created_at: parse_column(row, 2)?,
                    pse: row.get(3)?,
                    pain_score: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_class() -> ClassGroup {
        ClassGroup {
            id: None,
            name: "Sub 11".to_string(),
            age_band: "9-11".to_string(),
            cycle_start_date: NaiveDate::from_ymd_opt(2026, 10, 5),
            cycle_length_weeks: 4,
            sessions_per_week: 3,
            mv_level: Some(MvLevel::Mv2),
            days_of_week: vec![1, 3, 5],
            duration_minutes: 75,
        }
    }

    fn create_plan(class_id: i64, week_number: u32) -> ClassPlan {
        let now = Utc::now();
        ClassPlan {
            id: None,
            class_id,
            start_date: NaiveDate::from_ymd_opt(2026, 10, 5).unwrap(),
            week_number,
            phase: Phase::Base,
            theme: "Fundamentos".to_string(),
            technical_focus: "Manchete".to_string(),
            physical_focus: "Agilidade".to_string(),
            constraints: "Quadra reduzida".to_string(),
            mv_format: "2x2".to_string(),
            warmup_profile: "Mobilidade".to_string(),
            jump_target: "20-40".to_string(),
            rpe_target: "4-5".to_string(),
            source: PlanSource::Auto,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_class_round_trip() {
        let db = Database::open(":memory:").unwrap();
        let id = db.add_class(&create_class()).unwrap();
        let class = db.get_class(id).unwrap().unwrap();
        assert_eq!(class.id, Some(id));
        assert_eq!(class.days_of_week, vec![1, 3, 5]);
        assert_eq!(class.mv_level, Some(MvLevel::Mv2));
        assert_eq!(class.cycle_start_date, NaiveDate::from_ymd_opt(2026, 10, 5));
        assert_eq!(class.duration_minutes, 75);
    }

    #[test]
    fn test_get_missing_class() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.get_class(42).unwrap().is_none());
    }

    #[test]
    fn test_create_and_list_plans() {
        let db = Database::open(":memory:").unwrap();
        db.create_plans(&[create_plan(1, 2), create_plan(1, 1), create_plan(2, 1)]).unwrap();

        let plans = db.list_plans(1).unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].week_number, 1);
        assert_eq!(plans[1].week_number, 2);
        assert!(plans.iter().all(|p| p.id.is_some()));
    }

    #[test]
    fn test_one_plan_per_class_week() {
        let db = Database::open(":memory:").unwrap();
        db.create_plan(&create_plan(1, 1)).unwrap();
        assert!(db.create_plan(&create_plan(1, 1)).is_err());
    }

    #[test]
    fn test_update_plan_by_id() {
        let db = Database::open(":memory:").unwrap();
        let id = db.create_plan(&create_plan(1, 1)).unwrap();

        let mut plan = db.list_plans(1).unwrap().remove(0);
        plan.theme = "Saque".to_string();
        plan.source = PlanSource::Manual;
        db.update_plan(&plan).unwrap();

        let stored = db.list_plans(1).unwrap().remove(0);
        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.theme, "Saque");
        assert_eq!(stored.source, PlanSource::Manual);
    }

    #[test]
    fn test_update_without_id_fails() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.update_plan(&create_plan(1, 1)).is_err());
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let db = Database::open(":memory:").unwrap();
        let mut plan = create_plan(1, 1);
        plan.id = Some(99);
        assert!(db.update_plan(&plan).is_err());
    }

    #[test]
    fn test_delete_plans_by_class() {
        let db = Database::open(":memory:").unwrap();
        db.create_plans(&[create_plan(1, 1), create_plan(1, 2), create_plan(2, 1)]).unwrap();
        db.delete_plans_by_class(1).unwrap();
        assert!(db.list_plans(1).unwrap().is_empty());
        assert_eq!(db.list_plans(2).unwrap().len(), 1);
    }

    #[test]
    fn test_session_logs_in_range() {
        let db = Database::open(":memory:").unwrap();
        let now = Utc::now();
        for (days_ago, pain) in [(1, Some(2)), (10, None), (40, Some(0))] {
            db.add_session_log(&SessionLog {
                id: None,
                class_id: 1,
                created_at: now - Duration::days(days_ago),
                pse: 6.0,
                pain_score: pain,
            })
            .unwrap();
        }

        let logs = db.list_session_logs(now - Duration::days(28), now).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].pain_score, Some(2));
        assert!(logs[0].created_at > logs[1].created_at);
    }

    #[test]
    fn test_session_log_rejects_pse_out_of_scale() {
        let db = Database::open(":memory:").unwrap();
        for pse in [-1.0, 10.5, f64::NAN] {
            let log = SessionLog {
                id: None,
                class_id: 1,
                created_at: Utc::now(),
                pse,
                pain_score: None,
            };
            assert!(db.add_session_log(&log).is_err());
        }
        assert!(db.list_session_logs(Utc::now() - Duration::days(1), Utc::now()).unwrap().is_empty());
    }
}
