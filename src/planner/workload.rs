//! Workload monitoring: acute:chronic ratio, pain streaks, high-volume streaks

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::db::{PlanStore, SessionLog};
use crate::templates::Volume;
use super::generator::WeekPlan;

pub const ACUTE_WINDOW_DAYS: i64 = 7;
pub const CHRONIC_WINDOW_DAYS: i64 = 28;

/// Chronic load is the weekly average over the 28-day window
const CHRONIC_WEEKS: f64 = 4.0;

const OVERREACH_RATIO: f64 = 1.3;
const UNDERLOAD_RATIO: f64 = 0.8;

/// Most recent pain-scored logs inspected for a streak
const PAIN_STREAK_LEN: usize = 3;
const PAIN_THRESHOLD: u8 = 2;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Increased,
    Below,
    WithinRange,
}

impl LoadStatus {
    pub fn classify(ratio: f64) -> Self {
        if ratio > OVERREACH_RATIO {
            LoadStatus::Increased
        } else if ratio < UNDERLOAD_RATIO {
            LoadStatus::Below
        } else {
            LoadStatus::WithinRange
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LoadStatus::Increased => "Load increased >30% this week",
            LoadStatus::Below => "Load below recent pattern",
            LoadStatus::WithinRange => "Load within expected range",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AcwrReading {
    pub acute_load: f64,
    pub chronic_load: f64,
    /// Rounded to 2 decimals
    pub ratio: f64,
    pub status: LoadStatus,
}

impl AcwrReading {
    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}

/// Acute:chronic workload ratio over logs up to `now`.
///
/// Load is `pse * duration_minutes` per session. Acute is the last 7 days;
/// chronic is the whole 28-day window divided by 4, so the acute week is
/// counted in both. `None` when there is no chronic load.
pub fn compute_acwr(logs: &[SessionLog], duration_minutes: u32, now: DateTime<Utc>) -> Option<AcwrReading> {
    let acute_from = now - Duration::days(ACUTE_WINDOW_DAYS);
    let chronic_from = now - Duration::days(CHRONIC_WINDOW_DAYS);
    let duration = duration_minutes as f64;

    let mut acute_load = 0.0;
    let mut window_load = 0.0;
    for log in logs.iter().filter(|l| l.created_at <= now) {
        let load = log.pse * duration;
        if log.created_at >= chronic_from {
            window_load += load;
        }
        if log.created_at >= acute_from {
            acute_load += load;
        }
    }

    let chronic_load = window_load / CHRONIC_WEEKS;
    if chronic_load <= 0.0 {
        return None;
    }

    let ratio = (acute_load / chronic_load * 100.0).round() / 100.0;
    Some(AcwrReading {
        acute_load,
        chronic_load,
        ratio,
        status: LoadStatus::classify(ratio),
    })
}

/// True when the three most recent pain-scored logs all report pain >= 2
pub fn pain_alert(logs: &[SessionLog]) -> bool {
    let mut scored: Vec<_> = logs.iter().filter(|l| l.pain_score.is_some()).collect();
    scored.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let recent: Vec<_> = scored.into_iter().take(PAIN_STREAK_LEN).collect();
    recent.len() == PAIN_STREAK_LEN
        && recent
            .iter()
            .all(|l| l.pain_score.is_some_and(|p| p >= PAIN_THRESHOLD))
}

/// True when two consecutive weeks are both high volume
pub fn high_load_streak(weeks: &[WeekPlan]) -> bool {
    weeks
        .windows(2)
        .any(|pair| pair[0].volume == Volume::Alto && pair[1].volume == Volume::Alto)
}

/// Combined load signals for a class
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    pub acwr: Option<AcwrReading>,
    pub pain_alert: bool,
    pub high_load_streak: bool,
}

impl WorkloadReport {
    /// Build from already-loaded logs and week plans
    pub fn from_logs(
        logs: &[SessionLog],
        weeks: &[WeekPlan],
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            acwr: compute_acwr(logs, duration_minutes, now),
            pain_alert: pain_alert(logs),
            high_load_streak: high_load_streak(weeks),
        }
    }

    /// Human-readable warnings, most urgent first
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.pain_alert {
            warnings.push("Pain reported (>=2) in the last 3 sessions".to_string());
        }
        if let Some(acwr) = &self.acwr
            && acwr.status != LoadStatus::WithinRange
        {
            warnings.push(format!("{} (ACWR {:.2})", acwr.message(), acwr.ratio));
        }
        if self.high_load_streak {
            warnings.push("Two weeks of high load in a row, consider a recovery week".to_string());
        }
        warnings
    }
}

/// Load a class's last 28 days of logs from the store and evaluate them
pub fn workload_report<S: PlanStore + ?Sized>(
    store: &S,
    class_id: i64,
    weeks: &[WeekPlan],
    duration_minutes: u32,
    now: DateTime<Utc>,
) -> Result<WorkloadReport> {
    let logs: Vec<SessionLog> = store
        .list_session_logs(now - Duration::days(CHRONIC_WINDOW_DAYS), now)?
        .into_iter()
        .filter(|l| l.class_id == class_id)
        .collect();
    debug!(class_id, logs = logs.len(), "session logs loaded");
    Ok(WorkloadReport::from_logs(&logs, weeks, duration_minutes, now))
}
