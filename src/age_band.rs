//! Age bands - normalization of free-text bands like "9-11" or "09-11 anos"

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Sentinel for an unparseable bound, so malformed bands sort last
pub const UNBOUNDED: u32 = u32::MAX;

/// Numeric age range extracted from a band string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AgeRange {
    pub start: u32,
    pub end: u32,
}

impl AgeRange {
    pub fn is_bounded(&self) -> bool {
        self.start != UNBOUNDED && self.end != UNBOUNDED
    }
}

/// Macro band used to pick a base template
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlanBand {
    #[serde(rename = "06-08")]
    Kids,
    #[serde(rename = "09-11")]
    Juniors,
    #[serde(rename = "12-14")]
    Teens,
}

impl PlanBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanBand::Kids => "06-08",
            PlanBand::Juniors => "09-11",
            PlanBand::Teens => "12-14",
        }
    }
}

impl fmt::Display for PlanBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*-\s*([0-9]+)").expect("valid age range regex"));

/// First `<digits> - <digits>` pair, as the two digit runs
fn first_range(text: &str) -> Option<(&str, &str)> {
    let caps = RANGE_RE.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Numeric bound; runs too long for `u32` saturate to `UNBOUNDED`
fn bound(digits: &str) -> u32 {
    digits.parse().unwrap_or(UNBOUNDED)
}

fn pad(digits: &str) -> String {
    match digits.parse::<u32>() {
        Ok(n) => format!("{:02}", n),
        Err(_) => digits.to_string(),
    }
}

/// Normalize to zero-padded "NN-NN"; unparseable text comes back trimmed
pub fn normalize_age_band(text: &str) -> String {
    match first_range(text) {
        Some((start, end)) => format!("{}-{}", pad(start), pad(end)),
        None => text.trim().to_string(),
    }
}

/// Parse `{start, end}` for sorting and bucketing
pub fn parse_age_range(text: &str) -> AgeRange {
    match first_range(text) {
        Some((start, end)) => AgeRange { start: bound(start), end: bound(end) },
        None => AgeRange { start: UNBOUNDED, end: UNBOUNDED },
    }
}

/// Bucket a class into one of the three macro bands.
///
/// Unparseable bands land in the widest band (12-14).
pub fn resolve_plan_band(age_band: &str) -> PlanBand {
    let range = parse_age_range(&normalize_age_band(age_band));
    if range.end <= 8 {
        PlanBand::Kids
    } else if range.end <= 11 {
        PlanBand::Juniors
    } else {
        PlanBand::Teens
    }
}
