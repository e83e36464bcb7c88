//! Phase classification for a week of the mesocycle

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cycles of at least this many weeks use fixed 4-week blocks
const FIXED_BLOCK_MIN_CYCLE: u32 = 9;
const FIXED_BLOCK_WEEKS: u32 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    Base,
    Desenvolvimento,
    Consolidacao,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Base => "Base",
            Phase::Desenvolvimento => "Desenvolvimento",
            Phase::Consolidacao => "Consolidacao",
        }
    }

    /// Target perceived effort (0-10 scale)
    pub fn rpe_target(&self) -> &'static str {
        match self {
            Phase::Base => "4-5",
            Phase::Desenvolvimento => "5-6",
            Phase::Consolidacao => "6-7",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Base" => Ok(Phase::Base),
            "Desenvolvimento" => Ok(Phase::Desenvolvimento),
            "Consolidacao" => Ok(Phase::Consolidacao),
            other => anyhow::bail!("Unknown phase: {}", other),
        }
    }
}

/// Phase for a 1-based week.
///
/// Long cycles (9+ weeks) get fixed 4-week Base and Desenvolvimento blocks;
/// shorter cycles are split into thirds of `ceil(cycle_length / 3)` weeks.
pub fn phase_for_week(week_number: u32, cycle_length: u32) -> Phase {
    let (base_end, development_end) = if cycle_length >= FIXED_BLOCK_MIN_CYCLE {
        (FIXED_BLOCK_WEEKS, FIXED_BLOCK_WEEKS * 2)
    } else {
        let chunk = cycle_length.div_ceil(3);
        (chunk, chunk * 2)
    };

    if week_number <= base_end {
        Phase::Base
    } else if week_number <= development_end {
        Phase::Desenvolvimento
    } else {
        Phase::Consolidacao
    }
}
