//! Base templates - static weekly seeds per age band

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::age_band::PlanBand;

/// Target volume of a template week
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Volume {
    Baixo,
    Medio,
    Alto,
}

impl Volume {
    pub fn as_str(&self) -> &'static str {
        match self {
            Volume::Baixo => "baixo",
            Volume::Medio => "medio",
            Volume::Alto => "alto",
        }
    }

    /// Bar height for chart rendering (1-3)
    pub fn level(&self) -> u8 {
        match self {
            Volume::Baixo => 1,
            Volume::Medio => 2,
            Volume::Alto => 3,
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Skill tier used to scale jump counts and game formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MvLevel {
    #[serde(rename = "MV1")]
    Mv1,
    #[serde(rename = "MV2")]
    Mv2,
    #[serde(rename = "MV3")]
    Mv3,
}

impl MvLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MvLevel::Mv1 => "MV1",
            MvLevel::Mv2 => "MV2",
            MvLevel::Mv3 => "MV3",
        }
    }

    /// Jumps per session
    pub fn jump_target(&self) -> &'static str {
        match self {
            MvLevel::Mv1 => "10-20",
            MvLevel::Mv2 => "20-40",
            MvLevel::Mv3 => "30-60",
        }
    }

    /// Game format played at this level
    pub fn game_format(&self) -> &'static str {
        match self {
            MvLevel::Mv1 => "1x1 e 2x2 em quadra reduzida",
            MvLevel::Mv2 => "2x2 e 3x3 com rotacao simples",
            MvLevel::Mv3 => "4x4 evoluindo para 6x6",
        }
    }

    /// Level assumed when the class has no explicit override
    pub fn default_for_band(band: PlanBand) -> Self {
        match band {
            PlanBand::Kids => MvLevel::Mv1,
            PlanBand::Juniors => MvLevel::Mv2,
            PlanBand::Teens => MvLevel::Mv3,
        }
    }
}

impl fmt::Display for MvLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for MvLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MV1" => Ok(MvLevel::Mv1),
            "MV2" => Ok(MvLevel::Mv2),
            "MV3" => Ok(MvLevel::Mv3),
            other => anyhow::bail!("Unknown MV level: {}", other),
        }
    }
}

/// One week of a base template
#[derive(Debug, Clone)]
pub struct WeekTemplate {
    pub title: &'static str,
    pub focus: &'static str,
    pub volume: Volume,
}

/// Static text and weekly seeds for one macro band
#[derive(Debug, Clone)]
pub struct BandTemplate {
    pub band: PlanBand,
    pub weeks: &'static [WeekTemplate],
    pub physical_focus: &'static str,
    pub constraints: &'static str,
    pub warmup_profile: &'static str,
}

impl BandTemplate {
    /// Template week for a 1-based week number, cycling through the seeds
    pub fn week(&self, week_number: u32) -> &'static WeekTemplate {
        let index = (week_number.max(1) - 1) as usize % self.weeks.len();
        &self.weeks[index]
    }
}

const KIDS_WEEKS: &[WeekTemplate] = &[
    WeekTemplate {
        title: "Exploracao motora",
        focus: "Controle de bola, lancamentos, deslocamentos",
        volume: Volume::Baixo,
    },
    WeekTemplate {
        title: "Toque e recepcao",
        focus: "Toque por cima, manchete adaptada, jogos de alvo",
        volume: Volume::Medio,
    },
    WeekTemplate {
        title: "Jogos reduzidos",
        focus: "Mini voleibol 1x1, cooperacao, leitura de trajetoria",
        volume: Volume::Medio,
    },
    WeekTemplate {
        title: "Festival de jogos",
        focus: "Jogos ludicos, revisao dos fundamentos, diversao",
        volume: Volume::Baixo,
    },
];

const JUNIORS_WEEKS: &[WeekTemplate] = &[
    WeekTemplate {
        title: "Fundamentos base",
        focus: "Manchete, toque, saque por baixo",
        volume: Volume::Medio,
    },
    WeekTemplate {
        title: "Continuidade",
        focus: "Toque em deslocamento, recepcao de saque, 2x2",
        volume: Volume::Medio,
    },
    WeekTemplate {
        title: "Ataque inicial",
        focus: "Passada de ataque, saque por cima, 3x3",
        volume: Volume::Alto,
    },
    WeekTemplate {
        title: "Consolidar e jogar",
        focus: "Jogo 3x3, sistema simples, recuperacao ativa",
        volume: Volume::Baixo,
    },
];

const TEENS_WEEKS: &[WeekTemplate] = &[
    WeekTemplate {
        title: "Base tecnica",
        focus: "Recepcao, levantamento, saque tatico",
        volume: Volume::Medio,
    },
    WeekTemplate {
        title: "Potencia e ataque",
        focus: "Ataque de ponta, bloqueio simples, pliometria",
        volume: Volume::Alto,
    },
    WeekTemplate {
        title: "Sistema de jogo",
        focus: "Transicao ataque-defesa, 4x4, cobertura",
        volume: Volume::Alto,
    },
    WeekTemplate {
        title: "Regenerativa",
        focus: "Jogo 6x6 controlado, mobilidade, revisao tatica",
        volume: Volume::Baixo,
    },
];

pub const BAND_TEMPLATES: &[BandTemplate] = &[
    BandTemplate {
        band: PlanBand::Kids,
        weeks: KIDS_WEEKS,
        physical_focus: "Coordenacao, agilidade e equilibrio",
        constraints: "Bola leve, rede baixa, pausas frequentes",
        warmup_profile: "Brincadeiras de pega-pega e circuitos ludicos",
    },
    BandTemplate {
        band: PlanBand::Juniors,
        weeks: JUNIORS_WEEKS,
        physical_focus: "Velocidade de reacao e forca geral com peso corporal",
        constraints: "Quadra reduzida, no maximo 3 por equipe",
        warmup_profile: "Mobilidade articular e ativacao com bola",
    },
    BandTemplate {
        band: PlanBand::Teens,
        weeks: TEENS_WEEKS,
        physical_focus: "Potencia de salto, core e prevencao de lesoes",
        constraints: "Controle de saltos por sessao, aterrissagem tecnica",
        warmup_profile: "Aquecimento dinamico, pliometria leve e prevencao",
    },
];

pub fn band_template(band: PlanBand) -> &'static BandTemplate {
    BAND_TEMPLATES
        .iter()
        .find(|t| t.band == band)
        .unwrap_or(&BAND_TEMPLATES[BAND_TEMPLATES.len() - 1])
}
