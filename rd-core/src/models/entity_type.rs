use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    SoleProprietorship,
    Partnership,
    Llc,
    Pllc,
    CCorp,
    SCorp,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoleProprietorship => "sole_proprietorship",
            Self::Partnership => "partnership",
            Self::Llc => "llc",
            Self::Pllc => "pllc",
            Self::CCorp => "c_corp",
            Self::SCorp => "s_corp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sole_proprietorship" => Some(Self::SoleProprietorship),
            "partnership" => Some(Self::Partnership),
            "llc" => Some(Self::Llc),
            "pllc" => Some(Self::Pllc),
            "c_corp" => Some(Self::CCorp),
            "s_corp" => Some(Self::SCorp),
            _ => None,
        }
    }

    /// Only C corporations are taxed at the entity level.
    pub fn is_corporation(&self) -> bool {
        matches!(self, Self::CCorp)
    }

    pub fn is_passthrough(&self) -> bool {
        !self.is_corporation()
    }
}
