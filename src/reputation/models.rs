use serde::Deserialize;

use crate::model::RiskTier;

// Wire models
//------------------------------------------------------------------------------

/// Body of `POST /urls`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub data: SubmitData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitData {
    pub id: String,
}

/// Body of `GET /analyses/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisResponse {
    pub data: AnalysisData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisData {
    #[serde(default)]
    pub attributes: AnalysisAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisAttributes {
    #[serde(default)]
    pub stats: AnalysisStats,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AnalysisStats {
    #[serde(default)]
    pub malicious: u32,
    #[serde(default)]
    pub suspicious: u32,
    #[serde(default)]
    pub harmless: u32,
}

// Verdict
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReputationVerdict {
    pub malicious: u32,
    pub suspicious: u32,
    pub harmless: u32,
    pub inconclusive: bool,
}

impl ReputationVerdict {
    /// Verdict standing in for a lookup that did not complete
    pub fn failed() -> Self {
        Self { inconclusive: true, ..Self::default() }
    }

    /// Maps the verdict to a tier. Any malicious or suspicious report wins over an unfinished
    /// analysis, which in turn wins over harmless reports
    pub fn tier(&self) -> RiskTier {
        if self.malicious > 0 || self.suspicious > 0 {
            RiskTier::High
        } else if self.inconclusive {
            RiskTier::Medium
        } else if self.harmless > 0 {
            RiskTier::Low
        } else {
            RiskTier::Medium
        }
    }
}

impl From<AnalysisAttributes> for ReputationVerdict {
    fn from(attrs: AnalysisAttributes) -> Self {
        let AnalysisStats { malicious, suspicious, harmless } = attrs.stats;
        let inconclusive = attrs.status.is_some_and(|s| s != "completed");
        Self { malicious, suspicious, harmless, inconclusive }
    }
}
