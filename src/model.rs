use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

// Risk tier
//------------------------------------------------------------------------------

/// How likely a payload is to be malicious. Ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl Display for RiskTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

// Decoded payload
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSource {
    PrimaryDecoder,
    SecondaryDecoder,
    InlineSubmission,
}

impl Display for PayloadSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let s = match self {
            Self::PrimaryDecoder => "primary_decoder",
            Self::SecondaryDecoder => "secondary_decoder",
            Self::InlineSubmission => "inline_submission",
        };
        f.write_str(s)
    }
}

/// Text recovered from a request. An empty text means nothing was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub text: String,
    pub source: PayloadSource,
}

impl DecodedPayload {
    pub fn new(text: impl Into<String>, source: PayloadSource) -> Self {
        Self { text: text.into(), source }
    }

    pub fn empty(source: PayloadSource) -> Self {
        Self { text: String::new(), source }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// Tips and scan result
//------------------------------------------------------------------------------

/// Ordered localized tips for one risk tier and language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TipSet(pub Vec<String>);

impl TipSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for TipSet {
    fn from(tips: Vec<String>) -> Self {
        Self(tips)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub payload: String,
    pub risk: RiskTier,
    pub tips: TipSet,
}
