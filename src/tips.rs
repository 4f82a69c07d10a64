use std::{collections::HashMap, fs, io, path::Path};

use serde::Deserialize;
use tracing::{info, warn};

use crate::model::{RiskTier, TipSet};

pub const DEFAULT_LANGUAGE: &str = "en";
pub const LANGUAGES: [&str; 3] = ["en", "si", "ta"];

#[derive(Debug, thiserror::Error)]
pub enum TipsError {
    #[error("failed to read tips: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse tips: {0}")]
    Parse(#[from] serde_json::Error),
}

// A tip entry is either one text or a list of texts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TipText {
    One(String),
    Many(Vec<String>),
}

impl From<TipText> for TipSet {
    fn from(t: TipText) -> Self {
        match t {
            TipText::One(s) if s.is_empty() => TipSet::default(),
            TipText::One(s) => TipSet(vec![s]),
            TipText::Many(v) => TipSet(v),
        }
    }
}

type RawCatalog = HashMap<String, HashMap<String, TipText>>;

/// Read-only mapping from risk tier and language to localized tips
#[derive(Debug, Clone, PartialEq)]
pub struct TipsCatalog {
    tips: HashMap<RiskTier, HashMap<String, TipSet>>,
}

impl Default for TipsCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

impl TipsCatalog {
    /// Every tier with an empty set for each supported language
    pub fn empty() -> Self {
        let tips = RiskTier::ALL
            .into_iter()
            .map(|t| (t, LANGUAGES.iter().map(|l| (l.to_string(), TipSet::default())).collect()))
            .collect();
        Self { tips }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TipsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Loads the catalog, falling back to the empty catalog when the file is missing or malformed
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(catalog) => {
                info!(path = %path.display(), "Tips loaded");
                catalog
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Tips unavailable, using empty catalog");
                Self::empty()
            }
        }
    }

    /// Accepts both `{tier: {language: tips}}` and `{language: {tier: tips}}`. The shape is told
    /// apart by whether any top level key names a tier
    pub fn from_json(json: &str) -> Result<Self, TipsError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        let risk_first = raw.keys().any(|k| RiskTier::parse(k).is_some());

        let mut catalog = Self::empty();
        for (outer, entries) in raw {
            for (inner, text) in entries {
                let (tier, lang) = if risk_first { (&outer, &inner) } else { (&inner, &outer) };
                let Some(tier) = RiskTier::parse(tier) else {
                    warn!(key = %tier, "Ignoring tips for unknown risk tier");
                    continue;
                };
                catalog.insert(tier, lang, TipSet::from(text));
            }
        }

        Ok(catalog)
    }

    fn insert(&mut self, tier: RiskTier, lang: &str, tips: TipSet) {
        self.tips.entry(tier).or_default().insert(normalize_language(lang), tips);
    }

    /// Unknown languages and tiers yield an empty set
    pub fn tips_for(&self, risk: RiskTier, language: &str) -> TipSet {
        self.tips
            .get(&risk)
            .and_then(|by_lang| by_lang.get(&normalize_language(language)))
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    fn languages(&self, risk: RiskTier) -> Vec<&str> {
        let mut langs: Vec<&str> =
            self.tips.get(&risk).map(|m| m.keys().map(String::as_str).collect()).unwrap_or_default();
        langs.sort_unstable();
        langs
    }
}

fn normalize_language(lang: &str) -> String {
    lang.trim().to_ascii_lowercase()
}
