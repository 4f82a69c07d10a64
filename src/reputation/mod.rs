mod client;
mod models;

use async_trait::async_trait;

pub use client::{ReputationClient, ReputationConfig, ReputationError};
pub use models::ReputationVerdict;

use crate::model::RiskTier;

/// Classifies a URL into a risk tier. Implementations never fail and fall back to a tier of
/// their own choosing
#[async_trait]
pub trait UrlClassifier: Send + Sync {
    async fn classify(&self, url: &str) -> RiskTier;
}
