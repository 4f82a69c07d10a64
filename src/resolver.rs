use std::sync::Arc;

use tracing::debug;

use crate::{
    model::{DecodedPayload, RiskTier},
    reputation::UrlClassifier,
};

const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Decides whether a payload needs a reputation lookup
#[derive(Clone)]
pub struct RiskResolver {
    classifier: Arc<dyn UrlClassifier>,
}

impl RiskResolver {
    pub fn new(classifier: Arc<dyn UrlClassifier>) -> Self {
        Self { classifier }
    }

    /// URL payloads are classified remotely. Everything else, including an empty payload, is low
    /// risk without any outbound call
    pub async fn resolve(&self, payload: &DecodedPayload) -> RiskTier {
        if !is_url(&payload.text) {
            debug!(source = %payload.source, "Payload is not a URL");
            return RiskTier::Low;
        }
        self.classifier.classify(payload.text.trim_start()).await
    }
}

/// True when the text starts with http:// or https://, ignoring case and leading whitespace
pub fn is_url(text: &str) -> bool {
    let text = text.trim_start().as_bytes();
    URL_SCHEMES.iter().any(|scheme| {
        text.len() >= scheme.len() && text[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
    })
}
