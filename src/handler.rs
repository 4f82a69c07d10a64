use std::{borrow::Cow, fs, sync::Arc};

use axum::body::Bytes;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, DecodeFailurePolicy},
    decode::QrDecoder,
    error::{SentryError, SentryResult},
    model::{DecodedPayload, PayloadSource, RiskTier, ScanResult},
    reputation::ReputationClient,
    resolver::RiskResolver,
    sandbox::Sandbox,
    tips::{TipsCatalog, DEFAULT_LANGUAGE},
};

pub const NO_DATA_MESSAGE: &str = "No QR data provided";
pub const NO_QR_MESSAGE: &str = "No QR code detected";

/// An uploaded image, inline text decoded by the client, or both. Inline text is used when the
/// image holds no readable code
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub image: Option<Bytes>,
    pub text: Option<String>,
    pub lang: Option<String>,
}

/// Runs one scan: decode, resolve risk, attach tips
pub struct RequestHandler {
    decoder: Arc<QrDecoder>,
    resolver: RiskResolver,
    tips: Arc<TipsCatalog>,
    sandbox: Sandbox,
    on_decode_failure: DecodeFailurePolicy,
}

impl RequestHandler {
    pub fn new(
        decoder: QrDecoder,
        resolver: RiskResolver,
        tips: TipsCatalog,
        sandbox: Sandbox,
        on_decode_failure: DecodeFailurePolicy,
    ) -> Self {
        Self { decoder: Arc::new(decoder), resolver, tips: Arc::new(tips), sandbox, on_decode_failure }
    }

    /// Wires the default decoder, the reputation client and the tips file from configuration
    pub fn from_config(config: &AppConfig) -> SentryResult<Self> {
        if config.reputation.api_key.is_empty() {
            warn!("REPUTATION_API_KEY is not set, URL lookups will fall back to medium risk");
        }
        let client = ReputationClient::new(config.reputation.clone())
            .map_err(|e| SentryError::Config(format!("failed to build reputation client: {e}")))?;

        Ok(Self::new(
            QrDecoder::default(),
            RiskResolver::new(Arc::new(client)),
            TipsCatalog::load_or_empty(&config.tips_path),
            Sandbox::new(config.sandbox_dir.clone()),
            config.on_decode_failure,
        ))
    }

    pub async fn handle(&self, request: ScanRequest) -> SentryResult<ScanResult> {
        let ScanRequest { image, text, lang } = request;
        let image = image.filter(|b| !b.is_empty());
        let text = text.filter(|t| !t.trim().is_empty());
        let lang = lang.filter(|l| !l.trim().is_empty()).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let payload = match (image, text) {
            (None, None) => return Err(SentryError::Validation(NO_DATA_MESSAGE.to_string())),
            (None, Some(text)) => DecodedPayload::new(text, PayloadSource::InlineSubmission),
            (Some(image), text) => {
                let decoded = self.decode_image(image).await?;
                match (decoded.is_empty(), text) {
                    (false, _) => decoded,
                    (true, Some(text)) => DecodedPayload::new(text, PayloadSource::InlineSubmission),
                    (true, None) => return self.decode_failure(&lang),
                }
            }
        };

        let risk = self.resolver.resolve(&payload).await;
        info!(%risk, source = %payload.source, "Scan complete");

        Ok(ScanResult { payload: payload.text, risk, tips: self.tips.tips_for(risk, &lang) })
    }

    // Spooling and decoding both run on the blocking pool. The spooled file is removed when the
    // task ends
    async fn decode_image(&self, image: Bytes) -> SentryResult<DecodedPayload> {
        let sandbox = self.sandbox.clone();
        let decoder = self.decoder.clone();

        let task = tokio::task::spawn_blocking(move || -> SentryResult<DecodedPayload> {
            let spooled = sandbox.spool(&image)?;
            let data = match &spooled {
                Some(file) => Cow::Owned(fs::read(file.path())?),
                None => Cow::Borrowed(&image[..]),
            };
            Ok(decoder.decode(&data))
        });

        task.await.map_err(|e| SentryError::Internal(format!("decode task failed: {e}")))?
    }

    fn decode_failure(&self, lang: &str) -> SentryResult<ScanResult> {
        match self.on_decode_failure {
            DecodeFailurePolicy::Error => {
                info!("Scan found no QR code");
                Err(SentryError::DecodeFailure(NO_QR_MESSAGE.to_string()))
            }
            DecodeFailurePolicy::DefaultLow => {
                info!("Scan found no QR code, answering low risk");
                let risk = RiskTier::Low;
                Ok(ScanResult { payload: String::new(), risk, tips: self.tips.tips_for(risk, lang) })
            }
        }
    }
}

#[cfg(test)]
mod handler_tests {
    use std::fs;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;
    use axum::body::Bytes;

    use super::{RequestHandler, ScanRequest, NO_DATA_MESSAGE, NO_QR_MESSAGE};
    use crate::common::utils::{QRError, QRResult};
    use crate::config::DecodeFailurePolicy;
    use crate::decode::{DecodeStrategy, QrDecoder};
    use crate::error::SentryError;
    use crate::model::{PayloadSource, RiskTier, TipSet};
    use crate::reputation::UrlClassifier;
    use crate::resolver::RiskResolver;
    use crate::sandbox::Sandbox;
    use crate::tips::TipsCatalog;

    const TIPS: &str = r#"{
        "low": {"en": ["Looks fine"], "si": ["ආරක්ෂිතයි"]},
        "high": {"en": ["Do not open"]}
    }"#;

    struct FixedStrategy(Option<&'static str>);

    impl DecodeStrategy for FixedStrategy {
        fn source(&self) -> PayloadSource {
            PayloadSource::PrimaryDecoder
        }

        fn decode(&self, _bytes: &[u8]) -> QRResult<String> {
            self.0.map(str::to_string).ok_or(QRError::SymbolNotFound)
        }
    }

    #[derive(Default)]
    struct HighClassifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UrlClassifier for HighClassifier {
        async fn classify(&self, _url: &str) -> RiskTier {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RiskTier::High
        }
    }

    fn handler(
        decoded: Option<&'static str>,
        policy: DecodeFailurePolicy,
        sandbox: Sandbox,
    ) -> (RequestHandler, Arc<HighClassifier>) {
        let classifier = Arc::new(HighClassifier::default());
        let h = RequestHandler::new(
            QrDecoder::new(vec![Box::new(FixedStrategy(decoded))]),
            RiskResolver::new(classifier.clone()),
            TipsCatalog::from_json(TIPS).unwrap(),
            sandbox,
            policy,
        );
        (h, classifier)
    }

    fn image_request(lang: Option<&str>) -> ScanRequest {
        ScanRequest {
            image: Some(Bytes::from_static(b"image")),
            text: None,
            lang: lang.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let (h, _) = handler(None, DecodeFailurePolicy::Error, Sandbox::disabled());
        let req = ScanRequest { image: Some(Bytes::new()), text: Some("  ".to_string()), lang: None };
        let err = h.handle(req).await.unwrap_err();
        assert!(matches!(err, SentryError::Validation(ref m) if m == NO_DATA_MESSAGE));
    }

    #[tokio::test]
    async fn decoded_url_is_classified() {
        let (h, c) = handler(Some("https://evil.example"), DecodeFailurePolicy::Error, Sandbox::disabled());
        let res = h.handle(image_request(None)).await.unwrap();
        assert_eq!(res.payload, "https://evil.example");
        assert_eq!(res.risk, RiskTier::High);
        assert_eq!(res.tips, TipSet(vec!["Do not open".to_string()]));
        assert_eq!(c.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn decoded_text_is_low_in_requested_language() {
        let (h, c) = handler(Some("just text"), DecodeFailurePolicy::Error, Sandbox::disabled());
        let res = h.handle(image_request(Some("si"))).await.unwrap();
        assert_eq!(res.risk, RiskTier::Low);
        assert_eq!(res.tips, TipSet(vec!["ආරක්ෂිතයි".to_string()]));
        assert_eq!(c.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn inline_text_without_image() {
        let (h, _) = handler(None, DecodeFailurePolicy::Error, Sandbox::disabled());
        let req = ScanRequest { image: None, text: Some("http://inline.example".to_string()), lang: None };
        let res = h.handle(req).await.unwrap();
        assert_eq!(res.payload, "http://inline.example");
        assert_eq!(res.risk, RiskTier::High);
    }

    #[tokio::test]
    async fn inline_text_backs_up_failed_decode() {
        let (h, _) = handler(None, DecodeFailurePolicy::Error, Sandbox::disabled());
        let mut req = image_request(None);
        req.text = Some("fallback".to_string());
        let res = h.handle(req).await.unwrap();
        assert_eq!(res.payload, "fallback");
        assert_eq!(res.risk, RiskTier::Low);
    }

    #[tokio::test]
    async fn failed_decode_is_error_by_default() {
        let (h, _) = handler(None, DecodeFailurePolicy::Error, Sandbox::disabled());
        let err = h.handle(image_request(None)).await.unwrap_err();
        assert!(matches!(err, SentryError::DecodeFailure(ref m) if m == NO_QR_MESSAGE));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn failed_decode_can_default_to_low() {
        let (h, c) = handler(None, DecodeFailurePolicy::DefaultLow, Sandbox::disabled());
        let res = h.handle(image_request(None)).await.unwrap();
        assert_eq!(res.payload, "");
        assert_eq!(res.risk, RiskTier::Low);
        assert_eq!(res.tips, TipSet(vec!["Looks fine".to_string()]));
        assert_eq!(c.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sandbox_is_cleaned_up() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("sandbox");
        let (h, _) = handler(Some("text"), DecodeFailurePolicy::Error, Sandbox::new(Some(dir.clone())));

        h.handle(image_request(None)).await.unwrap();
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);

        let (h, _) = handler(None, DecodeFailurePolicy::Error, Sandbox::new(Some(dir.clone())));
        assert!(h.handle(image_request(None)).await.is_err());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_scans_leave_sandbox_empty() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("sandbox");
        let (h, _) = handler(None, DecodeFailurePolicy::Error, Sandbox::new(Some(dir.clone())));
        let h = Arc::new(h);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let h = h.clone();
                tokio::spawn(async move {
                    let req = ScanRequest { image: Some(Bytes::from(vec![0u8; 1 << 20])), ..ScanRequest::default() };
                    h.handle(req).await
                })
            })
            .collect();
        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert!(matches!(err, SentryError::DecodeFailure(_)));
        }
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn unwritable_sandbox_is_sandbox_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let (h, _) = handler(Some("text"), DecodeFailurePolicy::Error, Sandbox::new(Some(blocker.join("sandbox"))));

        let err = h.handle(image_request(None)).await.unwrap_err();
        assert!(matches!(err, SentryError::Sandbox(_)));
    }
}
