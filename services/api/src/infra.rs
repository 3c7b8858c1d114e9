use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::Local;
use metrics_exporter_prometheus::PrometheusHandle;
use readiness_lab::config::TrainingConfig;
use readiness_lab::workflows::training::{
    CatalogDocumentSource, CertificateArtifact, CertificateError, CertificateIssuer,
    DocumentSource, DocumentSourceError, EventSinkError, FsDocumentSource, RunEvent, RunEventSink,
    ScenarioDocument, ScoringConfig,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Document source picked at startup: a content directory when configured,
/// the built-in catalog otherwise.
pub(crate) enum ContentSource {
    Catalog(CatalogDocumentSource),
    Fs(FsDocumentSource),
}

impl DocumentSource for ContentSource {
    fn load(
        &self,
        scenario_id: &str,
    ) -> Result<Option<Arc<ScenarioDocument>>, DocumentSourceError> {
        match self {
            ContentSource::Catalog(source) => source.load(scenario_id),
            ContentSource::Fs(source) => source.load(scenario_id),
        }
    }
}

/// Default outbound adapter: every run event lands in the service log as a
/// structured line. Durable persistence slots in behind the same trait.
#[derive(Default, Clone)]
pub(crate) struct LogEventSink;

impl RunEventSink for LogEventSink {
    fn publish(&self, event: RunEvent) -> Result<(), EventSinkError> {
        let payload = serde_json::to_string(&event)
            .map_err(|err| EventSinkError::Transport(err.to_string()))?;
        info!(event = event.kind(), %payload, "run event");
        Ok(())
    }
}

/// In-memory sink used by the CLI demo so dispatched events can be rendered.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEventSink {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl InMemoryEventSink {
    pub(crate) fn events(&self) -> Vec<RunEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl RunEventSink for InMemoryEventSink {
    fn publish(&self, event: RunEvent) -> Result<(), EventSinkError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

/// Plain-text certificate renderer; a PDF renderer slots in behind the same
/// trait.
#[derive(Default, Clone)]
pub(crate) struct TextCertificateIssuer;

impl CertificateIssuer for TextCertificateIssuer {
    fn issue(
        &self,
        session_hint: Option<&str>,
        module_id: &str,
    ) -> Result<CertificateArtifact, CertificateError> {
        let issued_on = Local::now().date_naive();
        let holder = session_hint.unwrap_or("participant");
        let body = format!(
            "Readiness Lab Certificate of Completion\n\
             Module: {module_id}\n\
             Session: {holder}\n\
             Issued: {issued_on}\n"
        );

        Ok(CertificateArtifact {
            content_type: "text/plain; charset=utf-8".to_string(),
            bytes: body.into_bytes(),
        })
    }
}

pub(crate) fn scoring_config(training: &TrainingConfig) -> ScoringConfig {
    ScoringConfig {
        minimum_reflection_words: training.minimum_reflection_words,
    }
}
