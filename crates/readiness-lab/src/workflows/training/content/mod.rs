mod catalog;
mod normalizer;
mod parser;

pub use catalog::{supplier_disruption_scenario, CatalogDocumentSource};

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use super::document::{DocumentError, ScenarioDocument};

/// Supplies immutable scenario documents by id.
pub trait DocumentSource: Send + Sync {
    fn load(&self, scenario_id: &str)
        -> Result<Option<Arc<ScenarioDocument>>, DocumentSourceError>;
}

/// Content loading and normalization failures.
#[derive(Debug, thiserror::Error)]
pub enum DocumentSourceError {
    #[error("failed to read scenario content: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] DocumentError),
    #[error("scenario id may only contain letters, digits, '-' and '_'")]
    InvalidScenarioId,
}

/// Parse and normalize one scenario document from raw JSON bytes.
pub fn parse_document(bytes: &[u8]) -> Result<ScenarioDocument, DocumentSourceError> {
    let raw: parser::RawScenarioDocument = serde_json::from_slice(bytes)?;
    Ok(normalizer::normalize_document(raw)?)
}

/// Loads `<dir>/<scenario_id>.json`, normalizing on every read. Ids are
/// restricted to `[A-Za-z0-9_-]` so lookups stay inside the content dir.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    dir: PathBuf,
}

impl FsDocumentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for FsDocumentSource {
    fn load(
        &self,
        scenario_id: &str,
    ) -> Result<Option<Arc<ScenarioDocument>>, DocumentSourceError> {
        if scenario_id.is_empty()
            || !scenario_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DocumentSourceError::InvalidScenarioId);
        }

        let path = self.dir.join(format!("{scenario_id}.json"));
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        parse_document(&bytes).map(|document| Some(Arc::new(document)))
    }
}
