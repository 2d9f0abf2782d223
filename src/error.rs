use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("catalog pattern for {form_id} is invalid: {reason}")]
    InvalidPattern { form_id: String, reason: String },

    #[error("catalog entry {0} has no match rules")]
    EmptyRules(String),

    #[error("catalog entry has an empty form identifier")]
    EmptyIdentifier,

    #[error("catalog lists form {0} more than once")]
    DuplicateIdentifier(String),

    #[error("catalog has no forms")]
    EmptyCatalog,

    #[error("evaluation vocabulary is empty")]
    EmptyVocabulary,

    #[error("title zone {axis} fraction must be in (0, 1], got {value}")]
    InvalidTitleZone { axis: &'static str, value: f64 },
}

#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[error("page {page_number} of {document}: {reason}")]
pub struct PageReadError {
    pub document: String,
    pub page_number: usize,
    pub reason: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelMismatch {
    #[error("gold label for {document} has no prediction; scored as false negatives only")]
    MissingPrediction { document: String },

    #[error("prediction for {document} has no gold label; scored as false positives only")]
    MissingGold { document: String },
}

impl LabelMismatch {
    pub fn document(&self) -> &str {
        match self {
            Self::MissingPrediction { document } | Self::MissingGold { document } => document,
        }
    }
}
