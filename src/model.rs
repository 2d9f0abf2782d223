use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LabelMismatch, PageReadError};
use crate::pipeline::FormSpan;
use crate::scoring::ScoreCounts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub total_true_positives: usize,
    pub total_false_positives: usize,
    pub total_false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub overall_metrics: OverallMetrics,
    pub per_file_results: BTreeMap<String, ScoreCounts>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectReport {
    pub document: String,
    pub page_count: usize,
    pub forms: Vec<String>,
    pub spans: Vec<FormSpan>,
    pub warnings: Vec<PageReadError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    pub filename: String,
    pub sha256: String,
    pub page_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluatePaths {
    pub pdf_dir: String,
    pub gold_dir: String,
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateCounts {
    pub pdf_count: usize,
    pub gold_count: usize,
    pub scored_document_count: usize,
    pub skipped_unlabeled_count: usize,
    pub unreadable_page_count: usize,
    pub undecodable_pdf_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluateRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub pdftotext_version: Option<String>,
    pub catalog_form_count: usize,
    pub vocabulary: Vec<String>,
    pub paths: EvaluatePaths,
    pub counts: EvaluateCounts,
    pub source_hashes: Vec<PdfEntry>,
    pub label_mismatches: Vec<LabelMismatch>,
    pub warnings: Vec<String>,
    pub overall_metrics: OverallMetrics,
}
