use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::PatternCatalog;
use crate::document::{Document, Page, PageSlot};
use crate::error::PageReadError;
use crate::matcher::{FormDetection, match_region};
use crate::segment::{PageSegmenter, Segmenter, TitleZone};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DetectionResult {
    forms: BTreeSet<String>,
}

impl DetectionResult {
    pub fn forms(&self) -> &BTreeSet<String> {
        &self.forms
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    pub fn union(mut self, other: Self) -> Self {
        self.forms.extend(other.forms);
        self
    }
}

impl<S: Into<String>> FromIterator<S> for DetectionResult {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            forms: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSpan {
    pub document_type: String,
    pub start_page: usize,
    pub end_page: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub result: DetectionResult,
    pub detections: Vec<FormDetection>,
    pub spans: Vec<FormSpan>,
    pub warnings: Vec<PageReadError>,
}

enum PageOutcome {
    Matched(Vec<FormDetection>),
    Unreadable(PageReadError),
}

pub struct Extractor<'c, S = PageSegmenter> {
    catalog: &'c PatternCatalog,
    segmenter: S,
    parallel: bool,
}

impl<'c> Extractor<'c, PageSegmenter> {
    pub fn new(catalog: &'c PatternCatalog) -> Self {
        Self::with_segmenter(catalog, PageSegmenter::default())
    }

    pub fn title_zone(mut self, zone: TitleZone) -> Self {
        self.segmenter = PageSegmenter::new(zone);
        self
    }
}

impl<'c, S: Segmenter> Extractor<'c, S> {
    pub fn with_segmenter(catalog: &'c PatternCatalog, segmenter: S) -> Self {
        Self {
            catalog,
            segmenter,
            parallel: true,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn extract(&self, document: &Document) -> Extraction {
        let outcomes = if self.parallel {
            document
                .pages
                .par_iter()
                .map(|slot| self.process_slot(slot))
                .collect::<Vec<_>>()
        } else {
            document
                .pages
                .iter()
                .map(|slot| self.process_slot(slot))
                .collect::<Vec<_>>()
        };

        let mut extraction = Extraction::default();
        let mut primary = vec![None; document.page_count()];

        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                PageOutcome::Matched(detections) => {
                    primary[index] = detections.first().map(|detection| detection.form_id.clone());
                    extraction.result = extraction.result.union(
                        detections
                            .iter()
                            .map(|detection| detection.form_id.clone())
                            .collect(),
                    );
                    extraction.detections.extend(detections);
                }
                PageOutcome::Unreadable(error) => {
                    warn!(
                        document = %error.document,
                        page = error.page_number,
                        reason = %error.reason,
                        "skipping unreadable page"
                    );
                    extraction.warnings.push(error);
                }
            }
        }

        extraction.spans = build_spans(&primary);
        debug!(
            document = %document.name,
            pages = document.page_count(),
            forms = extraction.result.len(),
            "extracted forms"
        );

        extraction
    }

    fn process_slot(&self, slot: &PageSlot) -> PageOutcome {
        match slot {
            Ok(page) => PageOutcome::Matched(self.page_detections(page)),
            Err(error) => PageOutcome::Unreadable(error.clone()),
        }
    }

    fn page_detections(&self, page: &Page) -> Vec<FormDetection> {
        self.segmenter
            .regions(page)
            .iter()
            .flat_map(|region| match_region(self.catalog, region))
            .collect()
    }
}

/// Builds 1-based page spans from each page's primary identifier. Pages with
/// no identifier continue the open span; a different identifier closes it.
pub fn build_spans(primary: &[Option<String>]) -> Vec<FormSpan> {
    let mut spans = Vec::<FormSpan>::new();
    let mut current: Option<FormSpan> = None;

    for (index, form_id) in primary.iter().enumerate() {
        let Some(form_id) = form_id else {
            continue;
        };
        let page_number = index + 1;

        if let Some(span) = current.as_ref() {
            if span.document_type == *form_id {
                continue;
            }
        }
        if let Some(mut span) = current.take() {
            span.end_page = page_number - 1;
            spans.push(span);
        }
        current = Some(FormSpan {
            document_type: form_id.clone(),
            start_page: page_number,
            end_page: page_number,
        });
    }

    if let Some(mut span) = current {
        span.end_page = primary.len();
        spans.push(span);
    }

    spans
}
