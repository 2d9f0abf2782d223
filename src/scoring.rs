use std::collections::{BTreeMap, BTreeSet};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::LabelMismatch;
use crate::model::{EvaluationReport, OverallMetrics};
use crate::pipeline::DetectionResult;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoldLabel {
    forms: BTreeSet<String>,
}

impl GoldLabel {
    pub fn forms(&self) -> &BTreeSet<String> {
        &self.forms
    }
}

impl<S: Into<String>> FromIterator<S> for GoldLabel {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            forms: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCounts {
    #[serde(rename = "tp")]
    pub true_positives: usize,
    #[serde(rename = "fp")]
    pub false_positives: usize,
    #[serde(rename = "fn")]
    pub false_negatives: usize,
}

impl ScoreCounts {
    pub fn new(true_positives: usize, false_positives: usize, false_negatives: usize) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
        }
    }
}

impl Add for ScoreCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(
            self.true_positives + other.true_positives,
            self.false_positives + other.false_positives,
            self.false_negatives + other.false_negatives,
        )
    }
}

impl AddAssign for ScoreCounts {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sum for ScoreCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Set comparison over unique identifiers; callers restrict both sides to the
/// evaluation vocabulary first.
pub fn score_sets(predicted: &BTreeSet<String>, gold: &BTreeSet<String>) -> ScoreCounts {
    ScoreCounts {
        true_positives: predicted.intersection(gold).count(),
        false_positives: predicted.difference(gold).count(),
        false_negatives: gold.difference(predicted).count(),
    }
}

pub fn score_document(
    predicted: &DetectionResult,
    gold: &GoldLabel,
    vocabulary: &Vocabulary,
) -> ScoreCounts {
    score_sets(
        &vocabulary.restrict(predicted.forms()),
        &vocabulary.restrict(gold.forms()),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateMetrics {
    pub totals: ScoreCounts,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl AggregateMetrics {
    pub fn from_totals(totals: ScoreCounts) -> Self {
        let precision = ratio(
            totals.true_positives,
            totals.true_positives + totals.false_positives,
        );
        let recall = ratio(
            totals.true_positives,
            totals.true_positives + totals.false_negatives,
        );
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            totals,
            precision,
            recall,
            f1_score,
        }
    }

    pub fn to_overall(&self) -> OverallMetrics {
        OverallMetrics {
            total_true_positives: self.totals.true_positives,
            total_false_positives: self.totals.false_positives,
            total_false_negatives: self.totals.false_negatives,
            precision: round4(self.precision),
            recall: round4(self.recall),
            f1_score: round4(self.f1_score),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// One corpus entry. Either side may be missing when the prediction run and
/// the gold set disagree about which documents exist.
#[derive(Debug, Clone, Default)]
pub struct CorpusEntry {
    pub predicted: Option<DetectionResult>,
    pub gold: Option<GoldLabel>,
}

#[derive(Debug, Clone, Default)]
pub struct CorpusScore {
    pub per_document: BTreeMap<String, ScoreCounts>,
    pub metrics: AggregateMetrics,
    pub mismatches: Vec<LabelMismatch>,
}

impl CorpusScore {
    pub fn report(&self) -> EvaluationReport {
        EvaluationReport {
            overall_metrics: self.metrics.to_overall(),
            per_file_results: self.per_document.clone(),
        }
    }
}

/// Micro-averaged corpus score: counts are summed across documents before any
/// ratio is taken.
pub fn score_corpus(
    entries: &BTreeMap<String, CorpusEntry>,
    vocabulary: &Vocabulary,
) -> CorpusScore {
    let empty_prediction = DetectionResult::default();
    let empty_gold = GoldLabel::default();
    let mut score = CorpusScore::default();

    for (document, entry) in entries {
        match (&entry.predicted, &entry.gold) {
            (Some(_), None) => score.mismatches.push(LabelMismatch::MissingGold {
                document: document.clone(),
            }),
            (None, Some(_)) => score.mismatches.push(LabelMismatch::MissingPrediction {
                document: document.clone(),
            }),
            _ => {}
        }

        let counts = score_document(
            entry.predicted.as_ref().unwrap_or(&empty_prediction),
            entry.gold.as_ref().unwrap_or(&empty_gold),
            vocabulary,
        );
        score.per_document.insert(document.clone(), counts);
    }

    score.metrics = AggregateMetrics::from_totals(score.per_document.values().copied().sum());
    score
}

#[cfg(test)]
mod tests;
