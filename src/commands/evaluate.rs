use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::cli::EvaluateArgs;
use crate::config::EngineConfig;
use crate::corpus::{discover_gold_files, discover_pdfs, file_stem, load_gold_label};
use crate::model::{EvaluateCounts, EvaluatePaths, EvaluateRunManifest, PdfEntry};
use crate::pdf::{BboxParser, command_available, decode_pdf, pdftotext_version};
use crate::pipeline::DetectionResult;
use crate::scoring::{CorpusEntry, GoldLabel, score_corpus};
use crate::util::{now_utc_string, sha256_file, utc_compact_string, write_json_pretty, write_json_stdout};

#[derive(Debug, Clone)]
pub struct DocumentRun {
    pub filename: String,
    pub stem: String,
    pub page_count: usize,
    pub result: DetectionResult,
    pub unreadable_pages: usize,
    pub decode_error: Option<String>,
    pub sha256: Option<String>,
}

#[derive(Debug, Default)]
pub struct AssembledCorpus {
    pub entries: BTreeMap<String, CorpusEntry>,
    pub skipped_unlabeled: Vec<String>,
}

pub fn run(args: EvaluateArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("eval-{}", utc_compact_string(started_ts));

    let config = EngineConfig::from_args(&args.engine)?;

    if !command_available("pdftotext") {
        bail!("pdftotext is required but was not found on PATH");
    }

    let pdf_paths = discover_pdfs(&args.pdf_dir)?;
    if pdf_paths.is_empty() {
        warn!(path = %args.pdf_dir.display(), "no PDF files found");
    }
    let gold_paths = discover_gold_files(&args.gold_dir)?;
    info!(
        run_id = %run_id,
        pdfs = pdf_paths.len(),
        gold = gold_paths.len(),
        "starting evaluation"
    );

    let gold = gold_paths
        .iter()
        .map(|(stem, path)| Ok((stem.clone(), load_gold_label(path)?)))
        .collect::<Result<BTreeMap<String, GoldLabel>>>()?;

    let parser = BboxParser::new()?;
    let hash_sources = args.manifest_path.is_some();
    let process = |path: &PathBuf| process_pdf(&parser, &config, path, hash_sources);
    let runs = if config.parallel {
        pdf_paths.par_iter().map(process).collect::<Result<Vec<_>>>()?
    } else {
        pdf_paths.iter().map(process).collect::<Result<Vec<_>>>()?
    };

    let mut warnings = Vec::<String>::new();
    for run in &runs {
        if let Some(error) = &run.decode_error {
            warnings.push(format!("{}: {}", run.filename, error));
        }
        if run.unreadable_pages > 0 {
            warnings.push(format!(
                "{}: skipped {} unreadable pages",
                run.filename, run.unreadable_pages
            ));
        }
    }

    let source_hashes = runs
        .iter()
        .filter_map(|run| {
            run.sha256.as_ref().map(|sha256| PdfEntry {
                filename: run.filename.clone(),
                sha256: sha256.clone(),
                page_count: run.page_count,
            })
        })
        .collect::<Vec<_>>();
    let unreadable_page_count = runs.iter().map(|run| run.unreadable_pages).sum();
    let undecodable_pdf_count = runs.iter().filter(|run| run.decode_error.is_some()).count();
    let pdf_count = runs.len();

    let corpus = assemble_corpus(runs, gold, args.skip_unlabeled);
    for filename in &corpus.skipped_unlabeled {
        warn!(file = %filename, "no matching ground truth; skipping");
        warnings.push(format!("{filename}: no matching ground truth, skipped"));
    }

    let score = score_corpus(&corpus.entries, &config.vocabulary);
    for mismatch in &score.mismatches {
        warn!(document = %mismatch.document(), "{mismatch}");
    }

    let report = score.report();
    info!(
        documents = score.per_document.len(),
        precision = report.overall_metrics.precision,
        recall = report.overall_metrics.recall,
        f1_score = report.overall_metrics.f1_score,
        "evaluation completed"
    );

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote evaluation report");
    }

    if let Some(manifest_path) = &args.manifest_path {
        let manifest = EvaluateRunManifest {
            manifest_version: 1,
            run_id,
            status: "completed".to_string(),
            started_at,
            updated_at: now_utc_string(),
            command: render_evaluate_command(&args),
            pdftotext_version: pdftotext_version(),
            catalog_form_count: config.catalog.len(),
            vocabulary: config.vocabulary.iter().map(str::to_string).collect(),
            paths: EvaluatePaths {
                pdf_dir: args.pdf_dir.display().to_string(),
                gold_dir: args.gold_dir.display().to_string(),
                report_path: args
                    .report_path
                    .as_ref()
                    .map(|path| path.display().to_string()),
            },
            counts: EvaluateCounts {
                pdf_count,
                gold_count: gold_paths.len(),
                scored_document_count: score.per_document.len(),
                skipped_unlabeled_count: corpus.skipped_unlabeled.len(),
                unreadable_page_count,
                undecodable_pdf_count,
            },
            source_hashes,
            label_mismatches: score.mismatches.clone(),
            warnings,
            overall_metrics: report.overall_metrics.clone(),
        };
        write_json_pretty(manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote evaluation run manifest");
    }

    write_json_stdout(&report)
}

fn process_pdf(
    parser: &BboxParser,
    config: &EngineConfig,
    pdf_path: &Path,
    hash_source: bool,
) -> Result<DocumentRun> {
    let filename = pdf_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", pdf_path.display()))?;
    let stem = file_stem(pdf_path).unwrap_or_else(|| filename.clone());
    let sha256 = if hash_source {
        Some(sha256_file(pdf_path)?)
    } else {
        None
    };

    let document = match decode_pdf(parser, pdf_path) {
        Ok(document) => document,
        Err(error) => {
            warn!(path = %pdf_path.display(), error = %error, "could not decode pdf; scoring as empty prediction");
            return Ok(DocumentRun {
                filename,
                stem,
                page_count: 0,
                result: DetectionResult::default(),
                unreadable_pages: 0,
                decode_error: Some(format!("{error:#}")),
                sha256,
            });
        }
    };

    // Documents already run in parallel; pages stay sequential inside each one.
    let extraction = config.extractor().parallel(false).extract(&document);
    if extraction.result.is_empty() {
        warn!(path = %pdf_path.display(), "no catalog forms detected");
    }

    Ok(DocumentRun {
        filename,
        stem,
        page_count: document.page_count(),
        result: extraction.result,
        unreadable_pages: extraction.warnings.len(),
        decode_error: None,
        sha256,
    })
}

/// Pairs prediction runs with gold labels by file stem. Gold labels without a
/// PDF become prediction-less entries keyed as `<stem>.pdf`.
pub fn assemble_corpus(
    runs: Vec<DocumentRun>,
    mut gold: BTreeMap<String, GoldLabel>,
    skip_unlabeled: bool,
) -> AssembledCorpus {
    let mut corpus = AssembledCorpus::default();

    for run in runs {
        let label = gold.remove(&run.stem);
        if label.is_none() && skip_unlabeled {
            corpus.skipped_unlabeled.push(run.filename);
            continue;
        }

        corpus.entries.insert(
            run.filename,
            CorpusEntry {
                predicted: Some(run.result),
                gold: label,
            },
        );
    }

    for (stem, label) in gold {
        corpus.entries.insert(
            format!("{stem}.pdf"),
            CorpusEntry {
                predicted: None,
                gold: Some(label),
            },
        );
    }

    corpus
}

fn render_evaluate_command(args: &EvaluateArgs) -> String {
    let mut parts = vec![
        "taxforms".to_string(),
        "evaluate".to_string(),
        args.pdf_dir.display().to_string(),
        args.gold_dir.display().to_string(),
    ];

    if let Some(path) = &args.engine.catalog_path {
        parts.push("--catalog-path".to_string());
        parts.push(path.display().to_string());
    }
    for form in &args.engine.vocabulary {
        parts.push("--vocabulary".to_string());
        parts.push(form.clone());
    }
    if let Some(path) = &args.engine.vocabulary_path {
        parts.push("--vocabulary-path".to_string());
        parts.push(path.display().to_string());
    }
    parts.push("--title-zone-width".to_string());
    parts.push(args.engine.title_zone_width.to_string());
    parts.push("--title-zone-height".to_string());
    parts.push(args.engine.title_zone_height.to_string());
    if let Some(jobs) = args.engine.jobs {
        parts.push("--jobs".to_string());
        parts.push(jobs.to_string());
    }
    if args.engine.sequential {
        parts.push("--sequential".to_string());
    }
    if args.skip_unlabeled {
        parts.push("--skip-unlabeled".to_string());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LabelMismatch;
    use crate::scoring::ScoreCounts;
    use crate::vocabulary::Vocabulary;

    fn run_for(filename: &str, forms: &[&str]) -> DocumentRun {
        DocumentRun {
            filename: filename.to_string(),
            stem: filename.trim_end_matches(".pdf").to_string(),
            page_count: 4,
            result: forms.iter().copied().collect(),
            unreadable_pages: 0,
            decode_error: None,
            sha256: None,
        }
    }

    fn gold_for(entries: &[(&str, &[&str])]) -> BTreeMap<String, GoldLabel> {
        entries
            .iter()
            .map(|(stem, forms)| (stem.to_string(), forms.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn unmatched_sides_become_mismatch_entries() {
        let runs = vec![run_for("a.pdf", &["1040f", "f8949"]), run_for("b.pdf", &["f8889"])];
        let gold = gold_for(&[("a", &["1040f"]), ("c", &["f1040sa"])]);

        let corpus = assemble_corpus(runs, gold, false);
        assert_eq!(corpus.entries.len(), 3);
        assert!(corpus.skipped_unlabeled.is_empty());

        let score = score_corpus(&corpus.entries, &Vocabulary::desired_forms());
        assert_eq!(score.per_document["a.pdf"], ScoreCounts::new(1, 1, 0));
        assert_eq!(score.per_document["b.pdf"], ScoreCounts::new(0, 1, 0));
        assert_eq!(score.per_document["c.pdf"], ScoreCounts::new(0, 0, 1));
        assert!(score.mismatches.contains(&LabelMismatch::MissingGold {
            document: "b.pdf".to_string()
        }));
        assert!(score.mismatches.contains(&LabelMismatch::MissingPrediction {
            document: "c.pdf".to_string()
        }));
    }

    #[test]
    fn skip_unlabeled_drops_pdfs_without_gold() {
        let runs = vec![run_for("a.pdf", &["1040f"]), run_for("b.pdf", &["f8889"])];
        let gold = gold_for(&[("a", &["1040f"])]);

        let corpus = assemble_corpus(runs, gold, true);
        assert_eq!(corpus.entries.len(), 1);
        assert_eq!(corpus.skipped_unlabeled, vec!["b.pdf".to_string()]);
    }

    #[test]
    fn undecodable_pdf_scores_as_empty_prediction() {
        let mut failed = run_for("broken.pdf", &[]);
        failed.decode_error = Some("pdftotext returned non-zero exit status".to_string());
        let gold = gold_for(&[("broken", &["1040f", "f8949"])]);

        let corpus = assemble_corpus(vec![failed], gold, false);
        let score = score_corpus(&corpus.entries, &Vocabulary::desired_forms());
        assert_eq!(score.per_document["broken.pdf"], ScoreCounts::new(0, 0, 2));
        assert!(score.mismatches.is_empty());
    }
}
