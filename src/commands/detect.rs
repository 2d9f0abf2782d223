use std::io::{self, Write};

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::DetectArgs;
use crate::config::EngineConfig;
use crate::model::DetectReport;
use crate::pdf::{BboxParser, command_available, decode_pdf};
use crate::pipeline::Extraction;
use crate::segment::PageSegmenter;
use crate::util::write_json_stdout;
use crate::vocabulary::Vocabulary;

pub fn run(args: DetectArgs) -> Result<()> {
    let config = EngineConfig::from_args(&args.engine)?;

    if !command_available("pdftotext") {
        bail!("pdftotext is required but was not found on PATH");
    }

    let parser = BboxParser::new()?;
    let document = decode_pdf(&parser, &args.pdf_path)?;
    info!(
        path = %args.pdf_path.display(),
        pages = document.page_count(),
        "decoded pdf"
    );

    let segmenter = PageSegmenter::new(config.title_zone);
    for (page, zone) in document.readable_pages().zip(segmenter.title_zones(&document)) {
        debug!(page = page.index + 1, title_zone = %zone, "title zone");
    }

    let extraction = config.extractor().extract(&document);

    for warning in &extraction.warnings {
        warn!(page = warning.page_number, reason = %warning.reason, "page skipped");
    }

    let vocabulary = (!args.all_forms).then_some(&config.vocabulary);
    let report = build_report(&document.name, document.page_count(), extraction, vocabulary);

    if args.json {
        return write_json_stdout(&report);
    }
    write_text_report(&report)
}

pub fn build_report(
    document: &str,
    page_count: usize,
    extraction: Extraction,
    vocabulary: Option<&Vocabulary>,
) -> DetectReport {
    let keep = |form_id: &str| vocabulary.is_none_or(|vocabulary| vocabulary.contains(form_id));

    DetectReport {
        document: document.to_string(),
        page_count,
        forms: extraction
            .result
            .forms()
            .iter()
            .filter(|form_id| keep(form_id.as_str()))
            .cloned()
            .collect(),
        spans: extraction
            .spans
            .into_iter()
            .filter(|span| keep(span.document_type.as_str()))
            .collect(),
        warnings: extraction.warnings,
    }
}

fn write_text_report(report: &DetectReport) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    if report.forms.is_empty() {
        writeln!(output, "No tax forms could be identified in the document.")?;
        output.flush()?;
        return Ok(());
    }

    writeln!(output, "Document: {} ({} pages)", report.document, report.page_count)?;
    writeln!(output, "Forms: {}", report.forms.join(", "))?;
    for span in &report.spans {
        writeln!(
            output,
            "  {:<12} pages {}-{}",
            span.document_type, span.start_page, span.end_page
        )?;
    }
    if !report.warnings.is_empty() {
        writeln!(output, "Skipped pages: {}", report.warnings.len())?;
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PatternCatalog;
    use crate::document::{Document, Page, PageSlot, TextBlock};
    use crate::pipeline::Extractor;

    fn sample_extraction(catalog: &PatternCatalog) -> Extraction {
        let title = |index: usize, text: &str| -> PageSlot {
            Ok(Page::new(
                index,
                612.0,
                792.0,
                vec![TextBlock::new(text, 36.0, 30.0, 120.0, 42.0)],
            ))
        };
        let document = Document::new(
            "return.pdf",
            vec![title(0, "Form 1040"), title(1, "Form 8879"), title(2, "Form 8949")],
        );
        Extractor::new(catalog).extract(&document)
    }

    #[test]
    fn report_filters_to_vocabulary_by_default() {
        let catalog = PatternCatalog::builtin().unwrap();
        let vocabulary = Vocabulary::desired_forms();

        let report = build_report("return.pdf", 3, sample_extraction(&catalog), Some(&vocabulary));
        assert_eq!(report.forms, vec!["1040f", "f8949"]);
        assert_eq!(report.spans.len(), 2);
        assert!(report.spans.iter().all(|span| span.document_type != "f8879"));
    }

    #[test]
    fn all_forms_keeps_out_of_vocabulary_detections() {
        let catalog = PatternCatalog::builtin().unwrap();

        let report = build_report("return.pdf", 3, sample_extraction(&catalog), None);
        assert_eq!(report.forms, vec!["1040f", "f8879", "f8949"]);
        assert_eq!(report.spans.len(), 3);
    }
}
