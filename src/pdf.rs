use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::document::{Document, Page, PageSlot, TextBlock};
use crate::error::PageReadError;

/// Parses the XHTML word list that `pdftotext -bbox` writes.
pub struct BboxParser {
    page_regex: Regex,
    word_regex: Regex,
}

impl BboxParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            page_regex: Regex::new(
                r#"(?s)<page\s+width="([^"]*)"\s+height="([^"]*)"\s*>(.*?)</page>"#,
            )
            .context("failed to compile bbox page regex")?,
            word_regex: Regex::new(
                r#"(?s)<word\s+xMin="([^"]*)"\s+yMin="([^"]*)"\s+xMax="([^"]*)"\s+yMax="([^"]*)"\s*>(.*?)</word>"#,
            )
            .context("failed to compile bbox word regex")?,
        })
    }

    pub fn parse(&self, document_name: &str, raw: &str) -> Document {
        let pages = self
            .page_regex
            .captures_iter(raw)
            .enumerate()
            .map(|(index, captures)| {
                let width = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
                let height = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
                let body = captures.get(3).map(|m| m.as_str()).unwrap_or_default();
                self.parse_page(document_name, index, width, height, body)
            })
            .collect::<Vec<PageSlot>>();

        Document::new(document_name, pages)
    }

    fn parse_page(
        &self,
        document_name: &str,
        index: usize,
        width: &str,
        height: &str,
        body: &str,
    ) -> PageSlot {
        let page_error = |reason: String| PageReadError {
            document: document_name.to_string(),
            page_number: index + 1,
            reason,
        };

        let width = parse_dimension(width)
            .ok_or_else(|| page_error(format!("invalid page width '{width}'")))?;
        let height = parse_dimension(height)
            .ok_or_else(|| page_error(format!("invalid page height '{height}'")))?;

        let mut blocks = Vec::new();
        for captures in self.word_regex.captures_iter(body) {
            let mut coordinates = [0.0_f64; 4];
            for (slot, group) in coordinates.iter_mut().zip(1..=4) {
                let raw = captures.get(group).map(|m| m.as_str()).unwrap_or_default();
                *slot = parse_coordinate(raw)
                    .ok_or_else(|| page_error(format!("invalid word coordinate '{raw}'")))?;
            }

            let text = captures
                .get(5)
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            if text.trim().is_empty() {
                continue;
            }

            let [x_min, y_min, x_max, y_max] = coordinates;
            blocks.push(TextBlock::new(text, x_min, y_min, x_max, y_max));
        }

        Ok(Page::new(index, width, height, blocks))
    }
}

fn parse_dimension(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn decode_entities(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn command_available(program: &str) -> bool {
    Command::new(program).arg("-v").output().is_ok()
}

pub fn pdftotext_version() -> Option<String> {
    let output = Command::new("pdftotext").arg("-v").output().ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.trim().to_string()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

pub fn decode_pdf(parser: &BboxParser, pdf_path: &Path) -> Result<Document> {
    let document_name = pdf_path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", pdf_path.display()))?;

    let output = Command::new("pdftotext")
        .arg("-bbox")
        .arg("-enc")
        .arg("UTF-8")
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
    Ok(parser.parse(&document_name, &raw))
}
