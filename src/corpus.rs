use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::scoring::GoldLabel;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GoldItem {
    Identifier(String),
    Form { document_type: String },
}

impl GoldItem {
    fn into_identifier(self) -> String {
        match self {
            Self::Identifier(id) | Self::Form { document_type: id } => id.trim().to_string(),
        }
    }
}

pub fn parse_gold_label(raw: &str) -> Result<GoldLabel> {
    let items: Vec<GoldItem> = serde_json::from_str(raw)?;
    Ok(items
        .into_iter()
        .map(GoldItem::into_identifier)
        .filter(|id| !id.is_empty())
        .collect())
}

pub fn load_gold_label(path: &Path) -> Result<GoldLabel> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_gold_label(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// PDFs in `dir` (not recursive), sorted by path.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    discover_with_extension(dir, "pdf")
}

/// Gold files in `dir`, keyed by file stem.
pub fn discover_gold_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut gold = BTreeMap::new();
    for path in discover_with_extension(dir, "json")? {
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            gold.insert(stem.to_string(), path.clone());
        }
    }
    Ok(gold)
}

fn discover_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    let entries = fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);

        if matches {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gold_label_accepts_identifier_list() {
        let label = parse_gold_label(r#"["f8949", "1040f", "f8949"]"#).unwrap();
        assert_eq!(label.forms().len(), 2);
        assert!(label.forms().contains("1040f"));
    }

    #[test]
    fn gold_label_accepts_span_objects() {
        let raw = serde_json::json!([
            {"document_type": "1040f", "start_page": 1, "end_page": 2},
            {"document_type": "f1040sd", "start_page": 3, "end_page": 3}
        ])
        .to_string();

        let label = parse_gold_label(&raw).unwrap();
        assert_eq!(
            label.forms().iter().cloned().collect::<Vec<_>>(),
            vec!["1040f".to_string(), "f1040sd".to_string()]
        );
    }

    #[test]
    fn empty_gold_file_is_an_empty_label() {
        assert!(parse_gold_label("[]").unwrap().forms().is_empty());
        assert!(parse_gold_label(r#"{"forms": []}"#).is_err());
    }

    #[test]
    fn discovery_filters_by_extension_and_pairs_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF-1.7").unwrap();
        fs::write(dir.path().join("a.PDF"), b"%PDF-1.7").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignore").unwrap();
        fs::write(dir.path().join("a.json"), b"[\"1040f\"]").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let pdfs = discover_pdfs(dir.path()).unwrap();
        let names = pdfs
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);

        let gold = discover_gold_files(dir.path()).unwrap();
        assert_eq!(gold.len(), 1);
        let label = load_gold_label(&gold["a"]).unwrap();
        assert!(label.forms().contains("1040f"));
        assert_eq!(file_stem(&pdfs[0]).as_deref(), Some("a"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_pdfs(&dir.path().join("missing")).is_err());
    }
}
