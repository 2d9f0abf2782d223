use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::catalog::PatternCatalog;
use crate::cli::CatalogArgs;
use crate::config::load_catalog;
use crate::util::write_json_stdout;
use crate::vocabulary::Vocabulary;

#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub id: String,
    pub rule_count: usize,
    pub scored: bool,
}

pub fn run(args: CatalogArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog_path.as_deref())?;
    info!(forms = catalog.len(), "catalog is valid");

    let listing = list_catalog(&catalog, &Vocabulary::desired_forms());
    if args.json {
        return write_json_stdout(&listing);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for entry in &listing {
        let marker = if entry.scored { "*" } else { " " };
        writeln!(output, "{marker} {:<12} rules={}", entry.id, entry.rule_count)?;
    }
    writeln!(output, "(* = in default evaluation vocabulary)")?;
    output.flush()?;
    Ok(())
}

pub fn list_catalog(catalog: &PatternCatalog, vocabulary: &Vocabulary) -> Vec<CatalogListing> {
    catalog
        .forms()
        .iter()
        .map(|form| CatalogListing {
            id: form.id.clone(),
            rule_count: form.rules.len(),
            scored: vocabulary.contains(&form.id),
        })
        .collect()
}
