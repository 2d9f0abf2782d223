use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::catalog::PatternCatalog;
use crate::cli::EngineArgs;
use crate::pipeline::Extractor;
use crate::segment::TitleZone;
use crate::vocabulary::Vocabulary;

/// Everything the engines read. Built once per command and shared read-only.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub catalog: PatternCatalog,
    pub vocabulary: Vocabulary,
    pub title_zone: TitleZone,
    pub parallel: bool,
}

impl EngineConfig {
    pub fn from_args(args: &EngineArgs) -> Result<Self> {
        let catalog = load_catalog(args.catalog_path.as_deref())?;
        let vocabulary = load_vocabulary(args.vocabulary_path.as_deref(), &args.vocabulary)?;
        let title_zone = TitleZone::new(args.title_zone_width, args.title_zone_height)
            .context("invalid title zone configuration")?;

        for form in vocabulary.iter() {
            if !catalog.contains(form) {
                warn!(form = %form, "vocabulary form has no catalog pattern and can only score as a false negative");
            }
        }
        info!(
            forms = catalog.len(),
            vocabulary = vocabulary.len(),
            "engine configuration ready"
        );

        if let Some(jobs) = args.jobs {
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
                .context("failed to configure worker pool")?;
        }

        Ok(Self {
            catalog,
            vocabulary,
            title_zone,
            parallel: !args.sequential,
        })
    }

    pub fn extractor(&self) -> Extractor<'_> {
        Extractor::new(&self.catalog)
            .title_zone(self.title_zone)
            .parallel(self.parallel)
    }
}

pub fn load_catalog(path: Option<&Path>) -> Result<PatternCatalog> {
    let Some(path) = path else {
        return PatternCatalog::builtin().context("builtin catalog failed to compile");
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let catalog = PatternCatalog::from_json_str(&raw)
        .with_context(|| format!("failed to load catalog {}", path.display()))?;

    info!(path = %path.display(), forms = catalog.len(), "loaded pattern catalog");
    Ok(catalog)
}

pub fn load_vocabulary(path: Option<&Path>, inline: &[String]) -> Result<Vocabulary> {
    if let Some(path) = path {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let forms: Vec<String> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        return Vocabulary::new(forms.iter().chain(inline.iter()))
            .with_context(|| format!("invalid vocabulary {}", path.display()));
    }

    if inline.is_empty() {
        return Ok(Vocabulary::desired_forms());
    }

    Ok(Vocabulary::new(inline)?)
}
