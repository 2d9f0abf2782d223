use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::segment::{DEFAULT_TITLE_ZONE_HEIGHT, DEFAULT_TITLE_ZONE_WIDTH};

#[derive(Parser, Debug)]
#[command(
    name = "taxforms",
    version,
    about = "Tax form detection and scoring for multi-page return PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Detect(DetectArgs),
    Evaluate(EvaluateArgs),
    Catalog(CatalogArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long = "vocabulary")]
    pub vocabulary: Vec<String>,

    #[arg(long)]
    pub vocabulary_path: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_TITLE_ZONE_WIDTH)]
    pub title_zone_width: f64,

    #[arg(long, default_value_t = DEFAULT_TITLE_ZONE_HEIGHT)]
    pub title_zone_height: f64,

    #[arg(long)]
    pub jobs: Option<usize>,

    #[arg(long, default_value_t = false)]
    pub sequential: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    pub pdf_path: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(long, default_value_t = false)]
    pub all_forms: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    pub pdf_dir: PathBuf,

    pub gold_dir: PathBuf,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub skip_unlabeled: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
