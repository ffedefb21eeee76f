use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use seqnado_core::NormalizationMethod;

#[derive(Parser)]
#[command(group(ArgGroup::new("source").required(true).args(["method", "group"])))]
pub struct Args {
    /// Output directory of the run.
    #[arg(long, env = "SEQNADO_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Read the factor from the normalization factors of this method.
    #[arg(long)]
    pub method: Option<NormalizationMethod>,

    /// Read the factor from the scaling factors of this group.
    #[arg(long)]
    pub group: Option<String>,

    /// Negate the factor (minus strand).
    #[arg(long)]
    pub negative: bool,

    /// Sample uid.
    pub sample: String,
}
