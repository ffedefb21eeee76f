use std::path::PathBuf;

use clap::Parser;
use seqnado_core::NormalizationMethod;

use super::RunArgs;

#[derive(Parser)]
pub struct Args {
    #[command(flatten)]
    pub run: RunArgs,

    /// Normalization method (orlando or with_input).
    #[arg(long)]
    pub method: NormalizationMethod,

    /// Output normalization factors (JSON).
    ///
    /// By default, this is `<output-dir>/resources/<method>/normalisation_factors.json`.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
