use std::path::PathBuf;

use clap::Parser;

use super::RunArgs;

#[derive(Parser)]
pub struct Args {
    #[command(flatten)]
    pub run: RunArgs,

    /// Scaling or consensus group name.
    ///
    /// Scaling groups take precedence. If neither has a group with this name,
    /// all samples in the design are scaled together.
    #[arg(long)]
    pub group: String,

    /// Output scaling factors (TSV).
    ///
    /// By default, this is `<output-dir>/resources/<group>_scaling_factors.tsv`.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Input binned read counts (featureCounts).
    pub counts: PathBuf,
}
