pub mod csaw;
pub mod factor;
pub mod merged;
pub mod spike_in;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Subcommand)]
pub enum Command {
    /// Calculate library size scaling factors of a group from binned counts.
    Csaw(csaw::Args),
    /// Calculate per-sample spike-in normalization factors.
    SpikeIn(spike_in::Args),
    /// Print the scaling factor of a sample.
    Factor(factor::Args),
    /// Print the scaling factor of a merged group.
    Merged(merged::Args),
}

#[derive(Parser)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct RunArgs {
    /// Output directory of the run.
    #[arg(long, env = "SEQNADO_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Input design table (CSV).
    #[arg(long)]
    pub design: PathBuf,
}
