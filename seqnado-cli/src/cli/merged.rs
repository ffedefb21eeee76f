use clap::{Parser, ValueEnum};
use seqnado_core::{Grouping as CoreGrouping, NormalizationMethod};

use super::RunArgs;

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum Grouping {
    #[default]
    Consensus,
    Scaling,
}

impl From<Grouping> for CoreGrouping {
    fn from(grouping: Grouping) -> Self {
        match grouping {
            Grouping::Consensus => Self::Consensus,
            Grouping::Scaling => Self::Scaling,
        }
    }
}

#[derive(Parser)]
pub struct Args {
    #[command(flatten)]
    pub run: RunArgs,

    /// Merged group name.
    #[arg(long)]
    pub group: String,

    /// Normalization method.
    #[arg(long, default_value = "csaw")]
    pub method: NormalizationMethod,

    /// Grouping the merged group belongs to.
    #[arg(long, value_enum, default_value_t = Grouping::Consensus)]
    pub grouping: Grouping,

    /// Negate the factor (minus strand).
    #[arg(long)]
    pub negative: bool,
}
