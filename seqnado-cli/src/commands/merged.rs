use seqnado_core::normalization::merged::{self as normalization, Pooling};
use tracing::warn;

use super::build_context;
use crate::cli::merged;

pub fn merged(args: merged::Args) -> anyhow::Result<()> {
    let ctx = build_context(&args.run)?;

    let scale_factor = normalization::calculate_scale_factor(
        &ctx,
        &args.group,
        &args.method,
        args.grouping.into(),
        args.negative,
    )?;

    if scale_factor.pooling() != Pooling::Exact {
        warn!(pooling = ?scale_factor.pooling(), "merged scale factor is not exact");
    }

    println!("{}", scale_factor.value());

    Ok(())
}
