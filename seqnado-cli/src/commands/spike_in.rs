use seqnado_core::{normalization::spike_in as normalization, scaling_factors};
use tracing::info;

use super::{build_context, write};
use crate::cli::spike_in;

pub fn spike_in(args: spike_in::Args) -> anyhow::Result<()> {
    let ctx = build_context(&args.run)?;
    let method = &args.method;

    let factors = normalization::calculate_scaling_factors(&ctx, method)?;

    let dst = args
        .output
        .unwrap_or_else(|| ctx.normalisation_factors_path(method));

    write(&dst, |writer| scaling_factors::write_json(writer, &factors))?;

    info!("done");

    Ok(())
}
