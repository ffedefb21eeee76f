use anyhow::Context as _;
use seqnado_core::{counts, fs, normalization::library_size, scaling_factors};
use tracing::info;

use super::{build_context, write};
use crate::cli::csaw;

pub fn csaw(args: csaw::Args) -> anyhow::Result<()> {
    let ctx = build_context(&args.run)?;

    let src = &args.counts;

    info!(?src, "reading counts");

    let mut reader =
        fs::open(src).with_context(|| format!("failed to open {}", src.display()))?;
    let feature_counts = counts::reader::read(&mut reader)?;

    info!(
        sample_count = feature_counts.sample_names().len(),
        bin_count = feature_counts.counts().nrows(),
        "read counts"
    );

    let factors =
        library_size::calculate_scaling_factors(&feature_counts, ctx.design(), &args.group)?;

    let dst = args
        .output
        .unwrap_or_else(|| ctx.scaling_factors_path(&args.group));

    write(&dst, |writer| scaling_factors::write_tsv(writer, &factors))?;

    info!("done");

    Ok(())
}
