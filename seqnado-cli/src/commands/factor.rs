use anyhow::bail;
use seqnado_core::{Context, Design, normalization};

use crate::cli::factor;

pub fn factor(args: factor::Args) -> anyhow::Result<()> {
    let ctx = Context::new(&args.output_dir, Design::default());

    let src = match (&args.method, &args.group) {
        (Some(method), _) => ctx.normalisation_factors_path(method),
        (None, Some(group)) => ctx.scaling_factors_path(group),
        (None, None) => bail!("missing factor source"),
    };

    let scale_factor = normalization::sample_scale_factor(src, &args.sample, args.negative)?;

    println!("{scale_factor}");

    Ok(())
}
