mod csaw;
mod factor;
mod merged;
mod spike_in;

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;
use seqnado_core::{Context, design};
use tracing::info;

pub use self::{csaw::csaw, factor::factor, merged::merged, spike_in::spike_in};
use crate::cli::RunArgs;

fn build_context(args: &RunArgs) -> anyhow::Result<Context> {
    let src = &args.design;

    info!(?src, "reading design");

    let reader = File::open(src)
        .map(BufReader::new)
        .with_context(|| format!("failed to open {}", src.display()))?;

    let design = design::read(reader)?;

    info!(sample_count = design.samples().len(), "read design");

    Ok(Context::new(&args.output_dir, design))
}

fn write<F>(dst: &Path, f: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = File::create(dst).map(BufWriter::new)?;
    f(&mut writer)?;
    writer.flush()?;

    info!(?dst, "wrote output");

    Ok(())
}
