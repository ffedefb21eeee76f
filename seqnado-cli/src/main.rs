use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod cli;
mod commands;

use std::io;

use clap::Parser;

use self::{
    cli::{Cli, Command},
    commands::{csaw, factor, merged, spike_in},
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();

    match cli.command {
        Command::Csaw(args) => csaw(args)?,
        Command::SpikeIn(args) => spike_in(args)?,
        Command::Factor(args) => factor(args)?,
        Command::Merged(args) => merged(args)?,
    }

    Ok(())
}
