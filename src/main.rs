use anyhow::Result;
use clap::Parser;
use sb3mask_rs_core::cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    sb3mask_rs_core::run_cli(&args)
}
