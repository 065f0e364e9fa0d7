use std::path::Path;

use anyhow::Result;
use clap::Parser;
use meshvox::settings::{self, CliArgs};
use meshvox::sweep::Sweep;

fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let settings = settings::load_config_with(&args)?;

    if args.dump_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    log::info!("{}", settings);

    let output_dir = settings.output_dir.clone();
    let mut sweep = Sweep::new(settings)?;

    sweep.run()?;
    sweep.writeup(Path::new(&output_dir))?;

    Ok(())
}
