use cfd_visual::{BatchDriver, RunConfig};
use clap::Parser;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let config = RunConfig::parse();
    let driver = BatchDriver::from_config(config)?;
    println!(
        "Rendering {} into {:?} (logs in {:?})",
        driver.config().name,
        driver.config().output_root(),
        driver.config().log_dir
    );

    let now = Instant::now();
    let summary = driver.run()?;
    println!(
        "{} images, {} animations rendered ({} outputs already present) in {}s",
        summary.stills,
        summary.animations,
        summary.skipped,
        now.elapsed().as_secs()
    );
    Ok(())
}
