use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use obj_baker::config::{BakeConfig, CliArgs};
use obj_baker::pipeline::Pipeline;

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("obj_baker=debug")
    } else {
        EnvFilter::new("obj_baker=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: BakeConfig = args.into();

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure rayon thread pool")?;
    }

    match Pipeline::run(&config) {
        Ok(summary) => {
            match summary.atlas_size {
                Some((w, h)) => println!(
                    "Done: {} textures baked into a {w}x{h} atlas in {:.2}s",
                    summary.materials_packed,
                    summary.duration.as_secs_f64()
                ),
                None => println!(
                    "Done: no textures to bake, mesh copied in {:.2}s",
                    summary.duration.as_secs_f64()
                ),
            }
            Ok(())
        }
        Err(e) => {
            error!(%e, "Bake failed");
            Err(anyhow::anyhow!(e)).context("bake-obj failed")
        }
    }
}
