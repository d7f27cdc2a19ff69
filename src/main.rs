//! osbench CLI entry point

use anyhow::Result;
use osbench::config::cli::Cli;
use osbench::coordinator::Coordinator;
use osbench::engine::mem::MemStore;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = Arc::new(cli.into_config());

    println!("osbench v{}", env!("CARGO_PKG_VERSION"));
    println!("  size        {}", config.size);
    println!("  block-size  {}", config.block_size);
    println!("  repeats     {}", config.repeats);
    println!("  threads     {}", config.threads);
    println!("  multi-object {}", config.multi_object);
    println!();

    let engine = Arc::new(MemStore::new());
    let coordinator = Coordinator::new(Arc::clone(&config), engine);
    let report = coordinator.run()?;

    println!("{report}");
    Ok(())
}
