// src/main.rs

use anyhow::bail;
use watchrun::{cli, logging};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("watchrun error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;

    let project_root = match args.project_root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    // Entry validation is upstream of the core: a missing target is the one
    // fatal startup error.
    if !args.entry.is_file() {
        bail!("entry target not found: {}", args.entry.display());
    }

    watchrun::start_watcher(args.entry, project_root).await
}
