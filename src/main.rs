use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use file_cache_server::config::{Cli, Command};
use file_cache_server::{FileServer, FsSource, GeneratorConfig, ServerConfig, generate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level)?)
        .with_thread_names(true)
        .init();

    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig::from(args);
            let server = FileServer::bind(config, Arc::new(FsSource))?;
            server.run()?;
        }
        Command::Generate(args) => {
            let config = GeneratorConfig::from(args);
            info!(dir = %config.dir.display(), files = config.files, "generating files");
            let paths = generate(&config)?;
            info!(count = paths.len(), "done");
        }
    }

    Ok(())
}
