//! Command line surface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::generator::GeneratorConfig;
use crate::server::ServerConfig;

#[derive(Debug, Parser)]
#[command(name = "file-cache-server")]
#[command(about = "Concurrent file server backed by a bounded LRU cache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Log filter directive (trace, debug, info, warn, error, or a full EnvFilter spec)
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve sample files over TCP
    Serve(ServeArgs),
    /// Write the sample files the server hands out
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8010")]
    pub addr: SocketAddr,

    /// Number of client worker threads
    #[arg(short, long, default_value_t = 5)]
    pub workers: usize,

    /// Maximum number of files held in the cache
    #[arg(short, long, default_value_t = 3)]
    pub capacity: usize,

    /// Directory holding file_<id>.txt
    #[arg(short = 'd', long, default_value = "files")]
    pub files_dir: PathBuf,

    /// Number of sample files to choose from
    #[arg(short = 'n', long, default_value_t = 10)]
    pub file_count: u32,

    /// Exit after serving this many connections
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Exit after this many seconds without a new connection; 0 waits forever
    #[arg(long, default_value_t = 70)]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Output directory
    #[arg(short = 'd', long, default_value = "files")]
    pub dir: PathBuf,

    /// Number of files to write
    #[arg(short = 'n', long, default_value_t = 10)]
    pub files: u32,

    /// Lines per file
    #[arg(short, long, default_value_t = 40_000)]
    pub lines: usize,

    /// Characters per line, excluding the newline
    #[arg(long, default_value_t = 50)]
    pub width: usize,

    /// Writer threads
    #[arg(short, long, default_value_t = 5)]
    pub threads: usize,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            addr: args.addr,
            workers: args.workers,
            cache_capacity: args.capacity,
            files_dir: args.files_dir,
            file_count: args.file_count,
            max_connections: args.max_connections,
            idle_timeout: (args.idle_timeout_secs > 0)
                .then(|| Duration::from_secs(args.idle_timeout_secs)),
        }
    }
}

impl From<GenerateArgs> for GeneratorConfig {
    fn from(args: GenerateArgs) -> Self {
        Self {
            dir: args.dir,
            files: args.files,
            lines_per_file: args.lines,
            line_width: args.width,
            threads: args.threads,
        }
    }
}
