use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dal",
    about = "Document Anchor Ledger: store documents and anchor their fingerprints",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the DAL HTTP server
    Serve(ServeArgs),
    /// Submit a document for a subject to a running server
    Submit(SubmitArgs),
    /// Print the memory-store (BLAKE3) fingerprint of a file.
    ///
    /// An HTTP content store keys documents by its own CID, so this value
    /// only matches `submit` output when the server uses `store.backend = "memory"`.
    Fingerprint(FingerprintArgs),
    /// Print the default configuration as TOML
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override `server.bind_addr`
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct SubmitArgs {
    #[arg(short, long)]
    pub subject: String,
    #[arg(short, long)]
    pub file: PathBuf,
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    pub server: String,
    /// Declared media type; guessed from the file extension when absent
    #[arg(long)]
    pub media_type: Option<String>,
}

#[derive(Args)]
pub struct FingerprintArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ConfigArgs {}
