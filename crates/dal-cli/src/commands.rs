use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use dal_server::{DalServer, ErrorBody, NodeConfig, SubmitResponse};
use dal_types::Fingerprint;
use url::Url;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Submit(args) => cmd_submit(args, &cli.format).await,
        Command::Fingerprint(args) => cmd_fingerprint(args, &cli.format),
        Command::Config(_) => cmd_config(),
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    println!(
        "{} DAL server on {} (store: {:?}, network: {})",
        "▶".green().bold(),
        config.server.bind_addr.to_string().bold(),
        config.store.backend,
        config.ledger.network_id
    );
    DalServer::new(config)?.serve().await?;
    Ok(())
}

async fn cmd_submit(args: SubmitArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let media_type = args
        .media_type
        .clone()
        .unwrap_or_else(|| guess_media_type(&args.file).to_string());
    let url = submit_url(&args.server, &args.subject)?;
    tracing::debug!(%url, bytes = bytes.len(), %media_type, "submitting document");

    let client = reqwest::Client::new();
    let submitted = post_document(&client, url, bytes, &media_type).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&submitted)?),
        OutputFormat::Text => {
            println!("{} Document anchored for {}", "✓".green().bold(), submitted.subject.as_str().yellow());
            println!("  Fingerprint: {}", submitted.fingerprint.as_str().cyan());
            println!("  URI: {}", submitted.uri.blue());
            println!("  Transaction: {}", submitted.receipt.tx_hash.to_hex().dimmed());
            println!("  Block: {}", submitted.receipt.block);
            println!("  Submitter: {}", submitted.submitter.to_hex().dimmed());
            println!("  Elapsed: {} ms", submitted.elapsed_ms);
        }
    }
    Ok(())
}

fn cmd_fingerprint(args: FingerprintArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    let fingerprint = Fingerprint::from_content(&bytes);
    match format {
        OutputFormat::Json => {
            println!("{}", fingerprint_report(&args.path, &fingerprint, bytes.len()))
        }
        OutputFormat::Text => println!(
            "{}  {}  {}",
            "local".dimmed(),
            fingerprint.as_str().cyan(),
            args.path.display()
        ),
    }
    Ok(())
}

/// JSON output of `dal fingerprint`. The value is the memory store's
/// BLAKE3 key; an HTTP store answers `submit` with its own CID instead.
pub fn fingerprint_report(
    path: &Path,
    fingerprint: &Fingerprint,
    bytes: usize,
) -> serde_json::Value {
    serde_json::json!({
        "path": path.display().to_string(),
        "local_fingerprint": fingerprint,
        "scheme": "blake3-multihash",
        "bytes": bytes,
    })
}

fn cmd_config() -> anyhow::Result<()> {
    print!("{}", NodeConfig::default().to_toml_string()?);
    Ok(())
}

/// `<server>/v1/subjects/<subject>/documents`, with the subject encoded as
/// a single path segment.
pub fn submit_url(server: &str, subject: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(server).with_context(|| format!("invalid server URL {server:?}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("server URL {server:?} cannot carry a path"))?
        .pop_if_empty()
        .extend(["v1", "subjects", subject, "documents"]);
    Ok(url)
}

pub async fn post_document(
    client: &reqwest::Client,
    url: Url,
    bytes: Vec<u8>,
    media_type: &str,
) -> anyhow::Result<SubmitResponse> {
    let response = client
        .post(url.clone())
        .header(reqwest::header::CONTENT_TYPE, media_type)
        .body(bytes)
        .send()
        .await
        .with_context(|| format!("sending document to {url}"))?;

    let status = response.status();
    let body = response.bytes().await?;
    if status.is_success() {
        return serde_json::from_slice(&body).context("decoding submission response");
    }
    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(error) => {
            let mut message = format!("{} ({}): {}", error.error_kind, status, error.message);
            if let Some(fingerprint) = &error.fingerprint {
                message.push_str(&format!("; document stored as {fingerprint}"));
            }
            if error.retryable {
                message.push_str("; retry later");
            }
            bail!(message)
        }
        Err(_) => bail!("server returned {status}: {}", String::from_utf8_lossy(&body)),
    }
}

/// Media type from the file extension, `application/octet-stream` otherwise.
pub fn guess_media_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("dcm") => "application/dicom",
        _ => "application/octet-stream",
    }
}
