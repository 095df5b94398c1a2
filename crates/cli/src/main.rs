// ABOUTME: CLI for parsing feeds and OPDS catalogs with the folio feed parser.
// ABOUTME: Fetches each target from URL, file, or stdin and prints JSON for verification.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use folio_feed::{parse_catalog, parse_description, parse_feed, parse_feed_with, Dialect};
use serde_json::json;
use url::Url;

/// Parse one or more feed, catalog, or search description documents and output JSON.
#[derive(Parser, Debug)]
#[command(name = "folio-cli")]
#[command(about = "Parse feeds and OPDS catalogs with folio and print JSON", long_about = None)]
struct Args {
    /// Document URL(s) (http/https) or local file paths. Use "-" to read one document from stdin.
    #[arg(required = true)]
    targets: Vec<String>,

    /// Document kind. "auto" sniffs the root element (OPDS catalogs look like
    /// Atom at the root, so ask for opds explicitly).
    #[arg(long, value_enum, default_value = "auto")]
    kind: Kind,

    /// Base URL for resolving relative links (only valid when a single target
    /// is provided). Remote targets default to their own URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Rss,
    Atom,
    Opds,
    Opensearch,
    Auto,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.targets.len() > 1 && args.base_url.is_some() {
        bail!("--base-url is only valid when parsing a single target");
    }
    let base_override = args
        .base_url
        .as_deref()
        .map(|raw| Url::parse(raw).with_context(|| format!("invalid --base-url: {raw}")))
        .transpose()?;

    let mut results = Vec::new();

    for target in &args.targets {
        // Remote targets double as the base for relative links; file and
        // stdin targets have no base unless --base-url supplies one.
        let base = base_override.clone().or_else(|| Url::parse(target).ok());

        match load_bytes(target).and_then(|bytes| parse_target(&bytes, args.kind, base.as_ref())) {
            Ok(document) => results.push(json!({
                "target": target,
                "ok": true,
                "document": document,
                "error": null
            })),
            Err(err) => results.push(json!({
                "target": target,
                "ok": false,
                "document": null,
                "error": err.to_string()
            })),
        }
    }

    // Output format:
    // - Single target and ok => emit the parsed document directly
    // - Otherwise emit an envelope with per-target results and counts
    let output = if args.targets.len() == 1 {
        if let Some(first) = results.first() {
            if first.get("ok").and_then(|v| v.as_bool()) == Some(true) {
                first.get("document").cloned().unwrap_or_else(|| json!({}))
            } else {
                json!({ "documents": results, "total": results.len(), "parsed": 0, "failed": 1 })
            }
        } else {
            json!({})
        }
    } else {
        let parsed = results
            .iter()
            .filter(|r| r.get("ok").and_then(|v| v.as_bool()) == Some(true))
            .count();
        let failed = results.len() - parsed;
        json!({
            "documents": results,
            "total": results.len(),
            "parsed": parsed,
            "failed": failed
        })
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn parse_target(bytes: &[u8], kind: Kind, base: Option<&Url>) -> Result<serde_json::Value> {
    let value = match kind {
        Kind::Rss => serde_json::to_value(parse_feed_with(bytes, Dialect::Rss, base)?)?,
        Kind::Atom => serde_json::to_value(parse_feed_with(bytes, Dialect::Atom, base)?)?,
        Kind::Opds => serde_json::to_value(parse_catalog(bytes, base)?)?,
        Kind::Opensearch => serde_json::to_value(parse_description(bytes)?)?,
        Kind::Auto => serde_json::to_value(parse_feed(bytes, base)?)?,
    };
    Ok(value)
}

fn load_bytes(target: &str) -> Result<Vec<u8>> {
    if target == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let resp = reqwest::blocking::get(target)?.error_for_status()?;
        let bytes = resp.bytes()?;
        return Ok(bytes.to_vec());
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    Ok(fs::read(path)?)
}
