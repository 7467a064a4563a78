use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use axterm::protocol::RemoteNode;
use axterm::render::theme::Theme;
use axterm::render::{context::RenderContext, wrap, Renderer};
use axterm::tree::{Mirror, ROOT_ROLE};
use axterm::ui;

/// Render an accessibility-tree snapshot as text
#[derive(Parser, Debug)]
#[command(name = "axterm")]
#[command(about = "Renders a JSON accessibility-tree snapshot as a text page", long_about = None)]
#[command(version)]
struct Args {
    /// Snapshot file: a JSON array of accessibility nodes. Use "-" for stdin.
    #[arg(value_name = "SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Wrap output to this many columns (default: no wrapping)
    #[arg(long, value_name = "COLS")]
    width: Option<usize>,

    /// Emit ANSI colors
    #[arg(long)]
    color: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long)]
    debug: bool,
}

fn read_snapshot(path: Option<&PathBuf>) -> Result<String> {
    match path {
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read snapshot from stdin")?;
            Ok(buf)
        }
        Some(path) if path.as_os_str() == "-" => read_snapshot(None),
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot from {}", path.display())),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug { "axterm=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let raw = read_snapshot(args.snapshot.as_ref())?;
    let nodes: Vec<RemoteNode> =
        serde_json::from_str(&raw).context("Snapshot is not a JSON array of nodes")?;
    if nodes.is_empty() {
        bail!("Snapshot contains no nodes");
    }

    // The document root is the root-role node; fall back to the first node
    // for hand-written fixtures.
    let root_id = nodes
        .iter()
        .find(|n| n.role == ROOT_ROLE)
        .unwrap_or(&nodes[0])
        .id
        .clone();
    tracing::debug!(nodes = nodes.len(), root = %root_id, "loaded snapshot");

    let mirror = Mirror::build(nodes.into_iter().map(std::sync::Arc::new), root_id);
    let Some(root) = ui::build_root(&mirror) else {
        bail!("Snapshot renders to nothing");
    };

    let theme = if args.color {
        Theme::ansi()
    } else {
        Theme::plain()
    };
    let renderer = Renderer::new(&root, RenderContext::new(theme));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in wrap::wrap_frame(renderer, args.width) {
        writeln!(out, "{line}").context("Failed to write output")?;
    }
    Ok(())
}
