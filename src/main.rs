use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use patch_digest::config::Config;
use patch_digest::digest::{self, PatchInput};
use patch_digest::report::{self, OutputFormat};

/// patch-digest — maps unified-diff patches to changed lines and the
/// identifiers on them, addressed by zero-based (line, character).
#[derive(Parser, Debug)]
#[command(name = "patch-digest", version, about)]
struct Cli {
    /// Patch files to digest. Reads one patch from stdin when omitted.
    patches: Vec<PathBuf>,

    /// Source language of the patched files (e.g. Python, Rust).
    ///
    /// Overrides CODE_LANGUAGE and .patch-digest.toml.
    #[arg(short, long)]
    language: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Optional output file path instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let _main_span = info_span!("patch_digest", patches = cli.patches.len()).entered();

    info!("loading configuration");
    let config = Config::load()?.with_language(cli.language.clone());
    let language = config.language()?;
    debug!(%language, pretty = config.output.pretty, "resolved configuration");

    info!("reading patches");
    let inputs = read_inputs(&cli.patches).await?;
    let bytes: usize = inputs.iter().map(|i| i.bytes.len()).sum();
    debug!(inputs = inputs.len(), bytes, "read patches");

    info!("digesting patches");
    let digests = digest::digest_all(inputs, language).await?;

    let built_report = report::build(digests);
    report::output(
        &built_report,
        cli.format,
        config.output.pretty,
        cli.output.as_deref(),
    )?;
    info!(
        hunks = built_report.hunks,
        additions = built_report.additions,
        deletions = built_report.deletions,
        "done"
    );

    Ok(())
}

async fn read_inputs(paths: &[PathBuf]) -> std::io::Result<Vec<PatchInput>> {
    if paths.is_empty() {
        let mut bytes = Vec::new();
        tokio::io::stdin().read_to_end(&mut bytes).await?;
        return Ok(vec![PatchInput {
            name: "<stdin>".to_string(),
            bytes,
        }]);
    }

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        inputs.push(read_patch(path).await?);
    }
    Ok(inputs)
}

async fn read_patch(path: &Path) -> std::io::Result<PatchInput> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
    })?;
    Ok(PatchInput {
        name: path.display().to_string(),
        bytes,
    })
}
