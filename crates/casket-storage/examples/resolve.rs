//! Resolves one file by name from a local installation or a CDN root.
//!
//! ```text
//! cargo run --example resolve -- --install "/games/World of Warcraft" \
//!     --name "DBFilesClient\Item.dbc" --output Item.dbc
//!
//! cargo run --example resolve -- --cdn http://cdn.example.com/tpr/wow \
//!     --build-config <hex> --cdn-config <hex> --cache-dir ./cache \
//!     --name "DBFilesClient\Item.dbc"
//! ```
use anyhow::{Context, bail};
use casket_crypto::Key;
use casket_storage::{ContextConfig, Locale, LocalContext, RemoteContext};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "resolve")]
struct Cli {
    /// Local installation directory (contains `.build.info`).
    #[clap(long, conflicts_with = "cdn")]
    pub install: Option<PathBuf>,

    /// CDN root, such as `http://host/tpr/wow`.
    #[clap(long, requires_all = ["build_config", "cdn_config"])]
    pub cdn: Option<Url>,

    /// Build configuration key for `--cdn`.
    #[clap(long)]
    pub build_config: Option<Key>,

    /// CDN configuration key for `--cdn`.
    #[clap(long)]
    pub cdn_config: Option<Key>,

    /// Cache remote reads in this directory.
    #[clap(long)]
    pub cache_dir: Option<PathBuf>,

    /// Locale code, such as `enUS`.
    #[clap(long, default_value = "enUS")]
    pub locale: Locale,

    /// File name inside the archive.
    #[clap(long)]
    pub name: String,

    /// Where to write the content; prints a summary when absent.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Cli::parse();

    let mut config = ContextConfig::default().with_locale(args.locale);
    if let Some(dir) = &args.cache_dir {
        config = config.with_cache_dir(dir);
    }

    let data = if let Some(install) = args.install {
        LocalContext::open_local(install, config)
            .resolve_by_name(&args.name)
            .await?
    } else if let Some(cdn) = args.cdn {
        let build = args.build_config.context("--build-config is required")?;
        let cdn_config = args.cdn_config.context("--cdn-config is required")?;
        RemoteContext::open_remote(cdn, build, cdn_config, config)?
            .resolve_by_name(&args.name)
            .await?
    } else {
        bail!("one of --install or --cdn is required");
    };

    let Some(data) = data else {
        bail!("{} is not in the archive", args.name);
    };

    match args.output {
        Some(path) => {
            std::fs::write(&path, &data)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(bytes = data.len(), path = %path.display(), "wrote file");
        }
        None => println!("{}: {} bytes, md5 {}", args.name, data.len(), Key::from_data(&data)),
    }
    Ok(())
}
