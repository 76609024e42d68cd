mod config;
mod render;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use config::CliConfig;
use mettakg_explore_client::HttpExploreClient;
use mettakg_explorer::ExplorerEvent;
use mettakg_explorer::LeafExpansion;
use mettakg_explorer::TreeExplorer;
use render::render_notice;
use render::render_prefix;
use render::render_tree;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Explore a MeTTa-KG space lazily and print the visible tree.
#[derive(Debug, Parser)]
#[command(name = "mettakg-explore", version)]
struct Cli {
    /// TOML file with `[explorer]` and `[client]` tables.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Space to explore, e.g. `/` or `/user/data`.
    #[arg(long = "scope", default_value = "/")]
    scope: String,

    /// Match pattern sent with every explore call.
    #[arg(long = "pattern", default_value = "$x")]
    pattern: String,

    /// Backend URL; overrides `client.base_url`.
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Access token; overrides `client.credential` and `METTAKG_TOKEN`.
    #[arg(long = "token")]
    token: Option<String>,

    /// Viewport height in pixels used to size the initial expansion.
    #[arg(long = "height", default_value_t = 600)]
    height: u32,

    /// Row target for the initial expansion; overrides `--height`.
    #[arg(long = "rows")]
    rows: Option<usize>,

    /// After the initial expansion, expand everything below this row.
    #[arg(long = "expand-row", value_name = "ROW")]
    expand_row: Option<usize>,

    /// Print rows as JSON instead of an outline.
    #[arg(long = "json")]
    json: bool,
}

impl Cli {
    fn load_config(&self) -> Result<CliConfig> {
        let mut config = CliConfig::load(self.config.as_deref())?;
        if let Some(base_url) = &self.base_url {
            config.client.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.client.credential = Some(token.clone());
        }
        config.client = config.client.with_env_credential();
        config.validate()?;
        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = cli.load_config()?;

    let client = HttpExploreClient::new(&config.client).context("building HTTP client")?;
    let (explorer, mut events) =
        TreeExplorer::new(Arc::new(client), cli.scope.clone(), config.explorer.clone());

    let notices = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let ExplorerEvent::Notice(notice) = event {
                eprintln!("{}", render_notice(&notice));
            }
        }
    });

    explorer
        .load_roots(&cli.pattern)
        .await
        .with_context(|| format!("loading space {}", cli.scope))?;

    let target = cli
        .rows
        .unwrap_or_else(|| config.explorer.target_rows(cli.height));
    let fill = explorer
        .expand_to_fill_viewport(target, &cli.pattern)
        .await;
    info!("initial expansion: {fill:?}");

    if let Some(index) = cli.expand_row {
        let rows = explorer.flatten().await;
        let Some(row) = rows.get(index) else {
            bail!("row {index} is not visible ({} rows)", rows.len());
        };
        if let LeafExpansion::Failed { error } = explorer
            .expand_to_leaf(&row.path, &row.node, &cli.pattern)
            .await
        {
            bail!("expanding row {index} failed: {error}");
        }
    }

    let rows = explorer.flatten().await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        let snapshot = explorer.snapshot().await;
        if let Some(header) = render_prefix(&snapshot.root_prefix) {
            println!("{header}");
        }
        print!("{}", render_tree(&rows, snapshot.cache.expanded()));
    }

    drop(explorer);
    notices.await.context("notice printer panicked")?;
    Ok(())
}
