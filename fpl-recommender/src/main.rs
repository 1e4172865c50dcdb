// FPL recommender entry point.
//
// `recommend` loads data once, prints the buy list and exits.
// `serve` starts the HTTP service over a shared player pool.
//
// Logs go to stderr so rendered output on stdout stays machine-readable.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use fpl_recommender::app::{self, PlayerPool, RecommendParams};
use fpl_recommender::config;
use fpl_recommender::render::{self, OutputFormat};
use fpl_recommender::server;
use fpl_recommender::source;
use fpl_recommender::squad::parse::{parse_exclude_ids, parse_needs};

#[derive(Parser)]
#[command(name = "fpl-recommend", version)]
#[command(about = "Recommend Fantasy Premier League transfer targets under budget and squad limits")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a recommended buy list
    Recommend(RecommendArgs),
    /// Run the HTTP service
    Serve {
        /// Port to listen on (defaults to server.port from config)
        #[arg(long)]
        port: Option<u16>,
        /// Read bootstrap.json / fixtures.json from this directory instead of the API
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RecommendArgs {
    /// Money available, e.g. 7.5
    #[arg(long)]
    budget: f64,
    /// Positions to fill as POSITION:COUNT, e.g. "2:1,3:2" or "DEF:1,MID:2"
    #[arg(long)]
    need: String,
    /// Comma-separated ids of players already owned
    #[arg(long, default_value = "")]
    exclude: String,
    /// Most players from any one club (defaults to league.max_from_team)
    #[arg(long)]
    max_from_team: Option<usize>,
    /// Candidates considered per position, best score first
    #[arg(long)]
    top_per_pos: Option<usize>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Also write the full result as JSON to this file
    #[arg(long)]
    save: Option<PathBuf>,
    /// Read bootstrap.json / fixtures.json from this directory instead of the API
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "config loaded: league={}, max {} per club",
        config.league.name, config.league.max_from_team
    );

    match cli.command {
        Commands::Recommend(args) => run_recommend(args, &config).await,
        Commands::Serve { port, data_dir } => {
            let source = source::from_config(&config.source, data_dir.as_deref())?;
            let pool = Arc::new(PlayerPool::from_config(source, &config));

            // Warm the pool in the background; requests load it on demand anyway.
            let warm = Arc::clone(&pool);
            tokio::spawn(async move {
                if let Err(e) = warm.get().await {
                    warn!("initial data load failed: {e:#}");
                }
            });

            let port = port.unwrap_or(config.server.port);
            server::serve(pool, port, async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
        }
    }
}

async fn run_recommend(args: RecommendArgs, config: &config::Config) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.budget.is_finite() && args.budget > 0.0,
        "--budget must be a positive number"
    );
    let needs = parse_needs(&args.need).context("invalid --need")?;
    let exclude = parse_exclude_ids(&args.exclude).context("invalid --exclude")?;

    let mut params = RecommendParams::with_defaults(args.budget, needs, config);
    params.exclude = exclude;
    if let Some(cap) = args.max_from_team {
        params.max_from_team = cap;
    }
    if let Some(top) = args.top_per_pos {
        params.top_per_pos = top;
    }
    anyhow::ensure!(params.max_from_team >= 1, "--max-from-team must be at least 1");
    anyhow::ensure!(params.top_per_pos >= 1, "--top-per-pos must be at least 1");
    params
        .check_squad_size(config.league.squad_size)
        .map_err(anyhow::Error::msg)
        .context("--exclude and --need do not fit the squad")?;

    let source = source::from_config(&config.source, args.data_dir.as_deref())?;
    let players = app::load_players(source.as_ref(), &config.strategy).await?;
    let result = app::recommend(&players, &params);

    print!("{}", render::render(&result, args.format)?);

    if let Some(path) = args.save {
        std::fs::write(&path, render::render_json(&result)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("saved JSON to {}", path.display());
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fpl_recommender=info,fpl_recommend=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
