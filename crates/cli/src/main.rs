// ABOUTME: CLI that generates a user's status feed and prints it as JSON or RSS.
// ABOUTME: Logs go to stderr so stdout stays machine-readable; Ctrl-C stops pagination early.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use statusfeed_api::Client;
use statusfeed_feed::{FeedAssembler, FeedOptions, MemoryCache, RouteOptions, TokioScheduler};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Rss,
}

/// Generate the status feed of one user.
#[derive(Parser, Debug)]
#[command(name = "statusfeed")]
#[command(about = "Turn a user's status timeline into a feed", long_about = None)]
struct Args {
    /// Upstream user id.
    user_id: String,

    /// Route options as a query string, e.g. "readable=1&showComments=1&pagesCount=2".
    #[arg(long, default_value = "")]
    options: String,

    /// Override the status API base URL.
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Pause between uncached page requests, in milliseconds.
    #[arg(long)]
    page_delay_ms: Option<u64>,

    /// Maximum concurrent full-text requests.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Ignore cached pages and texts.
    #[arg(long, default_value_t = false)]
    force_refresh: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn feed_options(args: &Args) -> FeedOptions {
    let route = RouteOptions::from_query(&args.options);
    let mut opts = FeedOptions::from_route(&route).force_refresh(args.force_refresh);
    if let Some(ms) = args.page_delay_ms {
        opts = opts.page_delay(Duration::from_millis(ms));
    }
    if let Some(n) = args.concurrency {
        opts = opts.full_text_concurrency(n);
    }
    opts
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut builder = Client::builder();
    if let Some(base) = &args.base_url {
        builder = builder.base_url(base.as_str());
    }
    let client = builder.build();
    let cache = MemoryCache::new();
    let scheduler = TokioScheduler::new();

    let token = scheduler.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping after the current page");
            token.cancel();
        }
    });

    let feed = FeedAssembler::new(&client, &cache, &scheduler, feed_options(&args))
        .assemble(&args.user_id)
        .await;

    let output = match args.format {
        Format::Rss => feed.to_rss()?,
        Format::Json if args.compact => serde_json::to_string(&feed)?,
        Format::Json => serde_json::to_string_pretty(&feed)?,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").context("writing feed to stdout")?;
    Ok(())
}
