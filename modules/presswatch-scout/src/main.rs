use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use presswatch_common::{theme_config, Config, Topic};
use presswatch_scout::collector::Collector;
use presswatch_scout::ingest_client::IngestClient;
use presswatch_scout::renderer::{BrowserlessRenderer, ChromeRenderer, PageRenderer};

/// Press-monitoring collector for the configured watch domain.
#[derive(Parser, Debug)]
#[command(name = "presswatch-scout")]
struct Cli {
    /// Collect one theme's keyword subset (e.g. "Agriculture", "Politics").
    #[arg(long)]
    theme: Option<String>,

    /// Collect every theme sequentially.
    #[arg(long)]
    all_themes: bool,

    /// Loop the global pass, sleeping this many minutes between passes.
    #[arg(long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("presswatch=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::scout_from_env();
    config.log_redacted();

    // Operator stop: finish or abandon the in-flight candidate, release
    // page resources, don't resume partial keywords.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the in-flight candidate");
                shutdown.store(true, Ordering::Relaxed);
            }
        });
    }

    let renderer: Arc<dyn PageRenderer> = match config.browserless_url.as_deref() {
        Some(base_url) => Arc::new(BrowserlessRenderer::new(
            base_url,
            config.browserless_token.as_deref(),
        )),
        None => Arc::new(ChromeRenderer::new(&config.user_agent)?),
    };

    let sink = Arc::new(IngestClient::new(&config.ingest_url));
    let collector = Collector::new(renderer, sink, config.clone(), shutdown.clone());

    if let Some(name) = cli.theme {
        let Some(topic) = Topic::parse(&name) else {
            let available: Vec<&str> = Topic::ALL.iter().map(|t| t.label()).collect();
            anyhow::bail!("Unknown theme '{name}'. Available: {}", available.join(", "));
        };
        let stats = collector.run_theme(&theme_config(topic)).await?;
        info!(theme = topic.label(), %stats, "Theme run complete");
    } else if cli.all_themes {
        info!(themes = Topic::ALL.len(), "Collecting all themes sequentially");
        for topic in Topic::ALL {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let stats = collector.run_theme(&theme_config(topic)).await?;
            info!(theme = topic.label(), %stats, "Theme run complete");

            // Pause between themes to stay polite across the whole sweep.
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    } else if let Some(minutes) = cli.interval {
        info!(minutes, "Looping global pass");
        while !shutdown.load(Ordering::Relaxed) {
            match collector.run_global().await {
                Ok(stats) => info!(%stats, "Global run complete"),
                Err(e) => warn!(error = %e, "Global run failed"),
            }
            info!(minutes, "Waiting before the next pass");
            let wait = Duration::from_secs(minutes * 60);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = wait_for_shutdown(shutdown.clone()) => break,
            }
        }
    } else {
        let stats = collector.run_global().await?;
        info!(%stats, "Global run complete");
    }

    Ok(())
}

async fn wait_for_shutdown(shutdown: Arc<AtomicBool>) {
    while !shutdown.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}
