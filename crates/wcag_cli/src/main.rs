use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wcag_core::{AppConfig, ScoreStore};
use wcag_scrapers::extractor::Extractor;
use wcag_scrapers::{init_logging, BlogPipeline, HttpRevalidator, PipelineOptions, PipelineOutcome};
use wcag_storage::{create_storage, Storage, StorageConfig, StorageKind};
use wcag_web::{AppState, PageCache};

/// Durations such as `48h`, `30m`, `1d`, `1h15m30s`. A bare number is seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut number = String::new();
        let mut seen_any = false;

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            if c.is_whitespace() {
                continue;
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Expected a number before '{}'", c))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = value
                .checked_mul(unit)
                .and_then(|seconds| total_seconds.checked_add(seconds))
                .ok_or_else(|| format!("Duration is too large: {}", s))?;
            number.clear();
            seen_any = true;
        }

        if !number.is_empty() {
            let seconds = number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(seconds)
                .ok_or_else(|| format!("Duration is too large: {}", s))?;
            seen_any = true;
        }

        if !seen_any {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be greater than zero".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "TheWCAG.com blog pipeline and site API", long_about = None)]
struct Cli {
    /// Storage backend: memory, file or sqlite
    #[arg(long, default_value = "file")]
    storage: String,
    /// Directory for the file and sqlite backends (defaults to DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Model to use for generation and fact-checking: openrouter (default) or dummy
    #[arg(long, default_value = "openrouter")]
    model: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the site API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
    /// Run the blog pipeline once, or periodically with --interval
    Generate {
        /// e.g. 48h, 30m, 1d, 1h15m30s
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Print the articles the pipeline would currently pick up
    Extract,
    /// Print the quiz leaderboard
    Leaderboard {
        /// all-time, daily or stats
        #[arg(long = "type", default_value = "all-time")]
        kind: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn build_pipeline(
    config: &AppConfig,
    storage: &Storage,
    model: &str,
) -> anyhow::Result<BlogPipeline> {
    let models = wcag_inference::create_model(wcag_inference::Config::from_app_config(
        config,
        Some(model.to_string()),
    ))
    .context("Failed to initialize inference model")?;
    let extractor = Extractor::from_config(config)?;
    info!("Article sources: {}", extractor.source_names().join(", "));

    Ok(BlogPipeline::new(
        Arc::new(extractor),
        models.generator,
        models.fact_checker,
        storage.posts.clone(),
    )
    .with_options(PipelineOptions::from_config(config)))
}

async fn run_generation(pipeline: &BlogPipeline) -> anyhow::Result<()> {
    match pipeline.run().await? {
        PipelineOutcome::NoArticles => info!("No articles found, nothing generated"),
        PipelineOutcome::Created {
            post,
            articles_count,
        } => info!(
            "Created '{}' ({}) from {} articles, status {}, published: {}",
            post.title,
            post.slug,
            articles_count,
            post.fact_check_status.as_str(),
            post.is_published
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let logger = init_logging();
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    config.log_keys();

    let storage_config = StorageConfig {
        kind: StorageKind::from_str(&cli.storage)?,
        data_dir: cli.data_dir.clone().unwrap_or_else(|| config.data_dir.clone()),
    };
    let storage = create_storage(&storage_config)
        .await
        .with_context(|| format!("Failed to open {} storage", storage_config.kind))?;

    match cli.command {
        Commands::Serve { bind } => {
            let cache = Arc::new(PageCache::new());
            let pipeline = build_pipeline(&config, &storage, &cli.model)?.with_revalidator(cache.clone());
            let state = AppState {
                config: Arc::new(config),
                posts: storage.posts.clone(),
                scores: storage.scores.clone(),
                pipeline: Arc::new(pipeline),
                cache,
            };
            wcag_web::serve(state, bind).await?;
        }
        Commands::Generate { interval } => {
            let mut pipeline = build_pipeline(&config, &storage, &cli.model)?;
            if config.revalidate_secret.is_some() {
                pipeline = pipeline.with_revalidator(Arc::new(HttpRevalidator::new(
                    &config.site_url,
                    config.revalidate_secret.clone(),
                )?));
            }

            match interval {
                Some(HumanDuration(every)) => {
                    logger.info(&format!(
                        "Running in periodic mode with {}s interval",
                        every.as_secs()
                    ));
                    loop {
                        if let Err(e) = run_generation(&pipeline).await {
                            logger.error(&format!("Blog generation failed: {:#}", e));
                        }
                        logger.info(&format!("Waiting {}s before next run", every.as_secs()));
                        tokio::time::sleep(every).await;
                    }
                }
                None => run_generation(&pipeline).await?,
            }
        }
        Commands::Extract => {
            let extractor = Extractor::from_config(&config)?;
            let articles = extractor
                .extract_window(&wcag_scrapers::RecencyWindow::last_48_hours())
                .await;
            println!("{} articles", articles.len());
            for article in articles {
                println!(
                    "- [{}] {} ({})\n  {}",
                    article.published_date.format("%Y-%m-%d %H:%M"),
                    article.title,
                    article.source,
                    article.url
                );
            }
        }
        Commands::Leaderboard { kind, limit } => {
            let output = match kind.as_str() {
                "stats" => serde_json::to_string_pretty(&storage.scores.leaderboard_stats().await?)?,
                "daily" => serde_json::to_string_pretty(&storage.scores.daily_leaderboard(limit).await?)?,
                "all-time" => {
                    serde_json::to_string_pretty(&storage.scores.all_time_leaderboard(limit).await?)?
                }
                other => anyhow::bail!("Unknown leaderboard type: {}", other),
            };
            println!("{}", output);
        }
    }

    Ok(())
}
