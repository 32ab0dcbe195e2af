use std::path::PathBuf;

use eyre::{Result, WrapErr, bail, eyre};
use log::{debug, info};

use ytfeed::cache::DEFAULT_LANG;
use ytfeed::config::{self, Config};
use ytfeed::feed::FEED_MAX_ENTRIES;
use ytfeed::output;
use ytfeed::{DataApi, InnerTube, TranscriptCache};

mod cli;

use cli::{Cli, Command, OutputFormat};

const DEFAULT_REGION: &str = "US";
const DEFAULT_LIST_RESULTS: u32 = 10;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytfeed.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytfeed")
        .join("logs")
}

fn build_after_help() -> String {
    format!(
        "\nCONFIG: {}\nAPI KEY: --api-key, ${} or api_key in config (trending, search)\n\nLogs are written to: {}",
        config::config_path().display(),
        config::API_KEY_ENV,
        log_dir().join("ytfeed.log").display()
    )
}

fn data_api(http: &reqwest::Client, config: &Config, cli: &Cli) -> Result<DataApi> {
    let Some(key) = config.api_key(cli.api_key.as_deref()) else {
        bail!(
            "YouTube API key is not configured\n\nSet --api-key, ${} or api_key in {}",
            config::API_KEY_ENV,
            config::config_path().display()
        );
    };
    Ok(DataApi::new(http.clone(), key))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        debug!("Ignoring config: {e}");
        Config::default()
    });

    if cli.verbose {
        let config_path = config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    let http = reqwest::Client::new();
    let youtube = InnerTube::new(http.clone());

    match &cli.command {
        Command::Channel { channel, max_results } => {
            let Some(channel_id) = youtube.resolve_channel_id(channel).await else {
                println!("No YouTube channel found matching \"{channel}\".");
                return Ok(());
            };
            if cli.verbose {
                eprintln!("Channel: {channel} -> {channel_id}");
            }

            let max_results = (*max_results).clamp(1, FEED_MAX_ENTRIES);
            let videos = youtube
                .fetch_feed(&channel_id, max_results)
                .await
                .wrap_err("error fetching channel videos")?;

            if videos.is_empty() {
                println!("No videos found for channel \"{channel}\" (ID: {channel_id}).");
            } else {
                println!("{}", output::render_json(&videos));
            }
        }

        Command::Transcript {
            url,
            lang,
            format,
            output,
        } => {
            let lang = lang
                .clone()
                .or_else(|| config.default_lang.clone())
                .unwrap_or_else(|| DEFAULT_LANG.to_string());
            let cache_dir = cli.cache_dir.clone().unwrap_or_else(|| config.cache_dir());
            let cache = TranscriptCache::open(youtube, &cache_dir)?;

            let segments = cache
                .fetch_transcript(url, &lang)
                .await
                .wrap_err("error fetching transcript")?;

            if cli.verbose {
                let path = cache.transcript_path(url, &lang).unwrap_or_default();
                eprintln!(
                    "Language: {lang}\nSegments: {}\nCached at: {}",
                    segments.len(),
                    path.display()
                );
            }

            let rendered = match format {
                OutputFormat::Text => output::render_text(&segments),
                OutputFormat::Json => output::render_json(&segments),
                OutputFormat::Srt => output::render_srt(&segments),
            };

            if let Some(path) = output {
                std::fs::write(path, &rendered)?;
                if cli.verbose {
                    eprintln!("Output written to: {}", path.display());
                }
            } else {
                println!("{rendered}");
            }
        }

        Command::Trending {
            region,
            max_results,
            category,
        } => {
            let api = data_api(&http, &config, &cli)?;
            let region = region
                .clone()
                .or_else(|| config.region_code.clone())
                .unwrap_or_else(|| DEFAULT_REGION.to_string());
            let max_results = max_results.or(config.max_results).unwrap_or(DEFAULT_LIST_RESULTS);

            let videos = api
                .list_trending(&region, max_results, category.as_deref())
                .await
                .wrap_err("error fetching trending videos")?;

            if videos.is_empty() {
                let in_category = category.as_ref().map(|c| format!(" in category {c}")).unwrap_or_default();
                println!("No trending videos found for region \"{region}\"{in_category}.");
            } else {
                println!("{}", output::render_json(&videos));
            }
        }

        Command::Search {
            query,
            max_results,
            order,
        } => {
            let api = data_api(&http, &config, &cli)?;
            let max_results = max_results.or(config.max_results).unwrap_or(DEFAULT_LIST_RESULTS);

            let videos = api
                .search(query, max_results, *order)
                .await
                .wrap_err("error searching videos")?;

            if videos.is_empty() {
                println!("No videos found for topic \"{query}\".");
            } else {
                println!("{}", output::render_json(&videos));
            }
        }

        Command::Cache { url, lang } => {
            let cache_dir = cli.cache_dir.clone().unwrap_or_else(|| config.cache_dir());
            let cache = TranscriptCache::new(youtube, &cache_dir);

            match url {
                Some(url) => {
                    let lang = lang.as_deref().unwrap_or(DEFAULT_LANG);
                    let path = cache
                        .transcript_path(url, lang)
                        .ok_or_else(|| eyre!("no cached transcript for {url} (lang: {lang})"))?;
                    println!("{}", path.display());
                }
                None => {
                    let count = cache.rebuild_index()?;
                    println!("{count} cached transcripts in {}", cache.dir().display());
                }
            }
        }
    }

    Ok(())
}
