use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ytfeed::SearchOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Srt,
}

#[derive(Parser)]
#[command(
    name = "ytfeed",
    about = "YouTube channel feeds, video listings and cached transcripts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Transcript cache directory (overrides config)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// YouTube Data API key (overrides $YOUTUBE_API_KEY and config)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Show resolution and cache details
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Latest videos from a channel (no API key needed)
    Channel {
        /// Channel ID, @handle, name or URL
        channel: String,

        /// Number of videos (1-15)
        #[arg(short = 'n', long, default_value_t = 5)]
        max_results: usize,
    },

    /// Transcript of a video, cached on disk
    Transcript {
        /// YouTube video URL or video ID
        url: String,

        /// Caption language
        #[arg(short, long)]
        lang: Option<String>,

        /// Output format: text (default), json, srt
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Trending videos for a region (needs an API key)
    Trending {
        /// ISO 3166-1 alpha-2 region code
        #[arg(short, long)]
        region: Option<String>,

        /// Number of videos (1-50)
        #[arg(short = 'n', long)]
        max_results: Option<u32>,

        /// Video category ID, e.g. 10 for Music
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Search videos by topic (needs an API key)
    Search {
        query: String,

        /// Number of videos (1-50)
        #[arg(short = 'n', long)]
        max_results: Option<u32>,

        /// relevance, date or viewCount
        #[arg(long, default_value_t = SearchOrder::Relevance)]
        order: SearchOrder,
    },

    /// Show where a transcript is cached, or rebuild the index and count entries
    Cache {
        /// YouTube video URL or video ID
        url: Option<String>,

        /// Caption language
        #[arg(short, long)]
        lang: Option<String>,
    },
}
