use clap::Parser;
use std::path::PathBuf;

use crate::config::{ArchiveSource, DEFAULT_MAX_DEPTH, ExpandOptions};

#[derive(Parser, Debug)]
#[command(name = "deepunzip")]
#[command(version)]
#[command(about = "Extract a ZIP archive and every ZIP archive nested inside it", long_about = None)]
#[command(after_help = "Examples:\n  \
  deepunzip -s bundle.zip -d out              expand bundle.zip and all nested archives into out\n  \
  deepunzip -s bundle.zip -d out --max-depth 2   stop two levels below bundle.zip\n  \
  deepunzip -s https://example.com/bundle.zip -d out   read the outer archive over HTTP")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(short = 's', long, value_name = "PATH|URL", env = "DEEPUNZIP_SOURCE")]
    pub source: String,

    /// Directory that receives the extracted tree
    #[arg(short = 'd', long, value_name = "DIR", env = "DEEPUNZIP_DESTINATION")]
    pub destination: PathBuf,

    /// Deepest nesting level to expand (the source is level 0)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH, env = "DEEPUNZIP_MAX_DEPTH")]
    pub max_depth: usize,

    /// File extensions treated as nested archives
    #[arg(long = "ext", value_name = "EXT", value_delimiter = ',', default_value = "zip")]
    pub extensions: Vec<String>,

    /// Exit with status 2 if any archive failed to extract
    #[arg(long)]
    pub strict: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    /// Log level implied by `-q`/`-v`.
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (0, 0) => tracing::Level::INFO,
            (0, 1) => tracing::Level::DEBUG,
            (0, _) => tracing::Level::TRACE,
            (1, _) => tracing::Level::WARN,
            _ => tracing::Level::ERROR,
        }
    }

    pub fn to_options(&self) -> ExpandOptions {
        ExpandOptions::new(ArchiveSource::parse(&self.source), &self.destination)
            .with_max_depth(self.max_depth)
            .with_extensions(&self.extensions)
    }
}
