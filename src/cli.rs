use crate::config::{parse_depth, Options};
use crate::logging::LogLevel;
use anyhow::Result;
use clap::Parser;

/// List the chunks of an AIFF/AIFC file and optionally extract them
#[derive(Parser, Debug)]
#[command(name = "aiff-chunks")]
#[command(version)]
#[command(about = "Dump and extract the chunks of AIFF/AIFC files", long_about = None)]
pub struct Cli {
    /// Input .aif/.aifc file
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Extract each top-level chunk to <prefix>.<n>.<id>.dat
    #[arg(short = 'x', long)]
    pub extract: bool,

    /// Extract the chunks inside FORM containers instead of the containers
    #[arg(short, long)]
    pub recursive: bool,

    /// Prefix for extracted file names (defaults to the input path)
    #[arg(short, long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Directory to write extracted chunks into
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Maximum FORM nesting depth
    #[arg(long, value_name = "N")]
    pub max_depth: Option<String>,

    /// Skip the pad byte after odd-sized chunks
    #[arg(long)]
    pub pad: bool,

    /// Configuration file (KEY=VALUE lines)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Merge CLI arguments into the options struct
    pub fn merge_into_options(&self, mut opts: Options) -> Result<Options> {
        if let Some(ref depth) = self.max_depth {
            opts.max_depth = Some(parse_depth(depth)?);
        }

        if self.pad {
            opts.pad_odd_chunks = Some(true);
        }

        if self.recursive {
            opts.recursive_extract = Some(true);
        }

        if let Some(ref dir) = self.output_dir {
            opts.output_dir = Some(dir.clone());
        }

        if self.verbose > 0 {
            let base = opts.log_level().as_i32();
            opts.log_level = Some(LogLevel::from_i32(base + i32::from(self.verbose)));
        }

        Ok(opts)
    }

    /// Prefix for extracted files
    pub fn extract_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(&self.file)
    }
}
