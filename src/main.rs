use std::process::ExitCode;

use aiff_chunks::{config, dump_document, logging, open_document_with, Cli, Extractor};
use anyhow::{Context, Result};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // The logger may not be up if option loading failed
            if log::log_enabled!(log::Level::Error) {
                log::error!("{:#}", e);
            } else {
                eprintln!("error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let options = config::load_config(&cli.config)?;
    let options = cli.merge_into_options(options)?;

    logging::init(options.log_level());
    log::debug!("options: {:?}", options);

    let doc = open_document_with(&cli.file, options.reader_options())
        .with_context(|| format!("Failed to read chunks from {}", cli.file))?;

    print!("{}", dump_document(&doc));

    if cli.extract {
        let mut extractor = Extractor::new(cli.extract_prefix());
        if let Some(ref dir) = options.output_dir {
            extractor = extractor.with_dir(dir);
        }
        let extracted = if options.recursive_extract() {
            extractor.extract_leaves(&doc)
        } else {
            extractor.extract(&doc)
        };
        extracted.with_context(|| format!("Failed to extract chunks from {}", cli.file))?;
        log::info!("extracted {} chunks", extractor.count());
    }

    Ok(())
}
