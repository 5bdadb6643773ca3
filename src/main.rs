use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use relaylog::diagnostics::init_diagnostics;
use relaylog::{Failure, Logger, LoggerConfig};

const USAGE: &str =
    "usage: relaylog [--config <file>] [--name <name>] [--dir <path>] [--debug] [--force-color]";

/// Build the config from an optional file, then apply command-line overrides
fn parse_args(args: &[String]) -> Result<LoggerConfig> {
    let mut config_path = None;
    let mut overrides: Vec<(&str, &str)> = Vec::new();
    let mut debug = false;
    let mut force_color = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" => debug = true,
            "--force-color" => force_color = true,
            "--config" | "--name" | "--dir" => {
                let Some(value) = iter.next() else {
                    bail!("{} requires a value\n{}", arg, USAGE);
                };
                if arg == "--config" {
                    config_path = Some(PathBuf::from(value));
                } else {
                    overrides.push((arg.as_str(), value.as_str()));
                }
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other => bail!("unknown argument: {}\n{}", other, USAGE),
        }
    }

    let mut config = match config_path {
        Some(path) => LoggerConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LoggerConfig::default(),
    };
    for (flag, value) in overrides {
        match flag {
            "--name" => config.name = value.to_string(),
            _ => config.log_dir = PathBuf::from(value),
        }
    }
    config.debug |= debug;
    config.force_styled |= force_color;
    Ok(config)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_args(&args)?;

    let logger = Logger::stdout();
    logger.start(&config);
    init_diagnostics(logger.sink()).context("Failed to install diagnostics subscriber")?;

    // Each stdin line becomes a message; a severity prefix picks the level.
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if let Some(text) = line.strip_prefix("debug:") {
            logger.debug(module_path!(), text.trim());
        } else if let Some(text) = line.strip_prefix("warn:") {
            logger.warn(text.trim());
        } else if let Some(text) = line.strip_prefix("error:") {
            let fatal = logger.error(
                Some(text.trim().to_string()),
                Some(Failure::new("fatal line received on stdin")),
            );
            logger.stop();
            fatal.exit();
        } else {
            logger.info(line);
        }
    }

    logger.stop();
    Ok(())
}
