mod config;
mod format;
mod inspect;
mod transcode;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use config::CliConfig;
use format::FormatKind;
use transcode::TranscodeOptions;

#[derive(Parser)]
#[command(name = "tagwire", version, about = "Convert and inspect tagged JSON/MessagePack documents")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-encode a document between JSON and MessagePack
    Transcode {
        /// Input format (default: from the file extension, then the config)
        #[arg(long, value_enum, env = "TAGWIRE_FROM")]
        from: Option<FormatKind>,

        /// Output format (default: the other one)
        #[arg(long, value_enum, env = "TAGWIRE_TO")]
        to: Option<FormatKind>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Reject documents whose envelopes the built-in codecs cannot decode
        #[arg(long)]
        validate: bool,

        /// Input file, `-` for stdin
        input: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a document and print its value tree
    Inspect {
        /// Input format (default: from the file extension, then the config)
        #[arg(long, value_enum, env = "TAGWIRE_FROM")]
        from: Option<FormatKind>,

        /// Input file, `-` for stdin
        input: Option<PathBuf>,
    },

    /// Show or update ~/.tagwire/config.json
    Config {
        /// Format assumed when nothing else says
        #[arg(long, value_enum)]
        default_format: Option<FormatKind>,

        /// Pretty-print JSON output by default
        #[arg(long)]
        pretty: Option<bool>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::try_from_env("TAGWIRE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = CliConfig::load().unwrap_or_default();

    match args.command {
        Command::Transcode {
            from,
            to,
            pretty,
            validate,
            input,
            output,
        } => {
            let input = input.filter(|p| p != Path::new("-"));
            let from = FormatKind::resolve(from, input.as_deref(), config.default_format);
            let to = FormatKind::resolve(to, output.as_deref(), other(from));
            let bytes = read_input(input.as_deref())?;
            let out = transcode::transcode(
                &bytes,
                TranscodeOptions {
                    from,
                    to,
                    pretty: pretty || config.pretty,
                    validate,
                },
            )?;
            write_output(output.as_deref(), &out)?;
        }
        Command::Inspect { from, input } => {
            let input = input.filter(|p| p != Path::new("-"));
            let from = FormatKind::resolve(from, input.as_deref(), config.default_format);
            let wire = match input.as_deref() {
                Some(path) => {
                    let file = File::open(path)
                        .with_context(|| format!("failed to read {}", path.display()))?;
                    from.read_from(BufReader::new(file))
                }
                None => from.read_from(std::io::stdin().lock()),
            }
            .context("failed to parse input")?;
            let value = tagwire_core::global()
                .from_wire(wire)
                .context("failed to decode input")?;
            print!("{}", inspect::render(&value));
        }
        Command::Config {
            default_format,
            pretty,
        } => {
            let mut config = config;
            if default_format.is_some() || pretty.is_some() {
                if let Some(format) = default_format {
                    config.default_format = format;
                }
                if let Some(pretty) = pretty {
                    config.pretty = pretty;
                }
                config
                    .save()
                    .with_context(|| format!("failed to save {}", CliConfig::config_path().display()))?;
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn other(format: FormatKind) -> FormatKind {
    match format {
        FormatKind::Json => FormatKind::Msgpack,
        FormatKind::Msgpack => FormatKind::Json,
    }
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("failed to write stdout")?;
            stdout.flush().context("failed to write stdout")
        }
    }
}
