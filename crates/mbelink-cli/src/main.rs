//! mbelink command-line front-end.
//!
//! Connects a synthesizer session to the configured codec backend and
//! exposes two operations: a codec capability probe and stream synthesis
//! from raw frames on stdin to s16le samples on stdout.

mod config;

use clap::{Parser, Subcommand};
use mbelink_synth::{
    ControlWordDescriptor, MbeError, MbeSynthesizer, ModeDescriptor, TableDescriptor,
};
use mbelink_types::CONTROL_WORD_BYTES;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mbelink", version, about = "MBE voice synthesizer client")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Codec server address: empty for the in-process codec, a unix socket
    /// path, or host[:port]. Overrides the config file and MBELINK_SERVER.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the configured backend supports the AMBE codec.
    Check,
    /// Synthesize voice frames from stdin into s16le samples on stdout.
    Synth {
        /// Mode-table index to bind for the stream.
        #[arg(long, conflicts_with = "control_word")]
        index: Option<u32>,

        /// Control word to bind, as 24 hex digits.
        #[arg(long)]
        control_word: Option<String>,

        /// Input frame size in bytes.
        #[arg(long, default_value_t = 9)]
        frame_size: usize,
    },
}

fn resolve_config_path(flag: Option<String>) -> Option<String> {
    if flag.is_some() {
        return flag;
    }
    if let Ok(path) = std::env::var("MBELINK_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return Some(path);
        }
    }
    Some("mbelink.toml".to_string())
}

/// Builds the stream's mode descriptor from the synth arguments.
fn mode_descriptor(
    index: Option<u32>,
    control_word: Option<&str>,
) -> Result<Arc<dyn ModeDescriptor>, String> {
    match (index, control_word) {
        (Some(index), None) => Ok(Arc::new(TableDescriptor::new(i64::from(index)))),
        (None, Some(hex_word)) => {
            let payload = hex::decode(hex_word)
                .map_err(|e| format!("--control-word is not valid hex: {e}"))?;
            if payload.len() != CONTROL_WORD_BYTES {
                return Err(format!(
                    "--control-word must be {} hex digits, got {}",
                    CONTROL_WORD_BYTES * 2,
                    hex_word.len()
                ));
            }
            Ok(Arc::new(ControlWordDescriptor::new(payload)))
        }
        (None, None) => Err("one of --index or --control-word is required".to_string()),
        (Some(_), Some(_)) => unreachable!("clap rejects conflicting mode arguments"),
    }
}

/// Reads up to `buf.len()` bytes, short only at end of input.
async fn read_frame_bytes<R>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = input.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Mbe(#[from] MbeError),

    #[error("{0}: {1}")]
    Io(&'static str, std::io::Error),
}

async fn run_check(server: &str) -> Result<ExitCode, CliError> {
    let available = MbeSynthesizer::has_codec(server).await?;
    println!("ambe codec available: {available}");
    Ok(if available {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

async fn run_synth(
    server: &str,
    descriptor: Arc<dyn ModeDescriptor>,
    frame_size: usize,
) -> Result<ExitCode, CliError> {
    let mut session = MbeSynthesizer::open(&descriptor, server).await?;

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut frame = vec![0u8; frame_size];
    let mut frames: u64 = 0;
    let mut samples: u64 = 0;

    loop {
        let n = read_frame_bytes(&mut stdin, &mut frame)
            .await
            .map_err(|e| CliError::Io("reading frames from stdin failed", e))?;
        if n == 0 {
            break;
        }
        if n < frame_size {
            tracing::warn!(got = n, expected = frame_size, "dropping trailing partial frame");
            break;
        }

        let pcm = session.synthesize(&frame).await?;
        let mut out = Vec::with_capacity(pcm.len() * 2);
        for sample in &pcm {
            out.extend_from_slice(&sample.to_ne_bytes());
        }
        stdout
            .write_all(&out)
            .await
            .map_err(|e| CliError::Io("writing samples to stdout failed", e))?;

        frames += 1;
        samples += pcm.len() as u64;
    }

    stdout
        .flush()
        .await
        .map_err(|e| CliError::Io("writing samples to stdout failed", e))?;
    tracing::info!(frames, samples, "stream complete");
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.clone());
    let config = match config::load_config(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mbelink: {e}");
            return ExitCode::from(2);
        }
    };

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let server = cli.server.unwrap_or(config.server.address);

    let result = match cli.command {
        Command::Check => run_check(&server).await,
        Command::Synth {
            index,
            control_word,
            frame_size,
        } => match mode_descriptor(index, control_word.as_deref()) {
            Ok(descriptor) => run_synth(&server, descriptor, frame_size).await,
            Err(message) => {
                eprintln!("mbelink: {message}");
                return ExitCode::from(2);
            }
        },
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("mbelink: {e}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_descriptor_requires_exactly_one_mode_argument() {
        assert!(mode_descriptor(None, None).is_err());
        assert!(mode_descriptor(Some(3), None).is_ok());
        assert!(mode_descriptor(None, Some("0011223344556677889900aa")).is_ok());
    }

    #[test]
    fn control_word_argument_must_be_twelve_bytes_of_hex() {
        assert!(mode_descriptor(None, Some("zz")).is_err());
        assert!(mode_descriptor(None, Some("0011")).is_err());
        assert!(mode_descriptor(None, Some("0011223344556677889900aabb")).is_err());
    }

    #[tokio::test]
    async fn frame_reader_is_short_only_at_end_of_input() {
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let mut input: &[u8] = &data;
        let mut buf = [0u8; 3];

        assert_eq!(read_frame_bytes(&mut input, &mut buf).await.unwrap(), 3);
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(read_frame_bytes(&mut input, &mut buf).await.unwrap(), 3);
        assert_eq!(buf, [4, 5, 6]);
        // Trailing partial frame.
        assert_eq!(read_frame_bytes(&mut input, &mut buf).await.unwrap(), 1);
        assert_eq!(read_frame_bytes(&mut input, &mut buf).await.unwrap(), 0);
    }
}
