use std::fs;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use tools::{format_inspect_pretty, inspect_frame, run_session, Recorder, SessionPlan};
use tracing_subscriber::EnvFilter;
use transmit::{NetworkSender, TransmitConfig, UdpTransport};
use wire::ProtocolVariant;

#[derive(Parser)]
#[command(
    name = "ovp-tools",
    version,
    about = "Opulent Voice Protocol inspection and simulation tools"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode captured frame files.
    Inspect {
        /// Frame file, or a directory of frame files.
        path: PathBuf,
        /// Header layout the frames were written with.
        #[arg(long, value_enum, default_value_t = Protocol::Current)]
        protocol: Protocol,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
    /// Run a scripted PTT session over UDP.
    Simulate {
        /// JSON configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Destination as HOST:PORT, overriding the configuration.
        #[arg(long)]
        target: Option<String>,
        /// Header layout, overriding the configuration.
        #[arg(long, value_enum)]
        protocol: Option<Protocol>,
        /// Number of PTT presses.
        #[arg(long, default_value_t = 2)]
        presses: u32,
        /// Buffers captured per press.
        #[arg(long, default_value_t = 25)]
        buffers: u32,
        /// Deliver every k-th buffer at the wrong length.
        #[arg(long)]
        invalid_every: Option<u32>,
        /// Pace capture by wall time instead of stepping.
        #[arg(long)]
        realtime: bool,
        /// Write every produced frame to this directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Write the final statistics as JSON.
        #[arg(long)]
        summary: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON.
    Config {
        /// JSON configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Protocol {
    Legacy,
    Current,
}

impl From<Protocol> for ProtocolVariant {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Legacy => Self::Legacy,
            Protocol::Current => Self::Current,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Command::Inspect {
            path,
            protocol,
            glob,
            format,
        } => {
            let protocol = ProtocolVariant::from(protocol);
            if path.is_dir() {
                for entry in collect_frame_files(&path, glob.as_deref())? {
                    println!("== {} ==", entry.display());
                    inspect_file(&entry, protocol, format)?;
                }
            } else {
                inspect_file(&path, protocol, format)?;
            }
        }
        Command::Simulate {
            config,
            target,
            protocol,
            presses,
            buffers,
            invalid_every,
            realtime,
            out_dir,
            summary,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(target) = target {
                apply_target(&mut config, &target)?;
            }
            if let Some(protocol) = protocol {
                config.protocol = protocol.into();
            }
            config.validate().context("validate config")?;

            let target = config.target().context("resolve target")?;
            let transport = UdpTransport::open(target).context("open udp socket")?;
            let recorder = Recorder::new(transport);
            let frames = recorder.frames();
            let plan = SessionPlan {
                presses,
                buffers_per_press: buffers,
                invalid_every,
                realtime,
                ..SessionPlan::default()
            };
            let report = run_session(&config, NetworkSender::new(recorder), &plan)
                .context("run session")?;
            println!("{report}");

            if let Some(out_dir) = out_dir {
                let frames = frames.lock().unwrap_or_else(PoisonError::into_inner);
                write_frames(&out_dir, &frames)?;
            }
            if let Some(path) = summary {
                let contents =
                    serde_json::to_string_pretty(&report).context("serialize summary")?;
                fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
            }
        }
        Command::Config { config } => {
            let config = load_config(config.as_deref())?;
            let json = serde_json::to_string_pretty(&config).context("serialize config")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("parse log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TransmitConfig> {
    let Some(path) = path else {
        return Ok(TransmitConfig::default());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    TransmitConfig::from_json(&contents).with_context(|| format!("parse config {}", path.display()))
}

fn apply_target(config: &mut TransmitConfig, target: &str) -> Result<()> {
    let (host, port) = target
        .rsplit_once(':')
        .with_context(|| format!("target {target} is not HOST:PORT"))?;
    config.target_port = port
        .parse()
        .with_context(|| format!("invalid port in {target}"))?;
    config.target_addr = host.trim_start_matches('[').trim_end_matches(']').to_string();
    Ok(())
}

fn inspect_file(path: &Path, protocol: ProtocolVariant, format: OutputFormat) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("read frame {}", path.display()))?;
    let report = match inspect_frame(&bytes, protocol) {
        Ok(report) => report,
        Err(err) => {
            println!("invalid frame ({} bytes): {err}", bytes.len());
            return Ok(());
        }
    };
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize json")?;
            println!("{json}");
        }
        OutputFormat::Pretty => println!("{}", format_inspect_pretty(&report)),
    }
    Ok(())
}

fn collect_frame_files(dir: &Path, glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

fn write_frames(out_dir: &Path, frames: &[Vec<u8>]) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output dir {}", out_dir.display()))?;
    for (idx, frame) in frames.iter().enumerate() {
        let path = out_dir.join(format!("frame_{idx:06}.bin"));
        fs::write(&path, frame).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}
