#![warn(clippy::all)]

#[macro_use]
extern crate log;

use clap::{crate_version, Parser};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io;
use std::path::Path;

use libreplay_tools::Config;

/// Pcap replay tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<String>,

    /// Source MAC address written into replayed frames
    #[arg(long, value_name = "MAC")]
    src_mac: Option<String>,

    /// Destination MAC address written into replayed frames
    #[arg(long, value_name = "MAC")]
    dst_mac: Option<String>,

    /// Source IPv4 address written into replayed IPv4 frames
    #[arg(long, value_name = "ADDR")]
    src_ip: Option<String>,

    /// Destination IPv4 address written into replayed IPv4 frames
    #[arg(long, value_name = "ADDR")]
    dst_ip: Option<String>,

    /// Be verbose
    #[arg(short, long)]
    verbose: bool,

    /// Input capture file (pcap or pcap-ng, optionally .gz/.xz; '-' for stdin)
    input: String,

    /// Interface to transmit on
    interface: String,
}

fn load_config(config: &mut Config, filename: &str) -> Result<(), io::Error> {
    debug!("Loading configuration {filename}");
    let path = Path::new(&filename);
    let file = File::open(path).map_err(|e| {
        error!("Could not open config file '{filename}'");
        e
    })?;
    config.load_config(file)
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_env("PCAP_REPLAY_LOG").unwrap_or_else(|_| {
        let level = if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .compact()
        .init();

    info!("Pcap replay tool {}", crate_version!());

    let mut config = Config::default();
    if let Some(filename) = args.config.as_ref() {
        load_config(&mut config, filename)?;
    }
    // override config options from command-line arguments
    if let Some(v) = args.src_mac.as_ref() {
        config.set("rewrite.src_mac", v.as_str());
    }
    if let Some(v) = args.dst_mac.as_ref() {
        config.set("rewrite.dst_mac", v.as_str());
    }
    if let Some(v) = args.src_ip.as_ref() {
        config.set("rewrite.src_ip", v.as_str());
    }
    if let Some(v) = args.dst_ip.as_ref() {
        config.set("rewrite.dst_ip", v.as_str());
    }

    let stats = pcap_replay::replay_file(&args.input, &args.interface, &config).map_err(|e| {
        error!("Replay failed: {e}");
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    info!(
        "Replayed {} records: {} frames sent ({} bytes), {} malformed, {} send errors",
        stats.records, stats.frames_sent, stats.bytes_sent, stats.malformed, stats.send_errors
    );
    Ok(())
}
