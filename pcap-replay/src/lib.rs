//! Replay a pcap capture onto a live Ethernet interface.
//!
//! Each captured record is transmitted twice: once verbatim, then once with
//! source/destination MAC addresses (and, for IPv4 frames, IP addresses)
//! substituted, the original inter-arrival delay elapsing between the two
//! sends. IP/UDP checksums are not recomputed, so receivers observe the
//! captured payloads unchanged except for the address fields.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use log::{error, info};
use xz2::read::XzDecoder;

use libreplay_tools::{Config, Error, PcapFileSource};

pub mod engine;
pub mod live;
pub mod pacer;
pub mod rewriter;

use engine::{ReplayEngine, ReplayOptions, ReplayStats};
use live::LiveSink;
use rewriter::{HeaderRewriter, RewriteTargets};

/// Replay `input_filename` on `interface`.
///
/// - `input_filename` must be a Pcap or Pcap-NG file, optionally gzip or xz
///   compressed (selected by extension). The special value "-" reads
///   standard input.
/// - `interface` is opened for live injection before any record is read;
///   an open failure is returned without touching the capture.
/// - `config` provides the rewrite targets (`[rewrite]`) and replay policy
///   (`[replay]`); absent keys fall back to built-in defaults.
pub fn replay_file<S1: AsRef<str>, S2: AsRef<str>>(
    input_filename: S1,
    interface: S2,
    config: &Config,
) -> Result<ReplayStats, Error> {
    let input_filename = input_filename.as_ref();
    let interface = interface.as_ref();

    let targets = RewriteTargets::from_config(config)?;
    let options = ReplayOptions::from_config(config);

    let reader = get_reader(input_filename)?;
    let source = PcapFileSource::new(reader, config)?;
    let sink = LiveSink::open(interface)?;

    info!("Replaying '{input_filename}' on '{interface}'");
    let mut engine = ReplayEngine::new(source, sink, HeaderRewriter::new(targets), options);
    engine.run()?;
    Ok(engine.into_stats())
}

fn get_reader(input_filename: &str) -> Result<Box<dyn Read + Send>, Error> {
    if input_filename == "-" {
        return Ok(Box::new(io::stdin()));
    }
    let path = Path::new(input_filename);
    let file = File::open(path).map_err(|e| {
        error!("Could not open input file '{input_filename}'");
        Error::Io(e)
    })?;
    let reader: Box<dyn Read + Send> = if input_filename.ends_with(".gz") {
        Box::new(GzDecoder::new(file))
    } else if input_filename.ends_with(".xz") {
        Box::new(XzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(reader)
}
