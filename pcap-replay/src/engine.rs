use std::thread;

use log::{debug, info, warn};

use libreplay_tools::{CaptureRecord, CaptureSource, Config, Error, FrameSink};

use crate::pacer::Pacer;
use crate::rewriter::{HeaderRewriter, ETHERNET_HEADER_LEN};

/// Replay policy knobs, read from the `[replay]` configuration section.
#[derive(Clone, Copy, Debug)]
pub struct ReplayOptions {
    /// Skip the modified send of a record when its original send failed.
    /// Either way, a send failure never ends the session.
    pub halt_record_on_send_error: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        ReplayOptions {
            halt_record_on_send_error: true,
        }
    }
}

impl ReplayOptions {
    pub fn from_config(config: &Config) -> Self {
        let defaults = ReplayOptions::default();
        ReplayOptions {
            halt_record_on_send_error: config
                .get_bool("replay.halt_record_on_send_error")
                .unwrap_or(defaults.halt_record_on_send_error),
        }
    }
}

#[derive(Debug, Default)]
pub struct ReplayStats {
    pub records: u32,
    pub frames_sent: u32,
    pub bytes_sent: u64,
    pub malformed: u32,
    pub send_errors: u32,
    pub truncated: u32,
}

/// Sequential replay of a capture: each record is sent once verbatim, then
/// once with its addresses rewritten, the original inter-arrival delay
/// elapsing between the two sends.
pub struct ReplayEngine<S, K> {
    source: S,
    sink: K,
    rewriter: HeaderRewriter,
    pacer: Pacer,
    options: ReplayOptions,
    stats: ReplayStats,
}

impl<S: CaptureSource, K: FrameSink> ReplayEngine<S, K> {
    pub fn new(source: S, sink: K, rewriter: HeaderRewriter, options: ReplayOptions) -> Self {
        ReplayEngine {
            source,
            sink,
            rewriter,
            pacer: Pacer::new(),
            options,
            stats: ReplayStats::default(),
        }
    }

    /// Run the replay to source exhaustion.
    ///
    /// Send failures and malformed frames are counted and recovered locally;
    /// only a source error ends the loop early (and is returned).
    pub fn run(&mut self) -> Result<(), Error> {
        let result = self.run_loop();
        info!("Done.");
        info!("Stats: {:?}", self.stats);
        result
    }

    fn run_loop(&mut self) -> Result<(), Error> {
        while let Some(mut record) = self.source.next_record()? {
            self.stats.records += 1;
            self.replay_record(&mut record);
        }
        Ok(())
    }

    fn replay_record(&mut self, record: &mut CaptureRecord) {
        if record.data.len() < ETHERNET_HEADER_LEN {
            warn!(
                "frame {} too short for an Ethernet header ({} bytes), skipping",
                record.pcap_index,
                record.data.len()
            );
            self.stats.malformed += 1;
            return;
        }
        let wire_len = record.wire_len();
        if wire_len < record.origlen as usize {
            warn!(
                "frame {} truncated by capture, sending {} of {} bytes",
                record.pcap_index, wire_len, record.origlen
            );
            self.stats.truncated += 1;
        }

        let original_sent = self.send_frame(record.pcap_index, &record.data[..wire_len]);

        // the length was checked above, the MAC rewrite cannot fail
        let _ = self.rewriter.rewrite_ethernet(&mut record.data);
        if HeaderRewriter::is_ipv4(&record.data) {
            if let Err(e) = self.rewriter.rewrite_ipv4(&mut record.data) {
                // MAC rewrite already applied; the frame is still sent below
                warn!("frame {}: {}", record.pcap_index, e);
                self.stats.malformed += 1;
            }
        }

        // a record without a capture timestamp is sent unpaced and must not
        // become the pacing reference for its successors
        if let Some(ts) = record.ts {
            let delay = self.pacer.next_delay(ts);
            if !delay.is_zero() {
                debug!(
                    "frame {}: sleeping {}us",
                    record.pcap_index,
                    delay.as_micros()
                );
                thread::sleep(delay);
            }
            self.pacer.advance(ts);
        }

        if original_sent || !self.options.halt_record_on_send_error {
            self.send_frame(record.pcap_index, &record.data[..wire_len]);
        } else {
            debug!(
                "frame {}: skipping modified send after failed original send",
                record.pcap_index
            );
        }
    }

    fn send_frame(&mut self, index: usize, frame: &[u8]) -> bool {
        match self.sink.send(frame) {
            Ok(()) => {
                self.stats.frames_sent += 1;
                self.stats.bytes_sent += frame.len() as u64;
                true
            }
            Err(e) => {
                warn!("send failed for frame {index}: {e}");
                self.stats.send_errors += 1;
                false
            }
        }
    }

    pub fn stats(&self) -> &ReplayStats {
        &self.stats
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_stats(self) -> ReplayStats {
        self.stats
    }
}
