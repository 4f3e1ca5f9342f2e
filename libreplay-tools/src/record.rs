use crate::timestamp::Timestamp;

/// One frame read from a capture, with its original timestamp and length.
///
/// The buffer is owned so the replay engine can rewrite header fields in
/// place; the timestamp is never modified after the record is built. `ts` is
/// `None` when the capture stores no timestamp for the frame (pcap-ng Simple
/// Packet blocks); such records take no part in pacing.
#[derive(Clone, Debug)]
pub struct CaptureRecord {
    /// Capture timestamp of the frame, if the capture provides one
    pub ts: Option<Timestamp>,
    /// Captured bytes (up to the capture snaplen)
    pub data: Vec<u8>,
    /// Length of the frame on the original link
    pub origlen: u32,
    /// Index of the record in the capture (1-based)
    pub pcap_index: usize,
}

impl CaptureRecord {
    /// Number of bytes to put on the wire: the declared original length,
    /// bounded by what was actually captured.
    pub fn wire_len(&self) -> usize {
        (self.origlen as usize).min(self.data.len())
    }
}
