use std::io::Read;

use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::*;

use crate::config::Config;
use crate::error::Error;
use crate::record::CaptureRecord;
use crate::timestamp::{Timestamp, MICROS_PER_SEC};

/// Abstraction over an opened capture stream, yielding records in capture order.
pub trait CaptureSource {
    /// Return the next record, `Ok(None)` on clean end of stream.
    ///
    /// An `Err` is a mid-stream failure, distinct from end of stream; callers
    /// are expected to stop iterating.
    fn next_record(&mut self) -> Result<Option<CaptureRecord>, Error>;
}

/// Timestamp parameters of a network interface used for capture.
/// The link type is checked for Ethernet when the interface is declared.
#[derive(Clone, Copy)]
struct InterfaceInfo {
    /// Timestamp resolution, in units per second
    ts_unit: u64,
    if_tsoffset: u64,
}

/// Capture reader over pcap and pcap-ng containers, restricted to Ethernet
/// link types (the replay target is an Ethernet interface).
///
/// Timestamps are normalized to microsecond resolution whatever the
/// interface `if_tsresol` declares.
pub struct PcapFileSource {
    reader: Box<dyn PcapReaderIterator>,
    interfaces: Vec<InterfaceInfo>,
    pcap_index: usize,
    /// Total bytes consumed from the reader, to detect a stuck refill
    consumed: usize,
    last_incomplete_offset: usize,
}

impl PcapFileSource {
    /// Build a source from a reader over pcap/pcap-ng data.
    pub fn new<R: Read + Send + 'static>(input: R, config: &Config) -> Result<Self, Error> {
        let capacity = config
            .get_usize("buffer_initial_capacity")
            .unwrap_or(16384 * 8);
        let reader = pcap_parser::create_reader(capacity, input)?;
        Ok(PcapFileSource {
            reader,
            interfaces: Vec::new(),
            pcap_index: 0,
            consumed: 0,
            last_incomplete_offset: usize::MAX,
        })
    }

    fn check_ethernet(link_type: Linktype) -> Result<(), Error> {
        if link_type == Linktype::ETHERNET {
            Ok(())
        } else {
            warn!("Unsupported link type {link_type}");
            Err(Error::UnsupportedLinktype(link_type.0))
        }
    }
}

fn build_timestamp(if_info: &InterfaceInfo, ts_high: u32, ts_low: u32) -> Timestamp {
    let (secs, frac) =
        pcap_parser::build_ts(ts_high, ts_low, if_info.if_tsoffset, if_info.ts_unit);
    // normalize the fractional part to microseconds
    let micros = if if_info.ts_unit == u64::from(MICROS_PER_SEC) {
        frac
    } else {
        (u64::from(frac) * u64::from(MICROS_PER_SEC) / if_info.ts_unit.max(1)) as u32
    };
    Timestamp::new(secs, micros)
}

impl CaptureSource for PcapFileSource {
    fn next_record(&mut self) -> Result<Option<CaptureRecord>, Error> {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let rec = match block {
                        PcapBlockOwned::LegacyHeader(ref hdr) => {
                            debug!("Legacy pcap, link type: {}", hdr.network);
                            Self::check_ethernet(hdr.network)?;
                            self.interfaces.push(InterfaceInfo {
                                ts_unit: u64::from(MICROS_PER_SEC),
                                if_tsoffset: 0,
                            });
                            None
                        }
                        PcapBlockOwned::Legacy(ref b) => {
                            let blen = (b.caplen as usize).min(b.data.len());
                            self.pcap_index += 1;
                            Some(CaptureRecord {
                                ts: Some(Timestamp::new(b.ts_sec, b.ts_usec)),
                                data: b.data[..blen].to_vec(),
                                origlen: b.origlen,
                                pcap_index: self.pcap_index,
                            })
                        }
                        PcapBlockOwned::NG(Block::SectionHeader(ref _shb)) => {
                            debug!("pcap-ng: new section");
                            self.interfaces.clear();
                            None
                        }
                        PcapBlockOwned::NG(Block::InterfaceDescription(ref idb)) => {
                            Self::check_ethernet(idb.linktype)?;
                            let ts_unit =
                                build_ts_resolution(idb.if_tsresol).unwrap_or_else(|| {
                                    warn!(
                                        "Unsupported if_tsresol {}, assuming microseconds",
                                        idb.if_tsresol
                                    );
                                    u64::from(MICROS_PER_SEC)
                                });
                            self.interfaces.push(InterfaceInfo {
                                ts_unit,
                                if_tsoffset: idb.if_tsoffset as u64,
                            });
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(ref epb)) => {
                            let if_info = self
                                .interfaces
                                .get(epb.if_id as usize)
                                .ok_or(Error::Generic("EPB references unknown interface"))?;
                            let blen = (epb.caplen as usize).min(epb.data.len());
                            self.pcap_index += 1;
                            Some(CaptureRecord {
                                ts: Some(build_timestamp(if_info, epb.ts_high, epb.ts_low)),
                                data: epb.data[..blen].to_vec(),
                                origlen: epb.origlen,
                                pcap_index: self.pcap_index,
                            })
                        }
                        PcapBlockOwned::NG(Block::SimplePacket(ref spb)) => {
                            if self.interfaces.is_empty() {
                                return Err(Error::Generic(
                                    "SPB before any interface description",
                                ));
                            }
                            let blen = (spb.origlen as usize).min(spb.data.len());
                            self.pcap_index += 1;
                            // SPBs carry no timestamp: no pacing for this record
                            Some(CaptureRecord {
                                ts: None,
                                data: spb.data[..blen].to_vec(),
                                origlen: spb.origlen,
                                pcap_index: self.pcap_index,
                            })
                        }
                        PcapBlockOwned::NG(Block::InterfaceStatistics(_))
                        | PcapBlockOwned::NG(Block::NameResolution(_)) => None,
                        PcapBlockOwned::NG(_) => {
                            warn!("unsupported pcap-ng block");
                            None
                        }
                    };
                    self.reader.consume(offset);
                    self.consumed += offset;
                    if let Some(rec) = rec {
                        return Ok(Some(rec));
                    }
                }
                Err(PcapError::Eof) => return Ok(None),
                Err(PcapError::Incomplete(_)) => {
                    // refill helps only if the previous refill made progress
                    if self.last_incomplete_offset == self.consumed {
                        warn!("Could not read complete data block.");
                        warn!("Hint: the reader buffer size may be too small, or the input file may be truncated.");
                        return Err(Error::Generic("truncated or corrupted capture"));
                    }
                    self.last_incomplete_offset = self.consumed;
                    self.reader.refill()?;
                }
                Err(e) => return Err(Error::from(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // little-endian legacy pcap with the given link type and records
    fn legacy_pcap(network: u32, records: &[(u32, u32, &[u8])]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
        v.extend_from_slice(&2u16.to_le_bytes());
        v.extend_from_slice(&4u16.to_le_bytes());
        v.extend_from_slice(&0u32.to_le_bytes()); // thiszone
        v.extend_from_slice(&0u32.to_le_bytes()); // sigfigs
        v.extend_from_slice(&65535u32.to_le_bytes());
        v.extend_from_slice(&network.to_le_bytes());
        for &(secs, micros, data) in records {
            v.extend_from_slice(&secs.to_le_bytes());
            v.extend_from_slice(&micros.to_le_bytes());
            v.extend_from_slice(&(data.len() as u32).to_le_bytes());
            v.extend_from_slice(&(data.len() as u32).to_le_bytes());
            v.extend_from_slice(data);
        }
        v
    }

    #[test]
    fn read_legacy_records() {
        let frame0 = [0u8; 60];
        let frame1 = [1u8; 42];
        let bytes = legacy_pcap(1, &[(0, 0, &frame0), (0, 500_000, &frame1)]);
        let config = Config::default();
        let mut source = PcapFileSource::new(Cursor::new(bytes), &config).unwrap();

        let rec = source.next_record().unwrap().unwrap();
        assert_eq!(rec.ts, Some(Timestamp::new(0, 0)));
        assert_eq!(rec.data, frame0);
        assert_eq!(rec.pcap_index, 1);

        let rec = source.next_record().unwrap().unwrap();
        assert_eq!(rec.ts, Some(Timestamp::new(0, 500_000)));
        assert_eq!(rec.data, frame1);
        assert_eq!(rec.origlen, 42);
        assert_eq!(rec.pcap_index, 2);

        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn empty_capture() {
        let bytes = legacy_pcap(1, &[]);
        let config = Config::default();
        let mut source = PcapFileSource::new(Cursor::new(bytes), &config).unwrap();
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn reject_non_ethernet() {
        // LINKTYPE_RAW
        let bytes = legacy_pcap(101, &[]);
        let config = Config::default();
        let mut source = PcapFileSource::new(Cursor::new(bytes), &config).unwrap();
        match source.next_record() {
            Err(Error::UnsupportedLinktype(101)) => (),
            other => panic!("expected UnsupportedLinktype, got {other:?}"),
        }
    }
}
