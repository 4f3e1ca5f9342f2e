use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet_base::MacAddr;
use pnet_packet::ethernet::{EtherType, EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet_packet::ipv4::MutableIpv4Packet;

use libreplay_tools::{Config, Error};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const IPV4_MIN_FRAME_LEN: usize = ETHERNET_HEADER_LEN + 20;

/// Addresses substituted into replayed frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewriteTargets {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

impl Default for RewriteTargets {
    fn default() -> Self {
        RewriteTargets {
            src_mac: MacAddr::new(0x08, 0x00, 0x12, 0x34, 0x56, 0x78),
            dst_mac: MacAddr::new(0x08, 0x00, 0x12, 0x34, 0xac, 0xc2),
            src_ip: Ipv4Addr::new(10, 1, 1, 3),
            dst_ip: Ipv4Addr::new(10, 1, 1, 4),
        }
    }
}

fn get_parsed<T: FromStr>(config: &Config, key: &'static str, default: T) -> Result<T, Error> {
    match config.get(key) {
        Some(s) => s.parse().or(Err(Error::InvalidConfig(key))),
        None => Ok(default),
    }
}

impl RewriteTargets {
    /// Build targets from the `[rewrite]` section of the configuration,
    /// falling back to the historical defaults for absent keys.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let defaults = RewriteTargets::default();
        Ok(RewriteTargets {
            src_mac: get_parsed(config, "rewrite.src_mac", defaults.src_mac)?,
            dst_mac: get_parsed(config, "rewrite.dst_mac", defaults.dst_mac)?,
            src_ip: get_parsed(config, "rewrite.src_ip", defaults.src_ip)?,
            dst_ip: get_parsed(config, "rewrite.dst_ip", defaults.dst_ip)?,
        })
    }
}

/// In-place rewriting of Ethernet and IPv4 address fields.
///
/// All accesses go through the pnet packet views, which bounds-check the
/// buffer at construction. Checksums are deliberately not recomputed: the
/// replayed frames keep the stale IP/UDP checksums of the capture, so a
/// receiver sees exactly the captured payloads with only addresses changed.
pub struct HeaderRewriter {
    targets: RewriteTargets,
}

impl HeaderRewriter {
    pub fn new(targets: RewriteTargets) -> Self {
        HeaderRewriter { targets }
    }

    /// Read the ether-type field, if the buffer holds a full Ethernet header.
    pub fn ether_type(buf: &[u8]) -> Option<EtherType> {
        EthernetPacket::new(buf).map(|eth| eth.get_ethertype())
    }

    /// Overwrite source and destination MAC addresses.
    ///
    /// The ether-type and everything past the Ethernet header are left
    /// untouched. Fails without touching the buffer if it is shorter than
    /// 14 bytes. Idempotent.
    pub fn rewrite_ethernet(&self, buf: &mut [u8]) -> Result<(), Error> {
        let mut eth = MutableEthernetPacket::new(buf)
            .ok_or(Error::Generic("frame too short for an Ethernet header"))?;
        eth.set_source(self.targets.src_mac);
        eth.set_destination(self.targets.dst_mac);
        Ok(())
    }

    /// Overwrite IPv4 source and destination addresses, at their fixed
    /// offsets after the Ethernet header.
    ///
    /// The caller must have checked that the ether-type is IPv4; this
    /// function only validates the buffer length.
    pub fn rewrite_ipv4(&self, buf: &mut [u8]) -> Result<(), Error> {
        if buf.len() < IPV4_MIN_FRAME_LEN {
            return Err(Error::Generic("frame too short for an IPv4 header"));
        }
        let mut ipv4 = MutableIpv4Packet::new(&mut buf[ETHERNET_HEADER_LEN..])
            .ok_or(Error::Generic("frame too short for an IPv4 header"))?;
        ipv4.set_source(self.targets.src_ip);
        ipv4.set_destination(self.targets.dst_ip);
        Ok(())
    }

    pub fn is_ipv4(buf: &[u8]) -> bool {
        Self::ether_type(buf) == Some(EtherTypes::Ipv4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Ethernet + minimal IPv4 header + 6 payload bytes
    fn ipv4_frame() -> Vec<u8> {
        let mut frame = vec![0u8; 40];
        for (i, b) in frame.iter_mut().enumerate() {
            *b = i as u8;
        }
        frame[12] = 0x08; // ether-type IPv4
        frame[13] = 0x00;
        frame[14] = 0x45; // version + IHL
        frame
    }

    fn rewriter() -> HeaderRewriter {
        HeaderRewriter::new(RewriteTargets::default())
    }

    #[test]
    fn ethernet_rewrite_sets_macs() {
        let mut frame = ipv4_frame();
        let orig = frame.clone();
        rewriter().rewrite_ethernet(&mut frame).unwrap();
        assert_eq!(&frame[0..6], &[0x08, 0x00, 0x12, 0x34, 0xac, 0xc2]);
        assert_eq!(&frame[6..12], &[0x08, 0x00, 0x12, 0x34, 0x56, 0x78]);
        // everything outside the MAC fields is unchanged
        assert_eq!(&frame[12..], &orig[12..]);
    }

    #[test]
    fn ethernet_rewrite_is_idempotent() {
        let mut once = ipv4_frame();
        rewriter().rewrite_ethernet(&mut once).unwrap();
        let mut twice = once.clone();
        rewriter().rewrite_ethernet(&mut twice).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn ethernet_rewrite_rejects_short_frame() {
        let mut frame = vec![0u8; 13];
        let orig = frame.clone();
        assert!(rewriter().rewrite_ethernet(&mut frame).is_err());
        assert_eq!(frame, orig);
    }

    #[test]
    fn ipv4_rewrite_sets_addresses() {
        let mut frame = ipv4_frame();
        let orig = frame.clone();
        rewriter().rewrite_ipv4(&mut frame).unwrap();
        // source at 14+12, destination at 14+16
        assert_eq!(&frame[26..30], &[10, 1, 1, 3]);
        assert_eq!(&frame[30..34], &[10, 1, 1, 4]);
        assert_eq!(&frame[..26], &orig[..26]);
        assert_eq!(&frame[34..], &orig[34..]);
    }

    #[test]
    fn ipv4_rewrite_rejects_short_frame() {
        // full Ethernet header but truncated IPv4 header
        let mut frame = ipv4_frame();
        frame.truncate(20);
        let orig = frame.clone();
        assert!(rewriter().rewrite_ipv4(&mut frame).is_err());
        assert_eq!(frame, orig);
    }

    #[test]
    fn classification() {
        assert!(HeaderRewriter::is_ipv4(&ipv4_frame()));
        let mut arp = ipv4_frame();
        arp[12] = 0x08;
        arp[13] = 0x06;
        assert!(!HeaderRewriter::is_ipv4(&arp));
        assert_eq!(HeaderRewriter::ether_type(&[0u8; 10]), None);
    }

    #[test]
    fn targets_from_config() {
        let mut config = Config::default();
        config.set("rewrite.src_mac", "02:00:00:00:00:01");
        config.set("rewrite.dst_ip", "192.0.2.9");
        let targets = RewriteTargets::from_config(&config).unwrap();
        assert_eq!(targets.src_mac, MacAddr::new(2, 0, 0, 0, 0, 1));
        assert_eq!(targets.dst_mac, RewriteTargets::default().dst_mac);
        assert_eq!(targets.dst_ip, Ipv4Addr::new(192, 0, 2, 9));
    }

    #[test]
    fn targets_from_config_invalid() {
        let mut config = Config::default();
        config.set("rewrite.src_ip", "not-an-address");
        assert!(RewriteTargets::from_config(&config).is_err());
    }
}
