use log::debug;

use libreplay_tools::{Error, FrameSink};

/// Frame sink transmitting on a live interface through libpcap.
pub struct LiveSink {
    cap: pcap::Capture<pcap::Active>,
    interface: String,
}

impl LiveSink {
    /// Open `interface` for injection.
    ///
    /// Fails if the device does not exist or cannot be opened (typically a
    /// permissions problem); this is fatal for the caller, no replay must
    /// start without a working sink.
    pub fn open(interface: &str) -> Result<Self, Error> {
        let device = pcap::Device::list()
            .map_err(|e| Error::Open(e.to_string()))?
            .into_iter()
            .find(|d| d.name == interface)
            .ok_or_else(|| Error::Open(format!("interface '{interface}' not found")))?;
        let cap = pcap::Capture::from_device(device)
            .map_err(|e| Error::Open(e.to_string()))?
            .promisc(true)
            .snaplen(65535)
            .open()
            .map_err(|e| Error::Open(format!("{interface}: {e}")))?;
        debug!("opened {interface} for injection");
        Ok(LiveSink {
            cap,
            interface: interface.to_owned(),
        })
    }
}

impl FrameSink for LiveSink {
    fn send(&mut self, frame: &[u8]) -> Result<(), Error> {
        self.cap
            .sendpacket(frame)
            .map_err(|e| Error::Send(format!("{}: {}", self.interface, e)))
    }
}
