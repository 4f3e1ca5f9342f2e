use crate::error::Error;

/// Abstraction over an opened live transmit handle.
///
/// Implementations are responsible for link-level transmission and any
/// interface-specific setup (promiscuous mode, MTU, permissions). The replay
/// engine only pushes raw Ethernet frames through this trait.
pub trait FrameSink {
    /// Transmit one frame.
    fn send(&mut self, frame: &[u8]) -> Result<(), Error>;
}
