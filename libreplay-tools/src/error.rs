use pcap_parser::PcapError;
use std::fmt::Debug;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Generic(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("pcap parse error: {0}")]
    Pcap(String),

    #[error("unsupported link type {0} (only Ethernet captures can be replayed)")]
    UnsupportedLinktype(i32),

    #[error("invalid value for configuration key '{0}'")]
    InvalidConfig(&'static str),

    #[error("open failed: {0}")]
    Open(String),

    #[error("send failed: {0}")]
    Send(String),
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Error::Generic(s)
    }
}

impl<I: Debug> From<PcapError<I>> for Error {
    fn from(e: PcapError<I>) -> Self {
        Error::Pcap(format!("{e:?}"))
    }
}
