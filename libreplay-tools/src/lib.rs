#[macro_use]
extern crate log;

mod config;
mod error;
mod record;
mod sink;
mod source;
mod timestamp;

pub use config::Config;
pub use error::*;
pub use record::*;
pub use sink::*;
pub use source::*;
pub use timestamp::Timestamp;
