//! Stack definitions for the photo gallery

pub mod app;
pub mod dns;

pub use app::AppStack;
pub use dns::{DnsBinding, DnsStack};
