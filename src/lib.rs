pub mod config;
pub mod contract;
pub mod error;
pub mod host;
pub mod marshal;

pub use config::{HostConfig, Invocation};
pub use error::{Error, Stage};
pub use host::Host;
