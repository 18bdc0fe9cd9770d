pub mod error;
pub mod sdn;

pub use error::{SharedResult, SharedTypeError};
pub use sdn::ZoneConfig;
