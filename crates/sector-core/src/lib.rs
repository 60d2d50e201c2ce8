pub mod error;
pub mod groups;
pub mod traits;
pub mod types;

pub use error::*;
pub use groups::{default_sectors, normalize_sectors, parse_sectors, unique_symbols};
pub use traits::*;
pub use types::*;
