pub mod holding;
pub mod pnl;
pub mod quote;
pub mod snapshot;

pub use holding::*;
pub use pnl::*;
pub use quote::*;
pub use snapshot::*;
