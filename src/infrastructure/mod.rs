pub mod csv_store;
pub mod push_client;
pub mod quote_client;
pub mod traits;

pub use csv_store::*;
pub use push_client::*;
pub use quote_client::*;
pub use traits::*;
