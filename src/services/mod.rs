pub mod pipeline;
pub mod pnl_calculator;
pub mod report;
pub mod valuation;

pub use pipeline::*;
pub use pnl_calculator::*;
pub use report::*;
pub use valuation::*;
