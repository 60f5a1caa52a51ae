pub mod chain;
pub mod search;
pub mod state;
pub mod validation;

pub use chain::*;
pub use search::*;
