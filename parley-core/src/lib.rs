mod error;
pub mod model;
pub mod utils;

pub use error::ParseIdError;
pub use model::*;
