pub mod batch;
pub mod error;
pub mod sensitivity;
pub mod topsis;
pub mod types;
pub mod vps;

pub use batch::*;
pub use error::TopsisError;
pub use sensitivity::*;
pub use topsis::*;
pub use types::*;
pub use vps::*;
