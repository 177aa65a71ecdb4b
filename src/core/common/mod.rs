pub mod error;
pub use error::KdError;
