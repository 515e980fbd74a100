//! Types shared by the relay service and the Spotify auth library

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
