#[allow(clippy::module_inception)]
pub mod error;
pub mod discover;
pub mod executor;

pub use discover::DiscoverError;
pub use error::CliError;
pub use executor::ExecutorError;
