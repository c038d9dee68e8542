use thiserror::Error;

/// Errors raised while expanding an input pattern.
#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
