//! Transport abstractions: outbound messaging and channel membership queries.

pub mod port;
pub mod types;
