use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A value outside the literal vocabulary reached the expression encoder.
    #[error("don't know how to turn {0} into a literal expression")]
    UnsupportedValue(String),

    #[error("type `{id}` referenced from `{from}` is not defined in the type graph")]
    UnknownType { id: String, from: String },

    #[error("reference `{id}` targets `{target}`, which is not an object declaration")]
    InvalidTarget { id: String, target: String },

    #[error("base types of `{0}` form a cycle")]
    CyclicBases(String),

    /// Deserialization failure with JSON-path context.
    #[error("{0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl serde::ser::Error for Error {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Error::UnsupportedValue(msg.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
