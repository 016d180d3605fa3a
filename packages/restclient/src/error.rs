/// Errors raised while building requests or decoding responses.
///
/// Transport failures are not represented here: they are recorded on the
/// [`Response`](crate::Response) and read back with `Response::error`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("A response must exist before it can be decoded.")]
    NoResponse,

    #[error("Response format could not be determined.")]
    UndeterminedFormat,

    #[error("'{format}' is not a supported format, register a decoder to handle this response.")]
    UnsupportedFormat { format: String },

    #[error("Decoded response data is immutable.")]
    ImmutableResponse,

    #[error("decode error ({format}): {message}")]
    Decode { format: String, message: String },

    #[error("cannot look up '{key}' in a {kind} value")]
    TypeMismatch { key: String, kind: &'static str },

    #[error("Invalid format pattern: {message}")]
    InvalidFormatPattern { message: String },

    #[error("Invalid transport option '{option}': {message}")]
    InvalidTransportOption { option: String, message: String },

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn decode(format: impl Into<String>, message: impl ToString) -> Self {
        Error::Decode {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
