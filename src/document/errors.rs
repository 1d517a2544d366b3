use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("failed to decode property list: {message}")]
    Decode { message: String },

    #[error("failed to encode property list: {message}")]
    Encode { message: String },

    #[error("text is not valid UTF-8: {lossy:?}")]
    NonUnicodeText { lossy: String },
}

impl CodecError {
    pub(crate) fn decode(error: plist::Error) -> Self {
        CodecError::Decode {
            message: describe(&error, "malformed property list"),
        }
    }

    pub(crate) fn encode(error: plist::Error) -> Self {
        CodecError::Encode {
            message: describe(&error, "property list could not be serialized"),
        }
    }
}

/// Codec diagnostics are sometimes empty; fall back to a generic description.
fn describe(error: &plist::Error, generic: &str) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        generic.to_string()
    } else {
        message
    }
}
