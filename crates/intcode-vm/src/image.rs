//! Loading program images: comma-separated decimal words, optionally wrapped
//! in whitespace.

use crate::machine::Word;
use std::path::Path;

/// Error loading or parsing a program image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The image file could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// A comma-separated token was not a valid decimal integer.
    #[error("not a valid intcode word: {0:?}")]
    BadToken(String),
}

/// Parse a comma-separated list of decimal integers into an image, the
/// ordered sequence of words that seeds a machine's memory at address 0.
///
/// Leading/trailing whitespace around the whole input and around each token
/// is stripped; blank trailing tokens from a dangling newline are ignored.
///
/// # Errors
///
/// Returns [`ImageError::BadToken`] if any token fails to parse as a decimal
/// integer.
pub fn parse_image(text: &str) -> Result<Vec<Word>, ImageError> {
    text.trim()
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse()
                .map_err(|_| ImageError::BadToken(token.to_string()))
        })
        .collect()
}

/// Read and parse a program image from a file.
///
/// # Errors
///
/// Returns [`ImageError::Io`] if the file cannot be read, or
/// [`ImageError::BadToken`] if its contents fail to parse.
pub fn load_image(path: impl AsRef<Path>) -> Result<Vec<Word>, ImageError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_image(&text)
}
