//! In-process text conversions. No I/O, no shared state.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use rand::seq::IndexedRandom;
use tracing::debug;

use super::requests::{ContentRequest, RandomStringRequest};
use super::{ToolError, Toolbox, require_present};

/// Upper bound on `generate_random_string` output.
pub const MAX_RANDOM_LENGTH: usize = 65_536;

/// Everything except alphanumerics and `_ . - ~ /` is escaped.
const URL_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

pub fn url_encode(content: &str) -> String {
    utf8_percent_encode(content, URL_ESCAPE).to_string()
}

/// Malformed escapes pass through literally; invalid UTF-8 becomes U+FFFD.
pub fn url_decode(content: &str) -> String {
    percent_decode_str(content).decode_utf8_lossy().into_owned()
}

pub fn base64_encode(content: &str) -> String {
    STANDARD.encode(content.as_bytes())
}

pub fn base64_decode(content: &str) -> Result<String, ToolError> {
    let bytes = STANDARD
        .decode(content.trim())
        .map_err(|e| ToolError::transform(format!("Invalid base64 input: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|_| ToolError::transform("Decoded base64 is not valid UTF-8 text"))
}

pub fn random_string(length: usize, character_set: &str) -> Result<String, ToolError> {
    if length > MAX_RANDOM_LENGTH {
        return Err(ToolError::invalid(format!(
            "length must be at most {MAX_RANDOM_LENGTH}"
        )));
    }
    let alphabet: Vec<char> = character_set.chars().collect();
    if alphabet.is_empty() && length > 0 {
        return Err(ToolError::invalid("characterSet must not be empty"));
    }
    let mut rng = rand::rng();
    Ok((0..length)
        .filter_map(|_| alphabet.choose(&mut rng).copied())
        .collect())
}

impl Toolbox {
    pub fn url_encode(&self, req: ContentRequest) -> Result<String, ToolError> {
        Ok(url_encode(require_present(&req.content, "content")?))
    }

    pub fn url_decode(&self, req: ContentRequest) -> Result<String, ToolError> {
        Ok(url_decode(require_present(&req.content, "content")?))
    }

    pub fn base64_encode(&self, req: ContentRequest) -> Result<String, ToolError> {
        Ok(base64_encode(require_present(&req.content, "content")?))
    }

    pub fn base64_decode(&self, req: ContentRequest) -> Result<String, ToolError> {
        base64_decode(require_present(&req.content, "content")?)
    }

    pub fn generate_random_string(&self, req: RandomStringRequest) -> Result<String, ToolError> {
        let out = random_string(req.length, &req.character_set)?;
        debug!(length = req.length, "generated random string");
        Ok(out)
    }
}
