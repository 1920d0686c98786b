//! Transport-safe query tokens: compact JSON, then URL-safe base64 without padding.
//! Equal values always give byte-identical tokens, so tokens double as cache keys.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("token does not hold the expected JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn encode<T: Serialize>(value: &T) -> String {
    // Serializing plain data structs into a Vec cannot fail.
    let json = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode<T: DeserializeOwned>(token: &str) -> Result<T, TokenError> {
    let json = URL_SAFE_NO_PAD.decode(token.trim())?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode::<Vec<u32>>("***"), Err(TokenError::Base64(_))));
        let not_a_list = encode(&"text");
        assert!(matches!(decode::<Vec<u32>>(&not_a_list), Err(TokenError::Json(_))));
    }
}
