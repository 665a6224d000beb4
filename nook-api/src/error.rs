use anyhow::{anyhow, Context};
use serde_json::json;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid character in name {0:?}")]
    InvalidName(String),

    #[error("Text is {len} characters long, the limit is {max}")]
    TooLong { len: usize, max: usize },
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidName(_) => StatusCode::BAD_REQUEST,
            Error::TooLong { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound => json!({
                "message": "not found",
                "type": "not-found",
            }),
            Error::Validation(msg) => json!({
                "message": msg,
                "type": "validation",
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidName(n) => json!({
                "message": "there was an invalid character in a user name",
                "type": "invalid-name",
                "name": n,
            }),
            Error::TooLong { len, max } => json!({
                "message": "text is too long",
                "type": "too-long",
                "len": len,
                "max": max,
            }),
        })
        .unwrap_or_default()
    }

    /// Parse an error body returned by the server
    ///
    /// Bodies that do not follow the typed format, but still carry a `message`
    /// or `error` string, are surfaced as validation errors so the message can
    /// reach the user.
    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = || {
            data.get("message")
                .or_else(|| data.get("error"))
                .and_then(|msg| msg.as_str())
        };
        let ty = match data.get("type").and_then(|t| t.as_str()) {
            Some(ty) => ty,
            None => {
                return message()
                    .map(|m| Error::Validation(String::from(m)))
                    .ok_or_else(|| anyhow!("error contents has neither type nor message"))
            }
        };
        Ok(match ty {
            "unknown" => Error::Unknown(String::from(message().unwrap_or(""))),
            "permission-denied" => Error::PermissionDenied,
            "not-found" => Error::NotFound,
            "validation" => Error::Validation(String::from(message().unwrap_or(""))),
            "null-byte" => Error::NullByteInString(String::from(
                data.get("string")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| anyhow!("error is a null-byte-in-string without a string"))?,
            )),
            "invalid-name" => Error::InvalidName(String::from(
                data.get("name").and_then(|s| s.as_str()).ok_or_else(|| {
                    anyhow!("error is about an invalid name but no name was provided")
                })?,
            )),
            "too-long" => {
                let field = |f: &str| {
                    data.get(f)
                        .and_then(|v| v.as_u64())
                        .map(|v| v as usize)
                        .ok_or_else(|| anyhow!("too-long error without {f}"))
                };
                Error::TooLong {
                    len: field("len")?,
                    max: field("max")?,
                }
            }
            _ => return Err(anyhow!("error contents has unknown type {ty:?}")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_survive_the_wire() {
        let errors = [
            Error::Unknown(String::from("oops")),
            Error::PermissionDenied,
            Error::NotFound,
            Error::Validation(String::from("title is required")),
            Error::NullByteInString(String::from("a\0b")),
            Error::InvalidName(String::from("bob smith")),
            Error::TooLong { len: 200, max: 120 },
        ];
        for e in errors {
            assert_eq!(Error::parse(&e.contents()).unwrap(), e);
        }
    }

    #[test]
    fn untyped_bodies_keep_their_message() {
        assert_eq!(
            Error::parse(br#"{"error": "Nook has expired"}"#).unwrap(),
            Error::Validation(String::from("Nook has expired")),
        );
        assert!(Error::parse(br#"{"status": 500}"#).is_err());
        assert!(Error::parse(br#"{"type": "conflict-name", "name": "bob"}"#).is_err());
        assert!(Error::parse(b"<html>").is_err());
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::NotFound.status_code(), http::StatusCode::NOT_FOUND);
        assert_eq!(
            Error::PermissionDenied.status_code(),
            http::StatusCode::FORBIDDEN
        );
    }
}
