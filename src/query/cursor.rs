//! Resumable pagination cursors

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::content::{Post, PostId};
use crate::error::{Error, Result};

/// Position of the last item delivered in a reverse-chronological listing
///
/// Posts sort by `(created_at, post id)` descending, so the pair identifies a
/// unique point in the order. Resuming returns only posts strictly below it,
/// which keeps earlier pages stable when newer posts are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub post: PostId,
}

impl Cursor {
    /// Cursor pointing just past `post`
    pub fn after(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            post: post.id(),
        }
    }

    /// Whether `post` sorts after this position
    pub fn precedes(&self, post: &Post) -> bool {
        (post.created_at, post.id()) < (self.created_at, self.post)
    }

    /// Opaque URL-safe token
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.created_at.timestamp_micros(), self.post);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self> {
        let invalid = || Error::validation(format!("invalid page token: {:?}", token));

        let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (micros, post) = raw.split_once(':').ok_or_else(invalid)?;

        let micros: i64 = micros.parse().map_err(|_| invalid())?;
        let created_at = DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(invalid)?;
        let post = post.parse::<PostId>().map_err(|_| invalid())?;

        Ok(Self { created_at, post })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_round_trip() {
        let cursor = Cursor {
            created_at: Utc.timestamp_opt(1_700_000_000, 250_000_000).unwrap(),
            post: PostId(12),
        };
        let token = cursor.encode();
        assert!(!token.contains(':'));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Cursor::decode("").is_err());
        assert!(Cursor::decode("!!!").is_err());
        assert!(Cursor::decode(&URL_SAFE_NO_PAD.encode("12")).is_err());
        assert!(Cursor::decode(&URL_SAFE_NO_PAD.encode("x:1")).is_err());
        assert!(Cursor::decode(&URL_SAFE_NO_PAD.encode("1:y")).is_err());
    }
}
