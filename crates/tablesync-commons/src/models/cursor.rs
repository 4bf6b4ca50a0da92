//! Websafe continuation cursors for paginated scans.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

/// Opaque continuation token for resuming a paginated scan.
///
/// Encodes the storage key to resume *at* (inclusive). `after` appends a
/// zero byte to the last-consumed key, which is the smallest key strictly
/// greater than it, so resumption never re-reads the last page's tail even
/// while writers insert around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    resume_key: Vec<u8>,
}

impl Cursor {
    /// Cursor resuming immediately after `last_key`.
    pub fn after(last_key: &[u8]) -> Self {
        let mut resume_key = last_key.to_vec();
        resume_key.push(0);
        Self { resume_key }
    }

    /// The raw storage key to resume scanning at (inclusive).
    pub fn resume_key(&self) -> &[u8] {
        &self.resume_key
    }

    /// Websafe string form handed to clients.
    pub fn to_websafe_string(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.resume_key)
    }

    /// Parses a client-supplied websafe cursor.
    pub fn from_websafe_string(s: &str) -> Result<Self, String> {
        let resume_key = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| format!("malformed cursor: {}", e))?;
        Ok(Self { resume_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_roundtrip() {
        let cursor = Cursor::after(b"row-17");
        let websafe = cursor.to_websafe_string();
        let parsed = Cursor::from_websafe_string(&websafe).unwrap();
        assert_eq!(parsed, cursor);
    }

    #[test]
    fn test_resume_key_sorts_after_source() {
        let cursor = Cursor::after(b"row-17");
        assert!(cursor.resume_key() > b"row-17".as_slice());
        assert!(cursor.resume_key() < b"row-18".as_slice());
    }

    #[test]
    fn test_malformed_cursor_rejected() {
        assert!(Cursor::from_websafe_string("not base64 !!!").is_err());
    }
}
