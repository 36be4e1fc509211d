//! FileUpdate - the wire format for a whole-file update.
//!
//! Each update travels as one text frame:
//!
//! ```text
//! <base file name>|<standard base64 of the raw file bytes>
//! ```
//!
//! Base64 never produces `|`, so splitting on the first delimiter is
//! unambiguous and binary content survives a text-only channel.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{is_editor_artifact, validate_name, FrameError};

/// Separator between the file name and the payload.
pub const DELIMITER: char = '|';

/// Largest frame accepted by the inbound path (10 MiB).
pub const MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// A decoded whole-file update.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpdate {
    /// Bare file name, relative to the shared directory
    pub name: String,
    /// Raw file contents
    pub content: Vec<u8>,
}

impl FileUpdate {
    /// Create a new update for sending.
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    /// Encode to the `<name>|<payload>` text frame.
    pub fn encode(&self) -> String {
        let payload = STANDARD.encode(&self.content);
        let mut frame = String::with_capacity(self.name.len() + 1 + payload.len());
        frame.push_str(&self.name);
        frame.push(DELIMITER);
        frame.push_str(&payload);
        frame
    }

    /// Parse and validate a received text frame.
    ///
    /// Checks run in order and stop at the first failure: size cap (before
    /// any parsing), delimiter, name safety, editor artifact, payload decode.
    pub fn decode(frame: &str, max_frame_size: usize) -> Result<Self, FrameError> {
        if frame.len() > max_frame_size {
            return Err(FrameError::TooLarge {
                size: frame.len(),
                limit: max_frame_size,
            });
        }

        let (name, payload) = frame.split_once(DELIMITER).ok_or(FrameError::Malformed)?;

        let name = validate_name(name)?;
        if is_editor_artifact(name) {
            return Err(FrameError::EditorArtifact(name.to_string()));
        }

        let content = STANDARD
            .decode(payload)
            .map_err(|source| FrameError::Decode {
                name: name.to_string(),
                source,
            })?;

        Ok(Self {
            name: name.to_string(),
            content,
        })
    }
}

impl std::fmt::Debug for FileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpdate")
            .field("name", &self.name)
            .field("content", &format!("[{} bytes]", self.content.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(content: &[u8]) {
        let update = FileUpdate::new("notes.txt", content.to_vec());
        let decoded = FileUpdate::decode(&update.encode(), MAX_FRAME_SIZE).unwrap();
        assert_eq!(decoded, update);
    }

    #[test]
    fn roundtrip_preserves_bytes() {
        roundtrip(b"");
        roundtrip(b"print(1)");
        roundtrip(&[0x00, 0xff, 0xfe, 0x80, b'|', b'\n']);
        roundtrip(&(0..=255u8).collect::<Vec<_>>());
    }

    #[test]
    fn encode_matches_documented_format() {
        let update = FileUpdate::new("main.py", b"print(1)".to_vec());
        assert_eq!(update.encode(), "main.py|cHJpbnQoMSk=");
    }

    #[test]
    fn decode_accepts_empty_payload() {
        let update = FileUpdate::decode("empty.txt|", MAX_FRAME_SIZE).unwrap();
        assert_eq!(update.name, "empty.txt");
        assert!(update.content.is_empty());
    }

    #[test]
    fn decode_rejects_missing_delimiter() {
        let result = FileUpdate::decode("no-delimiter-here", MAX_FRAME_SIZE);
        assert!(matches!(result, Err(FrameError::Malformed)));
    }

    #[test]
    fn decode_splits_on_first_delimiter_only() {
        // The payload half is invalid base64 because of the second '|'.
        let result = FileUpdate::decode("a.txt|abc|def", MAX_FRAME_SIZE);
        assert!(matches!(result, Err(FrameError::Decode { .. })));
    }

    #[test]
    fn decode_rejects_oversized_frame_before_parsing() {
        let frame = format!("big.txt|{}", "A".repeat(64));
        let result = FileUpdate::decode(&frame, 16);
        assert!(matches!(
            result,
            Err(FrameError::TooLarge { limit: 16, .. })
        ));

        // Size is checked even when the frame would be malformed.
        let result = FileUpdate::decode(&"x".repeat(17), 16);
        assert!(matches!(result, Err(FrameError::TooLarge { .. })));
    }

    #[test]
    fn decode_rejects_unsafe_names() {
        for name in ["../etc/passwd", "/etc/passwd", "a/../b", ""] {
            let frame = format!("{name}|cHJpbnQoMSk=");
            let result = FileUpdate::decode(&frame, MAX_FRAME_SIZE);
            assert!(
                matches!(result, Err(FrameError::UnsafeName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn decode_rejects_editor_artifacts() {
        for name in [".main.py.swp", "main.py.tmp", "main.py~"] {
            let frame = format!("{name}|cHJpbnQoMSk=");
            let result = FileUpdate::decode(&frame, MAX_FRAME_SIZE);
            assert!(matches!(result, Err(FrameError::EditorArtifact(_))));
        }
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let result = FileUpdate::decode("main.py|not base64!", MAX_FRAME_SIZE);
        match result {
            Err(FrameError::Decode { name, .. }) => assert_eq!(name, "main.py"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn debug_hides_content() {
        let update = FileUpdate::new("secret.txt", b"password".to_vec());
        let debug = format!("{update:?}");
        assert!(debug.contains("8 bytes"));
        assert!(!debug.contains("password"));
    }
}
