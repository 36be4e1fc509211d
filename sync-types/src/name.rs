//! Path-safety rule for file names received over the wire.
//!
//! This is the only defence against a peer writing outside the shared
//! directory, so it is deliberately narrow: a name must be one plain path
//! component that normalizes to itself.

use std::path::{Component, Path};

use crate::FrameError;

/// Validate a wire name and return it unchanged if it is a safe bare file name.
///
/// Rejected:
/// - empty names, `.` and anything containing `..`
/// - names with a `/` or `\` separator (so `a/../b` and `../etc/passwd`)
/// - absolute paths and drive/root prefixes (`/etc/passwd`, `C:x`)
/// - names containing NUL
pub fn validate_name(name: &str) -> Result<&str, FrameError> {
    let unsafe_name = || FrameError::UnsafeName(name.to_string());

    if name.is_empty() || name.contains("..") || name.contains('\0') {
        return Err(unsafe_name());
    }
    if name.contains('/') || name.contains('\\') {
        return Err(unsafe_name());
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Ok(name),
        _ => Err(unsafe_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert_eq!(validate_name("notes.txt").unwrap(), "notes.txt");
        assert_eq!(validate_name("main.py").unwrap(), "main.py");
        assert_eq!(validate_name(".env").unwrap(), ".env");
        assert_eq!(validate_name("with space.md").unwrap(), "with space.md");
    }

    #[test]
    fn rejects_traversal() {
        assert!(validate_name("../etc/passwd").is_err());
        assert!(validate_name("a/../b").is_err());
        assert!(validate_name("..").is_err());
        assert!(validate_name("foo..bar").is_err());
    }

    #[test]
    fn rejects_roots_and_separators() {
        assert!(validate_name("/etc/passwd").is_err());
        assert!(validate_name("dir/file.txt").is_err());
        assert!(validate_name("dir\\file.txt").is_err());
        assert!(validate_name("file.txt/").is_err());
    }

    #[test]
    fn rejects_degenerate_names() {
        assert!(validate_name("").is_err());
        assert!(validate_name(".").is_err());
        assert!(validate_name("a\0b").is_err());
    }
}
