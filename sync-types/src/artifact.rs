//! Editor artifact recognition.
//!
//! Vim, Neovim and most IDEs save through helper files: swap files
//! (`.main.py.swp`), undo files (`main.py.un~`), backups (`main.py~`,
//! `main.py.bak`), write-then-rename temp files (`main.py.tmp`) and Vim's
//! `4913` write probe. Emacs adds lock files (`.#main.py`) and auto-saves
//! (`#main.py#`). None of these should ever be mirrored.

use regex::Regex;
use std::sync::LazyLock;

/// Suffix editors append to a temp copy before renaming it over the real file.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Suffix editors append to backup copies of the real file.
pub const BACKUP_SUFFIX: &str = "~";

// `.sw[a-z]` is the vim swap family (.swp, .swo, .swn, ...); a single
// trailing letter keeps real extensions like `.swift` out.
static ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\.(sw[a-z]|swpx|bak|tmp)|~)$|^4913$|^\.#|^#.*#$")
        .expect("artifact pattern is valid")
});

/// Returns true if `name` looks like an editor swap/undo/backup/temp file.
///
/// Matching is case-insensitive and only looks at the end of the name.
pub fn is_editor_artifact(name: &str) -> bool {
    ARTIFACT.is_match(name)
}
