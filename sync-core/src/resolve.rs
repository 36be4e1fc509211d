//! Watcher path resolution.
//!
//! Editors rarely write the file you are editing in place. Vim writes a
//! backup (`main.py~`) and some editors write `main.py.tmp` then rename it.
//! The event for the helper file really means "main.py changed", so it is
//! redirected to the real file when that file exists, and dropped otherwise.

use std::path::{Path, PathBuf};

use waveland_sync_types::{is_editor_artifact, BACKUP_SUFFIX, TEMP_SUFFIX};

/// Map a raw watcher path to the file that should be sent, if any.
///
/// `exists` is asked whether the real file behind a temp/backup name is
/// present; it is injected so the rule stays free of disk access.
///
/// Returns `None` when the event should be ignored.
pub fn resolve_event_path<F>(path: &Path, exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let mut resolved = path.to_path_buf();

    for suffix in [TEMP_SUFFIX, BACKUP_SUFFIX] {
        let name = resolved.file_name()?.to_str()?;
        if let Some(real) = name.strip_suffix(suffix) {
            if real.is_empty() {
                return None;
            }
            let target = resolved.with_file_name(real);
            if !exists(&target) {
                return None;
            }
            resolved = target;
        }
    }

    let name = resolved.file_name()?.to_str()?;
    if is_editor_artifact(name) {
        return None;
    }

    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(_: &Path) -> bool {
        true
    }

    fn never(_: &Path) -> bool {
        false
    }

    #[test]
    fn plain_file_passes_through() {
        let path = Path::new("/work/main.py");
        assert_eq!(resolve_event_path(path, never), Some(path.to_path_buf()));
    }

    #[test]
    fn temp_file_redirects_to_existing_target() {
        let resolved = resolve_event_path(Path::new("/work/main.py.tmp"), always);
        assert_eq!(resolved, Some(PathBuf::from("/work/main.py")));
    }

    #[test]
    fn temp_file_without_target_is_dropped() {
        assert_eq!(resolve_event_path(Path::new("/work/main.py.tmp"), never), None);
    }

    #[test]
    fn backup_redirects_to_existing_target() {
        let resolved = resolve_event_path(Path::new("/work/main.py~"), always);
        assert_eq!(resolved, Some(PathBuf::from("/work/main.py")));
    }

    #[test]
    fn backup_without_target_is_dropped() {
        assert_eq!(resolve_event_path(Path::new("/work/main.py~"), never), None);
    }

    #[test]
    fn exists_is_asked_about_the_real_file() {
        let only_main = |p: &Path| p == Path::new("/work/main.py");
        assert_eq!(
            resolve_event_path(Path::new("/work/main.py~"), only_main),
            Some(PathBuf::from("/work/main.py"))
        );
        assert_eq!(resolve_event_path(Path::new("/work/other.py~"), only_main), None);
    }

    #[test]
    fn swap_and_undo_files_are_dropped() {
        assert_eq!(resolve_event_path(Path::new("/work/.main.py.swp"), always), None);
        assert_eq!(resolve_event_path(Path::new("/work/.main.py.swx"), always), None);
        // `main.py.un~` strips to `main.py.un`, which is not a real file.
        assert_eq!(resolve_event_path(Path::new("/work/main.py.un~"), never), None);
        assert_eq!(resolve_event_path(Path::new("/work/main.py.bak"), always), None);
    }

    #[test]
    fn redirect_that_lands_on_an_artifact_is_dropped() {
        // `x.swp.tmp` → `x.swp`, still a swap file.
        assert_eq!(resolve_event_path(Path::new("/work/x.swp.tmp"), always), None);
    }

    #[test]
    fn bare_suffix_is_dropped() {
        assert_eq!(resolve_event_path(Path::new("/work/~"), always), None);
        assert_eq!(resolve_event_path(Path::new("/work/.tmp"), always), None);
    }
}
