//! Vim-setup command - install autoread plugins for Vim and Neovim.
//!
//! Editors keep their own copy of an open file; without autoread a
//! partner's change lands on disk but never shows up in the buffer.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Vim plugin body.
const VIM_PLUGIN: &str = include_str!("../../extras/autoread.vim");

/// Neovim `after/plugin` snippet.
const NVIM_SNIPPET: &str = r#"-- waveland: reload buffers changed on disk by a session partner
vim.opt.autoread = true
vim.opt.updatetime = 500
local group = vim.api.nvim_create_augroup("waveland_autoread", { clear = true })

vim.api.nvim_create_autocmd(
  { "FocusGained", "BufEnter", "CursorHold", "CursorHoldI", "TermEnter" },
  {
    group = group,
    pattern = "*",
    callback = function()
      -- pcall avoids 'checktime' errors in special buffers
      pcall(vim.cmd, "checktime")
    end,
    desc = "Reload buffer if the file changed on disk",
  }
)
"#;

/// Where the plugins go.
#[derive(Debug, Clone)]
pub struct Targets {
    /// `~/.vim/pack/waveland/start/autoread/plugin/autoread.vim`
    pub vim_plugin: PathBuf,
    /// `<nvim config>/after/plugin/waveland.lua`
    pub nvim_plugin: PathBuf,
}

impl Targets {
    /// Targets under the given home and Neovim config directories.
    pub fn new(home: &Path, nvim_config: &Path) -> Self {
        Self {
            vim_plugin: home
                .join(".vim")
                .join("pack")
                .join("waveland")
                .join("start")
                .join("autoread")
                .join("plugin")
                .join("autoread.vim"),
            nvim_plugin: nvim_config
                .join("after")
                .join("plugin")
                .join("waveland.lua"),
        }
    }

    /// Targets for the current user.
    pub fn for_current_user() -> Result<Self> {
        let base = directories::BaseDirs::new().context("Could not determine home directory")?;
        Ok(Self::new(base.home_dir(), &nvim_config_dir(&base)))
    }
}

/// Neovim's `stdpath('config')`.
fn nvim_config_dir(base: &directories::BaseDirs) -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("nvim");
    }
    if cfg!(windows) {
        base.config_local_dir().join("nvim")
    } else {
        base.home_dir().join(".config").join("nvim")
    }
}

/// Outcome of an install attempt.
#[derive(Debug, Default)]
pub struct Report {
    /// Editors that were set up.
    pub installed: Vec<&'static str>,
    /// Editors that failed, with the reason.
    pub failures: Vec<String>,
}

/// Install both plugins; one failing does not stop the other.
pub fn install(targets: &Targets) -> Report {
    let mut report = Report::default();

    for (editor, path, body) in [
        ("Vim", &targets.vim_plugin, VIM_PLUGIN),
        ("Neovim", &targets.nvim_plugin, NVIM_SNIPPET),
    ] {
        match write_file(path, body) {
            Ok(()) => report.installed.push(editor),
            Err(e) => report.failures.push(format!("{editor}: {e:#}")),
        }
    }
    report
}

fn write_file(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

/// Run the vim-setup command.
pub fn run() -> Result<()> {
    let targets = Targets::for_current_user()?;
    let report = install(&targets);

    for editor in &report.installed {
        println!("{editor} is set up, restart it to pick up the change");
    }
    if report.installed.is_empty() {
        return Err(anyhow!("{}", report.failures.join("; ")));
    }
    for failure in &report.failures {
        println!("Skipped {failure}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn installs_both_plugins() {
        let dir = tempdir().unwrap();
        let targets = Targets::new(dir.path(), &dir.path().join(".config").join("nvim"));

        let report = install(&targets);

        assert_eq!(report.installed, vec!["Vim", "Neovim"]);
        assert!(report.failures.is_empty());
        let vim = std::fs::read_to_string(&targets.vim_plugin).unwrap();
        assert!(vim.contains("set autoread"));
        let nvim = std::fs::read_to_string(&targets.nvim_plugin).unwrap();
        assert!(nvim.contains("checktime"));
    }

    #[test]
    fn one_failure_does_not_stop_the_other() {
        let dir = tempdir().unwrap();
        // A file where the .vim directory should be.
        std::fs::write(dir.path().join(".vim"), "").unwrap();
        let targets = Targets::new(dir.path(), &dir.path().join("nvim"));

        let report = install(&targets);

        assert_eq!(report.installed, vec!["Neovim"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("Vim:"));
    }

    #[test]
    fn reinstall_overwrites() {
        let dir = tempdir().unwrap();
        let targets = Targets::new(dir.path(), &dir.path().join("nvim"));
        std::fs::create_dir_all(targets.nvim_plugin.parent().unwrap()).unwrap();
        std::fs::write(&targets.nvim_plugin, "old").unwrap();

        install(&targets);

        assert_eq!(
            std::fs::read_to_string(&targets.nvim_plugin).unwrap(),
            NVIM_SNIPPET
        );
    }

    #[test]
    fn target_layout() {
        let targets = Targets::new(Path::new("/home/dev"), Path::new("/home/dev/.config/nvim"));
        assert_eq!(
            targets.vim_plugin,
            Path::new("/home/dev/.vim/pack/waveland/start/autoread/plugin/autoread.vim")
        );
        assert_eq!(
            targets.nvim_plugin,
            Path::new("/home/dev/.config/nvim/after/plugin/waveland.lua")
        );
    }
}
