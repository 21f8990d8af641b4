//! Runtime configuration for the `qs` front end.
//!
//! Combines command-line flags with environment variables and standard
//! per-user locations:
//!
//! | Setting        | Sources, highest priority first                              |
//! |----------------|--------------------------------------------------------------|
//! | library dir    | `-L<dir>`, `$QSLIBDIR`, user data dir (`…/qs`) if it exists  |
//! | depth limit    | `-D<n>`, `$QS_MAX_DEPTH`, none                               |
//! | rc file        | `-f<file>`, else first of `~/.qsrc`, `./.qsrc`; `-f` skips   |
//!
//! The library dir is exposed to scripts as the `QSLIBDIR` binding, which
//! `use` consults for relative paths.

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};

use crate::cli::{CliArgs, RcFile};
use crate::error::{Error, Result};
use crate::script::builtins::strip_layout;
use crate::script::Machine;

pub const LIBDIR_ENV: &str = "QSLIBDIR";
pub const MAX_DEPTH_ENV: &str = "QS_MAX_DEPTH";
pub const RC_NAME: &str = ".qsrc";

/// Resolved settings for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Config {
    pub libdir: Option<PathBuf>,
    pub max_depth: Option<usize>,
    pub rc_file: Option<PathBuf>,
}

impl Config {
    /// Resolve settings from parsed arguments and the process environment.
    pub fn resolve(args: &CliArgs) -> Self {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Like [`resolve`](Self::resolve), reading variables through `lookup`.
    pub fn resolve_with<F>(args: &CliArgs, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let libdir = args
            .libdir
            .clone()
            .or_else(|| lookup(LIBDIR_ENV).map(PathBuf::from))
            .or_else(user_libdir);

        let max_depth = args.max_depth.or_else(|| {
            let raw = lookup(MAX_DEPTH_ENV)?;
            match raw.trim().parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => {
                    tracing::warn!(var = MAX_DEPTH_ENV, value = %raw, "ignoring invalid depth limit");
                    None
                }
            }
        });

        let rc_file = match &args.rc {
            RcFile::Skip => None,
            RcFile::Explicit(path) => Some(path.clone()),
            RcFile::Search => find_user_rc(),
        };

        Config { libdir, max_depth, rc_file }
    }

    /// Apply the settings to a machine.
    pub fn apply(&self, m: &mut Machine) {
        m.set_max_depth(self.max_depth);
        if let Some(dir) = &self.libdir {
            m.define(LIBDIR_ENV, dir.display().to_string());
        }
    }
}

/// Per-user library directory, if it has been created.
fn user_libdir() -> Option<PathBuf> {
    let dirs = ProjectDirs::from("", "", "qs")?;
    let dir = dirs.data_dir().to_path_buf();
    dir.is_dir().then_some(dir)
}

/// Search for the user rc file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_rc() -> Option<PathBuf> {
    let home = BaseDirs::new().map(|d| d.home_dir().join(RC_NAME));
    home.into_iter()
        .chain(std::iter::once(PathBuf::from(".").join(RC_NAME)))
        .find(|p| p.is_file())
}

/// Read a script for the host, reporting failures as [`Error::Io`].
pub fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Bind command-line arguments as `args-0 … args-(n-1)` and `args-len`.
pub fn seed_args(m: &mut Machine, args: &[String]) {
    for (i, arg) in args.iter().enumerate() {
        m.define(format!("args-{i}"), arg.as_str());
    }
    m.define("args-len", args.len().to_string());
}

/// Evaluate a script file the way `use` would, but report a missing or
/// unreadable file instead of skipping it.  Returns the script's output.
pub fn run_script(m: &mut Machine, path: &Path) -> Result<String> {
    let src = read_script(path)?;
    tracing::debug!(path = %path.display(), "running script");
    m.eval(&strip_layout(&src))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
