//! Include resolution bookkeeping: the canonical-path stack used for cycle
//! detection and the depth counter (§4.4).

use std::path::{Path, PathBuf};

use webforge_core::error::IncludeError;

pub const MAX_INCLUDE_DEPTH: usize = 100;

pub struct IncludeContext {
    /// Canonical paths of files currently open on the include stack.
    open: Vec<PathBuf>,
    depth: usize,
}

impl IncludeContext {
    pub fn new(root_file: &Path) -> Self {
        let mut open = Vec::new();
        if let Ok(canon) = root_file.canonicalize() {
            open.push(canon);
        }
        Self { open, depth: 0 }
    }

    /// For parsing from an in-memory source string with no backing file
    /// (e.g. tests) — includes are still resolved relative to `base_dir`.
    pub fn rootless() -> Self {
        Self {
            open: Vec::new(),
            depth: 0,
        }
    }

    /// Attempt to enter `path`. On success, returns a guard that must be
    /// dropped (via `leave`) once the included file has been fully parsed.
    /// Fails with a cyclic-inclusion or too-deep error.
    pub fn enter(&mut self, path: &Path) -> Result<PathBuf, IncludeError> {
        let display = path.display().to_string();
        let canon = path
            .canonicalize()
            .map_err(|e| IncludeError::new(&display, format!("cannot resolve include path: {e}")))?;

        if self.open.contains(&canon) {
            return Err(IncludeError::cyclic(&display));
        }
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(IncludeError::too_deep(&display, MAX_INCLUDE_DEPTH));
        }

        self.open.push(canon.clone());
        self.depth += 1;
        Ok(canon)
    }

    pub fn leave(&mut self, canon: &Path) {
        self.open.retain(|p| p != canon);
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn entering_the_same_path_twice_is_cyclic() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.site");
        fs::write(&file, "website {}").unwrap();

        let mut ctx = IncludeContext::rootless();
        let canon = ctx.enter(&file).unwrap();
        let err = ctx.enter(&file).unwrap_err();
        assert!(err.message.contains("cyclic"));
        ctx.leave(&canon);
        // Re-entering after leaving is fine.
        assert!(ctx.enter(&file).is_ok());
    }

    #[test]
    fn depth_past_maximum_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = IncludeContext::rootless();
        for i in 0..MAX_INCLUDE_DEPTH {
            let file = dir.path().join(format!("f{i}.site"));
            fs::write(&file, "website {}").unwrap();
            assert!(ctx.enter(&file).is_ok());
        }
        let overflow = dir.path().join("overflow.site");
        fs::write(&overflow, "website {}").unwrap();
        let err = ctx.enter(&overflow).unwrap_err();
        assert!(err.message.contains("depth"));
    }
}
