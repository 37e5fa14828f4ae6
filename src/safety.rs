use std::path::{Path, PathBuf};
use thiserror::Error;

/// Build output directories inside a workspace that rewrites never touch.
pub const BUILD_DIRS: &[&str] = &["build", "target", "out", ".gradle"];

/// Keeps rewrites inside the workspace and away from build output and
/// dependency caches.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    workspace_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl WorkspaceGuard {
    /// The root is canonicalized so symlinked workspaces compare correctly.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let workspace_root = workspace_root.as_ref().canonicalize()?;
        let mut forbidden_paths = Vec::new();

        // Gradle and Maven dependency caches
        if let Some(home) = home::home_dir() {
            for cache in [".gradle", ".m2"] {
                if let Ok(dir) = home.join(cache).canonicalize() {
                    forbidden_paths.push(dir);
                }
            }
        }

        for dir in BUILD_DIRS {
            if let Ok(dir) = workspace_root.join(dir).canonicalize() {
                forbidden_paths.push(dir);
            }
        }

        Ok(Self {
            workspace_root,
            forbidden_paths,
        })
    }

    /// Returns the canonical absolute path if `path` may be rewritten.
    ///
    /// Relative paths resolve against the workspace root.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        let canonical = absolute.canonicalize()?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    #[cfg(test)]
    fn with_forbidden(
        workspace_root: impl AsRef<Path>,
        forbidden: Vec<PathBuf>,
    ) -> Result<Self, SafetyError> {
        Ok(Self {
            workspace_root: workspace_root.as_ref().canonicalize()?,
            forbidden_paths: forbidden,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn accepts_sources_inside_workspace() {
        let temp = tempfile::tempdir().unwrap();
        let guard = WorkspaceGuard::new(temp.path()).unwrap();

        let file = temp.path().join("src/main/kotlin/App.kt");
        touch(&file);
        assert!(guard.validate_path(&file).is_ok());
        assert!(guard.validate_path("src/main/kotlin/App.kt").is_ok());
    }

    #[test]
    fn rejects_outside_workspace() {
        let temp = tempfile::tempdir().unwrap();
        let workspace = temp.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let guard = WorkspaceGuard::new(&workspace).unwrap();

        let outside = temp.path().join("Outside.java");
        touch(&outside);
        assert!(matches!(
            guard.validate_path(&outside),
            Err(SafetyError::OutsideWorkspace { .. })
        ));
    }

    #[test]
    fn rejects_build_output() {
        let temp = tempfile::tempdir().unwrap();
        for dir in BUILD_DIRS {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        let guard = WorkspaceGuard::new(temp.path()).unwrap();

        for dir in BUILD_DIRS {
            let file = temp.path().join(dir).join("generated/Gen.java");
            touch(&file);
            assert!(
                matches!(guard.validate_path(&file), Err(SafetyError::ForbiddenPath { .. })),
                "{dir} should be forbidden"
            );
        }
    }

    #[test]
    fn custom_forbidden_paths() {
        let temp = tempfile::tempdir().unwrap();
        let vendored = temp.path().join("vendored");
        fs::create_dir_all(&vendored).unwrap();
        let guard =
            WorkspaceGuard::with_forbidden(temp.path(), vec![vendored.canonicalize().unwrap()])
                .unwrap();

        let file = vendored.join("Lib.kt");
        touch(&file);
        assert!(matches!(
            guard.validate_path(&file),
            Err(SafetyError::ForbiddenPath { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::tempdir().unwrap();
        let workspace = temp.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let outside = temp.path().join("Outside.kt");
        touch(&outside);
        let link = workspace.join("Escape.kt");
        symlink(&outside, &link).unwrap();

        let guard = WorkspaceGuard::new(&workspace).unwrap();
        assert!(matches!(
            guard.validate_path(&link),
            Err(SafetyError::OutsideWorkspace { .. })
        ));
    }
}
