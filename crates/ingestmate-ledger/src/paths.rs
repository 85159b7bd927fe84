use std::path::{Path, PathBuf};

/// All well-known paths under `.ingestmate/`.
#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub root: PathBuf,
    pub workspace_dir: PathBuf,
    pub interventions_json: PathBuf,
    pub rules_yaml: PathBuf,
    pub config_json: PathBuf,
    pub lock_file: PathBuf,
}

impl WorkspacePaths {
    /// Derive all paths from a project root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let workspace_dir = root.join(".ingestmate");
        Self {
            interventions_json: workspace_dir.join("interventions.json"),
            rules_yaml: workspace_dir.join("rules.yaml"),
            config_json: workspace_dir.join("config.json"),
            lock_file: workspace_dir.join("LOCK"),
            workspace_dir,
            root,
        }
    }

    /// Create the workspace directory. Idempotent.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.workspace_dir)?;
        Ok(())
    }

    /// Check whether `.ingestmate/` exists.
    pub fn is_initialized(&self) -> bool {
        self.workspace_dir.is_dir()
    }

    /// Fail with a hint when the workspace has not been initialized.
    pub fn require_initialized(&self) -> anyhow::Result<()> {
        if !self.is_initialized() {
            anyhow::bail!(
                "not an ingestmate workspace ({}/.ingestmate not found). Run `ingestmate init` first.",
                self.root.display()
            );
        }
        Ok(())
    }
}

/// Atomic write: write to temp file in same dir, then rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    use std::io::Write;

    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_is_pure() {
        let p = WorkspacePaths::discover("/tmp/nowhere-ingestmate");
        assert!(p.interventions_json.ends_with(".ingestmate/interventions.json"));
        assert!(p.rules_yaml.ends_with(".ingestmate/rules.yaml"));
        assert!(!p.is_initialized());
        assert!(p.require_initialized().is_err());
    }

    #[test]
    fn ensure_layout_initializes() {
        let tmp = tempfile::tempdir().unwrap();
        let p = WorkspacePaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        p.ensure_layout().unwrap();
        assert!(p.is_initialized());
        assert!(p.require_initialized().is_ok());
    }

    #[test]
    fn write_atomic_replaces_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("f.json");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
    }
}
