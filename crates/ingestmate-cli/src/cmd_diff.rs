use anyhow::Context;
use ingestmate_core::schema_diff::diff_versions;
use ingestmate_core::{SchemaChange, SchemaVersion};
use std::path::Path;

pub fn execute(from: &Path, to: &Path, json: bool) -> anyhow::Result<()> {
    let changes = diff(from, to)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }
    if changes.is_empty() {
        println!("(no schema changes)");
        return Ok(());
    }
    for c in &changes {
        println!("{:<6}  {:<6}  {}", c.kind.label(), c.impact, c.description);
    }
    Ok(())
}

pub fn diff(from: &Path, to: &Path) -> anyhow::Result<Vec<SchemaChange>> {
    let old = read_version(from)?;
    let new = read_version(to)?;
    if old.pipeline != new.pipeline {
        anyhow::bail!(
            "schema versions belong to different pipelines ({} vs {})",
            old.pipeline,
            new.pipeline
        );
    }
    if new.version <= old.version {
        tracing::warn!(
            from = old.version,
            to = new.version,
            "diffing against an older or equal schema version"
        );
    }
    Ok(diff_versions(&old, &new))
}

fn read_version(path: &Path) -> anyhow::Result<SchemaVersion> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing schema version {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestmate_core::{SchemaChangeKind, Severity};

    const V1: &str = r#"{
      "id": "orders-v1", "pipeline": "orders", "version": 1,
      "timestamp": "2026-01-01T00:00:00Z",
      "columns": [
        {"name": "id", "type": "int", "nullable": false},
        {"name": "amount", "type": "float", "nullable": true},
        {"name": "legacy", "type": "string", "nullable": true}
      ]
    }"#;

    const V2: &str = r#"{
      "id": "orders-v2", "pipeline": "orders", "version": 2,
      "timestamp": "2026-02-01T00:00:00Z",
      "columns": [
        {"name": "id", "type": "int", "nullable": false},
        {"name": "amount", "type": "decimal", "nullable": true},
        {"name": "currency", "type": "string", "nullable": true}
      ]
    }"#;

    fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn diff_files() {
        let tmp = tempfile::tempdir().unwrap();
        let from = write(tmp.path(), "v1.json", V1);
        let to = write(tmp.path(), "v2.json", V2);

        let changes = diff(&from, &to).unwrap();
        let labels: Vec<&str> = changes.iter().map(|c| c.kind.label()).collect();
        assert_eq!(labels, ["add", "remove", "modify"]);
        assert_eq!(changes[1].impact, Severity::High);
        assert!(matches!(
            &changes[2].kind,
            SchemaChangeKind::Modify { previous_column, .. } if previous_column.data_type == "float"
        ));
    }

    #[test]
    fn different_pipelines_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let from = write(tmp.path(), "v1.json", V1);
        let to = write(
            tmp.path(),
            "other.json",
            &V2.replace(r#""pipeline": "orders""#, r#""pipeline": "users""#),
        );
        assert!(diff(&from, &to).is_err());
    }
}
