use clap::Subcommand;
use ingestmate_ledger::{write_atomic, MonitorConfig, WorkspacePaths};
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. agent_mode, principal, approval_success_rate, rng_seed)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(repo_root, &key, &value),
        ConfigCmd::Get { key } => get(repo_root, &key),
        ConfigCmd::List => list(repo_root),
    }
}

// ── Command Implementations ──

type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Read `.ingestmate/config.json` as a raw map. Missing file is an empty map.
fn read_config(path: &Path) -> anyhow::Result<ConfigMap> {
    if !path.exists() {
        return Ok(ConfigMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let val: serde_json::Value = serde_json::from_str(&content)?;
    match val {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

fn write_config(path: &Path, config: &ConfigMap) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    write_atomic(path, json.as_bytes())
}

/// Parse a string value into an appropriate JSON value (bool/number/string).
fn parse_value(s: &str) -> serde_json::Value {
    match s {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                serde_json::Value::Number(n.into())
            } else if let Ok(f) = s.parse::<f64>() {
                serde_json::json!(f)
            } else {
                serde_json::Value::String(s.to_string())
            }
        }
    }
}

/// Keys whose values are stored verbatim, even when they look like numbers or booleans.
const STRING_KEYS: &[&str] = &["agent_mode", "principal"];

fn value_for(key: &str, raw: &str) -> serde_json::Value {
    if STRING_KEYS.contains(&key) {
        serde_json::Value::String(raw.to_string())
    } else {
        parse_value(raw)
    }
}

/// Insert `key = value` and write the file, refusing values the monitor could not load.
fn set_value(paths: &WorkspacePaths, key: &str, value: &str) -> anyhow::Result<()> {
    paths.require_initialized()?;
    let mut config = read_config(&paths.config_json)?;
    config.insert(key.to_string(), value_for(key, value));

    let parsed: MonitorConfig = serde_json::from_value(serde_json::Value::Object(config.clone()))
        .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}"))?;
    parsed.validate()?;

    write_config(&paths.config_json, &config)
}

/// `ingestmate config set <key> <value>`
pub fn set(repo_root: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let paths = WorkspacePaths::discover(repo_root);
    set_value(&paths, key, value)?;
    println!("{key} = {value}");
    Ok(())
}

/// `ingestmate config get <key>`
pub fn get(repo_root: &Path, key: &str) -> anyhow::Result<()> {
    let paths = WorkspacePaths::discover(repo_root);
    paths.require_initialized()?;
    let config = read_config(&paths.config_json)?;
    match config.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `ingestmate config list`, showing effective values including defaults.
pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let paths = WorkspacePaths::discover(repo_root);
    paths.require_initialized()?;
    let effective = serde_json::to_value(MonitorConfig::load(&paths)?)?;
    let explicit = read_config(&paths.config_json)?;
    if let serde_json::Value::Object(map) = effective {
        for (k, v) in &map {
            let origin = if explicit.contains_key(k) { "" } else { "  (default)" };
            println!("{k} = {v}{origin}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestmate_core::AgentMode;

    fn workspace() -> (tempfile::TempDir, WorkspacePaths) {
        let tmp = tempfile::tempdir().unwrap();
        crate::cmd_init::execute(tmp.path()).unwrap();
        let paths = WorkspacePaths::discover(tmp.path());
        (tmp, paths)
    }

    #[test]
    fn parse_value_types() {
        assert_eq!(parse_value("true"), serde_json::Value::Bool(true));
        assert_eq!(parse_value("7"), serde_json::json!(7));
        assert_eq!(parse_value("0.5"), serde_json::json!(0.5));
        assert_eq!(parse_value("supervised"), serde_json::json!("supervised"));
    }

    #[test]
    fn set_feeds_monitor_config() {
        let (_tmp, paths) = workspace();
        set_value(&paths, "agent_mode", "supervised").unwrap();
        set_value(&paths, "rng_seed", "42").unwrap();
        set_value(&paths, "approval_success_rate", "1").unwrap();

        let cfg = MonitorConfig::load(&paths).unwrap();
        assert_eq!(cfg.agent_mode, AgentMode::Supervised);
        assert_eq!(cfg.rng_seed, Some(42));
        assert_eq!(cfg.approval_success_rate, 1.0);
    }

    #[test]
    fn string_keys_keep_raw_text() {
        let (_tmp, paths) = workspace();
        set_value(&paths, "principal", "42").unwrap();
        assert_eq!(MonitorConfig::load(&paths).unwrap().principal, "42");
        set_value(&paths, "principal", "true").unwrap();
        assert_eq!(MonitorConfig::load(&paths).unwrap().principal, "true");
        assert_eq!(value_for("rng_seed", "42"), serde_json::json!(42));
    }

    #[test]
    fn invalid_values_are_not_written() {
        let (_tmp, paths) = workspace();
        assert!(set_value(&paths, "agent_mode", "sometimes").is_err());
        assert!(set_value(&paths, "approval_success_rate", "1.5").is_err());
        assert!(!paths.config_json.exists());
    }

    #[test]
    fn set_requires_init() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::discover(tmp.path());
        assert!(set_value(&paths, "principal", "ops").is_err());
    }
}
