use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default plotbatch data directory: ~/.plotbatch
pub fn get_plotbatch_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".plotbatch"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.plotbatch/config.toml
    let user_config = get_plotbatch_data_dir()?.join("config.toml");

    // Priority 2: ./plotbatch.toml
    let local_config = Path::new("plotbatch.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("read {} failed: {e}", path.display()))?;
    let cfg = toml::from_str::<AppConfig>(&s)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(cfg)
}

// Environment variables win over file values; blank values are ignored.
fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("PLOTBATCH_PATTERN") {
        cfg.batch.pattern = v;
    }
    if let Some(v) = get("PLOTBATCH_JOBS") {
        cfg.batch.jobs = v
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("PLOTBATCH_JOBS must be a positive integer: {e}"))?;
    }
    if let Some(v) = get("PLOTBATCH_PROGRAM") {
        cfg.batch.command.program = v;
    }
    Ok(())
}
