//! Configuration – reads/writes `~/.tagpose/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tagpose_types::{EvictionPolicy, SmoothingConfig};

/// Persisted configuration of the replay tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// A marker must be seen in more than this many consecutive frames
    /// before its position is published.
    #[serde(default = "default_min_ticks")]
    pub min_ticks: u64,

    /// Topic prefix; positions go to `{prefix}{id}/position`.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Filter tuning and state retention.
    #[serde(default)]
    pub smoothing: SmoothingConfig,
}

fn default_min_ticks() -> u64 {
    5
}
fn default_topic_prefix() -> String {
    "robot/".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_ticks: default_min_ticks(),
            topic_prefix: default_topic_prefix(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

/// Return the path to `~/.tagpose/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tagpose").join("config.toml")
}

/// Load the config from `path` (or `~/.tagpose/config.toml`), apply
/// environment overrides and validate the result.  Returns `None` if the
/// file does not exist.
pub fn load(path: Option<&Path>) -> Result<Option<Config>, String> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let Some(mut cfg) = load_from(&path)? else {
        return Ok(None);
    };
    apply_env_overrides(&mut cfg);
    cfg.smoothing.validate().map_err(|e| e.to_string())?;
    Ok(Some(cfg))
}

/// Read and validate the config file at `path`, without environment
/// overrides.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    cfg.smoothing.validate().map_err(|e| e.to_string())?;
    Ok(Some(cfg))
}

/// Apply `TAGPOSE_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `TAGPOSE_MIN_TICKS` | `min_ticks` |
/// | `TAGPOSE_TOPIC_PREFIX` | `topic_prefix` |
/// | `TAGPOSE_EVICT_AFTER_SECS` | `smoothing.eviction` (`UnseenFor`) |
/// | `TAGPOSE_POSITION_MIN_CUTOFF` | `smoothing.position.min_cutoff` |
/// | `TAGPOSE_YAW_MIN_CUTOFF` | `smoothing.yaw.min_cutoff` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TAGPOSE_MIN_TICKS")
        && let Ok(ticks) = v.parse::<u64>()
    {
        cfg.min_ticks = ticks;
    }
    if let Ok(v) = std::env::var("TAGPOSE_TOPIC_PREFIX") {
        cfg.topic_prefix = v;
    }
    if let Ok(v) = std::env::var("TAGPOSE_EVICT_AFTER_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        cfg.smoothing.eviction = EvictionPolicy::UnseenFor { secs };
    }
    if let Ok(v) = std::env::var("TAGPOSE_POSITION_MIN_CUTOFF")
        && let Ok(cutoff) = v.parse::<f64>()
    {
        cfg.smoothing.position.min_cutoff = cutoff;
    }
    if let Ok(v) = std::env::var("TAGPOSE_YAW_MIN_CUTOFF")
        && let Ok(cutoff) = v.parse::<f64>()
    {
        cfg.smoothing.yaw.min_cutoff = cutoff;
    }
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagpose_types::FilterParams;

    #[test]
    fn config_path_points_to_tagpose_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".tagpose"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn roundtrip_custom_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let mut cfg = Config::default();
        cfg.min_ticks = 2;
        cfg.smoothing.yaw = FilterParams::new(1.5, 0.2, 4.0);
        cfg.smoothing.eviction = EvictionPolicy::UnseenFor { secs: 3.0 };
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[smoothing.position]\nmin_cutoff = 2.0\nbeta = 0.0\nd_cutoff = 1.0\n")
            .unwrap();

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.min_ticks, 5);
        assert_eq!(loaded.topic_prefix, "robot/");
        assert_eq!(loaded.smoothing.position, FilterParams::new(2.0, 0.0, 1.0));
        assert_eq!(loaded.smoothing.yaw, FilterParams::default());
        assert_eq!(loaded.smoothing.eviction, EvictionPolicy::Never);
    }

    #[test]
    fn invalid_filter_params_are_reported() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[smoothing.yaw]\nmin_cutoff = 1.0\nbeta = -2.0\nd_cutoff = 1.0\n")
            .unwrap();
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("beta"), "{err}");
    }

    #[test]
    fn unparseable_file_is_reported() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "min_ticks = \"many\"").unwrap();
        assert!(load_from(&path).unwrap_err().starts_with("Failed to parse config"));
    }

    #[test]
    fn apply_env_overrides_changes_min_ticks() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TAGPOSE_MIN_TICKS", "12") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.min_ticks, 12);
        unsafe { std::env::remove_var("TAGPOSE_MIN_TICKS") };
    }

    #[test]
    fn apply_env_overrides_enables_eviction() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TAGPOSE_EVICT_AFTER_SECS", "4.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.smoothing.eviction, EvictionPolicy::UnseenFor { secs: 4.5 });
        unsafe { std::env::remove_var("TAGPOSE_EVICT_AFTER_SECS") };
    }

    #[test]
    fn apply_env_overrides_changes_cutoffs() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe {
            std::env::set_var("TAGPOSE_POSITION_MIN_CUTOFF", "0.8");
            std::env::set_var("TAGPOSE_YAW_MIN_CUTOFF", "1.2");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.smoothing.position.min_cutoff, 0.8);
        assert_eq!(cfg.smoothing.yaw.min_cutoff, 1.2);
        unsafe {
            std::env::remove_var("TAGPOSE_POSITION_MIN_CUTOFF");
            std::env::remove_var("TAGPOSE_YAW_MIN_CUTOFF");
        }
    }

    #[test]
    fn apply_env_overrides_changes_topic_prefix() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("TAGPOSE_TOPIC_PREFIX", "arena/") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.topic_prefix, "arena/");
        unsafe { std::env::remove_var("TAGPOSE_TOPIC_PREFIX") };
    }
}
