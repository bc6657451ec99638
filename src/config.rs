//! Runtime settings, read from `CORKBOARD_*` environment variables.
//!
//! - `CORKBOARD_DEV_MODE`: show coordinates on cards and log drops
//! - `CORKBOARD_BREAKPOINT`: widest viewport (layout units) treated as mobile
//! - `CORKBOARD_ASSET_DIR`: directory photo sources are resolved against
//! - `CORKBOARD_LAYOUT`: TOML layout override (default `<config dir>/layout.toml`)
//! - `CORKBOARD_DECODE_WORKERS`: image decode threads

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::layout::table::MOBILE_BREAKPOINT;
use crate::preload::queue::DEFAULT_WORKERS;

const LAYOUT_FILE: &str = "layout.toml";
const DEFAULT_ASSET_DIR: &str = "assets";

#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub dev_mode: bool,
    pub breakpoint: u32,
    pub asset_dir: PathBuf,
    pub layout_path: Option<PathBuf>,
    pub decode_workers: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            breakpoint: MOBILE_BREAKPOINT,
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            layout_path: None,
            decode_workers: DEFAULT_WORKERS,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_positive<T>(value: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    value.trim().parse::<T>().ok().filter(|v| *v > T::default())
}

impl BoardConfig {
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok());
        if config.layout_path.is_none() {
            config.layout_path = default_layout_path().filter(|path| path.exists());
        }
        config
    }

    /// Builds a config from any key lookup; unset or malformed values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            dev_mode: lookup("CORKBOARD_DEV_MODE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.dev_mode),
            breakpoint: lookup("CORKBOARD_BREAKPOINT")
                .and_then(|v| parse_positive(&v))
                .unwrap_or(defaults.breakpoint),
            asset_dir: lookup("CORKBOARD_ASSET_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_dir),
            layout_path: lookup("CORKBOARD_LAYOUT")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            decode_workers: lookup("CORKBOARD_DECODE_WORKERS")
                .and_then(|v| parse_positive(&v))
                .unwrap_or(defaults.decode_workers),
        }
    }
}

/// `<XDG config dir>/corkboard/layout.toml`, when the platform has one.
pub fn default_layout_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "corkboard").map(|dirs| dirs.config_dir().join(LAYOUT_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = BoardConfig::from_lookup(|_| None);
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.breakpoint, 768);
    }

    #[test]
    fn flags_accept_common_spellings() {
        for value in ["1", "true", "YES", " on "] {
            let config = BoardConfig::from_lookup(lookup_from(&[("CORKBOARD_DEV_MODE", value)]));
            assert!(config.dev_mode, "{value}");
        }
        let config = BoardConfig::from_lookup(lookup_from(&[("CORKBOARD_DEV_MODE", "0")]));
        assert!(!config.dev_mode);
    }

    #[test]
    fn overrides_are_applied() {
        let config = BoardConfig::from_lookup(lookup_from(&[
            ("CORKBOARD_BREAKPOINT", "900"),
            ("CORKBOARD_ASSET_DIR", "/srv/board"),
            ("CORKBOARD_LAYOUT", "/etc/corkboard/layout.toml"),
            ("CORKBOARD_DECODE_WORKERS", "3"),
        ]));
        assert_eq!(config.breakpoint, 900);
        assert_eq!(config.asset_dir, PathBuf::from("/srv/board"));
        assert_eq!(
            config.layout_path,
            Some(PathBuf::from("/etc/corkboard/layout.toml"))
        );
        assert_eq!(config.decode_workers, 3);
    }

    #[test]
    fn malformed_numbers_keep_defaults() {
        let config = BoardConfig::from_lookup(lookup_from(&[
            ("CORKBOARD_BREAKPOINT", "wide"),
            ("CORKBOARD_DECODE_WORKERS", "0"),
        ]));
        assert_eq!(config.breakpoint, MOBILE_BREAKPOINT);
        assert_eq!(config.decode_workers, DEFAULT_WORKERS);
    }

    #[test]
    fn default_layout_path_ends_with_file_name() {
        if let Some(path) = default_layout_path() {
            assert!(path.ends_with("layout.toml"));
        }
    }
}
