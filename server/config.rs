use std::env;
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TRAIN_DATA_PATH: &str = "train_img_data.json";
const DEFAULT_PLOTS_DIR: &str = "plots";
const DEFAULT_DIST_DIR: &str = "./dist";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Runtime settings of the data server, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Train manifest served at `/api/trains`
    pub train_data_path: PathBuf,
    pub plots_dir: PathBuf,
    /// Built single-page app
    pub dist_dir: PathBuf,
    /// Origin allowed to call the API cross-origin (the dev server)
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            train_data_path: PathBuf::from(DEFAULT_TRAIN_DATA_PATH),
            plots_dir: PathBuf::from(DEFAULT_PLOTS_DIR),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup; unset or unparsable values keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            port: non_empty("PORT")
                .and_then(|p| p.trim().parse::<u16>().ok())
                .unwrap_or(defaults.port),
            train_data_path: non_empty("TRAIN_DATA_PATH")
                .map_or(defaults.train_data_path, PathBuf::from),
            plots_dir: non_empty("PLOTS_DIR").map_or(defaults.plots_dir, PathBuf::from),
            dist_dir: non_empty("DIST_DIR").map_or(defaults.dist_dir, PathBuf::from),
            allowed_origin: non_empty("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 8080);
        assert_eq!(config.allowed_origin, "http://localhost:5173");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "5000"),
            ("TRAIN_DATA_PATH", "/srv/data/trains.json"),
            ("PLOTS_DIR", "/srv/plots"),
            ("DIST_DIR", "/srv/dist"),
            ("ALLOWED_ORIGIN", "https://trains.example.org"),
        ]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.train_data_path, PathBuf::from("/srv/data/trains.json"));
        assert_eq!(config.plots_dir, PathBuf::from("/srv/plots"));
        assert_eq!(config.dist_dir, PathBuf::from("/srv/dist"));
        assert_eq!(config.allowed_origin, "https://trains.example.org");
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[("PORT", "http")]));
        assert_eq!(config.port, 8080);

        let config = ServerConfig::from_lookup(lookup_from(&[("PORT", "70000")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = ServerConfig::from_lookup(lookup_from(&[("PLOTS_DIR", "  ")]));
        assert_eq!(config.plots_dir, PathBuf::from("plots"));
    }
}
