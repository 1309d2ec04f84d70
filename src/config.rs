//! Environment-based configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub triton_url: String,
    pub triton_model: String,
    pub grpc_pool_size: usize,
    pub model_input_size: u32,
    pub confidence_threshold: f32,
    pub detect_timeout: Duration,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub font_path: Option<PathBuf>,
    pub nutrition_tables: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or unparsable
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            port: parse_var(&lookup, "PORT").unwrap_or(8000),
            triton_url: lookup("TRITON_URL").unwrap_or_else(|| "triton-server:8001".to_string()),
            triton_model: lookup("TRITON_MODEL").unwrap_or_else(|| "yolov8s_end2end".to_string()),
            grpc_pool_size: parse_var(&lookup, "GRPC_POOL_SIZE").filter(|n: &usize| *n > 0).unwrap_or(4),
            model_input_size: parse_var(&lookup, "MODEL_INPUT_SIZE").filter(|n: &u32| *n > 0).unwrap_or(640),
            confidence_threshold: parse_var(&lookup, "CONFIDENCE_THRESHOLD").unwrap_or(0.25),
            detect_timeout: Duration::from_secs(parse_var(&lookup, "DETECT_TIMEOUT_SECS").unwrap_or(30)),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_MB")
                .unwrap_or(16usize)
                .saturating_mul(1024 * 1024),
            font_path: match lookup("FONT_PATH") {
                Some(path) if path.is_empty() => None,
                Some(path) => Some(PathBuf::from(path)),
                None => Some(PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf")),
            },
            nutrition_tables: lookup("NUTRITION_TABLES")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.triton_url, "triton-server:8001");
        assert_eq!(config.grpc_pool_size, 4);
        assert_eq!(config.model_input_size, 640);
        assert_eq!(config.detect_timeout, Duration::from_secs(30));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert!(config.nutrition_tables.is_none());
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("GRPC_POOL_SIZE", "0"),
            ("CONFIDENCE_THRESHOLD", "not-a-number"),
            ("FONT_PATH", ""),
            ("NUTRITION_TABLES", "/etc/calorie-lens/tables.json"),
        ]);
        assert_eq!(config.port, 9100);
        assert_eq!(config.grpc_pool_size, 4);
        assert_eq!(config.confidence_threshold, 0.25);
        assert!(config.font_path.is_none());
        assert_eq!(
            config.nutrition_tables,
            Some(PathBuf::from("/etc/calorie-lens/tables.json"))
        );
    }

    #[test]
    fn huge_upload_limit_saturates() {
        let huge = usize::MAX.to_string();
        let config = config_from(&[("MAX_UPLOAD_MB", huge.as_str())]);
        assert_eq!(config.max_upload_bytes, usize::MAX);

        let config = config_from(&[("MAX_UPLOAD_MB", "2")]);
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }
}
