// Configuration module for reading Snake3d.toml
// All tunable parameters of the planner and the tick loop live here

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub timing: TimingConfig,
    pub targeting: TargetingConfig,
    pub search: SearchConfig,
    pub valuation: ValuationConfig,
    pub strategy: StrategyConfig,
    pub debug: DebugConfig,
}

/// Game server endpoints and credentials
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub url: String,
    pub test_url: String,
    pub use_test_server: bool,
    pub token_path: String,
    pub token_env: String,
    /// Replay a recorded response instead of calling the server
    #[serde(default)]
    pub mock_response_path: Option<String>,
}

impl ApiConfig {
    pub fn move_url(&self) -> &str {
        if self.use_test_server {
            &self.test_url
        } else {
            &self.url
        }
    }

    /// Reads the auth token from the environment, then from `token_path`
    pub fn load_token(&self) -> Result<String, String> {
        if let Ok(token) = std::env::var(&self.token_env) {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        let token = fs::read_to_string(&self.token_path)
            .map_err(|e| format!("Failed to read token file '{}': {}", self.token_path, e))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(format!("Token file '{}' is empty", self.token_path));
        }
        Ok(token.to_string())
    }
}

/// Tick timing constants
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub planning_margin_ms: u64,
    pub retry_backoff_ms: u64,
    pub request_timeout_ms: u64,
}

impl TimingConfig {
    pub fn planning_margin(&self) -> Duration {
        Duration::from_millis(self.planning_margin_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Target selection radii
#[derive(Debug, Deserialize, Clone)]
pub struct TargetingConfig {
    pub initial_radius: f64,
    pub max_radius: f64,
}

/// Distance estimate used by the path search
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    Manhattan,
    Euclidean,
}

/// Path search parameters
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub heuristic: HeuristicKind,
    pub center_weight: f64,
    pub max_iterations: usize,
    pub centering_path_cap: usize,
    pub reuse_paths: bool,
}

/// Values assigned to each snapshot source
#[derive(Debug, Deserialize, Clone)]
pub struct ValuationConfig {
    pub golden_multiplier: i64,
    pub suspicious_value: i64,
    pub fence_value: i64,
    pub own_body_value: i64,
    pub enemy_body_value: i64,
    pub enemy_halo_value: i64,
    pub include_own_heads: bool,
}

/// Strategy selection constants
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub min_agents_for_parallel: usize,
    pub min_cpus_for_parallel: usize,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake3d.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake3d.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake3d.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake3d.toml
    pub fn default_hardcoded() -> Self {
        Config {
            api: ApiConfig {
                url: "http://games.datsteam.dev/play/snake3d/player/move".to_string(),
                test_url: "http://games-test.datsteam.dev/play/snake3d/player/move".to_string(),
                use_test_server: true,
                token_path: "token".to_string(),
                token_env: "SNAKE3D_TOKEN".to_string(),
                mock_response_path: None,
            },
            timing: TimingConfig {
                planning_margin_ms: 50,
                retry_backoff_ms: 500,
                request_timeout_ms: 2000,
            },
            targeting: TargetingConfig {
                initial_radius: 15.0,
                max_radius: 64.0,
            },
            search: SearchConfig {
                heuristic: HeuristicKind::Manhattan,
                center_weight: 0.0,
                max_iterations: 1_000_000,
                centering_path_cap: 5,
                reuse_paths: true,
            },
            valuation: ValuationConfig {
                golden_multiplier: 10,
                suspicious_value: -100,
                fence_value: -100,
                own_body_value: -100,
                enemy_body_value: -100,
                enemy_halo_value: -50,
                include_own_heads: true,
            },
            strategy: StrategyConfig {
                min_agents_for_parallel: 2,
                min_cpus_for_parallel: 2,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "snake3d_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            eprintln!(
                "Warning: Could not load Snake3d.toml ({}), using hardcoded defaults",
                e
            );
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_can_be_created() {
        let config = Config::default_hardcoded();
        assert_eq!(config.targeting.initial_radius, 15.0);
        assert_eq!(config.targeting.max_radius, 64.0);
        assert_eq!(config.search.heuristic, HeuristicKind::Manhattan);
        assert_eq!(config.timing.retry_backoff(), Duration::from_millis(500));
    }

    #[test]
    fn test_snake3d_toml_can_be_parsed() {
        let result = Config::from_file("Snake3d.toml");
        assert!(
            result.is_ok(),
            "Failed to parse Snake3d.toml: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config =
            Config::from_file("Snake3d.toml").expect("Snake3d.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        assert_eq!(file_config.api.url, hardcoded.api.url);
        assert_eq!(file_config.api.test_url, hardcoded.api.test_url);
        assert_eq!(file_config.api.token_env, hardcoded.api.token_env);
        assert_eq!(
            file_config.timing.planning_margin_ms,
            hardcoded.timing.planning_margin_ms
        );
        assert_eq!(
            file_config.timing.retry_backoff_ms,
            hardcoded.timing.retry_backoff_ms
        );
        assert_eq!(
            file_config.targeting.initial_radius,
            hardcoded.targeting.initial_radius
        );
        assert_eq!(file_config.targeting.max_radius, hardcoded.targeting.max_radius);
        assert_eq!(file_config.search.heuristic, hardcoded.search.heuristic);
        assert_eq!(file_config.search.center_weight, hardcoded.search.center_weight);
        assert_eq!(
            file_config.search.max_iterations,
            hardcoded.search.max_iterations
        );
        assert_eq!(
            file_config.search.centering_path_cap,
            hardcoded.search.centering_path_cap
        );
        assert_eq!(
            file_config.valuation.golden_multiplier,
            hardcoded.valuation.golden_multiplier
        );
        assert_eq!(
            file_config.valuation.enemy_halo_value,
            hardcoded.valuation.enemy_halo_value
        );
        assert_eq!(
            file_config.strategy.min_cpus_for_parallel,
            hardcoded.strategy.min_cpus_for_parallel
        );
    }

    #[test]
    fn test_hazard_values_are_non_positive() {
        let v = Config::default_hardcoded().valuation;
        for value in [
            v.suspicious_value,
            v.fence_value,
            v.own_body_value,
            v.enemy_body_value,
            v.enemy_halo_value,
        ] {
            assert!(value <= 0);
        }
    }

    #[test]
    fn test_move_url_follows_server_flag() {
        let mut api = Config::default_hardcoded().api;
        assert!(api.move_url().contains("games-test"));
        api.use_test_server = false;
        assert!(!api.move_url().contains("games-test"));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }
}
