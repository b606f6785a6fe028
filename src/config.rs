//! Hierarchical configuration: defaults, `psmt.toml`, then `PSMT_`-prefixed
//! environment variables, merged in that order (figment, same precedence
//! chain the teacher engine uses for its own `Config`).

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

fn default_var_weight() -> u32 {
    1
}

fn default_func_weight() -> u32 {
    20
}

fn default_worker_stack_bytes() -> usize {
    // The original core reserves several GiB per worker for deep recursive
    // term walks; we default far lower since that figure assumes a debug
    // build with no tail-call optimization. Override via config/env for
    // pathological inputs.
    256 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

/// Partitioner weighting and fallback behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Weight contributed by each uninterpreted constant occurrence (`W_VAR`).
    #[serde(default = "default_var_weight")]
    pub var_weight: u32,
    /// Weight contributed per argument position of an uninterpreted function
    /// occurrence (`W_FUNC`).
    #[serde(default = "default_func_weight")]
    pub func_weight: u32,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            var_weight: default_var_weight(),
            func_weight: default_func_weight(),
        }
    }
}

/// Reconciliation-loop toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Whether to emit the full C(m,2) disequality fan per sort in the
    /// per-round constraint formula (spec.md §4.6 step 3, flagged as an
    /// expensive default in §9's open questions). Disabling it keeps only
    /// the pairwise-chain equalities, trading interpolant quality for speed.
    #[serde(default = "default_true")]
    pub disequality_fan: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            disequality_fan: default_true(),
        }
    }
}

/// Concurrency and resource knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Requested stack size for each worker thread.
    #[serde(default = "default_worker_stack_bytes")]
    pub worker_stack_bytes: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            worker_stack_bytes: default_worker_stack_bytes(),
        }
    }
}

/// Logging configuration consumed by `main`'s `tracing-subscriber` setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string, overridable by
    /// `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit newline-delimited JSON instead of the compact text formatter.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

/// Top-level configuration, merged from defaults, `psmt.toml`,
/// `psmt.local.toml`, and `PSMT_`-prefixed environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub partition: PartitionConfig,
    pub reconcile: ReconcileConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `psmt.toml` (if present), `psmt.local.toml`
    /// (if present), and the environment, falling back to defaults.
    pub fn load() -> figment::error::Result<Self> {
        Figment::new()
            .merge(Toml::file("psmt.toml"))
            .merge(Toml::file("psmt.local.toml"))
            .merge(Env::prefixed("PSMT_").split("__"))
            .extract()
    }

    /// Load configuration from an explicit file, still layering environment
    /// overrides on top.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> figment::error::Result<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("PSMT_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_weights() {
        let cfg = Config::default();
        assert_eq!(cfg.partition.var_weight, 1);
        assert_eq!(cfg.partition.func_weight, 20);
        assert!(cfg.reconcile.disequality_fan);
    }

    #[test]
    fn env_overrides_default() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PSMT_PARTITION__VAR_WEIGHT", "7");
            let cfg: Config = Figment::new()
                .merge(Env::prefixed("PSMT_").split("__"))
                .join(figment::providers::Serialized::defaults(Config::default()))
                .extract()?;
            assert_eq!(cfg.partition.var_weight, 7);
            Ok(())
        });
    }
}
