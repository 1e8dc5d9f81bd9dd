//! Runtime configuration from the environment (and `.env`).
//!
//! | variable                 | meaning                                  | default      |
//! |--------------------------|------------------------------------------|--------------|
//! | `HSCAN_ENGINE`           | engine executable                        | required     |
//! | `HSCAN_ENGINE_ARGS`      | extra leading arguments, whitespace-split | none         |
//! | `HSCAN_ENGINE_DIR`       | engine working directory                 | current dir  |
//! | `HSCAN_SCRATCH_DIR`      | directory for scratch input files        | system temp  |
//! | `HSCAN_TIMEOUT_SECS`     | per-invocation timeout                   | 120          |
//! | `HSCAN_MAX_OUTPUT_BYTES` | captured stdout cap                      | 1048576      |
//! | `HSCAN_WORKERS`          | scan concurrency                         | 10           |
//! | `HSCAN_CACHE_TTL_SECS`   | output cache lifetime, 0 disables        | 0            |
//! | `HSCAN_CACHE_CAPACITY`   | output cache size                        | 256          |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::EngineConfig;
use crate::error::AppError;
use crate::scan::DEFAULT_WORKERS;
use crate::validate;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    pub workers: usize,
    /// `None` when caching is off.
    pub cache_ttl: Option<Duration>,
    pub cache_capacity: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let program = lookup("HSCAN_ENGINE")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::new(2, "Missing HSCAN_ENGINE in environment (.env)."))?;

        let mut engine = EngineConfig::new(program.trim());
        if let Some(args) = lookup("HSCAN_ENGINE_ARGS") {
            engine.args = args.split_whitespace().map(str::to_string).collect();
        }
        engine.working_dir = lookup("HSCAN_ENGINE_DIR").map(PathBuf::from);
        engine.scratch_dir = lookup("HSCAN_SCRATCH_DIR").map(PathBuf::from);
        if let Some(secs) = parse_var::<f64>(&lookup, "HSCAN_TIMEOUT_SECS")? {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(AppError::new(2, format!("HSCAN_TIMEOUT_SECS must be positive, got {secs}")));
            }
            engine.timeout = Duration::try_from_secs_f64(secs).map_err(|_| {
                AppError::new(2, format!("HSCAN_TIMEOUT_SECS is out of range, got {secs}"))
            })?;
        }
        if let Some(bytes) = parse_var::<usize>(&lookup, "HSCAN_MAX_OUTPUT_BYTES")? {
            if bytes == 0 {
                return Err(AppError::new(2, "HSCAN_MAX_OUTPUT_BYTES must be positive"));
            }
            engine.max_output_bytes = bytes;
        }

        let workers = match parse_var::<usize>(&lookup, "HSCAN_WORKERS")? {
            Some(n) => validate::validate_workers(n)?,
            None => DEFAULT_WORKERS,
        };

        let cache_ttl = parse_var::<u64>(&lookup, "HSCAN_CACHE_TTL_SECS")?
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);
        let cache_capacity =
            parse_var::<usize>(&lookup, "HSCAN_CACHE_CAPACITY")?.unwrap_or(DEFAULT_CACHE_CAPACITY);

        Ok(Self {
            engine,
            workers,
            cache_ttl,
            cache_capacity,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::new(2, format!("{name} has an invalid value '{raw}'"))),
    }
}
