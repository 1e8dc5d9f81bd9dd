//! Shared setup used by every command that talks to the engine:
//! environment settings -> process engine -> optional result cache.

use crate::config::Settings;
use crate::engine::{CachedEngine, Engine, ProcessEngine};
use crate::error::AppError;

/// Engine plus the settings it was built from.
pub struct Session {
    pub settings: Settings,
    pub engine: Box<dyn Engine>,
}

/// Load settings from the environment and build the engine.
pub fn open_session() -> Result<Session, AppError> {
    let settings = Settings::from_env()?;
    let engine = build_engine(&settings);
    Ok(Session { settings, engine })
}

/// Process engine, wrapped in a TTL cache when one is configured.
pub fn build_engine(settings: &Settings) -> Box<dyn Engine> {
    let process = ProcessEngine::new(settings.engine.clone());
    match settings.cache_ttl {
        Some(ttl) if settings.cache_capacity > 0 => {
            log::debug!(
                "engine results cached for {}s (capacity {})",
                ttl.as_secs_f64(),
                settings.cache_capacity
            );
            Box::new(CachedEngine::new(process, ttl, settings.cache_capacity))
        }
        _ => Box::new(process),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        Settings::from_lookup(|name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[test]
    fn builds_plain_and_cached_engines() {
        let plain = settings(&[("HSCAN_ENGINE", "/opt/engine")]);
        assert!(plain.cache_ttl.is_none());
        let _ = build_engine(&plain);

        let cached = settings(&[("HSCAN_ENGINE", "/opt/engine"), ("HSCAN_CACHE_TTL_SECS", "60")]);
        assert!(cached.cache_ttl.is_some());
        let _ = build_engine(&cached);
    }
}
