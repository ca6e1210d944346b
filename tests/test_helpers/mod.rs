//! Scoped environment updates for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Guard that sets environment variables and restores them on drop.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Applies `changes` for the guard lifetime. `None` removes a variable.
    pub fn set_many(changes: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = changes
            .iter()
            .map(|(key, value)| {
                let prior = env::var_os(key);
                unsafe {
                    // SAFETY: the global mutex serializes environment mutations in tests.
                    match value {
                        Some(new_value) => env::set_var(key, new_value),
                        None => env::remove_var(key),
                    }
                }
                (OsString::from(key), prior)
            })
            .collect();

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                match value {
                    Some(previous) => env::set_var(&key, &previous),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}
