//! Global initialization utilities for the application.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the process environment.
///
/// Loads environment variables from a `.env` file if one is present in the
/// current directory or an ancestor. Safe to call multiple times; only the
/// first call has any effect.
pub fn initialize_environment() {
    INIT.call_once(|| {
        dotenvy::dotenv().ok();
    });
}

/// Initialize the environment for tests, preferring `.env.test` over `.env`.
#[cfg(test)]
pub fn initialize_test_environment() {
    INIT.call_once(|| {
        dotenvy::from_filename(".env.test")
            .or_else(|_| dotenvy::dotenv())
            .ok();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_idempotent() {
        initialize_environment();
        initialize_environment();
    }
}
