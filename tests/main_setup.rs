use serial_test::serial;
use std::{env, panic};
use storefront_nav::{AppConfig, config::Env, error::ConfigError};

// --- Setup/Teardown Utilities ---

const CONFIG_VARS: [&str; 4] = [
    "APP_ENV",
    "BIND_ADDR",
    "SESSION_JWT_SECRET",
    "NAV_MAX_REDIRECT_HOPS",
];

/// Utility to run a test function and restore environment variables afterward
fn run_with_env<T, R>(test: T, cleanup_vars: &[&'static str]) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    // Save current environment variables
    let originals: Vec<(String, Option<String>)> = cleanup_vars
        .iter()
        .map(|&var| (var.to_string(), env::var(var).ok()))
        .collect();

    // Run the test
    let result = panic::catch_unwind(test);

    // Restore original environment variables
    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(&key, val);
            } else {
                env::remove_var(&key);
            }
        }
    }

    // Re-panic if the test failed
    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

fn clear_config_vars() {
    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            // SESSION_JWT_SECRET is missing
            AppConfig::load()
        },
        &CONFIG_VARS,
    );

    assert!(
        matches!(result, Err(ConfigError::Missing("SESSION_JWT_SECRET"))),
        "Production config loading should fail on a missing secret"
    );
}

#[test]
#[serial]
fn test_app_config_production_with_secret() {
    let config = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("SESSION_JWT_SECRET", "prod-secret");
                env::set_var("BIND_ADDR", "127.0.0.1:8080");
                env::set_var("NAV_MAX_REDIRECT_HOPS", "3");
            }
            AppConfig::load()
        },
        &CONFIG_VARS,
    )
    .unwrap();

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.jwt_secret, "prod-secret");
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert_eq!(config.max_redirect_hops, 3);
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    // Local mode needs no variables at all.
    let config = run_with_env(
        || {
            clear_config_vars();
            unsafe {
                env::set_var("APP_ENV", "local");
            }
            AppConfig::load()
        },
        &CONFIG_VARS,
    )
    .unwrap();

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    // Check local JWT secret fallback
    assert_eq!(config.jwt_secret, "super-secure-test-secret-value-local");
    assert_eq!(config.max_redirect_hops, 1);
}

#[test]
#[serial]
fn test_app_config_rejects_bad_hop_bound() {
    for raw in ["0", "-1", "many"] {
        let result = run_with_env(
            || {
                clear_config_vars();
                unsafe {
                    env::set_var("NAV_MAX_REDIRECT_HOPS", raw);
                }
                AppConfig::load()
            },
            &CONFIG_VARS,
        );

        assert!(
            matches!(result, Err(ConfigError::Invalid { name: "NAV_MAX_REDIRECT_HOPS", .. })),
            "{raw} should be rejected"
        );
    }
}
