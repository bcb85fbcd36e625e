//! # Tributary Configuration
//!
//! Settings for Tributary applications.
//!
//! Values are layered in priority order:
//! environment variables > TOML file > defaults.
//!
//! ```
//! use tributary_conf::Settings;
//!
//! let settings = Settings::from_toml_str(
//! 	r#"
//! port = 8080
//!
//! [streaming]
//! job_timeout_ms = 2500
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(settings.port, 8080);
//! assert_eq!(settings.job_timeout().unwrap().as_millis(), 2500);
//! ```
//!
//! ## Environment
//!
//! | Variable | Setting |
//! |---|---|
//! | `PORT` | `port` |
//! | `TRIBUTARY_HOST` | `host` |
//! | `TRIBUTARY_DEBUG` | `debug` |
//! | `TRIBUTARY_JOB_TIMEOUT_MS` | `streaming.job_timeout_ms` |
//! | `TRIBUTARY_INLINE_ERRORS` | `streaming.inline_errors` |
//! | `RUST_LOG` | `log_filter` |

pub mod settings;

pub use settings::{Settings, SettingsError, StreamingSettings};
