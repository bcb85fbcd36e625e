//! Application settings.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding [`Settings::port`].
pub const ENV_PORT: &str = "PORT";
/// Environment variable overriding [`Settings::host`].
pub const ENV_HOST: &str = "TRIBUTARY_HOST";
/// Environment variable overriding [`Settings::debug`].
pub const ENV_DEBUG: &str = "TRIBUTARY_DEBUG";
/// Environment variable overriding [`StreamingSettings::job_timeout_ms`].
pub const ENV_JOB_TIMEOUT_MS: &str = "TRIBUTARY_JOB_TIMEOUT_MS";
/// Environment variable overriding [`StreamingSettings::inline_errors`].
pub const ENV_INLINE_ERRORS: &str = "TRIBUTARY_INLINE_ERRORS";
/// Environment variable overriding [`Settings::log_filter`].
pub const ENV_LOG: &str = "RUST_LOG";

/// Error type for settings loading and validation
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Invalid value {value:?} for environment variable {key}")]
	InvalidEnv { key: &'static str, value: String },

	#[error("Invalid address {0}")]
	Address(String),

	#[error("Invalid setting: {0}")]
	Invalid(String),
}

/// Streaming render options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSettings {
	/// Upper bound for a single async dependency, in milliseconds.
	/// `None` waits indefinitely.
	pub job_timeout_ms: Option<u64>,
	/// Replace failed sections with an error fragment instead of keeping
	/// their fallback.
	pub inline_errors: bool,
	/// Module scripts appended to every shell.
	pub bootstrap_scripts: Vec<String>,
	/// Chunks buffered between the renderer and the connection.
	pub channel_capacity: usize,
}

impl Default for StreamingSettings {
	fn default() -> Self {
		Self {
			job_timeout_ms: None,
			inline_errors: false,
			bootstrap_scripts: vec!["/client.js".to_string()],
			channel_capacity: 16,
		}
	}
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Include error details in error documents.
	pub debug: bool,
	pub host: String,
	pub port: u16,
	/// Directory served for static requests.
	pub static_dir: PathBuf,
	/// `tracing-subscriber` filter directive.
	pub log_filter: String,
	pub streaming: StreamingSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			debug: false,
			host: "127.0.0.1".to_string(),
			port: 3000,
			static_dir: PathBuf::from("public"),
			log_filter: "info,tributary=debug".to_string(),
			streaming: StreamingSettings::default(),
		}
	}
}

impl Settings {
	/// Parses settings from TOML. Missing keys take their defaults.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Toml`] for malformed input.
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		Ok(toml::from_str(source)?)
	}

	/// Reads settings from a TOML file.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Io`] when the file cannot be read.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&source)
	}

	/// Loads settings from an optional file, then applies the process
	/// environment and validates the result.
	///
	/// # Errors
	///
	/// Returns the first loading, parsing or validation error.
	pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
		let mut settings = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		settings.apply_env_from(|key| std::env::var(key).ok())?;
		settings.validate()?;
		Ok(settings)
	}

	/// Applies environment overrides read through `lookup`.
	///
	/// # Examples
	///
	/// ```
	/// use tributary_conf::Settings;
	///
	/// let mut settings = Settings::default();
	/// settings
	/// 	.apply_env_from(|key| (key == "PORT").then(|| "8080".to_string()))
	/// 	.unwrap();
	/// assert_eq!(settings.port, 8080);
	/// ```
	///
	/// # Errors
	///
	/// Returns [`SettingsError::InvalidEnv`] when a value does not parse.
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), SettingsError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup(ENV_PORT) {
			self.port = parse_env(ENV_PORT, &value)?;
			debug!(key = ENV_PORT, "setting overridden from environment");
		}
		if let Some(value) = lookup(ENV_HOST)
			&& !value.trim().is_empty()
		{
			self.host = value.trim().to_string();
			debug!(key = ENV_HOST, "setting overridden from environment");
		}
		if let Some(value) = lookup(ENV_DEBUG) {
			self.debug = parse_bool(ENV_DEBUG, &value)?;
			debug!(key = ENV_DEBUG, "setting overridden from environment");
		}
		if let Some(value) = lookup(ENV_JOB_TIMEOUT_MS) {
			let value = value.trim();
			self.streaming.job_timeout_ms = if value.is_empty() {
				None
			} else {
				Some(parse_env(ENV_JOB_TIMEOUT_MS, value)?)
			};
			debug!(key = ENV_JOB_TIMEOUT_MS, "setting overridden from environment");
		}
		if let Some(value) = lookup(ENV_INLINE_ERRORS) {
			self.streaming.inline_errors = parse_bool(ENV_INLINE_ERRORS, &value)?;
			debug!(key = ENV_INLINE_ERRORS, "setting overridden from environment");
		}
		if let Some(value) = lookup(ENV_LOG)
			&& !value.trim().is_empty()
		{
			self.log_filter = value;
			debug!(key = ENV_LOG, "setting overridden from environment");
		}
		Ok(())
	}

	/// Checks values that deserialize fine but cannot be used.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Invalid`] describing the first bad value.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.host.trim().is_empty() {
			return Err(SettingsError::Invalid("host must not be empty".into()));
		}
		if self.streaming.channel_capacity == 0 {
			return Err(SettingsError::Invalid(
				"streaming.channel_capacity must be at least 1".into(),
			));
		}
		if self.streaming.job_timeout_ms == Some(0) {
			return Err(SettingsError::Invalid(
				"streaming.job_timeout_ms must be positive".into(),
			));
		}
		Ok(())
	}

	/// Resolves `host:port` to a socket address.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Address`] when the host does not resolve.
	pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
		let display = format!("{}:{}", self.host, self.port);
		(self.host.as_str(), self.port)
			.to_socket_addrs()
			.map_err(|_| SettingsError::Address(display.clone()))?
			.next()
			.ok_or(SettingsError::Address(display))
	}

	/// Per-job timeout, if one is configured.
	pub fn job_timeout(&self) -> Option<Duration> {
		self.streaming.job_timeout_ms.map(Duration::from_millis)
	}
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, SettingsError> {
	value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
		key,
		value: value.to_string(),
	})
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(SettingsError::InvalidEnv {
			key,
			value: value.to_string(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let pairs: Vec<(String, String)> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| {
			pairs
				.iter()
				.find(|(k, _)| k == key)
				.map(|(_, v)| v.clone())
		}
	}

	#[rstest]
	fn test_defaults() {
		let settings = Settings::default();

		assert!(!settings.debug);
		assert_eq!(settings.port, 3000);
		assert_eq!(settings.static_dir, PathBuf::from("public"));
		assert_eq!(settings.log_filter, "info,tributary=debug");
		assert_eq!(settings.job_timeout(), None);
		assert!(!settings.streaming.inline_errors);
		assert_eq!(settings.streaming.bootstrap_scripts, vec!["/client.js"]);
		assert_eq!(settings.streaming.channel_capacity, 16);
	}

	#[rstest]
	#[case("1", true)]
	#[case("TRUE", true)]
	#[case(" on ", true)]
	#[case("0", false)]
	#[case("no", false)]
	#[case("", false)]
	fn test_parse_bool(#[case] value: &str, #[case] expected: bool) {
		assert_eq!(parse_bool(ENV_DEBUG, value).unwrap(), expected);
	}

	#[rstest]
	fn test_parse_bool_rejects_garbage() {
		let err = parse_bool(ENV_DEBUG, "maybe").unwrap_err();
		assert!(matches!(err, SettingsError::InvalidEnv { key: ENV_DEBUG, .. }));
	}

	#[rstest]
	fn test_env_overrides() {
		let mut settings = Settings::default();
		settings
			.apply_env_from(env(&[
				("PORT", "8081"),
				("TRIBUTARY_HOST", "0.0.0.0"),
				("TRIBUTARY_DEBUG", "true"),
				("TRIBUTARY_JOB_TIMEOUT_MS", "1500"),
				("TRIBUTARY_INLINE_ERRORS", "yes"),
				("RUST_LOG", "warn"),
			]))
			.unwrap();

		assert_eq!(settings.port, 8081);
		assert_eq!(settings.host, "0.0.0.0");
		assert!(settings.debug);
		assert_eq!(settings.job_timeout(), Some(Duration::from_millis(1500)));
		assert!(settings.streaming.inline_errors);
		assert_eq!(settings.log_filter, "warn");
	}

	#[rstest]
	fn test_empty_timeout_clears_it() {
		let mut settings = Settings::default();
		settings.streaming.job_timeout_ms = Some(10);

		settings
			.apply_env_from(env(&[("TRIBUTARY_JOB_TIMEOUT_MS", "")]))
			.unwrap();

		assert_eq!(settings.job_timeout(), None);
	}

	#[rstest]
	fn test_invalid_port_is_rejected() {
		let mut settings = Settings::default();
		let err = settings
			.apply_env_from(env(&[("PORT", "eighty")]))
			.unwrap_err();

		assert_eq!(
			err.to_string(),
			"Invalid value \"eighty\" for environment variable PORT"
		);
	}

	#[rstest]
	#[case::zero_capacity(|s: &mut Settings| s.streaming.channel_capacity = 0)]
	#[case::zero_timeout(|s: &mut Settings| s.streaming.job_timeout_ms = Some(0))]
	#[case::blank_host(|s: &mut Settings| s.host = "  ".into())]
	fn test_validate_rejects(#[case] mutate: fn(&mut Settings)) {
		let mut settings = Settings::default();
		mutate(&mut settings);

		assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
	}

	#[rstest]
	fn test_bind_addr() {
		let settings = Settings {
			port: 4000,
			..Settings::default()
		};

		assert_eq!(
			settings.bind_addr().unwrap(),
			"127.0.0.1:4000".parse::<SocketAddr>().unwrap()
		);
	}
}
