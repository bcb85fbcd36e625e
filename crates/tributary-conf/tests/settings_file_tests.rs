//! Loading settings from TOML files.

use rstest::rstest;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tributary_conf::{Settings, SettingsError};

#[rstest]
fn test_from_file_merges_with_defaults() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(
		file,
		r#"
debug = true
static_dir = "assets"

[streaming]
job_timeout_ms = 250
bootstrap_scripts = ["/client.js", "/extra.js"]
"#
	)
	.unwrap();

	let settings = Settings::from_file(file.path()).unwrap();

	assert!(settings.debug);
	assert_eq!(settings.static_dir, PathBuf::from("assets"));
	assert_eq!(settings.port, 3000);
	assert_eq!(settings.job_timeout(), Some(Duration::from_millis(250)));
	assert_eq!(
		settings.streaming.bootstrap_scripts,
		vec!["/client.js", "/extra.js"]
	);
	assert_eq!(settings.streaming.channel_capacity, 16);
}

#[rstest]
fn test_missing_file_reports_path() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("absent.toml");

	let err = Settings::from_file(&path).unwrap_err();

	match err {
		SettingsError::Io { path: reported, .. } => assert_eq!(reported, path),
		other => panic!("unexpected error: {other}"),
	}
}

#[rstest]
#[case("port = \"not a number\"")]
#[case("[streaming\njob_timeout_ms = 1")]
fn test_malformed_toml(#[case] source: &str) {
	assert!(matches!(
		Settings::from_toml_str(source),
		Err(SettingsError::Toml(_))
	));
}

#[rstest]
fn test_empty_document_is_default() {
	assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
}
