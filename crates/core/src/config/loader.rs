use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Plain environment variables understood for compatibility with existing
/// deployments, and the config keys they set.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("CORS_ORIGIN", "server.cors_origin"),
    ("NOVITA_API_KEY", "video.api_key"),
    ("AWS_REGION", "storage.s3.region"),
    ("AWS_ACCESS_KEY_ID", "storage.s3.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "storage.s3.secret_access_key"),
    ("AWS_BUCKET_NAME", "storage.s3.bucket"),
];

/// Config key set by a legacy environment variable.
fn legacy_key(name: &str) -> Option<&'static str> {
    LEGACY_ENV
        .iter()
        .find(|(var, _)| var.eq_ignore_ascii_case(name))
        .map(|(_, key)| *key)
}

/// Environment layers, lowest precedence first.
fn with_env(mut figment: Figment) -> Figment {
    // A bucket in the environment means the deployment stores on S3.
    if std::env::var_os("AWS_BUCKET_NAME").is_some() {
        figment = figment.merge(Serialized::default("storage.backend", "s3"));
    }

    let legacy_vars: Vec<&str> = LEGACY_ENV.iter().map(|(var, _)| *var).collect();

    figment
        .merge(
            Env::raw()
                .only(&legacy_vars)
                .map(|name| legacy_key(name.as_str()).unwrap_or("").into()),
        )
        .merge(Env::prefixed("ARNFT_").split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    with_env(Figment::new().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    with_env(Figment::new())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[video]
api_key = "sk-test"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.video.api_key, "sk-test");
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[server]
port = "not-a-port"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3100

[marker]
max_parallel_jobs = 4
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.marker.max_parallel_jobs, 4);
    }

    #[test]
    fn test_legacy_keys() {
        assert_eq!(legacy_key("PORT"), Some("server.port"));
        assert_eq!(legacy_key("NOVITA_API_KEY"), Some("video.api_key"));
        assert_eq!(legacy_key("AWS_BUCKET_NAME"), Some("storage.s3.bucket"));
        assert_eq!(legacy_key("aws_region"), Some("storage.s3.region"));
        assert_eq!(legacy_key("HOME"), None);
    }
}
