use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable prefix: `BROKERDESK_API__BASE_URL`, `BROKERDESK_API__MEDIA_URL`, ...
pub const ENV_PREFIX: &str = "BROKERDESK";
const APP_DIR: &str = "brokerdesk";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Backend root, e.g. `https://crm.example.uz/api/`.
    pub base_url: String,
    /// Where uploaded media is served from. Defaults to `base_url`.
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SessionConfig {
    /// Where the bearer token is kept between runs.
    #[serde(default)]
    pub token_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "reports".to_string()
}

impl ApiConfig {
    /// Absolute URL of `path` under the API root.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Absolute URL of an uploaded file. Already absolute links pass through.
    pub fn media_link(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let root = self.media_url.as_deref().unwrap_or(&self.base_url);
        format!(
            "{}/{}",
            root.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl SessionConfig {
    pub fn resolved_token_path(&self) -> PathBuf {
        self.token_path.clone().unwrap_or_else(default_token_path)
    }
}

/// `<user config dir>/brokerdesk/token`, or `./.brokerdesk-token` when the
/// platform has no config dir.
pub fn default_token_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join("token"))
        .unwrap_or_else(|| PathBuf::from(".brokerdesk-token"))
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

impl AppConfig {
    /// Load an optional TOML file, then apply `BROKERDESK_*` environment
    /// overrides (`__` separates nesting levels).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(file) = path.map(Path::to_path_buf).or_else(default_config_path) {
            builder = builder.add_source(config::File::from(file.as_path()).required(path.is_some()));
        }

        let cfg = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| "Failed to read configuration")?;

        let cfg: AppConfig = cfg
            .try_deserialize()
            .with_context(|| format!("Invalid configuration (set {ENV_PREFIX}_API__BASE_URL?)"))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str, media: Option<&str>) -> ApiConfig {
        ApiConfig {
            base_url: base.into(),
            media_url: media.map(Into::into),
            timeout_secs: 30,
            page_size: 10,
        }
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let a = api("https://crm.test/api/", None);
        assert_eq!(a.endpoint("/apartment/"), "https://crm.test/api/apartment/");
    }

    #[test]
    fn media_link_prefers_media_root() {
        let a = api("https://crm.test/api", Some("https://cdn.test/"));
        assert_eq!(a.media_link("/media/a.jpg"), "https://cdn.test/media/a.jpg");
        assert_eq!(a.media_link("https://x.test/b.jpg"), "https://x.test/b.jpg");
        assert_eq!(
            api("https://crm.test", None).media_link("c.jpg"),
            "https://crm.test/c.jpg"
        );
    }

    #[test]
    fn loads_toml_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brokerdesk.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://crm.test/api\"\npage_size = 25\n",
        )
        .unwrap();

        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.api.base_url, "https://crm.test/api");
        assert_eq!(cfg.api.page_size, 25);
        assert_eq!(cfg.api.timeout_secs, 30);
        assert_eq!(cfg.output.dir, "reports");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn token_path_override() {
        let s = SessionConfig {
            token_path: Some(PathBuf::from("/tmp/tok")),
        };
        assert_eq!(s.resolved_token_path(), PathBuf::from("/tmp/tok"));
    }
}
