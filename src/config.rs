use crate::error::ConfigError;
use crate::models::Track;
use crate::render::ThemePolicy;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 研究记录输入文件
    pub input_path: String,
    /// 页面输出路径
    pub page_output_path: String,
    /// 订阅源输出路径
    pub feed_output_path: String,
    /// 是否查询外部元数据服务
    pub enrichment_enabled: bool,
    /// 单次查询超时（毫秒）
    pub lookup_timeout_ms: u64,
    /// 同时进行的查询数量
    pub max_concurrent_lookups: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- Crossref 配置 ---
    pub crossref_api_base_url: String,
    pub crossref_mailto: Option<String>,
    // --- 站点配置 ---
    pub site_title: String,
    pub site_link: String,
    pub feed_description: String,
    pub default_theme: ThemePolicy,
    pub default_track: Option<Track>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: "data/studies.json".to_string(),
            page_output_path: "pages/index.html".to_string(),
            feed_output_path: "pages/feed.xml".to_string(),
            enrichment_enabled: true,
            lookup_timeout_ms: 5000,
            max_concurrent_lookups: 8,
            verbose_logging: false,
            crossref_api_base_url: "https://api.crossref.org".to_string(),
            crossref_mailto: None,
            site_title: "Daily Study Digest".to_string(),
            site_link: "https://example.org/".to_string(),
            feed_description: "Curated summaries of research, grouped by track".to_string(),
            default_theme: ThemePolicy::System,
            default_track: None,
        }
    }
}

/// 配置文件中的可选项，未出现的键沿用默认值
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    input_path: Option<String>,
    page_output_path: Option<String>,
    feed_output_path: Option<String>,
    enrichment_enabled: Option<bool>,
    lookup_timeout_ms: Option<u64>,
    max_concurrent_lookups: Option<usize>,
    verbose_logging: Option<bool>,
    crossref_api_base_url: Option<String>,
    crossref_mailto: Option<String>,
    site_title: Option<String>,
    site_link: Option<String>,
    feed_description: Option<String>,
    default_theme: Option<String>,
    default_track: Option<String>,
}

impl Config {
    /// 按 默认值 → 配置文件 → 环境变量 的顺序加载配置
    ///
    /// 配置文件路径来自 `DIGEST_CONFIG`（默认 `digest.toml`），文件不存在时跳过
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DIGEST_CONFIG").unwrap_or_else(|_| "digest.toml".to_string());
        let base = Self::from_file(Path::new(&path))?.unwrap_or_default();
        Ok(base.with_env())
    }

    /// 只从环境变量覆盖默认值
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 读取 TOML 配置文件；文件不存在返回 `Ok(None)`
    pub fn from_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content, &path.display().to_string()).map(Some)
    }

    /// 解析 TOML 文本
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: FileConfig =
            toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
                path: origin.to_string(),
                source,
            })?;
        let default = Self::default();
        Ok(Self {
            input_path: file.input_path.unwrap_or(default.input_path),
            page_output_path: file.page_output_path.unwrap_or(default.page_output_path),
            feed_output_path: file.feed_output_path.unwrap_or(default.feed_output_path),
            enrichment_enabled: file.enrichment_enabled.unwrap_or(default.enrichment_enabled),
            lookup_timeout_ms: file.lookup_timeout_ms.unwrap_or(default.lookup_timeout_ms),
            max_concurrent_lookups: file
                .max_concurrent_lookups
                .unwrap_or(default.max_concurrent_lookups),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            crossref_api_base_url: file
                .crossref_api_base_url
                .unwrap_or(default.crossref_api_base_url),
            crossref_mailto: file.crossref_mailto.or(default.crossref_mailto),
            site_title: file.site_title.unwrap_or(default.site_title),
            site_link: file.site_link.unwrap_or(default.site_link),
            feed_description: file.feed_description.unwrap_or(default.feed_description),
            default_theme: match file.default_theme {
                Some(value) => parse_theme(&value)?,
                None => default.default_theme,
            },
            default_track: match file.default_track {
                Some(slug) => Some(parse_track(&slug)?),
                None => default.default_track,
            },
        })
    }

    fn with_env(self) -> Self {
        let default_theme = env_or(
            "DEFAULT_THEME",
            std::env::var("DEFAULT_THEME").ok().map(|v| parse_theme(&v)),
            self.default_theme,
        );
        let default_track = env_or(
            "DEFAULT_TRACK",
            std::env::var("DEFAULT_TRACK").ok().map(|v| parse_track(&v).map(Some)),
            self.default_track,
        );

        Self {
            input_path: std::env::var("INPUT_PATH").unwrap_or(self.input_path),
            page_output_path: std::env::var("PAGE_OUTPUT_PATH").unwrap_or(self.page_output_path),
            feed_output_path: std::env::var("FEED_OUTPUT_PATH").unwrap_or(self.feed_output_path),
            enrichment_enabled: std::env::var("ENRICHMENT_ENABLED").ok().and_then(|v| v.parse().ok()).unwrap_or(self.enrichment_enabled),
            lookup_timeout_ms: std::env::var("LOOKUP_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.lookup_timeout_ms),
            max_concurrent_lookups: std::env::var("MAX_CONCURRENT_LOOKUPS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.max_concurrent_lookups),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
            crossref_api_base_url: std::env::var("CROSSREF_API_BASE_URL").unwrap_or(self.crossref_api_base_url),
            crossref_mailto: std::env::var("CROSSREF_MAILTO").ok().or(self.crossref_mailto),
            site_title: std::env::var("SITE_TITLE").unwrap_or(self.site_title),
            site_link: std::env::var("SITE_LINK").unwrap_or(self.site_link),
            feed_description: std::env::var("FEED_DESCRIPTION").unwrap_or(self.feed_description),
            default_theme,
            default_track,
        }
    }
}

// 环境变量无法解析时保留下层的值
fn env_or<T>(key: &str, parsed: Option<Result<T, ConfigError>>, fallback: T) -> T {
    match parsed {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            warn!("⚠️ 忽略环境变量 {}: {}", key, e);
            fallback
        }
        None => fallback,
    }
}

fn parse_theme(value: &str) -> Result<ThemePolicy, ConfigError> {
    value.parse()
}

fn parse_track(slug: &str) -> Result<Track, ConfigError> {
    Track::from_slug(slug).ok_or_else(|| ConfigError::UnknownTrack {
        slug: slug.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_overrides_only_given_keys() {
        let config = Config::from_toml_str(
            r#"
            input_path = "fixtures/studies.json"
            enrichment_enabled = false
            default_theme = "dark"
            default_track = "health"
            "#,
            "inline",
        )
        .unwrap();

        assert_eq!(config.input_path, "fixtures/studies.json");
        assert!(!config.enrichment_enabled);
        assert_eq!(config.default_theme, ThemePolicy::Dark);
        assert_eq!(config.default_track, Some(Track::Health));
        assert_eq!(config.page_output_path, "pages/index.html");
        assert_eq!(config.lookup_timeout_ms, 5000);
    }

    #[test]
    fn test_unknown_default_track_is_rejected() {
        let err = Config::from_toml_str(r#"default_track = "The Health Layer""#, "inline")
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTrack { .. }));
    }

    #[test]
    fn test_unparseable_env_values_fall_back() {
        let base = Config {
            default_theme: ThemePolicy::Dark,
            default_track: Some(Track::Play),
            ..Config::default()
        };

        let theme = env_or("DEFAULT_THEME", Some(parse_theme("sepia")), base.default_theme);
        let track = env_or(
            "DEFAULT_TRACK",
            Some(parse_track("no-such-track").map(Some)),
            base.default_track,
        );
        assert_eq!(theme, ThemePolicy::Dark);
        assert_eq!(track, Some(Track::Play));

        let theme = env_or("DEFAULT_THEME", Some(parse_theme("light")), base.default_theme);
        assert_eq!(theme, ThemePolicy::Light);
        assert_eq!(env_or("DEFAULT_TRACK", None, base.default_track), Some(Track::Play));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let err = Config::from_toml_str("input_path = ", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseFailed { .. }));
    }

    #[test]
    fn test_missing_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::from_file(&dir.path().join("digest.toml")).unwrap();
        assert!(loaded.is_none());
    }
}
