//! 链接解析服务 - 业务能力层
//!
//! 按标题向文献元数据服务查询规范链接（DOI）。
//! 任何失败（网络、超时、非 2xx、空结果、缺少标识）都等价于"没有链接"，
//! 不重试，也不会让流程失败。

use crate::config::Config;
use crate::models::{EnrichedStudy, Study};
use futures::future::BoxFuture;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("study-digest/", env!("CARGO_PKG_VERSION"));
const DOI_RESOLVER_BASE: &str = "https://doi.org/";

static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(10\.\d{4,9}/\S+)").expect("DOI pattern is valid")
});

/// 按标题解析规范链接的能力
///
/// 返回 `None` 表示"没有可用链接"，实现方不应返回错误
pub trait TitleResolver: Send + Sync {
    fn resolve<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Option<String>>;
}

/// 关闭外部查询时使用的解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolver;

impl TitleResolver for NoopResolver {
    fn resolve<'a>(&'a self, _title: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async { None })
    }
}

/// 查询失败原因（只在解析器内部使用）
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("非成功状态码: {0}")]
    Status(u16),

    #[error("响应解析失败: {0}")]
    Parse(String),

    #[error("结果为空")]
    EmptyResult,

    #[error("首个结果缺少 DOI")]
    MissingIdentifier,
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

/// Crossref 元数据服务客户端
pub struct CrossrefResolver {
    http_client: reqwest::Client,
    base_url: String,
    mailto: Option<String>,
}

impl CrossrefResolver {
    /// 创建新的 Crossref 客户端，请求超时取自配置
    pub fn new(config: &Config) -> Result<Self, LookupError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(config.lookup_timeout_ms))
            .build()
            .map_err(|e| LookupError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.crossref_api_base_url.trim_end_matches('/').to_string(),
            mailto: config.crossref_mailto.clone(),
        })
    }

    /// 单次查询，只取排名第一的结果
    pub async fn lookup(&self, title: &str) -> Result<String, LookupError> {
        let url = format!("{}/works", self.base_url);
        let mut query = vec![("query.bibliographic", title), ("rows", "1")];
        if let Some(mailto) = self.mailto.as_deref() {
            query.push(("mailto", mailto));
        }

        debug!(title = %title, url = %url, "查询 Crossref");

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| LookupError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: WorksResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        top_result_url(body)
    }
}

impl TitleResolver for CrossrefResolver {
    fn resolve<'a>(&'a self, title: &'a str) -> BoxFuture<'a, Option<String>> {
        Box::pin(async move {
            match self.lookup(title).await {
                Ok(url) => Some(url),
                Err(e) => {
                    info!("未能解析链接 '{}': {}", title, e);
                    None
                }
            }
        })
    }
}

fn top_result_url(body: WorksResponse) -> Result<String, LookupError> {
    let top = body
        .message
        .items
        .into_iter()
        .next()
        .ok_or(LookupError::EmptyResult)?;
    top.doi
        .as_deref()
        .and_then(doi_to_url)
        .ok_or(LookupError::MissingIdentifier)
}

/// 把 DOI（裸值、`doi:` 前缀或已有链接）转换为可访问的链接
pub fn doi_to_url(raw: &str) -> Option<String> {
    DOI_PATTERN
        .captures(raw.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| format!("{}{}", DOI_RESOLVER_BASE, m.as_str()))
}

/// 解析阶段的调度参数
#[derive(Debug, Clone, Copy)]
pub struct EnrichmentLimits {
    /// 同时进行的查询数量
    pub max_concurrent: usize,
    /// 单次查询超时
    pub per_call_timeout: Duration,
}

impl EnrichmentLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_concurrent: config.max_concurrent_lookups,
            per_call_timeout: Duration::from_millis(config.lookup_timeout_ms),
        }
    }
}

impl Default for EnrichmentLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            per_call_timeout: Duration::from_secs(5),
        }
    }
}

enum Lookup {
    Known(Option<String>),
    Spawned(JoinHandle<Option<String>>),
}

/// 为每条记录生成带链接的副本
///
/// 查询并发执行（受信号量限制），等待全部完成后按输入顺序返回
pub async fn enrich_studies(
    studies: &[Study],
    resolver: Arc<dyn TitleResolver>,
    limits: EnrichmentLimits,
) -> Vec<EnrichedStudy> {
    let semaphore = Arc::new(Semaphore::new(limits.max_concurrent.max(1)));
    let mut pending = Vec::with_capacity(studies.len());

    for study in studies {
        // 记录自带 DOI 时不需要查询
        if let Some(url) = study.doi.as_deref().and_then(doi_to_url) {
            pending.push(Lookup::Known(Some(url)));
            continue;
        }

        let semaphore = semaphore.clone();
        let resolver = resolver.clone();
        let title = study.title.clone();
        let per_call_timeout = limits.per_call_timeout;

        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return None;
            };
            match tokio::time::timeout(per_call_timeout, resolver.resolve(&title)).await {
                Ok(url) => url,
                Err(_) => {
                    info!("解析链接超时 '{}'", title);
                    None
                }
            }
        });
        pending.push(Lookup::Spawned(handle));
    }

    let mut enriched = Vec::with_capacity(studies.len());
    for (study, lookup) in studies.iter().zip(pending) {
        let resolved_url = match lookup {
            Lookup::Known(url) => url,
            Lookup::Spawned(handle) => handle.await.unwrap_or_else(|e| {
                debug!("解析任务未完成 '{}': {}", study.title, e);
                None
            }),
        };
        enriched.push(EnrichedStudy::new(study.clone(), resolved_url));
    }

    let resolved = enriched.iter().filter(|s| s.resolved_url.is_some()).count();
    info!("🔗 链接解析完成: {}/{}", resolved, enriched.len());

    enriched
}
