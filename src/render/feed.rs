//! 订阅源渲染器
//!
//! 每条合法记录对应一个 RSS 2.0 条目，按输入顺序排列，与分类无关。
//! 缺少日期或日期格式错误的记录单独跳过，其余条目照常输出。

use crate::config::Config;
use crate::models::EnrichedStudy;
use crate::render::escape::{escape_markup, non_blank};
use crate::render::{ArtifactKind, ArtifactRenderer, Omission, RenderContext, Rendered};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

const AUTHOR_SEPARATOR: &str = ", ";
const CITATION_SEPARATOR: &str = " | ";
const GENERATOR: &str = concat!("study-digest ", env!("CARGO_PKG_VERSION"));

/// 订阅源频道信息
#[derive(Debug, Clone)]
pub struct FeedChannel {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl FeedChannel {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.site_title.clone(),
            link: config.site_link.clone(),
            description: config.feed_description.clone(),
        }
    }
}

/// RSS 渲染器
pub struct FeedRenderer {
    channel: FeedChannel,
}

impl FeedRenderer {
    pub fn new(channel: FeedChannel) -> Self {
        Self { channel }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(FeedChannel::from_config(config))
    }

    /// 渲染订阅源，返回文档和被跳过的条目
    pub fn render_feed(&self, studies: &[EnrichedStudy]) -> Rendered {
        let mut items = Vec::with_capacity(studies.len());
        let mut omissions = Vec::new();
        let mut latest: Option<DateTime<Utc>> = None;

        for study in studies {
            match published_at(study) {
                Ok(published) => {
                    latest = latest.max(Some(published));
                    items.push(render_item(study, published));
                }
                Err(reason) => {
                    warn!("⚠️ 订阅源跳过 '{}': {}", study.title, reason);
                    omissions.push(Omission {
                        title: study.title.clone(),
                        reason,
                    });
                }
            }
        }

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<rss version=\"2.0\">\n  <channel>\n");
        xml.push_str(&format!("    <title>{}</title>\n", escape_markup(&self.channel.title)));
        xml.push_str(&format!("    <link>{}</link>\n", escape_markup(&self.channel.link)));
        xml.push_str(&format!(
            "    <description>{}</description>\n",
            escape_markup(&self.channel.description)
        ));
        xml.push_str(&format!("    <generator>{}</generator>\n", GENERATOR));
        // 取最新条目的日期，保证同样的输入得到同样的输出
        if let Some(latest) = latest {
            xml.push_str(&format!(
                "    <lastBuildDate>{}</lastBuildDate>\n",
                latest.to_rfc2822()
            ));
        }
        for item in items {
            xml.push_str(&item);
        }
        xml.push_str("  </channel>\n</rss>\n");

        Rendered {
            body: xml,
            omissions,
        }
    }
}

impl ArtifactRenderer for FeedRenderer {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Feed
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Rendered {
        self.render_feed(ctx.studies)
    }
}

/// 解析 年-月-日 日期为当天零点（UTC）
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if !DATE_PATTERN.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn published_at(study: &EnrichedStudy) -> Result<DateTime<Utc>, String> {
    let raw = non_blank(study.date.as_deref()).ok_or_else(|| "缺少日期".to_string())?;
    parse_feed_date(raw).ok_or_else(|| format!("日期格式错误: {}", raw))
}

/// 署名行：作者（逗号分隔）+ 出处
///
/// 出处优先使用 `source_url`，否则使用 `source` 文本
pub fn attribution(study: &EnrichedStudy) -> Option<String> {
    let authors: Vec<&str> = study
        .authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let citation = non_blank(study.source_url.as_deref()).or(non_blank(study.source.as_deref()));

    match (authors.is_empty(), citation) {
        (false, Some(citation)) => Some(format!(
            "{}{}{}",
            authors.join(AUTHOR_SEPARATOR),
            CITATION_SEPARATOR,
            citation
        )),
        (false, None) => Some(authors.join(AUTHOR_SEPARATOR)),
        (true, Some(citation)) => Some(citation.to_string()),
        (true, None) => None,
    }
}

fn render_item(study: &EnrichedStudy, published: DateTime<Utc>) -> String {
    let link = non_blank(study.resolved_url.as_deref()).or(non_blank(study.source_url.as_deref()));
    let description = match attribution(study) {
        Some(line) => format!("{}\n\n{}", line, study.summary.trim()),
        None => study.summary.trim().to_string(),
    };

    let mut item = String::from("    <item>\n");
    item.push_str(&format!("      <title>{}</title>\n", escape_markup(&study.title)));
    if let Some(link) = link {
        item.push_str(&format!("      <link>{}</link>\n", escape_markup(link)));
    }
    item.push_str(&format!(
        "      <description>{}</description>\n",
        escape_markup(&description)
    ));
    if let Some(track) = non_blank(Some(study.track.as_str())) {
        item.push_str(&format!("      <category>{}</category>\n", escape_markup(track)));
    }
    match non_blank(study.resolved_url.as_deref()) {
        Some(url) => item.push_str(&format!(
            "      <guid isPermaLink=\"true\">{}</guid>\n",
            escape_markup(url)
        )),
        None => item.push_str(&format!(
            "      <guid isPermaLink=\"false\">{}</guid>\n",
            escape_markup(&study.title)
        )),
    }
    item.push_str(&format!("      <pubDate>{}</pubDate>\n", published.to_rfc2822()));
    item.push_str("    </item>\n");
    item
}
