//! 构建流水线 - 编排层
//!
//! ## 职责
//!
//! 按 校验 → 链接解析 → 分组 → 渲染 的顺序处理一批原始记录，
//! 返回内存中的产物与统计，不接触文件系统。
//!
//! ## 设计特点
//!
//! - **渲染器注入**：页面与订阅源渲染器通过 `PipelineBuilder` 注册
//! - **解析器注入**：外部查询通过 `TitleResolver` 注入，测试可以替换
//! - **降级继续**：单条记录的问题只产生诊断信息，不会让整次运行失败

use crate::models::Track;
use crate::render::{ArtifactKind, ArtifactRenderer, Omission, RenderContext};
use crate::services::enrichment::{enrich_studies, EnrichmentLimits, NoopResolver, TitleResolver};
use crate::services::grouper::group_by_track;
use crate::services::validator::{validate, Rejection};
use crate::utils::logging::log_studies_loaded;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// 渲染完成的产物
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub body: String,
}

/// 构建统计
#[derive(Debug, Default, Clone)]
pub struct BuildReport {
    pub loaded: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub ungrouped: usize,
    pub enriched: usize,
    pub feed_items: usize,
    pub feed_omissions: usize,
    pub rejections: Vec<Rejection>,
    pub omissions: Vec<Omission>,
}

/// 一次构建的结果
#[derive(Debug)]
pub struct BuildOutcome {
    pub artifacts: Vec<Artifact>,
    pub report: BuildReport,
}

impl BuildOutcome {
    /// 按类型取产物
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// 构建流水线
pub struct Pipeline {
    resolver: Arc<dyn TitleResolver>,
    renderers: Vec<Box<dyn ArtifactRenderer>>,
    limits: EnrichmentLimits,
    registry: Vec<Track>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// 处理一批原始记录
    pub async fn run(&self, raw: Vec<Value>) -> BuildOutcome {
        let loaded = raw.len();
        let validation = validate(raw);
        log_studies_loaded(loaded, validation.studies.len());

        let enriched =
            enrich_studies(&validation.studies, self.resolver.clone(), self.limits).await;
        let groups = group_by_track(&enriched, &self.registry);

        let mut report = BuildReport {
            loaded,
            accepted: enriched.len(),
            rejected: validation.rejections.len(),
            ungrouped: groups.ungrouped().len(),
            enriched: enriched.iter().filter(|s| s.resolved_url.is_some()).count(),
            rejections: validation.rejections,
            ..Default::default()
        };

        let ctx = RenderContext {
            studies: &enriched,
            groups: &groups,
        };

        let mut artifacts = Vec::with_capacity(self.renderers.len());
        for renderer in &self.renderers {
            let rendered = renderer.render(&ctx);
            info!(
                "📝 {}渲染完成 ({} 字节, 跳过 {} 条)",
                renderer.kind(),
                rendered.body.len(),
                rendered.omissions.len()
            );

            if renderer.kind() == ArtifactKind::Feed {
                report.feed_omissions = rendered.omissions.len();
                report.feed_items = enriched.len() - rendered.omissions.len();
            }
            report.omissions.extend(rendered.omissions);

            artifacts.push(Artifact {
                kind: renderer.kind(),
                body: rendered.body,
            });
        }

        BuildOutcome { artifacts, report }
    }
}

/// 流水线构建器
pub struct PipelineBuilder {
    resolver: Arc<dyn TitleResolver>,
    renderers: Vec<Box<dyn ArtifactRenderer>>,
    limits: EnrichmentLimits,
    registry: Vec<Track>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            resolver: Arc::new(NoopResolver),
            renderers: Vec::new(),
            limits: EnrichmentLimits::default(),
            registry: Track::ALL.to_vec(),
        }
    }
}

impl PipelineBuilder {
    /// 设置链接解析器（默认不解析）
    pub fn resolver(mut self, resolver: impl TitleResolver + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// 使用共享的链接解析器
    pub fn shared_resolver(mut self, resolver: Arc<dyn TitleResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// 注册一个渲染器，产物按注册顺序输出
    pub fn renderer(mut self, renderer: impl ArtifactRenderer + 'static) -> Self {
        self.renderers.push(Box::new(renderer));
        self
    }

    pub fn limits(mut self, limits: EnrichmentLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            resolver: self.resolver,
            renderers: self.renderers,
            limits: self.limits,
            registry: self.registry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FeedChannel, FeedRenderer, PagePreferences, PageRenderer};
    use serde_json::json;

    fn pipeline() -> Pipeline {
        Pipeline::builder()
            .renderer(PageRenderer::new("Digest", PagePreferences::default()))
            .renderer(FeedRenderer::new(FeedChannel {
                title: "Digest".into(),
                link: "https://example.org/".into(),
                description: "d".into(),
            }))
            .build()
    }

    #[tokio::test]
    async fn test_report_counts_each_stage() {
        let outcome = pipeline()
            .run(vec![
                json!({"title": "a", "track": "The Social Layer", "date": "2024-05-14"}),
                json!({"title": "b", "track": "Unknown Layer", "date": "2024-05-15"}),
                json!({"title": "c", "track": "Systems of Play"}),
                json!({"title": "no track"}),
                json!([1, 2]),
            ])
            .await;

        let report = &outcome.report;
        assert_eq!(report.loaded, 5);
        assert_eq!(report.accepted, 3);
        assert_eq!(report.rejected, 2);
        assert_eq!(report.ungrouped, 1);
        assert_eq!(report.enriched, 0);
        assert_eq!(report.feed_items, 2);
        assert_eq!(report.feed_omissions, 1);
        assert_eq!(report.omissions[0].title, "c");
    }

    #[tokio::test]
    async fn test_artifacts_follow_renderer_order() {
        let outcome = pipeline().run(Vec::new()).await;

        let kinds: Vec<ArtifactKind> = outcome.artifacts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ArtifactKind::Page, ArtifactKind::Feed]);
        let page = outcome.artifact(ArtifactKind::Page).unwrap();
        assert_eq!(page.body.matches("class=\"track-panel").count(), 6);
    }
}
