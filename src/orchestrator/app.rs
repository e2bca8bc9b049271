//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：输出启动信息、创建链接解析器、注册渲染器
//! 2. **加载输入**：读取原始记录（输入文件不存在时中止）
//! 3. **执行构建**：委托 `Pipeline` 完成校验、解析、分组和渲染
//! 4. **写出产物**：页面和订阅源分别整体覆盖写入各自路径
//! 5. **全局统计**：汇总本次运行的结果

use crate::config::Config;
use crate::error::{DigestError, DigestResult};
use crate::models::load_raw_records;
use crate::orchestrator::pipeline::{BuildReport, Pipeline};
use crate::render::{ArtifactKind, FeedRenderer, PageRenderer};
use crate::services::enrichment::{
    CrossrefResolver, EnrichmentLimits, NoopResolver, TitleResolver,
};
use crate::utils::logging::{log_startup, print_final_stats};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::info;

/// 应用主结构
pub struct App {
    config: Config,
    pipeline: Pipeline,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let resolver: Arc<dyn TitleResolver> = if config.enrichment_enabled {
            Arc::new(CrossrefResolver::new(&config).context("无法创建 Crossref 客户端")?)
        } else {
            Arc::new(NoopResolver)
        };

        let pipeline = Pipeline::builder()
            .shared_resolver(resolver)
            .limits(EnrichmentLimits::from_config(&config))
            .renderer(PageRenderer::from_config(&config))
            .renderer(FeedRenderer::from_config(&config))
            .build();

        Ok(Self::with_pipeline(config, pipeline))
    }

    /// 使用自定义流水线创建应用
    pub fn with_pipeline(config: Config, pipeline: Pipeline) -> Self {
        Self { config, pipeline }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<BuildReport> {
        info!("\n📁 正在读取记录...");
        let raw = load_raw_records(Path::new(&self.config.input_path))
            .await
            .context("没有可构建的数据")?;

        let outcome = self.pipeline.run(raw).await;

        for artifact in &outcome.artifacts {
            let path = self.output_path(artifact.kind);
            write_artifact(Path::new(path), &artifact.body).await?;
            info!("✓ 已写入{}: {}", artifact.kind, path);
        }

        print_final_stats(&outcome.report, &self.config);

        Ok(outcome.report)
    }

    fn output_path(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Page => &self.config.page_output_path,
            ArtifactKind::Feed => &self.config.feed_output_path,
        }
    }
}

/// 整体覆盖写入产物，必要时创建父目录
async fn write_artifact(path: &Path, body: &str) -> DigestResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DigestError::write_failed(parent.display().to_string(), e))?;
    }
    fs::write(path, body)
        .await
        .map_err(|e| DigestError::write_failed(path.display().to_string(), e))
}
