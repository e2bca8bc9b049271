//! # Study Digest
//!
//! 把一批研究摘要记录构建为分类标签页面和 RSS 订阅源
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - `Study` 记录、`Track` 分类注册表、JSON 输入加载
//!
//! ### ② 业务能力层（Services）
//! - `Validator` - 跳过不合法的记录并给出诊断
//! - `Enrichment` - 按标题解析规范链接，失败即视为没有链接
//! - `Grouper` - 按注册表顺序分组
//!
//! ### ③ 渲染层（Render）
//! - `PageRenderer` - 标签页面（含主题与默认分类的客户端偏好）
//! - `FeedRenderer` - RSS 2.0 订阅源
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/pipeline` - 校验 → 解析 → 分组 → 渲染
//! - `orchestrator/app` - 读取输入、写出产物、输出统计

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{ConfigError, DigestError, DigestResult};
pub use models::{EnrichedStudy, Study, Track};
pub use orchestrator::{App, BuildOutcome, BuildReport, Pipeline};
pub use render::{ArtifactKind, FeedRenderer, PagePreferences, PageRenderer, ThemePolicy};
pub use services::{CrossrefResolver, NoopResolver, TitleResolver};
