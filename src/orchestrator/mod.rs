//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `pipeline` - 构建流水线
//! - 校验原始记录
//! - 并发解析规范链接（Semaphore 限制并发，单次超时）
//! - 按注册表分组
//! - 调用注入的渲染器生成页面与订阅源
//!
//! ### `app` - 应用入口
//! - 管理配置与解析器的生命周期
//! - 读取输入、写出产物
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (读输入 / 写产物)
//!     ↓
//! pipeline (validate → enrich → group → render)
//!     ↓
//! services (能力层：validator / enrichment / grouper)
//!     ↓
//! render (页面 / 订阅源)
//! ```

pub mod app;
pub mod pipeline;

// 重新导出主要类型
pub use app::App;
pub use pipeline::{Artifact, BuildOutcome, BuildReport, Pipeline, PipelineBuilder};
