//! 渲染层（Render Layer）
//!
//! 同一份输入（带链接的记录 + 分组结果）分别渲染为页面和订阅源。
//! 渲染器之间不共享可变状态，编排层通过 `ArtifactRenderer` 注入它们。

pub mod escape;
pub mod feed;
pub mod page;

use crate::models::EnrichedStudy;
use crate::services::grouper::TrackGroups;

pub use feed::{FeedChannel, FeedRenderer};
pub use page::{PagePreferences, PageRenderer, ThemePolicy};

/// 产物类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// HTML 页面
    Page,
    /// RSS 订阅源
    Feed,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Page => write!(f, "页面"),
            ArtifactKind::Feed => write!(f, "订阅源"),
        }
    }
}

/// 渲染输入，所有渲染器看到的是同一份只读数据
pub struct RenderContext<'a> {
    /// 全部合法记录，保持输入顺序
    pub studies: &'a [EnrichedStudy],
    /// 按注册表分组后的记录
    pub groups: &'a TrackGroups<'a>,
}

/// 单条记录未能进入产物的诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Omission {
    pub title: String,
    pub reason: String,
}

/// 渲染结果
#[derive(Debug, Clone)]
pub struct Rendered {
    pub body: String,
    pub omissions: Vec<Omission>,
}

impl Rendered {
    pub fn complete(body: String) -> Self {
        Self {
            body,
            omissions: Vec::new(),
        }
    }
}

/// 产物渲染器
pub trait ArtifactRenderer: Send + Sync {
    fn kind(&self) -> ArtifactKind;

    fn render(&self, ctx: &RenderContext<'_>) -> Rendered;
}
