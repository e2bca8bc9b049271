/// 主题分类（Track）枚举
///
/// 注册表顺序即页面中标签页与面板的顺序，与输入数据无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Track {
    /// 社会层
    SocialLayer,
    /// 资本架构
    Capital,
    /// 游戏系统
    Play,
    /// 健康层
    Health,
    /// 长期视野
    Horizons,
    /// 国家层
    State,
}

impl Track {
    /// 按注册表顺序排列的全部分类
    pub const ALL: [Track; 6] = [
        Track::SocialLayer,
        Track::Capital,
        Track::Play,
        Track::Health,
        Track::Horizons,
        Track::State,
    ];

    /// 获取可读名称（与输入记录中的 `track` 字段精确匹配）
    pub fn name(self) -> &'static str {
        match self {
            Track::SocialLayer => "The Social Layer",
            Track::Capital => "Architectures of Capital",
            Track::Play => "Systems of Play",
            Track::Health => "The Health Layer",
            Track::Horizons => "Long Horizons",
            Track::State => "The State Layer",
        }
    }

    /// 获取稳定的短标识（slug），用作面板 id 和客户端偏好值
    pub fn slug(self) -> &'static str {
        match self {
            Track::SocialLayer => "social-layer",
            Track::Capital => "capital",
            Track::Play => "play",
            Track::Health => "health",
            Track::Horizons => "horizons",
            Track::State => "state",
        }
    }

    /// 注册表中的第一个分类
    pub fn first() -> Self {
        Self::ALL[0]
    }

    /// 从可读名称解析分类（精确匹配，不做模糊匹配）
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|track| track.name() == name)
    }

    /// 从 slug 解析分类
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|track| track.slug() == slug)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
