use crate::models::track::Track;
use serde::{Deserialize, Serialize};

/// 一条研究摘要记录
///
/// 可选字段保持 `None` 表示"未提供"，`Some("")` 表示"提供但为空"，
/// 两者由渲染层统一省略。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub title: String,
    pub track: String,

    #[serde(default, deserialize_with = "deserialize_nullable_text")]
    pub summary: String,

    #[serde(default, deserialize_with = "deserialize_authors")]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// 年-月-日 格式，订阅源的发布时间来源
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// 存储层中的 DOI 列，存在时可直接得到规范链接
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    // --- 按分类出现的可选字段 ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_notable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_powerful: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub further_explanation: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_projects",
        skip_serializing_if = "Option::is_none"
    )]
    pub projects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lean: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterpoint: Option<String>,
}

impl Study {
    /// 创建只含必填字段的记录
    pub fn new(title: impl Into<String>, track: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            track: track.into(),
            summary: summary.into(),
            authors: Vec::new(),
            source: None,
            source_url: None,
            date: None,
            doi: None,
            why_notable: None,
            example: None,
            why_powerful: None,
            further_explanation: None,
            projects: None,
            lean: None,
            counterpoint: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// 在注册表中查找所属分类，未登记的分类返回 `None`
    pub fn registered_track(&self) -> Option<Track> {
        Track::from_name(&self.track)
    }

    /// 去重用的身份键（标题，忽略首尾空白与大小写）
    pub fn identity_key(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

/// 经过链接解析后的记录
///
/// 原始 `Study` 不会被修改，`resolved_url` 只存在于这份派生副本上
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedStudy {
    pub study: Study,
    pub resolved_url: Option<String>,
}

impl EnrichedStudy {
    pub fn new(study: Study, resolved_url: Option<String>) -> Self {
        Self {
            study,
            resolved_url,
        }
    }

    /// 未解析到链接的副本
    pub fn unresolved(study: &Study) -> Self {
        Self::new(study.clone(), None)
    }
}

impl std::ops::Deref for EnrichedStudy {
    type Target = Study;

    fn deref(&self) -> &Study {
        &self.study
    }
}

// 文本字段：null 视为空字符串
fn deserialize_nullable_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// authors 既可以是字符串数组，也可以是存储层里的单个文本（按 , 或 ; 拆分）
fn deserialize_authors<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(deserializer
        .deserialize_any(TextListVisitor { split: true })?
        .unwrap_or_default())
}

// projects 保留"未提供"与"空列表"的区别
fn deserialize_projects<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(TextListVisitor { split: false })
}

struct TextListVisitor {
    split: bool,
}

impl<'de> serde::de::Visitor<'de> for TextListVisitor {
    type Value = Option<Vec<String>>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a string or a list of strings")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        if self.split {
            Ok(Some(
                value
                    .split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            ))
        } else {
            Ok(Some(vec![value.to_string()]))
        }
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Option<String>>()? {
            if let Some(item) = item {
                items.push(item);
            }
        }
        Ok(Some(items))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(None)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(None)
    }
}
