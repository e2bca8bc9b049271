//! 记录校验服务 - 业务能力层
//!
//! 只负责"把原始值变成合法 Study"，不关心分组与渲染。
//! 不合法的记录跳过并返回诊断信息，不会中止运行。

use crate::models::Study;
use crate::utils::logging::truncate_text;
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// 记录被拒绝的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    /// 不是键值对记录
    #[error("不是记录类型")]
    NotRecord,
    /// 缺少 track 字段（或为 null / 非字符串）
    #[error("缺少 track 字段")]
    MissingTrack,
    /// 缺少标题或标题为空
    #[error("缺少标题")]
    MissingTitle,
    /// 字段类型不符
    #[error("字段格式错误: {0}")]
    InvalidField(String),
    /// 与之前的记录标题重复
    #[error("标题重复")]
    DuplicateTitle,
}

/// 一条被拒绝记录的诊断信息
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// 在输入中的位置（从0开始）
    pub index: usize,
    pub reason: RejectionReason,
    /// 原始值的截断预览，用于日志
    pub preview: String,
}

/// 校验结果
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// 合法记录，保持输入顺序
    pub studies: Vec<Study>,
    pub rejections: Vec<Rejection>,
}

impl ValidationReport {
    /// 分类不在注册表中的合法记录数量（只影响页面分组）
    pub fn ungrouped_count(&self) -> usize {
        self.studies
            .iter()
            .filter(|s| s.registered_track().is_none())
            .count()
    }
}

const PREVIEW_LEN: usize = 80;

/// 字段期望的 JSON 形态
#[derive(Debug, Clone, Copy)]
enum FieldShape {
    /// 字符串或 null
    Text,
    /// 字符串、字符串数组或 null
    TextList,
}

/// title / track 之外的已知字段
const FIELD_SHAPES: &[(&str, FieldShape)] = &[
    ("summary", FieldShape::Text),
    ("authors", FieldShape::TextList),
    ("source", FieldShape::Text),
    ("source_url", FieldShape::Text),
    ("date", FieldShape::Text),
    ("doi", FieldShape::Text),
    ("why_notable", FieldShape::Text),
    ("example", FieldShape::Text),
    ("why_powerful", FieldShape::Text),
    ("further_explanation", FieldShape::Text),
    ("projects", FieldShape::TextList),
    ("lean", FieldShape::Text),
    ("counterpoint", FieldShape::Text),
];

/// 校验一批原始记录
pub fn validate(raw: Vec<Value>) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_titles = HashSet::new();

    for (index, value) in raw.into_iter().enumerate() {
        match validate_one(&value) {
            Ok(study) => {
                if !seen_titles.insert(study.identity_key()) {
                    reject(&mut report, index, RejectionReason::DuplicateTitle, &value);
                    continue;
                }
                if study.registered_track().is_none() {
                    debug!("记录 #{} 的分类 '{}' 未登记，只进入订阅源", index, study.track);
                }
                report.studies.push(study);
            }
            Err(reason) => reject(&mut report, index, reason, &value),
        }
    }

    report
}

/// 校验单条记录
pub fn validate_one(value: &Value) -> Result<Study, RejectionReason> {
    let record = value.as_object().ok_or(RejectionReason::NotRecord)?;

    match record.get("track") {
        Some(Value::String(_)) => {}
        _ => return Err(RejectionReason::MissingTrack),
    }

    let title = match record.get("title").and_then(Value::as_str) {
        Some(title) if !title.trim().is_empty() => title.trim(),
        _ => return Err(RejectionReason::MissingTitle),
    };

    // 其余字段类型不符时按未提供处理，记录本身保留
    let mut record = record.clone();
    for field in discard_malformed_fields(&mut record) {
        warn!("⚠️ 记录 '{}' 的字段 {} 格式错误，按未提供处理", title, field);
    }

    let mut study: Study = serde_json::from_value(Value::Object(record))
        .map_err(|e| RejectionReason::InvalidField(e.to_string()))?;
    study.title = study.title.trim().to_string();

    Ok(study)
}

/// 移除类型不符的已知字段，返回被移除（或被清理）的字段名
fn discard_malformed_fields(record: &mut Map<String, Value>) -> Vec<&'static str> {
    let mut discarded = Vec::new();

    for &(field, shape) in FIELD_SHAPES {
        let Some(value) = record.get_mut(field) else {
            continue;
        };
        let keep = match (shape, value) {
            (_, Value::Null) | (_, Value::String(_)) => true,
            (FieldShape::TextList, Value::Array(items)) => {
                let before = items.len();
                items.retain(|item| item.is_string() || item.is_null());
                if items.len() != before {
                    discarded.push(field);
                }
                true
            }
            _ => false,
        };
        if !keep {
            record.remove(field);
            discarded.push(field);
        }
    }

    discarded
}

fn reject(report: &mut ValidationReport, index: usize, reason: RejectionReason, value: &Value) {
    let preview = truncate_text(&value.to_string(), PREVIEW_LEN);
    warn!("⚠️ 跳过不合法的记录 #{} ({}): {}", index, reason, preview);
    report.rejections.push(Rejection {
        index,
        reason,
        preview,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_record_and_missing_track_are_skipped() {
        let report = validate(vec![
            json!("just a string"),
            json!(42),
            json!({"title": "no track"}),
            json!({"title": "null track", "track": null}),
            json!({"title": "ok", "track": "Systems of Play"}),
        ]);

        assert_eq!(report.studies.len(), 1);
        assert_eq!(report.studies[0].title, "ok");
        let reasons: Vec<_> = report.rejections.iter().map(|r| r.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                RejectionReason::NotRecord,
                RejectionReason::NotRecord,
                RejectionReason::MissingTrack,
                RejectionReason::MissingTrack,
            ]
        );
        assert_eq!(report.rejections[2].index, 2);
    }

    #[test]
    fn test_unknown_track_is_kept_but_ungrouped() {
        let report = validate(vec![
            json!({"title": "a", "track": "Unknown Layer", "date": "2024-05-14"}),
            json!({"title": "b", "track": "The State Layer"}),
        ]);

        assert_eq!(report.studies.len(), 2);
        assert!(report.rejections.is_empty());
        assert_eq!(report.ungrouped_count(), 1);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let report = validate(vec![
            json!({"title": "   ", "track": "Long Horizons"}),
            json!({"track": "Long Horizons"}),
        ]);

        assert!(report.studies.is_empty());
        assert_eq!(report.rejections[0].reason, RejectionReason::MissingTitle);
        assert_eq!(report.rejections[1].reason, RejectionReason::MissingTitle);
    }

    #[test]
    fn test_wrong_typed_fields_are_treated_as_absent() {
        let report = validate(vec![json!({
            "title": "Numeric Date",
            "track": "The Social Layer",
            "summary": "kept",
            "date": 20240514,
            "lean": 3,
            "example": {"nested": true},
            "authors": ["Ada", 7, null, "Grace"],
            "projects": false
        })]);

        assert!(report.rejections.is_empty());
        let study = &report.studies[0];
        assert_eq!(study.summary, "kept");
        assert_eq!(study.date, None);
        assert_eq!(study.lean, None);
        assert_eq!(study.example, None);
        assert_eq!(study.projects, None);
        assert_eq!(study.authors, vec!["Ada", "Grace"]);
    }

    #[test]
    fn test_wrong_typed_summary_becomes_empty() {
        let study = validate_one(&json!({
            "title": "t",
            "track": "The Health Layer",
            "summary": 12
        }))
        .unwrap();
        assert_eq!(study.summary, "");
    }

    #[test]
    fn test_duplicate_titles_keep_first_occurrence() {
        let report = validate(vec![
            json!({"title": "Same", "track": "The Health Layer", "summary": "first"}),
            json!({"title": " same ", "track": "Long Horizons", "summary": "second"}),
        ]);

        assert_eq!(report.studies.len(), 1);
        assert_eq!(report.studies[0].summary, "first");
        assert_eq!(report.rejections[0].reason, RejectionReason::DuplicateTitle);
    }

    #[test]
    fn test_input_order_is_preserved() {
        let raw = (0..5)
            .map(|i| json!({"title": format!("t{}", i), "track": "Systems of Play"}))
            .collect();
        let titles: Vec<_> = validate(raw).studies.into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["t0", "t1", "t2", "t3", "t4"]);
    }
}
