use crate::error::{DigestError, DigestResult};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载原始记录
///
/// 只检查"文件存在且顶层是数组"，逐条记录的校验交给 validator。
/// 文件缺失是唯一应该中止运行的输入错误。
pub async fn load_raw_records(path: &Path) -> DigestResult<Vec<Value>> {
    let display = path.display().to_string();

    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(DigestError::InputNotFound { path: display });
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| DigestError::input_read_failed(&display, e))?;

    parse_raw_records(&content, &display)
}

/// 解析 JSON 文本为原始记录列表
pub fn parse_raw_records(content: &str, origin: &str) -> DigestResult<Vec<Value>> {
    let value: Value =
        serde_json::from_str(content).map_err(|source| DigestError::InputParseFailed {
            path: origin.to_string(),
            source,
        })?;

    match value {
        Value::Array(records) => {
            tracing::info!("成功加载 {} 条原始记录", records.len());
            Ok(records)
        }
        _ => Err(DigestError::InputNotArray {
            path: origin.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_raw_records(&dir.path().join("studies.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_loads_array_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("studies.json");
        std::fs::write(&path, r#"[{"title": "a", "track": "Systems of Play"}, 3]"#).unwrap();

        let records = load_raw_records(&path).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_top_level_object_is_rejected() {
        let err = parse_raw_records(r#"{"title": "a"}"#, "inline").unwrap_err();
        assert!(matches!(err, DigestError::InputNotArray { .. }));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = parse_raw_records("[{", "inline").unwrap_err();
        assert!(matches!(err, DigestError::InputParseFailed { .. }));
    }
}
