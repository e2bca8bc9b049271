/// 转义 HTML / XML 文本与属性值中的特殊字符
///
/// XML 1.0 不允许的控制字符（制表、换行、回车除外）直接丢弃
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\t' | '\n' | '\r' => out.push(ch),
            '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// 去掉首尾空白后非空才返回，用于判断可选字段是否需要渲染
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<b>"R&D" isn't</b>"#),
            "&lt;b&gt;&quot;R&amp;D&quot; isn&#39;t&lt;/b&gt;"
        );
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn test_escape_markup_drops_illegal_control_chars() {
        assert_eq!(escape_markup("a\u{1}b\u{0}c\u{1F}"), "abc");
        assert_eq!(escape_markup("tab\there\r\nline"), "tab\there\r\nline");
        assert_eq!(escape_markup("x\u{FFFF}y"), "xy");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(Some("  \n")), None);
        assert_eq!(non_blank(Some(" x ")), Some("x"));
    }
}
