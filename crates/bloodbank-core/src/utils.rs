//! 通用工具函数

/// 规范化搜索词：去除首尾空白并转小写，空串返回 None
pub fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// 忽略大小写的子串匹配，`needle` 需已转小写
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// 表单可选文本：空白视为未填写
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 必填文本字段是否缺失
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
