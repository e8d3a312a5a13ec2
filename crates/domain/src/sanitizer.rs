//! HTML 转义
//!
//! 存储的文本是已经转义过的，客户端可以直接插入 DOM。

/// 转义 `& < > " ' /` 六个字符，其余字符原样保留。
///
/// 不做截断或规范化；对同一段文本调用两次会得到二次转义的结果。
pub fn sanitize(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            '/' => escaped.push_str("&#x2F;"),
            other => escaped.push(other),
        }
    }
    escaped
}
