//! 输入验证辅助函数
//!
//! 验证规则：
//! - 去除首尾空格
//! - 非空字符串才通过验证
//! - 失败返回 bad_request_error 响应

use crate::utils::response::bad_request_error;
use axum::response::Response;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: &str, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize_required;
    use axum::http::StatusCode;

    #[test]
    fn trims_and_rejects_blank() {
        assert_eq!(normalize_required(" 10.0.0.1 ", "ip").unwrap(), "10.0.0.1");
        let response = normalize_required("  ", "ip").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
