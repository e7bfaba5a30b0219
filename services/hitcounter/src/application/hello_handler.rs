/// Helloハンドラー
///
/// HitCounterの下流に置く最小のハンドラー。呼び出されたパスを本文に含めて返す。
use serde_json::{json, Value};
use tracing::info;

pub struct HelloHandler;

impl HelloHandler {
    pub fn new() -> Self {
        Self
    }

    /// API Gatewayプロキシ形式のレスポンスを返す
    ///
    /// `path`が無い場合は空文字として扱う。
    pub fn handle(&self, event: &Value) -> Value {
        info!(
            event = %serde_json::to_string_pretty(event).unwrap_or_default(),
            "request"
        );

        let path = event.get("path").and_then(|v| v.as_str()).unwrap_or_default();

        json!({
            "statusCode": 200,
            "headers": { "Content-Type": "text/plain" },
            "body": format!("Hello, CDK! You've hit {}\n", path)
        })
    }
}

impl Default for HelloHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_response_shape() {
        let response = HelloHandler::new().handle(&json!({ "path": "/greeting" }));

        assert_eq!(
            response,
            json!({
                "statusCode": 200,
                "headers": { "Content-Type": "text/plain" },
                "body": "Hello, CDK! You've hit /greeting\n"
            })
        );
    }

    #[test]
    fn test_hello_without_path() {
        let response = HelloHandler::new().handle(&json!({}));
        // pathが無いときは"undefined"と出さず、意図的に空文字にする
        assert_eq!(response["body"], "Hello, CDK! You've hit \n");
        assert_eq!(response["statusCode"], 200);
    }

    #[test]
    fn test_hello_ignores_other_fields() {
        let response = HelloHandler::default().handle(&json!({
            "path": "/a",
            "httpMethod": "POST",
            "body": "{\"x\":1}"
        }));
        assert_eq!(response["body"], "Hello, CDK! You've hit /a\n");
    }
}
