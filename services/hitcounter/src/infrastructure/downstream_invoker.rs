//! 下流Lambda呼び出しモジュール
//!
//! ラッパー関数から下流関数を同期呼び出し（RequestResponse）し、
//! 下流関数のレスポンスJSONをそのまま返す。

use async_trait::async_trait;
use aws_sdk_lambda::operation::invoke::builders::InvokeFluentBuilder;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client as LambdaClient;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

/// 下流呼び出しのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvokeError {
    /// AWS SDK エラー
    #[error("AWS Lambda APIエラー: {0}")]
    AwsSdkError(String),

    /// 下流関数の実行エラー（FunctionErrorヘッダー付きのレスポンス）
    #[error("Downstream function error ({kind}): {payload}")]
    FunctionError { kind: String, payload: String },

    /// ペイロードのJSON変換に失敗
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// 下流関数呼び出しトレイト（テスト用の抽象化）
#[async_trait]
pub trait DownstreamInvoker: Send + Sync {
    /// イベントを変更せずに下流関数へ渡し、レスポンスを返す
    async fn invoke(&self, event: &Value) -> Result<Value, InvokeError>;
}

/// 実際のAWS Lambda SDKを使用した下流呼び出し実装
pub struct AwsLambdaInvoker {
    client: LambdaClient,
    function_name: String,
}

impl AwsLambdaInvoker {
    pub fn new(client: LambdaClient, function_name: String) -> Self {
        Self {
            client,
            function_name,
        }
    }

    /// 同期呼び出し用のInvokeリクエストを組み立てる
    fn invoke_request(&self, event: &Value) -> Result<InvokeFluentBuilder, InvokeError> {
        let payload =
            serde_json::to_vec(event).map_err(|e| InvokeError::InvalidPayload(e.to_string()))?;

        Ok(self
            .client
            .invoke()
            .function_name(&self.function_name)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(payload)))
    }
}

/// Invokeのレスポンスを解釈する
///
/// `function_error`が設定されている場合、下流関数内で例外が発生している。
/// ペイロードが空の場合は`null`を返す。
fn decode_response(
    function_error: Option<&str>,
    payload: Option<&[u8]>,
) -> Result<Value, InvokeError> {
    let payload = payload.unwrap_or_default();

    if let Some(kind) = function_error {
        return Err(InvokeError::FunctionError {
            kind: kind.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
    }

    if payload.is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_slice(payload).map_err(|e| InvokeError::InvalidPayload(e.to_string()))
}

#[async_trait]
impl DownstreamInvoker for AwsLambdaInvoker {
    async fn invoke(&self, event: &Value) -> Result<Value, InvokeError> {
        let output = self
            .invoke_request(event)?
            .send()
            .await
            .map_err(|err| {
                warn!(
                    function_name = %self.function_name,
                    error = %err,
                    "Invokeエラー"
                );
                InvokeError::AwsSdkError(err.to_string())
            })?;

        info!(
            function_name = %self.function_name,
            status_code = output.status_code(),
            function_error = output.function_error().unwrap_or_default(),
            "下流関数を呼び出し"
        );

        decode_response(output.function_error(), output.payload().map(|p| p.as_ref()))
    }
}
