/// ラッパー関数の実行時設定
///
/// HitCounter Constructが関数に設定した環境変数から、
/// 下流関数名とヒット数テーブル名を読み込む。
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_lambda::Client as LambdaClient;
use thiserror::Error;

use crate::domain::{ENV_DOWNSTREAM_FUNCTION_NAME, ENV_HITS_TABLE_NAME};

/// 設定読み込みのエラー型
#[derive(Debug, Error)]
pub enum HitCounterConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// 環境変数を読み込む（未設定・空文字はエラー）
fn require_env(key: &str) -> Result<String, HitCounterConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(HitCounterConfigError::MissingEnvVar(key.to_string())),
    }
}

/// クライアントと呼び出し先を持つ設定
///
/// 環境変数:
/// - DOWNSTREAM_FUNCTION_NAME: カウント後に呼び出す下流関数名
/// - HITS_TABLE_NAME: ヒット数テーブル名
#[derive(Debug, Clone)]
pub struct HitCounterConfig {
    dynamodb_client: DynamoDbClient,
    lambda_client: LambdaClient,
    hits_table: String,
    downstream_function: String,
}

impl HitCounterConfig {
    /// 環境からAWS設定を読み込み、クライアントを作成する
    pub async fn from_env() -> Result<Self, HitCounterConfigError> {
        // テーブル名・関数名が無ければクライアントを作らずに終了
        let hits_table = require_env(ENV_HITS_TABLE_NAME)?;
        let downstream_function = require_env(ENV_DOWNSTREAM_FUNCTION_NAME)?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        Ok(Self {
            dynamodb_client: DynamoDbClient::new(&aws_config),
            lambda_client: LambdaClient::new(&aws_config),
            hits_table,
            downstream_function,
        })
    }

    /// 明示的な値で作成（テスト用）
    pub fn new(
        dynamodb_client: DynamoDbClient,
        lambda_client: LambdaClient,
        hits_table: String,
        downstream_function: String,
    ) -> Self {
        Self {
            dynamodb_client,
            lambda_client,
            hits_table,
            downstream_function,
        }
    }

    pub fn dynamodb_client(&self) -> &DynamoDbClient {
        &self.dynamodb_client
    }

    pub fn lambda_client(&self) -> &LambdaClient {
        &self.lambda_client
    }

    /// ヒット数テーブル名
    pub fn hits_table(&self) -> &str {
        &self.hits_table
    }

    /// 下流関数名
    pub fn downstream_function(&self) -> &str {
        &self.downstream_function
    }
}
