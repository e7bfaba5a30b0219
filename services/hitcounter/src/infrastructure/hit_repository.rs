/// DynamoDBでパスごとのヒット数を管理するリポジトリ
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::operation::update_item::builders::UpdateItemFluentBuilder;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;
use tracing::debug;

use crate::domain::{HITS_PARTITION_KEY, HIT_COUNT_ATTRIBUTE};

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// DynamoDBへの書き込みに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// 属性値の変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// ヒット数カウンター用トレイト
///
/// 実際のDynamoDB実装とテスト用モックを差し替えられるようにする。
#[async_trait]
pub trait HitRepository: Send + Sync {
    /// パスのヒット数を1加算し、加算後の値を返す
    ///
    /// レコードが存在しない場合はヒット数1で作成する。
    /// 読み取りと書き込みを分けず、単一の原子的な操作で行うこと。
    async fn increment(&self, path: &str) -> Result<u64, RepositoryError>;
}

/// HitRepositoryのDynamoDB実装
#[derive(Debug, Clone)]
pub struct DynamoHitRepository {
    /// DynamoDBクライアント
    client: DynamoDbClient,
    /// ヒット数テーブル名
    table_name: String,
}

impl DynamoHitRepository {
    pub fn new(client: DynamoDbClient, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// 属性マップからヒット数を読み取る
    fn parse_hit_count(item: &HashMap<String, AttributeValue>) -> Result<u64, RepositoryError> {
        item.get(HIT_COUNT_ATTRIBUTE)
            .and_then(|v| v.as_n().ok())
            .ok_or_else(|| {
                RepositoryError::SerializationError(format!("Missing {} field", HIT_COUNT_ATTRIBUTE))
            })?
            .parse::<u64>()
            .map_err(|e| {
                RepositoryError::SerializationError(format!(
                    "Invalid {} value: {}",
                    HIT_COUNT_ATTRIBUTE, e
                ))
            })
    }

    /// 加算用のUpdateItemリクエストを組み立てる
    ///
    /// ADDは属性が無ければ0として扱うため、レコード作成と加算が1回の書き込みで済む。
    fn increment_request(&self, path: &str) -> UpdateItemFluentBuilder {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key(HITS_PARTITION_KEY, AttributeValue::S(path.to_string()))
            .update_expression("ADD #hit_count :incr")
            .expression_attribute_names("#hit_count", HIT_COUNT_ATTRIBUTE)
            .expression_attribute_values(":incr", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::UpdatedNew)
    }
}

#[async_trait]
impl HitRepository for DynamoHitRepository {
    async fn increment(&self, path: &str) -> Result<u64, RepositoryError> {
        let result = self
            .increment_request(path)
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(e.to_string()))?;

        let attributes = result.attributes.ok_or_else(|| {
            RepositoryError::SerializationError("UpdateItem returned no attributes".to_string())
        })?;
        let hit_count = Self::parse_hit_count(&attributes)?;

        debug!(path = path, hit_count = hit_count, "ヒット数を加算");

        Ok(hit_count)
    }
}
