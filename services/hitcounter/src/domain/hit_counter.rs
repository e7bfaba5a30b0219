//! HitCounter Construct
//!
//! 下流のLambda関数の前段にヒット数カウンターを配置する。
//! 生成するリソース:
//! - パスごとのヒット数を保持するDynamoDBテーブル（`<id>Hits`）
//! - カウントを加算してから下流関数へ転送するLambda関数（`<id>HitCounterHandler`）
//! - ラッパー関数への権限付与（下流関数の呼び出し、テーブルの読み書きのみ）

use thiserror::Error;
use tracing::info;

use super::resource::{Capability, FunctionProps, Resource, ResourceRef, TableResource};
use super::stack::{Stack, StackError};

/// readCapacityの下限（この値自体は不可）
pub const MIN_READ_CAPACITY: u32 = 5;

/// readCapacityの上限（この値自体は不可）
pub const MAX_READ_CAPACITY: u32 = 20;

/// ヒット数テーブルの書き込みキャパシティ（加算のみのため固定）
pub const HITS_WRITE_CAPACITY: u32 = 5;

/// ヒット数テーブルのパーティションキー
pub const HITS_PARTITION_KEY: &str = "path";

/// ヒット数を保持する属性名
pub const HIT_COUNT_ATTRIBUTE: &str = "hitCount";

/// 環境変数名: 下流関数名
pub const ENV_DOWNSTREAM_FUNCTION_NAME: &str = "DOWNSTREAM_FUNCTION_NAME";

/// 環境変数名: ヒット数テーブル名
pub const ENV_HITS_TABLE_NAME: &str = "HITS_TABLE_NAME";

/// ラッパー関数のランタイム（cargo-lambdaでビルドしたbootstrap）
pub const HANDLER_RUNTIME: &str = "provided.al2023";
pub const HANDLER_ENTRYPOINT: &str = "bootstrap";
pub const HANDLER_CODE_ASSET: &str = "target/lambda/hitcounter";

/// Construct作成時のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HitCounterError {
    /// readCapacityが許容範囲外
    #[error("readCapacity must be greater than 5 and less than 20 (got {0})")]
    InvalidReadCapacity(u32),

    /// Stackへの登録に失敗
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// 検証済みのreadCapacity
///
/// `MIN_READ_CAPACITY < value < MAX_READ_CAPACITY`を満たす値のみ保持する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCapacity(u32);

impl ReadCapacity {
    pub fn new(value: u32) -> Result<Self, HitCounterError> {
        if value <= MIN_READ_CAPACITY || value >= MAX_READ_CAPACITY {
            return Err(HitCounterError::InvalidReadCapacity(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ReadCapacity {
    type Error = HitCounterError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// HitCounterの作成パラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct HitCounterProps {
    /// カウント後に呼び出す下流関数（ライフサイクルは所有しない）
    pub downstream: ResourceRef,
    /// ヒット数テーブルの読み取りキャパシティ
    pub read_capacity: u32,
}

/// 作成済みのHitCounter
#[derive(Debug, Clone, PartialEq)]
pub struct HitCounter {
    handler: ResourceRef,
    table: ResourceRef,
}

impl HitCounter {
    /// HitCounterを作成してStackに登録する
    ///
    /// readCapacityの検証と論理IDの重複確認をすべて済ませてから登録するため、
    /// エラー時はStackに何も追加されない。
    pub fn new(stack: &mut Stack, id: &str, props: HitCounterProps) -> Result<Self, HitCounterError> {
        let read_capacity = ReadCapacity::new(props.read_capacity)?;

        let table_id = Self::table_id(id);
        let handler_id = Self::handler_id(id);

        let mut planned = vec![table_id.clone(), Stack::policy_id(&handler_id)];
        planned.extend(Stack::function_ids(&handler_id));
        if let Some(taken) = planned.into_iter().find(|planned_id| stack.contains(planned_id)) {
            return Err(StackError::DuplicateLogicalId(taken).into());
        }

        let table = stack.add(
            table_id,
            Resource::Table(TableResource {
                partition_key: HITS_PARTITION_KEY.to_string(),
                read_capacity: read_capacity.value(),
                write_capacity: HITS_WRITE_CAPACITY,
                sse_enabled: true,
            }),
        )?;

        let handler_props = FunctionProps::new(HANDLER_RUNTIME, HANDLER_ENTRYPOINT, HANDLER_CODE_ASSET)
            .with_environment(ENV_DOWNSTREAM_FUNCTION_NAME, props.downstream.clone())
            .with_environment(ENV_HITS_TABLE_NAME, table.clone());
        let handler = stack.add_function(&handler_id, handler_props)?;

        stack.grant(&handler, Capability::ReadWrite, &table)?;
        stack.grant(&handler, Capability::Invoke, &props.downstream)?;

        info!(
            construct_id = id,
            downstream = props.downstream.logical_id(),
            read_capacity = read_capacity.value(),
            "HitCounter作成"
        );

        Ok(Self { handler, table })
    }

    /// ラッパー関数（API Gatewayなどから呼び出す先）
    pub fn handler(&self) -> &ResourceRef {
        &self.handler
    }

    /// ヒット数テーブル
    pub fn table(&self) -> &ResourceRef {
        &self.table
    }

    fn table_id(id: &str) -> String {
        format!("{}Hits", id)
    }

    fn handler_id(id: &str) -> String {
        format!("{}HitCounterHandler", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::resource::{
        Grant, FUNCTION_RESOURCE_TYPE, POLICY_RESOURCE_TYPE, TABLE_RESOURCE_TYPE,
    };
    use serde_json::json;

    /// 下流関数を登録したStackを作成
    fn stack_with_downstream() -> (Stack, ResourceRef) {
        let mut stack = Stack::new();
        let downstream = stack
            .add_function(
                "TestFunction",
                FunctionProps::new("provided.al2023", "bootstrap", "target/lambda/hello"),
            )
            .unwrap();
        (stack, downstream)
    }

    fn props(downstream: &ResourceRef, read_capacity: u32) -> HitCounterProps {
        HitCounterProps {
            downstream: downstream.clone(),
            read_capacity,
        }
    }

    // ==================== ReadCapacity ====================

    #[test]
    fn test_read_capacity_accepts_open_range() {
        for value in 6..20 {
            assert_eq!(ReadCapacity::new(value).unwrap().value(), value);
        }
    }

    #[test]
    fn test_read_capacity_rejects_bounds_and_outside() {
        for value in [0, 1, 2, 5, 20, 21, 100] {
            assert_eq!(
                ReadCapacity::new(value),
                Err(HitCounterError::InvalidReadCapacity(value))
            );
        }
    }

    #[test]
    fn test_read_capacity_try_from() {
        assert!(ReadCapacity::try_from(10).is_ok());
        assert!(ReadCapacity::try_from(5).is_err());
    }

    #[test]
    fn test_invalid_read_capacity_message() {
        let error = HitCounterError::InvalidReadCapacity(2);
        assert_eq!(
            error.to_string(),
            "readCapacity must be greater than 5 and less than 20 (got 2)"
        );
    }

    // ==================== Construct ====================

    #[test]
    fn test_creates_one_table() {
        let (mut stack, downstream) = stack_with_downstream();

        HitCounter::new(&mut stack, "MyTestConstruct", props(&downstream, 10)).unwrap();

        let template = stack.synth();
        assert_eq!(template.resource_count(TABLE_RESOURCE_TYPE), 1);
        // 下流関数 + ラッパー関数
        assert_eq!(template.resource_count(FUNCTION_RESOURCE_TYPE), 2);
        assert_eq!(template.resource_count(POLICY_RESOURCE_TYPE), 1);
    }

    #[test]
    fn test_every_valid_capacity_creates_resources() {
        for read_capacity in 6..20 {
            let (mut stack, downstream) = stack_with_downstream();
            let counter =
                HitCounter::new(&mut stack, "Counter", props(&downstream, read_capacity)).unwrap();

            assert!(stack.contains(counter.table().logical_id()));
            assert!(stack.contains(counter.handler().logical_id()));
        }
    }

    #[test]
    fn test_handler_environment_variables() {
        let (mut stack, downstream) = stack_with_downstream();

        let counter = HitCounter::new(&mut stack, "MyTestConstruct", props(&downstream, 10)).unwrap();

        let template = stack.synth();
        let handler = &template.as_json()["Resources"][counter.handler().logical_id()];
        assert_eq!(
            handler["Properties"]["Environment"],
            json!({
                "Variables": {
                    "DOWNSTREAM_FUNCTION_NAME": { "Ref": "TestFunction" },
                    "HITS_TABLE_NAME": { "Ref": "MyTestConstructHits" },
                }
            })
        );
    }

    #[test]
    fn test_table_created_with_encryption() {
        let (mut stack, downstream) = stack_with_downstream();

        HitCounter::new(&mut stack, "MyTestConstruct", props(&downstream, 10)).unwrap();

        let template = stack.synth();
        let (_, table) = template.find_resources(TABLE_RESOURCE_TYPE)[0];
        assert_eq!(
            table["Properties"]["SSESpecification"],
            json!({ "SSEEnabled": true })
        );
    }

    #[test]
    fn test_table_key_schema_and_capacity() {
        let (mut stack, downstream) = stack_with_downstream();

        HitCounter::new(&mut stack, "MyTestConstruct", props(&downstream, 12)).unwrap();

        let template = stack.synth();
        let (id, table) = template.find_resources(TABLE_RESOURCE_TYPE)[0];
        assert_eq!(id, "MyTestConstructHits");
        assert_eq!(
            table["Properties"]["KeySchema"],
            json!([{ "AttributeName": "path", "KeyType": "HASH" }])
        );
        assert_eq!(
            table["Properties"]["ProvisionedThroughput"],
            json!({ "ReadCapacityUnits": 12, "WriteCapacityUnits": HITS_WRITE_CAPACITY })
        );
    }

    #[test]
    fn test_handler_granted_exactly_invoke_and_read_write() {
        let (mut stack, downstream) = stack_with_downstream();

        let counter = HitCounter::new(&mut stack, "MyTestConstruct", props(&downstream, 10)).unwrap();

        assert_eq!(
            stack.granted_capabilities(counter.handler()),
            vec![
                Grant::new(Capability::Invoke, downstream.clone()),
                Grant::new(Capability::ReadWrite, counter.table().clone()),
            ]
        );
        // 下流関数には権限を付与しない
        assert!(stack.granted_capabilities(&downstream).is_empty());
    }

    #[test]
    fn test_read_capacity_can_be_configured() {
        let (mut stack, downstream) = stack_with_downstream();
        let before = stack.clone();

        let result = HitCounter::new(&mut stack, "MyTestConstruct", props(&downstream, 2));

        let error = result.unwrap_err();
        assert!(error
            .to_string()
            .contains("readCapacity must be greater than 5 and less than 20"));
        // 何も登録されていない
        assert_eq!(stack, before);
    }

    #[test]
    fn test_boundary_capacities_rejected_without_resources() {
        for read_capacity in [5, 20] {
            let (mut stack, downstream) = stack_with_downstream();

            let result = HitCounter::new(&mut stack, "Counter", props(&downstream, read_capacity));

            assert_eq!(
                result.unwrap_err(),
                HitCounterError::InvalidReadCapacity(read_capacity)
            );
            assert_eq!(stack.synth().resource_count(TABLE_RESOURCE_TYPE), 0);
            assert_eq!(stack.synth().resource_count(FUNCTION_RESOURCE_TYPE), 1);
        }
    }

    #[test]
    fn test_duplicate_construct_id_adds_nothing() {
        let (mut stack, downstream) = stack_with_downstream();
        HitCounter::new(&mut stack, "Counter", props(&downstream, 10)).unwrap();
        let before = stack.clone();

        let result = HitCounter::new(&mut stack, "Counter", props(&downstream, 10));

        assert_eq!(
            result.unwrap_err(),
            HitCounterError::Stack(StackError::DuplicateLogicalId("CounterHits".to_string()))
        );
        assert_eq!(stack, before);
    }

    #[test]
    fn test_two_counters_in_one_stack() {
        let (mut stack, downstream) = stack_with_downstream();

        let first = HitCounter::new(&mut stack, "First", props(&downstream, 10)).unwrap();
        let second = HitCounter::new(&mut stack, "Second", props(&downstream, 15)).unwrap();

        assert_ne!(first.table(), second.table());
        assert_eq!(stack.synth().resource_count(TABLE_RESOURCE_TYPE), 2);
    }
}
