//! リソース定義
//!
//! Stackに登録される個々のリソース（DynamoDBテーブル、Lambda関数、IAMロール、IAMポリシー）と、
//! それらをCloudFormation形式のプロパティへ変換する処理を提供する。

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

/// DynamoDBテーブルのリソースタイプ
pub const TABLE_RESOURCE_TYPE: &str = "AWS::DynamoDB::Table";

/// Lambda関数のリソースタイプ
pub const FUNCTION_RESOURCE_TYPE: &str = "AWS::Lambda::Function";

/// IAMロールのリソースタイプ
pub const ROLE_RESOURCE_TYPE: &str = "AWS::IAM::Role";

/// IAMポリシーのリソースタイプ
pub const POLICY_RESOURCE_TYPE: &str = "AWS::IAM::Policy";

/// 他リソースへの参照
///
/// テンプレート上では`{"Ref": "<論理ID>"}`として出力される。
/// 実行環境ではデプロイ時に解決される物理名（関数名・テーブル名）になる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceRef {
    #[serde(rename = "Ref")]
    logical_id: String,
}

impl ResourceRef {
    pub fn new(logical_id: impl Into<String>) -> Self {
        Self {
            logical_id: logical_id.into(),
        }
    }

    /// 参照先の論理ID
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// `Fn::GetAtt`でARNを参照する値
    pub fn arn(&self) -> Value {
        json!({ "Fn::GetAtt": [self.logical_id, "Arn"] })
    }
}

/// 関数に付与できる権限
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Lambda関数の呼び出し
    Invoke,
    /// DynamoDBテーブルの読み書き
    ReadWrite,
}

/// DynamoDB読み取り系アクション
const TABLE_READ_ACTIONS: &[&str] = &[
    "dynamodb:BatchGetItem",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:Query",
    "dynamodb:GetItem",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
];

/// DynamoDB書き込み系アクション
const TABLE_WRITE_ACTIONS: &[&str] = &[
    "dynamodb:BatchWriteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:DescribeTable",
];

impl Capability {
    /// 権限に対応するIAMアクション一覧
    pub fn actions(&self) -> Vec<&'static str> {
        match self {
            Capability::Invoke => vec!["lambda:InvokeFunction"],
            Capability::ReadWrite => TABLE_READ_ACTIONS
                .iter()
                .chain(TABLE_WRITE_ACTIONS)
                .copied()
                .collect(),
        }
    }
}

/// 付与された権限（どのリソースに対して何ができるか）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grant {
    pub capability: Capability,
    pub target: ResourceRef,
}

impl Grant {
    pub fn new(capability: Capability, target: ResourceRef) -> Self {
        Self { capability, target }
    }

    fn to_statement(&self) -> Value {
        json!({
            "Effect": "Allow",
            "Action": self.capability.actions(),
            "Resource": self.target.arn(),
        })
    }
}

/// DynamoDBテーブル定義（プロビジョニングモード）
#[derive(Debug, Clone, PartialEq)]
pub struct TableResource {
    /// パーティションキー名（文字列型）
    pub partition_key: String,
    pub read_capacity: u32,
    pub write_capacity: u32,
    /// サーバーサイド暗号化の有無
    pub sse_enabled: bool,
}

impl TableResource {
    fn properties(&self) -> Value {
        json!({
            "KeySchema": [
                { "AttributeName": self.partition_key, "KeyType": "HASH" }
            ],
            "AttributeDefinitions": [
                { "AttributeName": self.partition_key, "AttributeType": "S" }
            ],
            "ProvisionedThroughput": {
                "ReadCapacityUnits": self.read_capacity,
                "WriteCapacityUnits": self.write_capacity,
            },
            "SSESpecification": { "SSEEnabled": self.sse_enabled },
        })
    }
}

/// Lambda関数の作成パラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProps {
    /// ランタイム識別子（例: `provided.al2023`）
    pub runtime: String,
    /// ハンドラー名
    pub handler: String,
    /// デプロイパッケージのアセットパス
    pub code: String,
    /// 明示的な関数名（省略時はデプロイ時に自動命名）
    pub function_name: Option<String>,
    /// 環境変数（値は他リソースへの参照）
    pub environment: BTreeMap<String, ResourceRef>,
}

impl FunctionProps {
    pub fn new(
        runtime: impl Into<String>,
        handler: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            handler: handler.into(),
            code: code.into(),
            function_name: None,
            environment: BTreeMap::new(),
        }
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    pub fn with_environment(mut self, key: impl Into<String>, value: ResourceRef) -> Self {
        self.environment.insert(key.into(), value);
        self
    }
}

/// Lambda関数定義
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResource {
    pub props: FunctionProps,
    /// 実行ロール
    pub role: ResourceRef,
}

impl FunctionResource {
    fn properties(&self) -> Value {
        let mut properties = json!({
            "Runtime": self.props.runtime,
            "Handler": self.props.handler,
            "Code": { "Asset": self.props.code },
            "Role": self.role.arn(),
        });

        if let Some(function_name) = &self.props.function_name {
            properties["FunctionName"] = json!(function_name);
        }

        // 環境変数が無い関数ではEnvironment自体を出力しない
        if !self.props.environment.is_empty() {
            properties["Environment"] = json!({ "Variables": self.props.environment });
        }

        properties
    }
}

/// Lambda実行ロール定義
#[derive(Debug, Clone, PartialEq)]
pub struct RoleResource {
    /// 引き受け可能なサービスプリンシパル
    pub service_principal: String,
}

impl RoleResource {
    fn properties(&self) -> Value {
        json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Action": "sts:AssumeRole",
                    "Principal": { "Service": self.service_principal },
                }],
            },
            "ManagedPolicyArns": [
                "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole"
            ],
        })
    }
}

/// ロールにアタッチされるインラインポリシー定義
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyResource {
    pub role: ResourceRef,
    pub grants: Vec<Grant>,
}

impl PolicyResource {
    fn properties(&self, logical_id: &str) -> Value {
        let statements: Vec<Value> = self.grants.iter().map(Grant::to_statement).collect();
        json!({
            "PolicyName": logical_id,
            "PolicyDocument": {
                "Version": "2012-10-17",
                "Statement": statements,
            },
            "Roles": [self.role],
        })
    }
}

/// Stackに登録されるリソース
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Table(TableResource),
    Function(FunctionResource),
    Role(RoleResource),
    Policy(PolicyResource),
}

impl Resource {
    /// CloudFormationのリソースタイプ
    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Table(_) => TABLE_RESOURCE_TYPE,
            Resource::Function(_) => FUNCTION_RESOURCE_TYPE,
            Resource::Role(_) => ROLE_RESOURCE_TYPE,
            Resource::Policy(_) => POLICY_RESOURCE_TYPE,
        }
    }

    /// テンプレート上のリソース表現（`Type`と`Properties`）
    pub fn to_template(&self, logical_id: &str) -> Value {
        let properties = match self {
            Resource::Table(table) => table.properties(),
            Resource::Function(function) => function.properties(),
            Resource::Role(role) => role.properties(),
            Resource::Policy(policy) => policy.properties(logical_id),
        };

        json!({
            "Type": self.resource_type(),
            "Properties": properties,
        })
    }
}
