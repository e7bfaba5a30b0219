//! Stack（リソースグラフ）
//!
//! Constructが生成したリソースを論理IDをキーに保持し、
//! CloudFormation形式のテンプレートとして合成する。
//! 論理IDはStack内で一意でなければならない。

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::debug;

use super::resource::{
    Capability, FunctionProps, FunctionResource, Grant, PolicyResource, Resource, ResourceRef,
    RoleResource,
};

/// Lambdaサービスプリンシパル
const LAMBDA_SERVICE_PRINCIPAL: &str = "lambda.amazonaws.com";

/// Stack操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StackError {
    /// 論理IDの重複
    #[error("There is already a resource with logical id '{0}'")]
    DuplicateLogicalId(String),

    /// 参照先のLambda関数が存在しない
    #[error("Function not found: {0}")]
    FunctionNotFound(String),
}

/// リソースの集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    resources: BTreeMap<String, Resource>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 論理IDが使用済みかどうか
    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources.get(logical_id)
    }

    /// リソースを登録し、その参照を返す
    pub fn add(
        &mut self,
        logical_id: impl Into<String>,
        resource: Resource,
    ) -> Result<ResourceRef, StackError> {
        let logical_id = logical_id.into();
        if self.contains(&logical_id) {
            return Err(StackError::DuplicateLogicalId(logical_id));
        }

        debug!(
            logical_id = %logical_id,
            resource_type = resource.resource_type(),
            "リソース登録"
        );

        let reference = ResourceRef::new(&logical_id);
        self.resources.insert(logical_id, resource);
        Ok(reference)
    }

    /// 関数の実行ロールの論理ID
    pub fn role_id(function_id: &str) -> String {
        format!("{}ServiceRole", function_id)
    }

    /// 関数のデフォルトポリシーの論理ID
    pub fn policy_id(function_id: &str) -> String {
        format!("{}ServiceRoleDefaultPolicy", function_id)
    }

    /// 関数の登録で使用される論理ID（関数本体と実行ロール）
    pub fn function_ids(function_id: &str) -> [String; 2] {
        [function_id.to_string(), Self::role_id(function_id)]
    }

    /// Lambda関数を実行ロールと一緒に登録する
    ///
    /// 関数本体・ロールのどちらかの論理IDが使用済みの場合は何も登録しない。
    pub fn add_function(
        &mut self,
        function_id: &str,
        props: FunctionProps,
    ) -> Result<ResourceRef, StackError> {
        if let Some(taken) = Self::function_ids(function_id)
            .into_iter()
            .find(|id| self.contains(id))
        {
            return Err(StackError::DuplicateLogicalId(taken));
        }

        let role = self.add(
            Self::role_id(function_id),
            Resource::Role(RoleResource {
                service_principal: LAMBDA_SERVICE_PRINCIPAL.to_string(),
            }),
        )?;

        self.add(function_id, Resource::Function(FunctionResource { props, role }))
    }

    /// 関数に権限を付与する
    ///
    /// 関数のデフォルトポリシーに1ステートメント追加する。ポリシーが未作成なら作成する。
    /// 同じ権限を重複して付与した場合は1つにまとめる。
    pub fn grant(
        &mut self,
        function: &ResourceRef,
        capability: Capability,
        target: &ResourceRef,
    ) -> Result<(), StackError> {
        let role = match self.get(function.logical_id()) {
            Some(Resource::Function(f)) => f.role.clone(),
            _ => return Err(StackError::FunctionNotFound(function.logical_id().to_string())),
        };

        let grant = Grant::new(capability, target.clone());
        let policy_id = Self::policy_id(function.logical_id());

        match self.resources.get_mut(&policy_id) {
            Some(Resource::Policy(policy)) => {
                if !policy.grants.contains(&grant) {
                    policy.grants.push(grant);
                }
            }
            Some(_) => return Err(StackError::DuplicateLogicalId(policy_id)),
            None => {
                self.add(
                    policy_id,
                    Resource::Policy(PolicyResource {
                        role,
                        grants: vec![grant],
                    }),
                )?;
            }
        }

        Ok(())
    }

    /// 関数に付与されている権限の一覧
    ///
    /// 関数の実行ロールにアタッチされた全ポリシーを対象にする。
    pub fn granted_capabilities(&self, function: &ResourceRef) -> Vec<Grant> {
        let role = match self.get(function.logical_id()) {
            Some(Resource::Function(f)) => &f.role,
            _ => return Vec::new(),
        };

        let mut grants: Vec<Grant> = self
            .resources
            .values()
            .filter_map(|r| match r {
                Resource::Policy(policy) if &policy.role == role => Some(policy.grants.iter()),
                _ => None,
            })
            .flatten()
            .cloned()
            .collect();
        grants.sort();
        grants.dedup();
        grants
    }

    /// テンプレートを合成する
    pub fn synth(&self) -> Template {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|(id, r)| (id.clone(), r.to_template(id)))
            .collect();

        Template {
            json: json!({ "Resources": resources }),
        }
    }
}

/// 合成済みテンプレート
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    json: Value,
}

impl Template {
    pub fn as_json(&self) -> &Value {
        &self.json
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.json).unwrap_or_default()
    }

    /// 指定タイプのリソースを論理IDと一緒に列挙
    pub fn find_resources(&self, resource_type: &str) -> Vec<(&str, &Value)> {
        self.json["Resources"]
            .as_object()
            .map(|resources| {
                resources
                    .iter()
                    .filter(|(_, r)| r["Type"] == resource_type)
                    .map(|(id, r)| (id.as_str(), r))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn resource_count(&self, resource_type: &str) -> usize {
        self.find_resources(resource_type).len()
    }
}
