// ドメイン層モジュール
pub mod hit_counter;
pub mod resource;
pub mod stack;

// 再エクスポート
pub use hit_counter::{
    HitCounter, HitCounterError, HitCounterProps, ReadCapacity, ENV_DOWNSTREAM_FUNCTION_NAME,
    ENV_HITS_TABLE_NAME, HITS_PARTITION_KEY, HIT_COUNT_ATTRIBUTE,
};
pub use resource::{
    Capability, FunctionProps, Grant, Resource, ResourceRef, TableResource,
    FUNCTION_RESOURCE_TYPE, POLICY_RESOURCE_TYPE, ROLE_RESOURCE_TYPE, TABLE_RESOURCE_TYPE,
};
pub use stack::{Stack, StackError, Template};
