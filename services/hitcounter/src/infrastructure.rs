// インフラストラクチャ層モジュール
pub mod config;
pub mod downstream_invoker;
pub mod hit_repository;
pub mod logging;

// 再エクスポート
pub use config::{HitCounterConfig, HitCounterConfigError};
pub use downstream_invoker::{AwsLambdaInvoker, DownstreamInvoker, InvokeError};
pub use hit_repository::{DynamoHitRepository, HitRepository, RepositoryError};
pub use logging::init_logging;
