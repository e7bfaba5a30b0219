/// HitCounter Lambda関数
///
/// リクエストパスのヒット数をDynamoDBで加算し、下流のLambda関数へ
/// イベントをそのまま転送する。下流のレスポンスは変更せずに返す。
///
/// # 環境変数
/// - HITS_TABLE_NAME: ヒット数テーブル名（必須）
/// - DOWNSTREAM_FUNCTION_NAME: 下流関数名（必須）
///
/// 加算・下流呼び出しのどちらかが失敗した場合は、呼び出し元へエラーを返す。
use hitcounter::application::HitCounterHandler;
use hitcounter::infrastructure::{
    init_logging, AwsLambdaInvoker, DynamoHitRepository, HitCounterConfig,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

type Handler = HitCounterHandler<DynamoHitRepository, AwsLambdaInvoker>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    // 設定はコンテナ起動時に一度だけ読み込む
    let config = HitCounterConfig::from_env().await.map_err(|err| {
        error!(error = %err, "HitCounter設定読み込み失敗");
        err
    })?;

    info!(
        hits_table = config.hits_table(),
        downstream_function = config.downstream_function(),
        "HitCounter Lambda関数を初期化"
    );

    let handler = HitCounterHandler::new(
        DynamoHitRepository::new(
            config.dynamodb_client().clone(),
            config.hits_table().to_string(),
        ),
        AwsLambdaInvoker::new(
            config.lambda_client().clone(),
            config.downstream_function().to_string(),
        ),
    );

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        handle_request(&handler, event)
    }))
    .await
}

/// 1回の呼び出しを処理する
async fn handle_request(handler: &Handler, event: LambdaEvent<Value>) -> Result<Value, Error> {
    let request_id = event.context.request_id.clone();

    match handler.handle(&event.payload).await {
        Ok(response) => Ok(response),
        Err(err) => {
            error!(
                request_id = %request_id,
                error = %err,
                "HitCounter処理失敗"
            );
            Err(err.into())
        }
    }
}
