/// Hello Lambda関数
///
/// HitCounterの下流関数。呼び出されたパスをプレーンテキストで返す。
use hitcounter::application::HelloHandler;
use hitcounter::infrastructure::init_logging;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    Ok(HelloHandler::new().handle(&event.payload))
}
