// アプリケーション層モジュール
pub mod hello_handler;
pub mod hit_counter_handler;

// 再エクスポート
pub use hello_handler::HelloHandler;
pub use hit_counter_handler::{HitCounterHandler, HitCounterHandlerError};
