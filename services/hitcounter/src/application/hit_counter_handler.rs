/// ヒット数カウンターハンドラー
///
/// リクエストパスのヒット数を加算してから下流関数を呼び出し、
/// 下流関数のレスポンスをそのまま返す。
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::infrastructure::{DownstreamInvoker, HitRepository, InvokeError, RepositoryError};

/// ハンドラーのエラー型
///
/// ストア・下流関数のエラーは変換せずにそのまま保持する。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HitCounterHandlerError {
    /// イベントに文字列の`path`が無い
    #[error("Missing path in event")]
    MissingPath,

    /// ヒット数の加算に失敗
    #[error(transparent)]
    Store(#[from] RepositoryError),

    /// 下流関数の呼び出しに失敗
    #[error(transparent)]
    Downstream(#[from] InvokeError),
}

/// 下流関数の前段でヒット数を数えるハンドラー
///
/// 状態はすべてリポジトリ側にあり、ハンドラー自体は共有可変状態を持たない。
pub struct HitCounterHandler<HR, DI>
where
    HR: HitRepository,
    DI: DownstreamInvoker,
{
    hit_repo: HR,
    downstream: DI,
}

impl<HR, DI> HitCounterHandler<HR, DI>
where
    HR: HitRepository,
    DI: DownstreamInvoker,
{
    pub fn new(hit_repo: HR, downstream: DI) -> Self {
        Self {
            hit_repo,
            downstream,
        }
    }

    /// リクエストを処理
    ///
    /// # 処理フロー
    /// 1. イベントをログ出力
    /// 2. `path`のヒット数を原子的に加算（存在しなければ1で作成）
    /// 3. 元のイベントをそのまま下流関数に渡す
    /// 4. 下流関数のレスポンスを変更せずに返す
    ///
    /// 加算に失敗した場合は下流関数を呼び出さずにエラーを返す。
    pub async fn handle(&self, event: &Value) -> Result<Value, HitCounterHandlerError> {
        info!(
            event = %serde_json::to_string_pretty(event).unwrap_or_default(),
            "request"
        );

        let path = event
            .get("path")
            .and_then(|v| v.as_str())
            .ok_or(HitCounterHandlerError::MissingPath)?;

        let hit_count = self.hit_repo.increment(path).await?;
        info!(path = path, hit_count = hit_count, "ヒット数を加算");

        let response = self.downstream.invoke(event).await?;

        Ok(response)
    }
}
