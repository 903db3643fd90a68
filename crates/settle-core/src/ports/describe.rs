//! Describe port - ステータス取得の抽象化
//!
//! リソースごとの describe 呼び出しを waiter に接続するための trait です。

use std::fmt;

use async_trait::async_trait;

use crate::app::await_status;
use crate::domain::{PollOutcome, ResourceId, WaitSpec};
use crate::error::WaitError;

/// Describe は ID からスナップショットとステータスを取得する
///
/// # 契約
/// - 読み取り専用（副作用なし）
/// - 「見つからない」は `PollOutcome::NotFound`、それ以外の失敗は `PollOutcome::Error`
#[async_trait]
pub trait Describe: Send + Sync {
    type Snapshot: fmt::Debug + Send;
    type Status: PartialEq + Clone + fmt::Debug + Send + Sync;
    type Error: std::error::Error + Send + 'static;

    async fn describe(
        &self,
        id: &ResourceId,
    ) -> PollOutcome<Self::Snapshot, Self::Status, Self::Error>;
}

/// Wait for `id` as described by `source` to satisfy `spec`.
pub async fn wait_for<D>(
    source: &D,
    id: &ResourceId,
    spec: &WaitSpec<D::Status>,
) -> Result<Option<D::Snapshot>, WaitError<D::Snapshot, D::Status, D::Error>>
where
    D: Describe + ?Sized,
{
    await_status(spec, || source.describe(id)).await
}
