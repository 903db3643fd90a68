//! App - 待機ロジック
//!
//! # 主要コンポーネント
//! - **PollBackoff**: ポーリング間隔の決定（指数バックオフ + 上限）
//! - **await_status**: 結果整合性を吸収する待機ループ（create/update/delete 共通）

pub mod backoff;
pub mod waiter;

pub use self::backoff::PollBackoff;
pub use self::waiter::await_status;
