//! settle-core
//!
//! Building blocks for declarative resource lifecycles against eventually
//! consistent remote APIs.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, wait_spec, outcome, tags）
//! - **app**: 待機ロジック（backoff, waiter）
//! - **ports**: 抽象化レイヤー（Describe, NetworkFirewallApi, OamApi）
//! - **resources**: リソース実装（TLS inspection configuration, sink policy）
//! - **impls**: 実装（InMemoryNetworkFirewall などテスト・開発用）
//! - **config**: プロバイダ設定ファイル
//! - **error**: エラー型の再エクスポート

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod resources;

pub use app::{PollBackoff, await_status};
pub use domain::{PollOutcome, ResourceId, StatusSet, WaitSpec};
pub use error::{SpecError, WaitError};
