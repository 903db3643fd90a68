//! Ports - 抽象化レイヤー
//!
//! 各 trait はリモート API（AWS NetworkFirewall, OAM など）への
//! インターフェースを提供し、トランスポートや認証の詳細を隠蔽します。
//!
//! # 設計原則
//! - Describe 系の呼び出しは読み取り専用で、何度呼んでも安全
//! - 変更系（create/update/delete）は 1 回だけ呼ばれ、その後は waiter が観測する

pub mod describe;
pub mod network_firewall;
pub mod oam;

pub use self::describe::{Describe, wait_for};
pub use self::network_firewall::{ApiError, NetworkFirewallApi};
pub use self::oam::OamApi;
