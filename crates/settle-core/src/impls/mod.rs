//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryNetworkFirewall**: 結果整合性を模した NetworkFirewallApi
//! - **InMemoryOam**: ポリシー反映の遅延を模した OamApi
//!
//! どちらも [`Lag`] で「見えるまで」「落ち着くまで」の読み取り回数を指定できます。

pub mod inmem_firewall;
pub mod inmem_oam;

use chrono::Utc;
use ulid::Ulid;

pub use self::inmem_firewall::InMemoryNetworkFirewall;
pub use self::inmem_oam::InMemoryOam;

/// How many reads a fake takes to reflect a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lag {
    /// Reads that report a freshly created object as absent.
    pub invisible_reads: u32,
    /// Reads that report the transitional status before it settles.
    pub transition_reads: u32,
}

impl Lag {
    /// Changes are visible and settled on the first read.
    pub const fn none() -> Self {
        Self {
            invisible_reads: 0,
            transition_reads: 0,
        }
    }
}

pub(crate) const ACCOUNT_ID: &str = "123456789012";

/// Lowercase ULID from the wall clock and `rand`.
pub(crate) fn fresh_id() -> String {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    Ulid::from_parts(millis, rand::random::<u128>())
        .to_string()
        .to_lowercase()
}
