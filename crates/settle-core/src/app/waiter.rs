//! Eventual-consistency waiter.
//!
//! One parameterized loop serves creation, update and deletion waits; call
//! sites differ only in the [`WaitSpec`] they pass.
//!
//! # ループ
//! 1. poll（残り時間で上限を設ける）
//! 2. NotFound → not_found カウント。許容回数を超えたら
//!    target が空なら成功、そうでなければ `NotFoundExhausted`
//! 3. Error → 即座に `PollFailed`（リトライしない）
//! 4. Found → target なら streak を加算、`min_target_streak` に達したら成功。
//!    それ以外（pending でも未知のステータスでも）は streak をリセットして継続
//! 5. バックオフ分スリープ（前後でタイムアウトを確認）
//!
//! 呼び出しごとにカウンタを持つので、同じ ID を複数の待機が同時に
//! ポーリングしても干渉しない。

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::domain::{PollOutcome, WaitSpec};
use crate::error::WaitError;

/// Per-invocation bookkeeping.
struct Progress<T, S> {
    started: Instant,
    polls: u32,
    not_found_count: u32,
    target_streak: u32,
    last_status: Option<S>,
    last_snapshot: Option<T>,
}

impl<T, S> Progress<T, S> {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            polls: 0,
            not_found_count: 0,
            target_streak: 0,
            last_status: None,
            last_snapshot: None,
        }
    }

    /// Time left before `timeout`, or `None` once it has been reached.
    fn remaining(&self, timeout: Duration) -> Option<Duration> {
        timeout
            .checked_sub(self.started.elapsed())
            .filter(|left| !left.is_zero())
    }
}

/// Poll until the remote object reaches one of `spec.target()` statuses.
///
/// Returns the snapshot of the final matching poll. When the target set is
/// empty, success means the object disappeared; the result is then the last
/// snapshot seen before it vanished (`None` if it was never seen).
///
/// `poll_once` must be read-only and safe to call repeatedly.
///
/// # Errors
/// - `PollFailed` as soon as a poll returns an error
/// - `NotFoundExhausted` when the object stays absent past the tolerance
///   while a non-empty target is expected
/// - `TimedOut` when `spec.timeout()` elapses first
pub async fn await_status<T, S, E, F, Fut>(
    spec: &WaitSpec<S>,
    mut poll_once: F,
) -> Result<Option<T>, WaitError<T, S, E>>
where
    T: fmt::Debug,
    S: PartialEq + Clone + fmt::Debug,
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = PollOutcome<T, S, E>>,
{
    let mut progress = Progress::new();

    loop {
        let Some(remaining) = progress.remaining(spec.timeout()) else {
            return Err(timed_out(spec, progress));
        };

        progress.polls += 1;
        let outcome = match tokio::time::timeout(remaining, poll_once()).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(timed_out(spec, progress)),
        };

        match outcome {
            PollOutcome::Error(source) => return Err(WaitError::PollFailed { source }),
            PollOutcome::NotFound => {
                progress.not_found_count += 1;
                progress.target_streak = 0;
                if progress.not_found_count > spec.not_found_tolerance() {
                    if spec.expects_disappearance() {
                        return Ok(progress.last_snapshot);
                    }
                    return Err(WaitError::NotFoundExhausted {
                        checks: progress.not_found_count,
                    });
                }
            }
            PollOutcome::Found { snapshot, status } => {
                progress.not_found_count = 0;
                if spec.target().contains(&status) {
                    progress.target_streak += 1;
                    if progress.target_streak >= spec.min_target_streak() {
                        return Ok(Some(snapshot));
                    }
                } else {
                    // Pending, or a status the caller didn't list: keep waiting.
                    progress.target_streak = 0;
                }
                progress.last_status = Some(status);
                progress.last_snapshot = Some(snapshot);
            }
        }

        let Some(remaining) = progress.remaining(spec.timeout()) else {
            return Err(timed_out(spec, progress));
        };
        let delay = spec.backoff().next_delay(progress.polls).min(remaining);
        tokio::time::sleep(delay).await;
    }
}

fn timed_out<T, S, E>(spec: &WaitSpec<S>, progress: Progress<T, S>) -> WaitError<T, S, E>
where
    T: fmt::Debug,
    S: PartialEq + Clone + fmt::Debug,
    E: std::error::Error + 'static,
{
    WaitError::TimedOut {
        timeout: spec.timeout(),
        expected: spec.target().to_vec(),
        last_status: progress.last_status,
        last_snapshot: progress.last_snapshot,
    }
}
