//! 로그인 무차별 대입 방지 정책.
//!
//! 사용자 레코드의 잠금 상태만 다루는 순수 결정 로직입니다.
//! 저장은 호출자가 담당하며, 결정 값이 저장 필요 여부를 알려줍니다.
//!
//! # 상태 전이
//!
//! ```text
//! Unlocked --record_failure (count < max)--> Unlocked (+1 attempt)
//! Unlocked --record_failure (count == max)--> Blocked
//! Blocked  --attempt_unblock (elapsed >= block_hours)--> Unlocked (history cleared)
//! Blocked  --attempt_unblock (elapsed < block_hours)--> Blocked
//! ```

use chrono::{DateTime, Utc};

use super::user::User;

/// 잠금 해제 시도 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnblockDecision {
    StillBlocked,
    Unblocked,
}

/// 실패 기록 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    AttemptRecorded,
    NowBlocked,
}

/// 잠금 정책 파라미터.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockoutPolicy {
    max_attempts: usize,
    block_hours: f64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            block_hours: Self::DEFAULT_BLOCK_HOURS,
        }
    }
}

impl LockoutPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: usize = 5;
    pub const DEFAULT_BLOCK_HOURS: f64 = 24.0;

    /// `max_attempts`는 최소 1로 보정됩니다.
    pub fn new(max_attempts: usize, block_hours: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            block_hours,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn block_hours(&self) -> f64 {
        self.block_hours
    }

    pub fn is_currently_blocked(user: &User) -> bool {
        user.blocked
    }

    /// 마지막 실패 이후 경과 시간(시간 단위). 실패 이력이 없으면 `None`.
    pub fn hours_since_last_failure(user: &User, now: DateTime<Utc>) -> Option<f64> {
        user.last_failed_attempt()
            .map(|last| (now - last).num_milliseconds() as f64 / 3_600_000.0)
    }

    /// 잠금 시간이 지났으면 이력을 비우고 잠금을 해제합니다.
    ///
    /// 잠겨 있지 않은 사용자는 변경하지 않고 `Unblocked`를 반환합니다.
    /// 잠겨 있는데 이력이 비어 있으면(불변식 위반 레코드) 해제합니다.
    pub fn attempt_unblock(&self, user: &mut User, now: DateTime<Utc>) -> UnblockDecision {
        if !user.blocked {
            return UnblockDecision::Unblocked;
        }

        let elapsed = Self::hours_since_last_failure(user, now);
        match elapsed {
            Some(hours) if hours < self.block_hours => UnblockDecision::StillBlocked,
            _ => {
                user.failed_attempts.clear();
                user.blocked = false;
                UnblockDecision::Unblocked
            }
        }
    }

    /// 실패 시각을 추가하고, 누적 횟수가 한도에 도달하면 잠급니다.
    pub fn record_failure(&self, user: &mut User, now: DateTime<Utc>) -> FailureDecision {
        user.failed_attempts.push(now);

        if user.failed_attempts.len() >= self.max_attempts {
            user.blocked = true;
            FailureDecision::NowBlocked
        } else {
            FailureDecision::AttemptRecorded
        }
    }

    /// 로그인 성공 시 실패 이력을 비웁니다. 변경이 있었으면 `true`.
    pub fn clear_failures(user: &mut User) -> bool {
        let changed = !user.failed_attempts.is_empty() || user.blocked;
        user.failed_attempts.clear();
        user.blocked = false;
        changed
    }

    /// 잠금 해제까지 남은 시간(시간 단위). 잠겨 있지 않으면 `None`.
    pub fn remaining_block_hours(&self, user: &User, now: DateTime<Utc>) -> Option<f64> {
        if !user.blocked {
            return None;
        }
        let elapsed = Self::hours_since_last_failure(user, now).unwrap_or(self.block_hours);
        Some((self.block_hours - elapsed).max(0.0))
    }
}
