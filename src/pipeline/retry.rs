//! 重试策略
//!
//! 指数退避带上限；实际等待在确定性间隔上叠加随机抖动，
//! 避免多个提交同时打到刚恢复的外部服务。

use std::time::Duration;

use rand::Rng;

/// 某一阶段的重试参数
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64, backoff_cap_ms: u64) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            backoff_cap_ms,
        }
    }

    /// 第 attempt 次失败后的确定性退避间隔（base * 2^attempt，封顶）
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self
            .backoff_base_ms
            .saturating_mul(multiplier)
            .min(self.backoff_cap_ms);
        Duration::from_millis(ms)
    }

    /// 加抖动的退避间隔（最多再加 50%）
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.backoff_delay(attempt);
        let jitter_ms = rand::rng().random_range(0..=base.as_millis() as u64 / 2);
        base + Duration::from_millis(jitter_ms)
    }

    /// 已用尝试数是否耗尽重试预算
    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts > self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_monotone_and_capped() {
        let policy = RetryPolicy::new(5, 100, 3000);
        let mut prev = Duration::ZERO;
        for attempt in 0..10 {
            let delay = policy.backoff_delay(attempt);
            assert!(delay >= prev, "attempt {attempt} 退避应不递减");
            assert!(delay <= Duration::from_millis(3000));
            prev = delay;
        }
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(10), Duration::from_millis(3000));
    }

    #[test]
    fn test_backoff_survives_huge_attempt() {
        let policy = RetryPolicy::new(3, 100, 5000);
        assert_eq!(policy.backoff_delay(200), Duration::from_millis(5000));
    }

    #[test]
    fn test_jittered_within_bounds() {
        let policy = RetryPolicy::new(3, 100, 3000);
        for _ in 0..20 {
            let delay = policy.jittered_delay(2);
            assert!(delay >= Duration::from_millis(400));
            assert!(delay <= Duration::from_millis(600));
        }
    }

    #[test]
    fn test_exhausted() {
        let policy = RetryPolicy::new(3, 100, 3000);
        assert!(!policy.exhausted(3));
        assert!(policy.exhausted(4));
    }
}
