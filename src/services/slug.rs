//! Short slug generation with bounded collision retries.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};
use xxhash_rust::xxh64::xxh64;

use crate::config::SlugConfig;
use crate::errors::{LinkTrackerError, Result};
use crate::utils::push_base62;

/// 一个 u64 最多提供的 base62 位数（62^10 < 2^64）
const DIGITS_PER_ROUND: usize = 10;

/// 最长 slug（与 tracked_links.slug 列宽一致）
pub const MAX_SLUG_LEN: usize = 64;

/// Produces one candidate of the requested length.
pub type CandidateSource = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// Outcome of one attempt to persist a candidate slug.
#[derive(Debug)]
pub enum SlugClaim<T> {
    Claimed(T),
    Taken,
}

/// 随机 64 位种子经 xxh64 打散后以 base62 输出
pub fn random_candidate(length: usize) -> String {
    let seed: u64 = rand::random();
    let mut out = String::with_capacity(length);
    let mut round = 0u64;
    while out.len() < length {
        let digits = (length - out.len()).min(DIGITS_PER_ROUND);
        push_base62(xxh64(&seed.to_le_bytes(), round), &mut out, digits);
        round += 1;
    }
    out
}

/// 合法 slug：1..=64 个 `[A-Za-z0-9_-]` 字符
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

#[derive(Clone)]
pub struct SlugGenerator {
    length: usize,
    max_attempts: u32,
    source: CandidateSource,
}

impl std::fmt::Debug for SlugGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlugGenerator")
            .field("length", &self.length)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for SlugGenerator {
    fn default() -> Self {
        Self::from_config(&SlugConfig::default())
    }
}

impl SlugGenerator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length: length.clamp(1, MAX_SLUG_LEN),
            max_attempts: max_attempts.max(1),
            source: Arc::new(random_candidate),
        }
    }

    pub fn from_config(config: &SlugConfig) -> Self {
        Self::new(config.length, config.max_attempts)
    }

    /// Replace the candidate source (deterministic sequences in tests).
    pub fn with_source(mut self, source: CandidateSource) -> Self {
        self.source = source;
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn candidate(&self) -> String {
        (self.source)(self.length)
    }

    /// Draw candidates until `is_unique` accepts one.
    ///
    /// Check-then-use: callers that persist the slug afterwards still need
    /// the store's unique index. See [`SlugGenerator::claim`].
    pub fn generate<F>(&self, mut is_unique: F) -> Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.candidate();
            if is_unique(&candidate) {
                return Ok(candidate);
            }
            debug!("Slug candidate '{}' collided (attempt {})", candidate, attempt);
        }
        Err(self.exhausted())
    }

    /// Draw candidates until `try_claim` persists one.
    ///
    /// `try_claim` reports `Taken` when the store rejected the candidate;
    /// any other error aborts the loop immediately.
    pub async fn claim<T, F, Fut>(&self, mut try_claim: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<SlugClaim<T>>>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.candidate();
            match try_claim(candidate).await? {
                SlugClaim::Claimed(value) => {
                    if attempt > 1 {
                        debug!("Slug claimed after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                SlugClaim::Taken => continue,
            }
        }
        Err(self.exhausted())
    }

    fn exhausted(&self) -> LinkTrackerError {
        warn!(
            "Slug generation exhausted after {} attempts (length {})",
            self.max_attempts, self.length
        );
        LinkTrackerError::slug_exhausted(format!(
            "No unique slug of length {} found after {} attempts",
            self.length, self.max_attempts
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn sequence(items: &[&str]) -> CandidateSource {
        let queue = Mutex::new(items.iter().map(|s| s.to_string()).collect::<VecDeque<_>>());
        Arc::new(move |_| queue.lock().unwrap().pop_front().unwrap_or_default())
    }

    #[test]
    fn test_random_candidate_shape() {
        for len in [1, 6, 10, 11, 32, 64] {
            let slug = random_candidate(len);
            assert_eq!(slug.len(), len);
            assert!(is_valid_slug(&slug));
        }
    }

    #[test]
    fn test_random_candidates_differ() {
        let a = random_candidate(12);
        let b = random_candidate(12);
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_retries_on_collision() {
        let generator = SlugGenerator::new(6, 100).with_source(sequence(&["aaaaaa", "bbbbbb"]));
        let taken = ["aaaaaa"];
        let slug = generator.generate(|s| !taken.contains(&s)).unwrap();
        assert_eq!(slug, "bbbbbb");
    }

    #[test]
    fn test_generate_exhausts() {
        let generator = SlugGenerator::new(6, 3);
        let mut calls = 0;
        let result = generator.generate(|_| {
            calls += 1;
            false
        });
        assert!(matches!(result, Err(LinkTrackerError::SlugExhausted(_))));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_claim_skips_taken_candidates() {
        let generator =
            SlugGenerator::new(6, 5).with_source(sequence(&["taken1", "taken2", "free01"]));
        let claimed = generator
            .claim(|slug| async move {
                if slug.starts_with("taken") {
                    Ok(SlugClaim::Taken)
                } else {
                    Ok(SlugClaim::Claimed(slug))
                }
            })
            .await
            .unwrap();
        assert_eq!(claimed, "free01");
    }

    #[tokio::test]
    async fn test_claim_propagates_store_errors() {
        let generator = SlugGenerator::new(6, 5);
        let result: Result<()> = generator
            .claim(|_| async { Err(LinkTrackerError::database_operation("disk full")) })
            .await;
        assert!(matches!(result, Err(LinkTrackerError::DatabaseOperation(_))));
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("aB3_-z"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug(&"x".repeat(65)));
    }
}
