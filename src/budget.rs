//! Token estimation and flush budgeting
//!
//! Two ceilings bound an artifact: a token limit checked against an
//! estimate of each record's serialized form, and a byte limit checked
//! against the actual accumulated serialized size. The checks are
//! independent; either can force a flush at the same record boundary.
//!
//! The budgeter never drops data. A record whose own size or token
//! estimate already exceeds a limit is still emitted, alone, as its own
//! artifact.

use crate::batch::Batch;

/// Token estimator using character-based heuristic
pub struct TokenEstimator {
    /// Characters per token (default: 4.0 for English)
    chars_per_token: f32,
}

impl TokenEstimator {
    /// Create a new estimator with default settings
    pub fn new() -> Self {
        Self {
            chars_per_token: 4.0,
        }
    }

    /// Create a new estimator with custom chars_per_token
    pub fn with_chars_per_token(chars_per_token: f32) -> Self {
        Self { chars_per_token }
    }

    /// Estimate token count for given text
    ///
    /// Uses simple character count / chars_per_token heuristic.
    /// Fast but approximate - not a replacement for actual tokenization.
    pub fn estimate(&self, text: &str) -> u32 {
        let char_count = text.chars().count();
        (char_count as f32 / self.chars_per_token).ceil() as u32
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// A candidate record's token cost relative to the configured limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCost {
    /// Fits under the limit on its own
    Within(u32),
    /// Exceeds the limit on its own; still emitted, isolated in its own batch
    ExceedsAlone(u32),
}

impl TokenCost {
    pub fn tokens(&self) -> u32 {
        match *self {
            TokenCost::Within(n) | TokenCost::ExceedsAlone(n) => n,
        }
    }
}

/// Flush decision for one candidate record
#[derive(Debug, Clone, Copy)]
pub struct BudgetPlan {
    /// Flush the current batch before appending (token ceiling would be hit)
    pub flush_before: bool,
    /// The candidate's estimated token cost
    pub token_cost: TokenCost,
}

/// Decides when the in-progress batch must be flushed
pub struct Budgeter {
    byte_limit: Option<usize>,
    token_limit: Option<u32>,
    estimator: TokenEstimator,
}

impl Budgeter {
    /// Create a budgeter; `None` for either limit means unbounded
    pub fn new(byte_limit: Option<usize>, token_limit: Option<u32>) -> Self {
        Self {
            byte_limit,
            token_limit,
            estimator: TokenEstimator::new(),
        }
    }

    pub fn with_estimator(mut self, estimator: TokenEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Assess a candidate's serialized form against the token ceiling
    ///
    /// `flush_before` is set when adding the candidate's cost to the batch's
    /// running estimate would exceed the limit. After such a forced split
    /// the new batch opens with an estimate of half the candidate's own
    /// cost (see [`opening_estimate_after_split`](Self::opening_estimate_after_split)),
    /// a smoothing heuristic that avoids systematically under- or
    /// over-counting right after the boundary. The candidate itself is
    /// always appended, whether or not it fits alone.
    pub fn plan(&self, batch: &Batch, serialized: &str) -> BudgetPlan {
        let estimate = self.estimator.estimate(serialized);
        let token_cost = match self.token_limit {
            Some(limit) if estimate > limit => TokenCost::ExceedsAlone(estimate),
            _ => TokenCost::Within(estimate),
        };
        let flush_before = match self.token_limit {
            Some(limit) => batch.token_estimate().saturating_add(estimate) > limit,
            None => false,
        };
        BudgetPlan {
            flush_before,
            token_cost,
        }
    }

    /// Opening token estimate of the batch started by a forced split
    pub fn opening_estimate_after_split(plan: &BudgetPlan) -> u32 {
        plan.token_cost.tokens() / 2
    }

    /// Would appending `incoming_bytes` push the batch past the byte ceiling?
    ///
    /// Used before an append so no multi-record batch is ever flushed above
    /// the limit.
    pub fn byte_flush_before(&self, batch: &Batch, incoming_bytes: usize) -> bool {
        match self.byte_limit {
            Some(limit) => batch.byte_size() + incoming_bytes > limit,
            None => false,
        }
    }

    /// Is the batch already past the byte ceiling?
    ///
    /// After an append this can only be true for a single record that
    /// exceeds the limit on its own; it is then flushed immediately,
    /// isolated.
    pub fn over_byte_limit(&self, batch: &Batch) -> bool {
        match self.byte_limit {
            Some(limit) => batch.byte_size() > limit,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_estimation() {
        let estimator = TokenEstimator::new();

        // Empty string
        assert_eq!(estimator.estimate(""), 0);

        // Simple text (15 chars / 4 = 3.75 -> ceil = 4 tokens)
        assert_eq!(estimator.estimate("This is a test."), 4);

        // Longer text (40 chars / 4 = 10 tokens)
        assert_eq!(
            estimator.estimate("The quick brown fox jumps over the lazy"),
            10
        );
    }

    #[test]
    fn test_ceiling_behavior() {
        let estimator = TokenEstimator::new();
        assert_eq!(estimator.estimate("1"), 1); // 1 char / 4 = 0.25 -> ceil = 1
        assert_eq!(estimator.estimate("1234"), 1); // 4 chars / 4 = 1.0 -> 1
        assert_eq!(estimator.estimate("12345"), 2); // 5 chars / 4 = 1.25 -> 2
    }

    #[test]
    fn test_custom_chars_per_token() {
        let estimator = TokenEstimator::with_chars_per_token(3.0);
        assert_eq!(estimator.estimate("123"), 1);
        assert_eq!(estimator.estimate("1234"), 2);
    }

    #[test]
    fn test_unicode_characters_count_as_chars() {
        let estimator = TokenEstimator::new();
        assert_eq!(estimator.estimate("café"), 1); // 4 chars
        assert_eq!(estimator.estimate("Hello 世界"), 2); // 8 chars
    }

    #[test]
    fn test_no_limits_never_flush() {
        let budgeter = Budgeter::new(None, None);
        let mut batch = Batch::new();
        batch.add_token_estimate(u32::MAX / 2);

        let plan = budgeter.plan(&batch, &"x".repeat(10_000));
        assert!(!plan.flush_before);
        assert!(!budgeter.byte_flush_before(&batch, usize::MAX / 2));
    }

    #[test]
    fn test_token_ceiling_triggers_flush_before() {
        // Limit 10 tokens; batch already carries 8
        let budgeter = Budgeter::new(None, Some(10));
        let mut batch = Batch::new();
        batch.add_token_estimate(8);

        // 12 chars -> 3 tokens, 8 + 3 > 10
        let plan = budgeter.plan(&batch, "abcdefghijkl");
        assert!(plan.flush_before);
        assert_eq!(plan.token_cost, TokenCost::Within(3));
        assert_eq!(Budgeter::opening_estimate_after_split(&plan), 1);
    }

    #[test]
    fn test_record_over_token_limit_is_sentinel_not_drop() {
        let budgeter = Budgeter::new(None, Some(5));
        let batch = Batch::new();

        // 40 chars -> 10 tokens, above the limit on its own
        let plan = budgeter.plan(&batch, &"y".repeat(40));
        assert!(plan.flush_before);
        assert_eq!(plan.token_cost, TokenCost::ExceedsAlone(10));
        // Half-of-own-count opening estimate still applies
        assert_eq!(Budgeter::opening_estimate_after_split(&plan), 5);
    }

    #[test]
    fn test_byte_ceiling_checks() {
        let budgeter = Budgeter::new(Some(100), None);
        let mut batch = Batch::new();
        batch.push(
            serde_json::from_value(serde_json::json!({
                "title": "t", "url": "u", "content": "c"
            }))
            .unwrap(),
            60,
        );

        assert!(!budgeter.byte_flush_before(&batch, 40)); // exactly at limit
        assert!(budgeter.byte_flush_before(&batch, 41));
        assert!(!budgeter.over_byte_limit(&batch));
    }

    proptest! {
        #[test]
        fn prop_estimate_matches_default_formula(chars in prop::collection::vec(any::<char>(), 0..256)) {
            let text: String = chars.into_iter().collect();
            let estimator = TokenEstimator::new();

            let expected = (text.chars().count() as f32 / 4.0).ceil() as u32;
            prop_assert_eq!(estimator.estimate(&text), expected);
        }

        #[test]
        fn prop_estimate_is_monotonic_under_appending(
            lhs in prop::collection::vec(any::<char>(), 0..128),
            rhs in prop::collection::vec(any::<char>(), 0..128),
        ) {
            let lhs: String = lhs.into_iter().collect();
            let rhs: String = rhs.into_iter().collect();
            let combined = format!("{lhs}{rhs}");

            let estimator = TokenEstimator::new();
            let lhs_tokens = estimator.estimate(&lhs);
            let combined_tokens = estimator.estimate(&combined);

            prop_assert!(
                combined_tokens >= lhs_tokens,
                "Appending content must not reduce estimated token count"
            );
        }

        #[test]
        fn prop_opening_estimate_is_half_the_candidate(cost in 0u32..1_000_000) {
            let plan = BudgetPlan {
                flush_before: true,
                token_cost: TokenCost::Within(cost),
            };
            prop_assert_eq!(Budgeter::opening_estimate_after_split(&plan), cost / 2);
        }
    }
}
