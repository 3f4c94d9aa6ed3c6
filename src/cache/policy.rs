//! Window policy - Which positions to prefetch and which to release
//!
//! The policy is pure index arithmetic. It produces a [`WindowPlan`] that the
//! cache applies to its entries; it never touches entries itself.

use serde::{Deserialize, Serialize};

use super::error::{CacheError, Result};

/// Direction of travel through the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Window tunables. `Default` is the reference policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowPolicy {
    /// Distance behind the current index released after a forward step
    pub behind_on_forward: usize,

    /// Distance ahead of the current index released after a backward step.
    /// Larger than `behind_on_forward`: readers who go back tend to come forward again.
    pub behind_on_backward: usize,

    /// Prefetch distance in the direction of travel on a single step
    pub in_direction_count: usize,

    /// Prefetch ahead after a forward jump
    pub forward_on_jump_ahead: usize,

    /// Prefetch behind after a forward jump
    pub backward_on_jump_ahead: usize,

    /// Prefetch ahead after a backward jump
    pub forward_on_jump_behind: usize,

    /// Prefetch behind after a backward jump
    pub backward_on_jump_behind: usize,

    /// Positions started eagerly when the cache is constructed
    pub warm_start: usize,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            behind_on_forward: 5,
            behind_on_backward: 10,
            in_direction_count: 5,
            forward_on_jump_ahead: 5,
            backward_on_jump_ahead: 3,
            forward_on_jump_behind: 3,
            backward_on_jump_behind: 5,
            warm_start: 3,
        }
    }
}

/// Positions to start and positions to invalidate, in issue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowPlan {
    pub start: Vec<usize>,
    pub invalidate: Vec<usize>,
}

/// Upper bound for every window distance
pub const MAX_SPAN: usize = 1 << 16;

impl WindowPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.warm_start == 0 {
            return Err(CacheError::InvalidPolicy(
                "warm_start must be at least 1".to_string(),
            ));
        }
        if self.behind_on_forward == 0 && self.behind_on_backward == 0 {
            return Err(CacheError::InvalidPolicy(
                "behind_on_forward and behind_on_backward cannot both be 0".to_string(),
            ));
        }
        for (name, value) in self.spans() {
            if value > MAX_SPAN {
                return Err(CacheError::InvalidPolicy(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_SPAN, value
                )));
            }
        }
        Ok(())
    }

    fn spans(&self) -> [(&'static str, usize); 8] {
        [
            ("behind_on_forward", self.behind_on_forward),
            ("behind_on_backward", self.behind_on_backward),
            ("in_direction_count", self.in_direction_count),
            ("forward_on_jump_ahead", self.forward_on_jump_ahead),
            ("backward_on_jump_ahead", self.backward_on_jump_ahead),
            ("forward_on_jump_behind", self.forward_on_jump_behind),
            ("backward_on_jump_behind", self.backward_on_jump_behind),
            ("warm_start", self.warm_start),
        ]
    }

    /// Positions started on construction
    pub fn warm_start_positions(&self, len: usize) -> std::ops::Range<usize> {
        0..self.warm_start.min(len)
    }

    /// Plan for a single step that just moved to `index`.
    pub fn plan_step(&self, index: usize, direction: Direction, len: usize) -> WindowPlan {
        match direction {
            Direction::Forward => WindowPlan {
                start: span_forward(index, self.in_direction_count, len),
                invalidate: index
                    .checked_sub(self.behind_on_forward.saturating_add(1))
                    .filter(|&i| i < len)
                    .into_iter()
                    .collect(),
            },
            Direction::Backward => WindowPlan {
                start: span_backward(index, self.in_direction_count, len),
                invalidate: index
                    .checked_add(1)
                    .and_then(|i| i.checked_add(self.behind_on_backward))
                    .filter(|&i| i < len)
                    .into_iter()
                    .collect(),
            },
        }
    }

    /// Plan for a jump from `previous` to `target`. The target itself is
    /// expected to be started by the caller before the plan is applied.
    pub fn plan_jump(&self, previous: usize, target: usize, len: usize) -> WindowPlan {
        let (forward, backward, start) = if target > previous {
            let (f, b) = (self.forward_on_jump_ahead, self.backward_on_jump_ahead);
            (f, b, merge(span_forward(target, f, len), span_backward(target, b, len)))
        } else {
            let (f, b) = (self.forward_on_jump_behind, self.backward_on_jump_behind);
            (f, b, merge(span_backward(target, b, len), span_forward(target, f, len)))
        };

        let keep = target.saturating_sub(backward)..=target.saturating_add(forward);
        let band = previous.saturating_sub(self.behind_on_forward)
            ..previous.saturating_add(self.behind_on_backward).min(len);
        let invalidate = band.filter(|i| !keep.contains(i)).collect();

        WindowPlan { start, invalidate }
    }
}

/// `index..=index+count` within `[0, len)`, ascending
fn span_forward(index: usize, count: usize, len: usize) -> Vec<usize> {
    if index >= len {
        return Vec::new();
    }
    let last = index.saturating_add(count).min(len - 1);
    (index..=last).collect()
}

/// `index-count..=index` within `[0, len)`, descending from `index`
fn span_backward(index: usize, count: usize, len: usize) -> Vec<usize> {
    if index >= len {
        return Vec::new();
    }
    (index.saturating_sub(count)..=index).rev().collect()
}

fn merge(mut first: Vec<usize>, second: Vec<usize>) -> Vec<usize> {
    for i in second {
        if !first.contains(&i) {
            first.push(i);
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.behind_on_forward, 5);
        assert_eq!(policy.behind_on_backward, 10);
        assert_eq!(policy.in_direction_count, 5);
        assert_eq!(policy.forward_on_jump_ahead, 5);
        assert_eq!(policy.backward_on_jump_ahead, 3);
        assert_eq!(policy.forward_on_jump_behind, 3);
        assert_eq!(policy.backward_on_jump_behind, 5);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_warm_start_bounded_by_len() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.warm_start_positions(10), 0..3);
        assert_eq!(policy.warm_start_positions(2), 0..2);
        assert_eq!(policy.warm_start_positions(0), 0..0);
    }

    #[test]
    fn test_forward_step_plan() {
        let plan = WindowPolicy::default().plan_step(8, Direction::Forward, 20);
        assert_eq!(plan.start, vec![8, 9, 10, 11, 12, 13]);
        assert_eq!(plan.invalidate, vec![2]);
    }

    #[test]
    fn test_forward_step_trailing_edge_out_of_range() {
        let plan = WindowPolicy::default().plan_step(5, Direction::Forward, 20);
        assert_eq!(plan.start, vec![5, 6, 7, 8, 9, 10]);
        assert!(plan.invalidate.is_empty());
    }

    #[test]
    fn test_forward_step_clipped_at_end() {
        let plan = WindowPolicy::default().plan_step(18, Direction::Forward, 20);
        assert_eq!(plan.start, vec![18, 19]);
        assert_eq!(plan.invalidate, vec![12]);
    }

    #[test]
    fn test_backward_step_plan() {
        let plan = WindowPolicy::default().plan_step(10, Direction::Backward, 30);
        assert_eq!(plan.start, vec![10, 9, 8, 7, 6, 5]);
        assert_eq!(plan.invalidate, vec![21]);
    }

    #[test]
    fn test_backward_step_clipped_at_start() {
        let plan = WindowPolicy::default().plan_step(2, Direction::Backward, 5);
        assert_eq!(plan.start, vec![2, 1, 0]);
        assert!(plan.invalidate.is_empty());
    }

    #[test]
    fn test_jump_ahead_plan() {
        let plan = WindowPolicy::default().plan_jump(5, 30, 50);
        assert_eq!(plan.start, vec![30, 31, 32, 33, 34, 35, 29, 28, 27]);
        // band 0..15 around the old index, nothing of it survives
        assert_eq!(plan.invalidate, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_jump_behind_plan() {
        let plan = WindowPolicy::default().plan_jump(30, 10, 50);
        assert_eq!(plan.start, vec![10, 9, 8, 7, 6, 5, 11, 12, 13]);
        assert_eq!(plan.invalidate, (25..40).collect::<Vec<_>>());
    }

    #[test]
    fn test_short_jump_keeps_overlap() {
        // jump 10 -> 13 keeps [10, 18] alive
        let plan = WindowPolicy::default().plan_jump(10, 13, 50);
        assert_eq!(plan.invalidate, vec![5, 6, 7, 8, 9, 19]);
        assert!(plan.invalidate.iter().all(|i| !plan.start.contains(i)));
    }

    #[test]
    fn test_validate_rejects_zero_warm_start() {
        let policy = WindowPolicy {
            warm_start: 0,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(CacheError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_validate_rejects_huge_spans() {
        let policy = WindowPolicy {
            in_direction_count: i64::MAX as usize,
            ..Default::default()
        };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("in_direction_count"));

        let policy = WindowPolicy {
            behind_on_forward: usize::MAX,
            behind_on_backward: usize::MAX,
            ..Default::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_unvalidated_huge_spans_stay_within_len() {
        let policy = WindowPolicy {
            behind_on_forward: usize::MAX,
            behind_on_backward: usize::MAX,
            in_direction_count: usize::MAX,
            forward_on_jump_ahead: usize::MAX,
            backward_on_jump_ahead: usize::MAX,
            forward_on_jump_behind: usize::MAX,
            backward_on_jump_behind: usize::MAX,
            warm_start: usize::MAX,
        };

        let plan = policy.plan_step(3, Direction::Forward, 10);
        assert_eq!(plan.start, (3..10).collect::<Vec<_>>());
        assert!(plan.invalidate.is_empty());

        let plan = policy.plan_step(3, Direction::Backward, 10);
        assert_eq!(plan.start, vec![3, 2, 1, 0]);
        assert!(plan.invalidate.is_empty());

        let plan = policy.plan_jump(2, 7, 10);
        assert_eq!(plan.start.len(), 10);
        assert!(plan.invalidate.is_empty());
        assert_eq!(policy.warm_start_positions(10), 0..10);
    }

    #[test]
    fn test_deserialize_partial_policy() {
        let policy: WindowPolicy = serde_json::from_str(r#"{"in_direction_count": 2}"#).unwrap();
        assert_eq!(policy.in_direction_count, 2);
        assert_eq!(policy.behind_on_backward, 10);
    }
}
