//! Opt-in cost-based reordering of a matcher's top-level checks.
//!
//! An [`AdaptiveMatcher`] is a per-session wrapper: it times each check, keeps
//! an exponential moving average per check, and re-sorts its own evaluation
//! order after every evaluation so cheap checks short-circuit first. The
//! wrapped [`Matcher`] is never modified; [`AdaptiveMatcher::snapshot`] hands
//! out a new matcher with checks in the measured order.

use super::{Bindings, Matcher};
use crate::syntax::SyntaxNode;
use std::time::Instant;

const SMOOTHING: f64 = 0.2;

pub struct AdaptiveMatcher {
    matcher: Matcher,
    order: Vec<usize>,
    averages: Vec<f64>,
    evaluations: u64,
}

impl AdaptiveMatcher {
    pub fn new(matcher: Matcher) -> Self {
        let count = matcher.check_count();
        Self {
            matcher,
            order: (0..count).collect(),
            averages: vec![0.0; count],
            evaluations: 0,
        }
    }

    /// Same outcome as [`Matcher::matches`]; only the evaluation order differs.
    pub fn matches<'t>(&mut self, node: SyntaxNode<'t>) -> Option<Bindings<'t>> {
        if !self.matcher.target().accepts(node.kind()) {
            return None;
        }
        self.evaluations += 1;

        let mut bindings = Bindings::new();
        let mut failed = false;
        for &i in &self.order {
            let started = Instant::now();
            let outcome = self.matcher.checks()[i].check(node);
            let elapsed = started.elapsed().as_nanos() as f64;
            self.averages[i] = SMOOTHING * elapsed + (1.0 - SMOOTHING) * self.averages[i];

            match outcome {
                Some(found) => bindings.extend(found),
                None => {
                    failed = true;
                    break;
                }
            }
        }

        let averages = &self.averages;
        self.order
            .sort_by(|&a, &b| averages[a].total_cmp(&averages[b]));

        if failed {
            None
        } else {
            Some(self.matcher.finish(node, bindings))
        }
    }

    /// Current evaluation order as indices into the original check list.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Moving-average cost per check in nanoseconds, by original index.
    pub fn averages(&self) -> &[f64] {
        &self.averages
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// A matcher with checks in the currently measured order.
    pub fn snapshot(&self) -> Matcher {
        self.matcher.with_check_order(&self.order)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn into_inner(self) -> Matcher {
        self.matcher
    }
}
