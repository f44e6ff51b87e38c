// SPDX-License-Identifier: AGPL-3.0

//! Bottom-up fixpoint driver over the local rules.
//!
//! Children are simplified first, then the rule dispatcher runs on the
//! rebuilt application; replacement terms are simplified again until no
//! rule fires. Results are memoized per input handle, so shared subterms
//! are processed once.

use std::collections::HashMap;

use tracing::trace;

use bvsimp_term::{Context, TermData, TermId};

use crate::{Outcome, Rewriter};

pub struct Simplifier {
    rewriter: Rewriter,
    cache: HashMap<TermId, TermId>,
}

impl Simplifier {
    pub fn new(rewriter: Rewriter) -> Self {
        Self {
            rewriter,
            cache: HashMap::new(),
        }
    }

    pub fn rewriter(&self) -> &Rewriter {
        &self.rewriter
    }

    /// Simplify `t` to a fixpoint of the local rules.
    pub fn simplify(&mut self, ctx: &mut Context, t: TermId) -> TermId {
        if let Some(&cached) = self.cache.get(&t) {
            return cached;
        }
        let result = match ctx.get(t) {
            TermData::App { op, args, .. } => {
                let op = *op;
                let args = args.clone();
                let new_args: Vec<TermId> =
                    args.iter().map(|&a| self.simplify(ctx, a)).collect();
                let base = if new_args == args {
                    t
                } else {
                    ctx.mk_app(op, &new_args)
                };
                match self.rewriter.simplify_app(ctx, op, &new_args) {
                    Outcome::NoRule => base,
                    Outcome::Simplified { term, .. } => {
                        if term == base {
                            base
                        } else {
                            trace!(from = ?base, to = ?term, "descending into replacement");
                            self.simplify(ctx, term)
                        }
                    }
                }
            }
            _ => t,
        };
        self.cache.insert(t, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvsimp_term::Op;

    fn simplifier() -> Simplifier {
        Simplifier::new(Rewriter::new())
    }

    #[test]
    fn test_leaves_pass_through() {
        let mut ctx = Context::new();
        let mut s = simplifier();
        let x = ctx.mk_bv_var("x", 8);
        assert_eq!(s.simplify(&mut ctx, x), x);
        let n = ctx.mk_numeral_u64(7, 8);
        assert_eq!(s.simplify(&mut ctx, n), n);
    }

    #[test]
    fn test_constant_expression_folds_completely() {
        let mut ctx = Context::new();
        let mut s = simplifier();
        let a = ctx.mk_numeral_u64(3, 8);
        let b = ctx.mk_numeral_u64(5, 8);
        let sum = ctx.mk_app(Op::Add, &[a, b]);
        let prod = ctx.mk_app(Op::Mul, &[sum, b]);
        let expected = ctx.mk_numeral_u64(40, 8);
        assert_eq!(s.simplify(&mut ctx, prod), expected);
    }

    #[test]
    fn test_children_simplify_before_parent() {
        let mut ctx = Context::new();
        let mut s = simplifier();
        let x = ctx.mk_bv_var("x", 8);
        let zero = ctx.zero(8);
        // (x + 0) | x collapses to x
        let sum = ctx.mk_app(Op::Add, &[x, zero]);
        let or = ctx.mk_app(Op::Or, &[sum, x]);
        assert_eq!(s.simplify(&mut ctx, or), x);
    }

    #[test]
    fn test_replacement_is_resimplified() {
        let mut ctx = Context::new();
        let mut s = simplifier();
        let x = ctx.mk_bv_var("x", 8);
        // sub expands into add of a negation, then the numerals fold:
        // x - x = 0
        let diff = ctx.mk_sub(x, x);
        let zero = ctx.zero(8);
        assert_eq!(s.simplify(&mut ctx, diff), zero);
    }

    #[test]
    fn test_fixpoint_is_stable() {
        let mut ctx = Context::new();
        let mut s = simplifier();
        let x = ctx.mk_bv_var("x", 8);
        let three = ctx.mk_numeral_u64(3, 8);
        let shifted = ctx.mk_app(Op::Shl, &[x, three]);
        let once = s.simplify(&mut ctx, shifted);
        let mut fresh = simplifier();
        let twice = fresh.simplify(&mut ctx, once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cache_returns_same_result() {
        let mut ctx = Context::new();
        let mut s = simplifier();
        let x = ctx.mk_bv_var("x", 8);
        let n = ctx.mk_numeral_u64(1, 8);
        let sum = ctx.mk_app(Op::Add, &[n, x]);
        let first = s.simplify(&mut ctx, sum);
        let second = s.simplify(&mut ctx, sum);
        assert_eq!(first, second);
    }
}
