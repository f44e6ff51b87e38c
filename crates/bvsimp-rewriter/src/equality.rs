// SPDX-License-Identifier: AGPL-3.0

//! Equality canonicalization over bit-vector operands.

use num_traits::One;

use bvsimp_term::{numeral, Context, Op, TermId};

use crate::arith::{cancel_monomials, mul_with_coeff};
use crate::{Outcome, Rewriter};

/// Matches `(-1) * s`.
fn is_minus_one_times(ctx: &Context, t: TermId) -> bool {
    matches!(ctx.app(t), Some((Op::Mul, args)) if args.len() == 2 && ctx.is_allone(args[0]))
}

impl Rewriter {
    pub(crate) fn mk_eq_core(&mut self, ctx: &mut Context, lhs: TermId, rhs: TermId) -> Outcome {
        if lhs == rhs {
            let t = ctx.mk_true();
            return Outcome::done(t);
        }
        // interned numerals share handles, so distinct handles mean
        // distinct values
        if ctx.is_numeral(lhs) && ctx.is_numeral(rhs) {
            let t = ctx.mk_false();
            return Outcome::done(t);
        }
        let mut lhs = lhs;
        let mut rhs = rhs;
        let mut swapped = false;
        if ctx.is_numeral(lhs) {
            std::mem::swap(&mut lhs, &mut rhs);
            swapped = true;
        }

        if self.cfg.bit2bool {
            let st = self.bit2bool(ctx, lhs, rhs);
            if st != Outcome::NoRule {
                return st;
            }
        }
        let st = self.mul_eq(ctx, lhs, rhs);
        if st != Outcome::NoRule {
            return st;
        }
        let st = self.mul_eq(ctx, rhs, lhs);
        if st != Outcome::NoRule {
            return st;
        }
        if self.cfg.blast_eq_value {
            let st = self.blast_eq_value(ctx, lhs, rhs);
            if st != Outcome::NoRule {
                return st;
            }
        }

        let is_arith =
            |ctx: &Context, t| ctx.is_app_of(t, Op::Add) || ctx.is_app_of(t, Op::Mul);
        if is_arith(ctx, lhs) || is_arith(ctx, rhs) {
            let mut cancelled = false;
            if let Some((nl, nr)) = cancel_monomials(ctx, lhs, rhs) {
                lhs = nl;
                rhs = nr;
                cancelled = true;
            }
            if ctx.is_numeral(lhs) && ctx.is_numeral(rhs) {
                let t = ctx.mk_bool(lhs == rhs);
                return Outcome::done(t);
            }
            // isolate one summand of a two-term sum against a constant
            if let Some((Op::Add, parts)) = ctx.app(lhs) {
                if parts.len() == 2 && ctx.is_numeral(rhs) {
                    let (t1, t2) = (parts[0], parts[1]);
                    return self.t1_add_t2_eq_c(ctx, t1, t2, rhs);
                }
            }
            if let Some((Op::Add, parts)) = ctx.app(rhs) {
                if parts.len() == 2 && ctx.is_numeral(lhs) {
                    let (t1, t2) = (parts[0], parts[1]);
                    return self.t1_add_t2_eq_c(ctx, t1, t2, lhs);
                }
            }
            if cancelled {
                let t = ctx.mk_eq(lhs, rhs);
                return Outcome::done(t);
            }
        }

        if (ctx.is_app_of(lhs, Op::Concat) && self.is_concat_split_target(ctx, rhs))
            || (ctx.is_app_of(rhs, Op::Concat) && self.is_concat_split_target(ctx, lhs))
        {
            return self.mk_eq_concat(ctx, lhs, rhs);
        }

        if swapped {
            let t = ctx.mk_eq(lhs, rhs);
            return Outcome::done(t);
        }
        Outcome::NoRule
    }

    /// Width-1 equality against a constant bit turns into boolean structure.
    fn bit2bool(&mut self, ctx: &mut Context, lhs: TermId, rhs: TermId) -> Outcome {
        if ctx.width(lhs) != 1 {
            return Outcome::NoRule;
        }
        let mut lhs = lhs;
        let mut rhs = rhs;
        if ctx.is_numeral(lhs) {
            std::mem::swap(&mut lhs, &mut rhs);
        }
        let Some((v, _)) = ctx.numeral(rhs) else {
            return Outcome::NoRule;
        };
        let is_one = v.is_one();
        let (op, args) = match ctx.app(lhs) {
            Some((op, args)) => (op, args.to_vec()),
            None => return Outcome::NoRule,
        };
        match op {
            Op::Ite => {
                let then_eq = ctx.mk_eq(args[1], rhs);
                let else_eq = ctx.mk_eq(args[2], rhs);
                let t = ctx.mk_ite(args[0], then_eq, else_eq);
                Outcome::rw2(t)
            }
            Op::Not => {
                let flipped = ctx.mk_numeral_u64(if is_one { 0 } else { 1 }, 1);
                let t = ctx.mk_eq(args[0], flipped);
                Outcome::rw1(t)
            }
            Op::Or => {
                let bit1 = ctx.one(1);
                let eqs: Vec<_> = args.iter().map(|&a| ctx.mk_eq(a, bit1)).collect();
                let or = ctx.mk_bool_or(&eqs);
                if is_one {
                    Outcome::rw2(or)
                } else {
                    let t = ctx.mk_bool_not(or);
                    Outcome::rw3(t)
                }
            }
            Op::Xor => {
                let bit1 = ctx.one(1);
                let eqs: Vec<_> = args.iter().map(|&a| ctx.mk_eq(a, bit1)).collect();
                let xor = ctx.mk_bool_xor(&eqs);
                if is_one {
                    Outcome::rw2(xor)
                } else {
                    let t = ctx.mk_bool_not(xor);
                    Outcome::rw3(t)
                }
            }
            _ => Outcome::NoRule,
        }
    }

    /// `c * x = rhs` divides through by `c` when the coefficient is odd and
    /// therefore invertible modulo `2^n`.
    fn mul_eq(&mut self, ctx: &mut Context, lhs: TermId, rhs: TermId) -> Outcome {
        let Some((c, x)) = mul_with_coeff(ctx, lhs) else {
            return Outcome::NoRule;
        };
        let sz = ctx.width(lhs);
        let Some(c_inv) = numeral::mult_inverse(&c, sz) else {
            return Outcome::NoRule;
        };
        if let Some((r, _)) = ctx.numeral(rhs) {
            let v = numeral::normalize(c_inv * r, sz);
            let n = ctx.mk_numeral(v, sz);
            let t = ctx.mk_eq(x, n);
            return Outcome::rw1(t);
        }
        if let Some((c2, x2)) = mul_with_coeff(ctx, rhs) {
            let v = numeral::normalize(c_inv.clone() * c2, sz);
            if v.is_one() {
                let t = ctx.mk_eq(x, x2);
                return Outcome::rw1(t);
            }
            let coeff = ctx.mk_numeral(v, sz);
            let m = ctx.mk_app(Op::Mul, &[coeff, x2]);
            let t = ctx.mk_eq(x, m);
            return Outcome::rw1(t);
        }
        if let Some((Op::Add, sums)) = ctx.app(rhs) {
            let sums = sums.to_vec();
            if sums
                .iter()
                .all(|&s| ctx.is_numeral(s) || mul_with_coeff(ctx, s).is_some())
            {
                let inv = ctx.mk_numeral(c_inv, sz);
                let m = ctx.mk_app(Op::Mul, &[inv, rhs]);
                let t = ctx.mk_eq(x, m);
                return Outcome::rw2(t);
            }
        }
        Outcome::NoRule
    }

    /// Equality against a numeral through or/xor/not splits into one
    /// equation per bit.
    fn blast_eq_value(&mut self, ctx: &mut Context, lhs: TermId, rhs: TermId) -> Outcome {
        let sz = ctx.width(lhs);
        if sz <= 1 {
            return Outcome::NoRule;
        }
        let mut lhs = lhs;
        let mut rhs = rhs;
        if ctx.is_numeral(lhs) {
            std::mem::swap(&mut lhs, &mut rhs);
        }
        let Some((v, _)) = ctx.numeral(rhs) else {
            return Outcome::NoRule;
        };
        if !matches!(ctx.app(lhs), Some((Op::Or | Op::Xor | Op::Not, _))) {
            return Outcome::NoRule;
        }
        let mut conj = Vec::with_capacity(sz as usize);
        for i in 0..sz {
            let bit = ctx.mk_numeral_u64(numeral::bit(&v, i) as u64, 1);
            let slice = self.extract(ctx, i, i, lhs);
            conj.push(ctx.mk_eq(slice, bit));
        }
        let t = ctx.mk_bool_and(&conj);
        Outcome::rw3(t)
    }

    fn is_concat_split_target(&self, ctx: &Context, t: TermId) -> bool {
        self.cfg.split_concat_eq
            || ctx.is_app_of(t, Op::Concat)
            || ctx.is_numeral(t)
            || ctx.is_app_of(t, Op::Or)
    }

    /// Slice both sides at every component boundary and conjoin the
    /// resulting aligned equations, most significant first.
    fn mk_eq_concat(&mut self, ctx: &mut Context, a: TermId, b: TermId) -> Outcome {
        let split = |ctx: &Context, t: TermId| -> Vec<TermId> {
            match ctx.app(t) {
                Some((Op::Concat, args)) => args.to_vec(),
                _ => vec![t],
            }
        };
        let args1 = split(ctx, a);
        let args2 = split(ctx, b);
        let mut eqs = Vec::new();
        let mut i1 = args1.len();
        let mut i2 = args2.len();
        // consumed low bits of the current component on each side
        let mut low1 = 0;
        let mut low2 = 0;
        while i1 > 0 && i2 > 0 {
            let t1 = args1[i1 - 1];
            let t2 = args2[i2 - 1];
            let w1 = ctx.width(t1);
            let w2 = ctx.width(t2);
            let take = (w1 - low1).min(w2 - low2);
            let s1 = if low1 == 0 && take == w1 {
                t1
            } else {
                self.extract(ctx, low1 + take - 1, low1, t1)
            };
            let s2 = if low2 == 0 && take == w2 {
                t2
            } else {
                self.extract(ctx, low2 + take - 1, low2, t2)
            };
            eqs.push(ctx.mk_eq(s1, s2));
            low1 += take;
            low2 += take;
            if low1 == w1 {
                i1 -= 1;
                low1 = 0;
            }
            if low2 == w2 {
                i2 -= 1;
                low2 = 0;
            }
        }
        eqs.reverse();
        let t = ctx.mk_bool_and(&eqs);
        Outcome::rw3(t)
    }

    /// `t1 + t2 = c` isolates the summand that is not a negation.
    fn t1_add_t2_eq_c(
        &mut self,
        ctx: &mut Context,
        t1: TermId,
        t2: TermId,
        c: TermId,
    ) -> Outcome {
        let (keep, moved) = if is_minus_one_times(ctx, t1) {
            (t2, t1)
        } else {
            (t1, t2)
        };
        let sub = ctx.mk_sub(c, moved);
        let t = ctx.mk_eq(keep, sub);
        Outcome::rw2(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Revisit;
    use bvsimp_config::RewriterConfig;

    fn rw1(term: TermId) -> Outcome {
        Outcome::Simplified {
            term,
            revisit: Revisit::One,
        }
    }

    fn rw2(term: TermId) -> Outcome {
        Outcome::Simplified {
            term,
            revisit: Revisit::Two,
        }
    }

    fn rw3(term: TermId) -> Outcome {
        Outcome::Simplified {
            term,
            revisit: Revisit::Three,
        }
    }

    #[test]
    fn test_reflexive_and_distinct_numerals() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let tt = ctx.mk_true();
        assert_eq!(rw.mk_eq_core(&mut ctx, x, x), Outcome::done(tt));
        let a = ctx.mk_numeral_u64(1, 8);
        let b = ctx.mk_numeral_u64(2, 8);
        let ff = ctx.mk_false();
        assert_eq!(rw.mk_eq_core(&mut ctx, a, b), Outcome::done(ff));
    }

    #[test]
    fn test_numeral_moves_right() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let n = ctx.mk_numeral_u64(5, 8);
        let expected = ctx.mk_eq(x, n);
        assert_eq!(rw.mk_eq_core(&mut ctx, n, x), Outcome::done(expected));
        // already oriented: nothing to do
        assert_eq!(rw.mk_eq_core(&mut ctx, x, n), Outcome::NoRule);
    }

    #[test]
    fn test_bit2bool_not() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 1);
        let nx = ctx.mk_bv_not(x);
        let one = ctx.one(1);
        let zero = ctx.zero(1);
        let expected = ctx.mk_eq(x, zero);
        assert_eq!(rw.mk_eq_core(&mut ctx, nx, one), rw1(expected));
    }

    #[test]
    fn test_bit2bool_or() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 1);
        let y = ctx.mk_bv_var("y", 1);
        let or = ctx.mk_bv_or(&[x, y]);
        let one = ctx.one(1);
        let ex = ctx.mk_eq(x, one);
        let ey = ctx.mk_eq(y, one);
        let bool_or = ctx.mk_bool_or(&[ex, ey]);
        assert_eq!(rw.mk_eq_core(&mut ctx, or, one), rw2(bool_or));
        let zero = ctx.zero(1);
        let negated = ctx.mk_bool_not(bool_or);
        assert_eq!(rw.mk_eq_core(&mut ctx, or, zero), rw3(negated));
    }

    #[test]
    fn test_bit2bool_ite() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let c = ctx.mk_var("c", bvsimp_term::Sort::Bool);
        let x = ctx.mk_bv_var("x", 1);
        let y = ctx.mk_bv_var("y", 1);
        let ite = ctx.mk_ite(c, x, y);
        let one = ctx.one(1);
        let ex = ctx.mk_eq(x, one);
        let ey = ctx.mk_eq(y, one);
        let expected = ctx.mk_ite(c, ex, ey);
        assert_eq!(rw.mk_eq_core(&mut ctx, ite, one), rw2(expected));
    }

    #[test]
    fn test_bit2bool_disabled() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::with_config(RewriterConfig {
            bit2bool: false,
            ..Default::default()
        });
        let x = ctx.mk_bv_var("x", 1);
        let nx = ctx.mk_bv_not(x);
        let one = ctx.one(1);
        assert_eq!(rw.mk_eq_core(&mut ctx, nx, one), Outcome::NoRule);
    }

    #[test]
    fn test_mul_eq_with_numeral_rhs() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 4);
        let three = ctx.mk_numeral_u64(3, 4);
        let m = ctx.mk_app(Op::Mul, &[three, x]);
        let five = ctx.mk_numeral_u64(5, 4);
        // 3x = 5 divides through: x = 11 * 5 = 55 = 7 mod 16
        let seven = ctx.mk_numeral_u64(7, 4);
        let expected = ctx.mk_eq(x, seven);
        assert_eq!(rw.mk_eq_core(&mut ctx, m, five), rw1(expected));
    }

    #[test]
    fn test_mul_eq_both_sides() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 4);
        let y = ctx.mk_bv_var("y", 4);
        let three = ctx.mk_numeral_u64(3, 4);
        let lhs = ctx.mk_app(Op::Mul, &[three, x]);
        let rhs = ctx.mk_app(Op::Mul, &[three, y]);
        // the common invertible coefficient drops out
        let expected = ctx.mk_eq(x, y);
        assert_eq!(rw.mk_eq_core(&mut ctx, lhs, rhs), rw1(expected));
    }

    #[test]
    fn test_mul_eq_even_coefficient_not_invertible() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 4);
        let two = ctx.mk_numeral_u64(2, 4);
        let m = ctx.mk_app(Op::Mul, &[two, x]);
        let five = ctx.mk_numeral_u64(5, 4);
        assert_eq!(rw.mk_eq_core(&mut ctx, m, five), Outcome::NoRule);
    }

    #[test]
    fn test_blast_eq_value() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        rw.update_config(RewriterConfig {
            blast_eq_value: true,
            ..Default::default()
        });
        let x = ctx.mk_bv_var("x", 2);
        let y = ctx.mk_bv_var("y", 2);
        let or = ctx.mk_bv_or(&[x, y]);
        let n = ctx.mk_numeral_u64(0b10, 2);
        let out = rw.mk_eq_core(&mut ctx, or, n);
        let bit1 = ctx.one(1);
        let bit0 = ctx.zero(1);
        let s0 = ctx.mk_extract(0, 0, or);
        let e0 = ctx.mk_eq(s0, bit0);
        let s1 = ctx.mk_extract(1, 1, or);
        let e1 = ctx.mk_eq(s1, bit1);
        let expected = ctx.mk_bool_and(&[e0, e1]);
        assert_eq!(out, rw3(expected));
    }

    #[test]
    fn test_cancel_shared_summands() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 8);
        let z = ctx.mk_bv_var("z", 8);
        let lhs = ctx.mk_app(Op::Add, &[x, y]);
        let rhs = ctx.mk_app(Op::Add, &[y, z]);
        let expected = ctx.mk_eq(x, z);
        assert_eq!(rw.mk_eq_core(&mut ctx, lhs, rhs), Outcome::done(expected));
    }

    #[test]
    fn test_sum_against_constant_isolates() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 8);
        let lhs = ctx.mk_app(Op::Add, &[x, y]);
        let five = ctx.mk_numeral_u64(5, 8);
        let sub = ctx.mk_sub(five, y);
        let expected = ctx.mk_eq(x, sub);
        assert_eq!(rw.mk_eq_core(&mut ctx, lhs, five), rw2(expected));
    }

    #[test]
    fn test_sum_isolation_prefers_positive_summand() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 8);
        let m1 = ctx.ones(8);
        let minus_y = ctx.mk_app(Op::Mul, &[m1, y]);
        let lhs = ctx.mk_app(Op::Add, &[minus_y, x]);
        let five = ctx.mk_numeral_u64(5, 8);
        let sub = ctx.mk_sub(five, minus_y);
        let expected = ctx.mk_eq(x, sub);
        assert_eq!(rw.mk_eq_core(&mut ctx, lhs, five), rw2(expected));
    }

    #[test]
    fn test_concat_eq_splits_at_boundaries() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 4);
        let y = ctx.mk_bv_var("y", 4);
        let a = ctx.mk_bv_var("a", 2);
        let b = ctx.mk_bv_var("b", 6);
        let lhs = ctx.mk_concat(&[x, y]);
        let rhs = ctx.mk_concat(&[a, b]);
        let out = rw.mk_eq_core(&mut ctx, lhs, rhs);
        // boundaries at 4 (lhs) and 6 (rhs): slices [7:6], [5:4], [3:0]
        let x_hi = ctx.mk_extract(3, 2, x);
        let x_lo = ctx.mk_extract(1, 0, x);
        let b_hi = ctx.mk_extract(5, 4, b);
        let b_lo = ctx.mk_extract(3, 0, b);
        let e2 = ctx.mk_eq(x_hi, a);
        let e1 = ctx.mk_eq(x_lo, b_hi);
        let e0 = ctx.mk_eq(y, b_lo);
        let expected = ctx.mk_bool_and(&[e2, e1, e0]);
        assert_eq!(out, rw3(expected));
    }

    #[test]
    fn test_concat_eq_against_numeral() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 4);
        let y = ctx.mk_bv_var("y", 4);
        let lhs = ctx.mk_concat(&[x, y]);
        let n = ctx.mk_numeral_u64(0xab, 8);
        let out = rw.mk_eq_core(&mut ctx, lhs, n);
        let n_hi = ctx.mk_extract(7, 4, n);
        let n_lo = ctx.mk_extract(3, 0, n);
        let e1 = ctx.mk_eq(x, n_hi);
        let e0 = ctx.mk_eq(y, n_lo);
        let expected = ctx.mk_bool_and(&[e1, e0]);
        assert_eq!(out, rw3(expected));
    }

    #[test]
    fn test_concat_eq_not_split_against_plain_var() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 4);
        let y = ctx.mk_bv_var("y", 4);
        let z = ctx.mk_bv_var("z", 8);
        let lhs = ctx.mk_concat(&[x, y]);
        assert_eq!(rw.mk_eq_core(&mut ctx, lhs, z), Outcome::NoRule);
        // split_concat_eq lifts the restriction
        let mut eager = Rewriter::with_config(RewriterConfig {
            split_concat_eq: true,
            ..Default::default()
        });
        assert!(matches!(
            eager.mk_eq_core(&mut ctx, lhs, z),
            Outcome::Simplified {
                revisit: Revisit::Three,
                ..
            }
        ));
    }

    #[test]
    fn test_plain_vars_have_no_rule() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 8);
        assert_eq!(rw.mk_eq_core(&mut ctx, x, y), Outcome::NoRule);
    }
}
