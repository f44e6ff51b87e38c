// SPDX-License-Identifier: AGPL-3.0

//! Inequality rules. `ule`/`sle` carry all the logic; the strict and
//! reversed forms are expressed through them.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use bvsimp_term::{numeral, Context, Op, TermId};

use crate::bits::is_zero_bit;
use crate::{Outcome, Rewriter};

impl Rewriter {
    pub(crate) fn mk_leq(
        &mut self,
        ctx: &mut Context,
        signed: bool,
        a: TermId,
        b: TermId,
    ) -> Outcome {
        if a == b {
            let t = ctx.mk_true();
            return Outcome::done(t);
        }
        let sz = ctx.width(a);
        let interp = |v: &BigUint| -> BigInt {
            if signed {
                numeral::to_signed(v, sz)
            } else {
                BigInt::from(v.clone())
            }
        };
        let ra = ctx.numeral(a).map(|(v, _)| interp(&v));
        let rb = ctx.numeral(b).map(|(v, _)| interp(&v));
        if let (Some(ra), Some(rb)) = (&ra, &rb) {
            let t = ctx.mk_bool(ra <= rb);
            return Outcome::done(t);
        }

        let (lower, upper) = if signed {
            let half = BigInt::one() << (sz - 1);
            (-half.clone(), half - 1)
        } else {
            (BigInt::zero(), BigInt::from(numeral::mask(sz)))
        };
        // bound arguments collapse to equality or truth
        if let Some(rb) = &rb {
            if *rb == lower {
                let eq = ctx.mk_eq(a, b);
                return Outcome::rw1(eq);
            }
            if *rb == upper {
                let t = ctx.mk_true();
                return Outcome::done(t);
            }
        }
        if let Some(ra) = &ra {
            if *ra == lower {
                let t = ctx.mk_true();
                return Outcome::done(t);
            }
            if *ra == upper {
                let eq = ctx.mk_eq(a, b);
                return Outcome::rw1(eq);
            }
        }

        if !signed {
            // a <= b where every bit of b above k is known zero: the high
            // part of a must be zero and the low parts compare
            let first_non_zero = (0..sz).rev().find(|&i| !is_zero_bit(ctx, b, i));
            match first_non_zero {
                None => {
                    let zero = ctx.zero(sz);
                    let eq = ctx.mk_eq(a, zero);
                    return Outcome::rw1(eq);
                }
                Some(k) if k < sz - 1 => {
                    let hi_a = self.extract(ctx, sz - 1, k + 1, a);
                    let zero = ctx.zero(sz - 1 - k);
                    let hi_eq = ctx.mk_eq(hi_a, zero);
                    let lo_a = self.extract(ctx, k, 0, a);
                    let lo_b = self.extract(ctx, k, 0, b);
                    let le = ctx.mk_ule(lo_a, lo_b);
                    let t = ctx.mk_bool_and(&[hi_eq, le]);
                    return Outcome::rw3(t);
                }
                _ => {}
            }
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_geq(
        &mut self,
        ctx: &mut Context,
        signed: bool,
        a: TermId,
        b: TermId,
    ) -> Outcome {
        let st = self.mk_leq(ctx, signed, b, a);
        if st != Outcome::NoRule {
            return st;
        }
        let op = if signed { Op::Sle } else { Op::Ule };
        let t = ctx.mk_app(op, &[b, a]);
        Outcome::done(t)
    }

    pub(crate) fn mk_lt(&mut self, ctx: &mut Context, signed: bool, a: TermId, b: TermId) -> Outcome {
        let op = if signed { Op::Sle } else { Op::Ule };
        let le = ctx.mk_app(op, &[b, a]);
        let t = ctx.mk_bool_not(le);
        Outcome::rw2(t)
    }
}
