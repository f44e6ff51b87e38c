// SPDX-License-Identifier: AGPL-3.0

//! Shift and rotation rules.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use bvsimp_term::{numeral, Context, Op, TermId, WidthInt};

use crate::{Outcome, Rewriter};

impl Rewriter {
    pub(crate) fn mk_shl(&mut self, ctx: &mut Context, arg1: TermId, arg2: TermId) -> Outcome {
        let sz = ctx.width(arg1);
        let Some((r2, _)) = ctx.numeral(arg2) else {
            return Outcome::NoRule;
        };
        if r2.is_zero() {
            return Outcome::done(arg1);
        }
        if r2 >= BigUint::from(sz) {
            let t = ctx.zero(sz);
            return Outcome::done(t);
        }
        let k = r2.to_u32().expect("shift amount below width");
        if let Some((r1, _)) = ctx.numeral(arg1) {
            let t = if sz <= 64 {
                let v = r1.to_u64().expect("numeral fits its width");
                let shifted = ((v as u128) << k) & ((1u128 << sz) - 1);
                ctx.mk_numeral(BigUint::from(shifted as u64), sz)
            } else {
                ctx.mk_numeral(r1 << k, sz)
            };
            return Outcome::done(t);
        }
        // (concat (extract[sz-k-1:0] x) 0^k)
        let body = self.extract(ctx, sz - k - 1, 0, arg1);
        let pad = ctx.zero(k);
        let t = ctx.mk_app(Op::Concat, &[body, pad]);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_lshr(&mut self, ctx: &mut Context, arg1: TermId, arg2: TermId) -> Outcome {
        let sz = ctx.width(arg1);
        let Some((r2, _)) = ctx.numeral(arg2) else {
            return Outcome::NoRule;
        };
        if r2.is_zero() {
            return Outcome::done(arg1);
        }
        if r2 >= BigUint::from(sz) {
            let t = ctx.zero(sz);
            return Outcome::done(t);
        }
        let k = r2.to_u32().expect("shift amount below width");
        if let Some((r1, _)) = ctx.numeral(arg1) {
            let t = ctx.mk_numeral(r1 >> k, sz);
            return Outcome::done(t);
        }
        // (concat 0^k (extract[sz-1:k] x))
        let pad = ctx.zero(k);
        let body = self.extract(ctx, sz - 1, k, arg1);
        let t = ctx.mk_app(Op::Concat, &[pad, body]);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_ashr(&mut self, ctx: &mut Context, arg1: TermId, arg2: TermId) -> Outcome {
        let sz = ctx.width(arg1);
        let num2 = ctx.numeral(arg2);
        if let Some((r2, _)) = &num2 {
            if r2.is_zero() {
                return Outcome::done(arg1);
            }
        }
        let num1 = ctx.numeral(arg1);
        if let (Some((r1, _)), Some((r2, _))) = (&num1, &num2) {
            let sign = numeral::bit(r1, sz - 1);
            let t = if *r2 >= BigUint::from(sz) {
                if sign {
                    ctx.ones(sz)
                } else {
                    ctx.zero(sz)
                }
            } else {
                let k = r2.to_u32().expect("shift amount below width");
                let mut shifted = r1 >> k;
                if sign {
                    // shifting in ones fills the k high bits
                    shifted |= numeral::mask(sz) ^ numeral::mask(sz - k);
                }
                ctx.mk_numeral(shifted, sz)
            };
            return Outcome::done(t);
        }
        // nested shifts by known amounts compose, saturating at the width
        if let Some((r2, _)) = &num2 {
            if let Some((Op::Ashr, inner)) = ctx.app(arg1) {
                let (x, c1) = (inner[0], inner[1]);
                if let Some((r1, _)) = ctx.numeral(c1) {
                    let total = (r1 + r2).min(BigUint::from(sz));
                    let amount = ctx.mk_numeral(total, sz);
                    let t = ctx.mk_app(Op::Ashr, &[x, amount]);
                    return Outcome::rw1(t);
                }
            }
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_rotate_left(&mut self, ctx: &mut Context, n: WidthInt, arg: TermId) -> Outcome {
        let sz = ctx.width(arg);
        let n = n % sz;
        if n == 0 || sz == 1 {
            return Outcome::done(arg);
        }
        let lo = self.extract(ctx, sz - n - 1, 0, arg);
        let hi = self.extract(ctx, sz - 1, sz - n, arg);
        let t = ctx.mk_app(Op::Concat, &[lo, hi]);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_rotate_right(&mut self, ctx: &mut Context, n: WidthInt, arg: TermId) -> Outcome {
        let sz = ctx.width(arg);
        let n = n % sz;
        self.mk_rotate_left(ctx, sz - n, arg)
    }

    pub(crate) fn mk_ext_rotate_left(
        &mut self,
        ctx: &mut Context,
        arg1: TermId,
        arg2: TermId,
    ) -> Outcome {
        let sz = ctx.width(arg1);
        let Some((r2, _)) = ctx.numeral(arg2) else {
            return Outcome::NoRule;
        };
        let shift = (r2 % BigUint::from(sz)).to_u32().expect("reduced amount");
        self.mk_rotate_left(ctx, shift, arg1)
    }

    pub(crate) fn mk_ext_rotate_right(
        &mut self,
        ctx: &mut Context,
        arg1: TermId,
        arg2: TermId,
    ) -> Outcome {
        let sz = ctx.width(arg1);
        let Some((r2, _)) = ctx.numeral(arg2) else {
            return Outcome::NoRule;
        };
        let shift = (r2 % BigUint::from(sz)).to_u32().expect("reduced amount");
        self.mk_rotate_right(ctx, shift, arg1)
    }
}
