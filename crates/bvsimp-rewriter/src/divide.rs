// SPDX-License-Identifier: AGPL-3.0

//! Division, remainder, and modulus rules.
//!
//! Every core is parameterized by the divide-by-zero policy. Under the
//! hardware interpretation (`hi_div0`) a zero divisor yields a fixed value;
//! otherwise the result is an uninterpreted witness applied to the dividend
//! and symbolic divisors force an if-then-else case split. The `internal`
//! flag marks the already-committed hardware forms, which must not be
//! re-wrapped into themselves.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use bvsimp_term::{numeral, Context, Op, TermId};

use crate::bits::is_x_minus_one;
use crate::{Outcome, Rewriter};

impl Rewriter {
    pub(crate) fn mk_udiv(
        &mut self,
        ctx: &mut Context,
        a: TermId,
        b: TermId,
        hi: bool,
        internal: bool,
    ) -> Outcome {
        if let Some((r2, sz)) = ctx.numeral(b) {
            if r2.is_zero() {
                if !hi {
                    let t = ctx.mk_app(Op::Udiv0, &[a]);
                    return Outcome::done(t);
                }
                let t = ctx.ones(sz);
                return Outcome::done(t);
            }
            if r2.is_one() {
                return Outcome::done(a);
            }
            if let Some((r1, _)) = ctx.numeral(a) {
                let t = ctx.mk_numeral(r1 / r2, sz);
                return Outcome::done(t);
            }
            if let Some(shift) = numeral::power_of_two_shift(&r2) {
                let amount = ctx.mk_numeral_u64(shift as u64, sz);
                let t = ctx.mk_app(Op::Lshr, &[a, amount]);
                return Outcome::rw1(t);
            }
            if self.cfg.udiv2mul {
                if let Some(inv) = numeral::mult_inverse(&r2, sz) {
                    let inv = ctx.mk_numeral(inv, sz);
                    let t = ctx.mk_app(Op::Mul, &[inv, a]);
                    return Outcome::rw1(t);
                }
            }
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::UdivI, &[a, b]);
            return Outcome::done(t);
        }
        if hi {
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::UdivI, &[a, b]);
            return Outcome::done(t);
        }
        self.div_case_split(ctx, a, b, Op::Udiv0, Op::UdivI)
    }

    pub(crate) fn mk_sdiv(
        &mut self,
        ctx: &mut Context,
        a: TermId,
        b: TermId,
        hi: bool,
        internal: bool,
    ) -> Outcome {
        if let Some((r2, sz)) = ctx.numeral(b) {
            if r2.is_zero() {
                if !hi {
                    let t = ctx.mk_app(Op::Sdiv0, &[a]);
                    return Outcome::done(t);
                }
                // x/0 is 1 when x is negative and -1 otherwise
                let zero = ctx.zero(sz);
                let cond = ctx.mk_app(Op::Slt, &[a, zero]);
                let one = ctx.one(sz);
                let ones = ctx.ones(sz);
                let t = ctx.mk_ite(cond, one, ones);
                return Outcome::rw2(t);
            }
            let r2s = numeral::to_signed(&r2, sz);
            if r2s.is_one() {
                return Outcome::done(a);
            }
            if let Some((r1, _)) = ctx.numeral(a) {
                let r1s = numeral::to_signed(&r1, sz);
                let q = r1s / r2s; // truncating division
                let t = ctx.mk_numeral(numeral::from_signed(&q, sz), sz);
                return Outcome::done(t);
            }
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::SdivI, &[a, b]);
            return Outcome::done(t);
        }
        if hi {
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::SdivI, &[a, b]);
            return Outcome::done(t);
        }
        self.div_case_split(ctx, a, b, Op::Sdiv0, Op::SdivI)
    }

    pub(crate) fn mk_urem(
        &mut self,
        ctx: &mut Context,
        a: TermId,
        b: TermId,
        hi: bool,
        internal: bool,
    ) -> Outcome {
        let sz = ctx.width(a);
        if let Some((r2, _)) = ctx.numeral(b) {
            if r2.is_zero() {
                if !hi {
                    let t = ctx.mk_app(Op::Urem0, &[a]);
                    return Outcome::done(t);
                }
                return Outcome::done(a);
            }
            if r2.is_one() {
                let t = ctx.zero(sz);
                return Outcome::done(t);
            }
            if let Some((r1, _)) = ctx.numeral(a) {
                let t = ctx.mk_numeral(r1 % r2, sz);
                return Outcome::done(t);
            }
            if let Some(shift) = numeral::power_of_two_shift(&r2) {
                // the remainder is just the low bits
                let pad = ctx.zero(sz - shift);
                let low = self.extract(ctx, shift - 1, 0, a);
                let t = ctx.mk_app(Op::Concat, &[pad, low]);
                return Outcome::rw2(t);
            }
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::UremI, &[a, b]);
            return Outcome::done(t);
        }
        // structural dividends: 0 rem x and (x - 1) rem x
        if !hi {
            if ctx.is_zero(a) {
                let cond = ctx.mk_eq(b, a);
                let witness = ctx.mk_app(Op::Urem0, &[a]);
                let t = ctx.mk_ite(cond, witness, a);
                return Outcome::rw2(t);
            }
            if let Some(x) = is_x_minus_one(ctx, a) {
                if x == b {
                    let zero = ctx.zero(sz);
                    let cond = ctx.mk_eq(x, zero);
                    let ones = ctx.ones(sz);
                    let witness = ctx.mk_app(Op::Urem0, &[ones]);
                    let t = ctx.mk_ite(cond, witness, a);
                    return Outcome::rw2(t);
                }
            }
        } else {
            if ctx.is_zero(a) {
                return Outcome::done(a);
            }
            if let Some(x) = is_x_minus_one(ctx, a) {
                if x == b {
                    return Outcome::done(a);
                }
            }
        }
        if hi {
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::UremI, &[a, b]);
            return Outcome::done(t);
        }
        self.div_case_split(ctx, a, b, Op::Urem0, Op::UremI)
    }

    pub(crate) fn mk_srem(
        &mut self,
        ctx: &mut Context,
        a: TermId,
        b: TermId,
        hi: bool,
        internal: bool,
    ) -> Outcome {
        if let Some((r2, sz)) = ctx.numeral(b) {
            if r2.is_zero() {
                if !hi {
                    let t = ctx.mk_app(Op::Srem0, &[a]);
                    return Outcome::done(t);
                }
                return Outcome::done(a);
            }
            let r2s = numeral::to_signed(&r2, sz);
            if r2s.is_one() {
                let t = ctx.zero(sz);
                return Outcome::done(t);
            }
            if let Some((r1, _)) = ctx.numeral(a) {
                let r1s = numeral::to_signed(&r1, sz);
                let r = r1s % r2s; // truncating remainder, sign of the dividend
                let t = ctx.mk_numeral(numeral::from_signed(&r, sz), sz);
                return Outcome::done(t);
            }
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::SremI, &[a, b]);
            return Outcome::done(t);
        }
        if hi {
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::SremI, &[a, b]);
            return Outcome::done(t);
        }
        self.div_case_split(ctx, a, b, Op::Srem0, Op::SremI)
    }

    pub(crate) fn mk_smod(
        &mut self,
        ctx: &mut Context,
        a: TermId,
        b: TermId,
        hi: bool,
        internal: bool,
    ) -> Outcome {
        // 0 smod b coincides with 0 urem b for every b, including zero
        if ctx.is_zero(a) {
            let t = ctx.mk_app(Op::Urem, &[a, b]);
            return Outcome::rw1(t);
        }
        if let Some((r2, sz)) = ctx.numeral(b) {
            if r2.is_zero() {
                if !hi {
                    let t = ctx.mk_app(Op::Smod0, &[a]);
                    return Outcome::done(t);
                }
                return Outcome::done(a);
            }
            let r2s = numeral::to_signed(&r2, sz);
            if let Some((r1, _)) = ctx.numeral(a) {
                let r1s = numeral::to_signed(&r1, sz);
                let u = r1s.abs() % r2s.abs();
                // the result takes the sign of the divisor
                let r: BigInt = if u.is_zero() {
                    BigInt::zero()
                } else if r1s.is_positive() && r2s.is_positive() {
                    u
                } else if r1s.is_negative() && r2s.is_positive() {
                    -&u + &r2s
                } else if r1s.is_positive() && r2s.is_negative() {
                    &u + &r2s
                } else {
                    -u
                };
                let t = ctx.mk_numeral(numeral::from_signed(&r, sz), sz);
                return Outcome::done(t);
            }
            if r2s.is_one() {
                let t = ctx.zero(sz);
                return Outcome::rw2(t);
            }
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::SmodI, &[a, b]);
            return Outcome::done(t);
        }
        if hi {
            if internal {
                return Outcome::NoRule;
            }
            let t = ctx.mk_app(Op::SmodI, &[a, b]);
            return Outcome::done(t);
        }
        self.div_case_split(ctx, a, b, Op::Smod0, Op::SmodI)
    }

    /// `(ite (= b 0) (witness a) (internal a b))` for symbolic divisors
    /// outside the hardware interpretation.
    fn div_case_split(
        &mut self,
        ctx: &mut Context,
        a: TermId,
        b: TermId,
        witness: Op,
        internal: Op,
    ) -> Outcome {
        let sz = ctx.width(b);
        let zero = ctx.zero(sz);
        let cond = ctx.mk_eq(b, zero);
        let undef = ctx.mk_app(witness, &[a]);
        let defined = ctx.mk_app(internal, &[a, b]);
        let t = ctx.mk_ite(cond, undef, defined);
        Outcome::rw2(t)
    }
}
