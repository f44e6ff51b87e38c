// SPDX-License-Identifier: AGPL-3.0

//! Conversions between bit-vectors, integers, and boolean tuples.

use num_bigint::BigInt;

use bvsimp_term::{numeral, Context, Op, TermData, TermId, WidthInt};

use crate::{Outcome, Rewriter};

impl Rewriter {
    pub(crate) fn mk_bv2int(&mut self, ctx: &mut Context, arg: TermId) -> Outcome {
        if let Some((v, _)) = ctx.numeral(arg) {
            // the unsigned reading
            let t = ctx.mk_int(BigInt::from(v));
            return Outcome::done(t);
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_int2bv(&mut self, ctx: &mut Context, n: WidthInt, arg: TermId) -> Outcome {
        if let TermData::IntVal(v) = ctx.get(arg) {
            let value = numeral::from_signed(&v.clone(), n);
            let t = ctx.mk_numeral(value, n);
            return Outcome::done(t);
        }
        if let Some((Op::Bv2Int, inner)) = ctx.app(arg) {
            let x = inner[0];
            if ctx.width(x) == n {
                return Outcome::done(x);
            }
        }
        Outcome::NoRule
    }

    /// `(mkbv b0 .. b(n-1))` over literal booleans folds to a numeral,
    /// least significant bit first.
    pub(crate) fn mk_mkbv(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        if !self.cfg.mkbv2num {
            return Outcome::NoRule;
        }
        let mut value = num_bigint::BigUint::default();
        for (i, &a) in args.iter().enumerate() {
            match ctx.get(a) {
                TermData::True => value.set_bit(i as u64, true),
                TermData::False => {}
                _ => return Outcome::NoRule,
            }
        }
        let t = ctx.mk_numeral(value, args.len() as WidthInt);
        Outcome::done(t)
    }
}
