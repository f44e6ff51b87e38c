// SPDX-License-Identifier: AGPL-3.0

//! Modular arithmetic rules. Sums and products are kept in a light normal
//! form: numerals folded into a single coefficient, placed last in a sum
//! and first in a product; subtraction and negation are expressed through
//! multiplication by minus one.

use std::collections::HashMap;

use num_bigint::BigUint;
use num_traits::{One, Zero};

use bvsimp_term::{numeral, Context, Op, TermId, WidthInt};

use crate::bits::is_zero_bit;
use crate::{Outcome, Revisit, Rewriter};

fn flatten(ctx: &Context, op: Op, args: &[TermId]) -> Option<Vec<TermId>> {
    if !args.iter().any(|&a| ctx.is_app_of(a, op)) {
        return None;
    }
    let mut out = Vec::with_capacity(args.len());
    for &a in args {
        match ctx.app(a) {
            Some((o, inner)) if o == op => out.extend_from_slice(inner),
            _ => out.push(a),
        }
    }
    Some(out)
}

/// Split a sum into its non-numeral terms and the folded constant.
fn split_sum(ctx: &Context, t: TermId, sz: WidthInt) -> (Vec<TermId>, BigUint) {
    let parts: Vec<TermId> = match ctx.app(t) {
        Some((Op::Add, args)) => args.to_vec(),
        _ => vec![t],
    };
    let mut terms = Vec::with_capacity(parts.len());
    let mut constant = BigUint::zero();
    for p in parts {
        if let Some((v, _)) = ctx.numeral(p) {
            constant += v;
        } else {
            terms.push(p);
        }
    }
    (terms, numeral::normalize(constant, sz))
}

fn assemble_sum(ctx: &mut Context, terms: &[TermId], constant: &BigUint, sz: WidthInt) -> TermId {
    if terms.is_empty() {
        return ctx.mk_numeral(constant.clone(), sz);
    }
    if constant.is_zero() {
        return ctx.mk_add(terms);
    }
    let mut all = terms.to_vec();
    all.push(ctx.mk_numeral(constant.clone(), sz));
    ctx.mk_add(&all)
}

/// Remove summands common to both sides of an equation and fold the
/// constants down. Returns the rebuilt sides, or `None` when nothing
/// cancels.
pub(crate) fn cancel_monomials(
    ctx: &mut Context,
    lhs: TermId,
    rhs: TermId,
) -> Option<(TermId, TermId)> {
    let sz = ctx.width(lhs);
    let (l_terms, mut l_const) = split_sum(ctx, lhs, sz);
    let (r_terms, mut r_const) = split_sum(ctx, rhs, sz);

    let mut available: HashMap<TermId, usize> = HashMap::new();
    for &t in &l_terms {
        *available.entry(t).or_insert(0) += 1;
    }
    let mut cancelled: HashMap<TermId, usize> = HashMap::new();
    let mut new_r = Vec::with_capacity(r_terms.len());
    let mut changed = false;
    for t in r_terms {
        match available.get_mut(&t) {
            Some(n) if *n > 0 => {
                *n -= 1;
                *cancelled.entry(t).or_insert(0) += 1;
                changed = true;
            }
            _ => new_r.push(t),
        }
    }
    let mut new_l = Vec::with_capacity(l_terms.len());
    for t in l_terms {
        match cancelled.get_mut(&t) {
            Some(n) if *n > 0 => *n -= 1,
            _ => new_l.push(t),
        }
    }
    // a constant present on both sides cancels as well
    let common = l_const.clone().min(r_const.clone());
    if !common.is_zero() {
        l_const -= &common;
        r_const -= &common;
        changed = true;
    }
    if !changed {
        return None;
    }
    let nl = assemble_sum(ctx, &new_l, &l_const, sz);
    let nr = assemble_sum(ctx, &new_r, &r_const, sz);
    Some((nl, nr))
}

/// `t` as `coeff * x` with a numeral coefficient in front.
pub(crate) fn mul_with_coeff(ctx: &Context, t: TermId) -> Option<(BigUint, TermId)> {
    let (op, args) = ctx.app(t)?;
    if op != Op::Mul || args.len() != 2 {
        return None;
    }
    let (v, _) = ctx.numeral(args[0])?;
    Some((v, args[1]))
}

impl Rewriter {
    fn add_core(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        if args.len() == 1 {
            return Outcome::done(args[0]);
        }
        let sz = ctx.width(args[0]);
        let work: Vec<TermId> = if self.cfg.flat {
            flatten(ctx, Op::Add, args).unwrap_or_else(|| args.to_vec())
        } else {
            args.to_vec()
        };
        // fold numerals and combine like monomials: `x` and `c * x` both
        // contribute to the coefficient of `x`
        let mut sum = BigUint::zero();
        let mut order: Vec<TermId> = Vec::with_capacity(work.len());
        let mut coeffs: HashMap<TermId, BigUint> = HashMap::new();
        for &arg in &work {
            if let Some((v, _)) = ctx.numeral(arg) {
                sum += v;
                continue;
            }
            let (c, base) = match mul_with_coeff(ctx, arg) {
                Some((c, x)) => (c, x),
                None => (BigUint::one(), arg),
            };
            match coeffs.get_mut(&base) {
                Some(acc) => *acc = numeral::normalize(&*acc + c, sz),
                None => {
                    coeffs.insert(base, numeral::normalize(c, sz));
                    order.push(base);
                }
            }
        }
        let sum = numeral::normalize(sum, sz);
        let mut new_args = Vec::with_capacity(order.len() + 1);
        for base in order {
            let c = &coeffs[&base];
            if c.is_zero() {
                continue;
            }
            if c.is_one() {
                new_args.push(base);
            } else {
                let coeff = ctx.mk_numeral(c.clone(), sz);
                new_args.push(ctx.mk_app(Op::Mul, &[coeff, base]));
            }
        }
        if !sum.is_zero() {
            new_args.push(ctx.mk_numeral(sum, sz));
        }
        if new_args == args {
            return Outcome::NoRule;
        }
        match new_args.len() {
            0 => {
                let t = ctx.zero(sz);
                Outcome::done(t)
            }
            1 => Outcome::done(new_args[0]),
            _ => {
                let t = ctx.mk_app(Op::Add, &new_args);
                Outcome::done(t)
            }
        }
    }

    pub(crate) fn mk_add(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let st = self.add_core(ctx, args);
        // when no two summands can carry into the same bit position the sum
        // is just a disjunction
        let work: Vec<TermId> = match st {
            Outcome::NoRule => args.to_vec(),
            Outcome::Simplified {
                term,
                revisit: Revisit::Done,
            } => match ctx.app(term) {
                Some((Op::Add, inner)) => inner.to_vec(),
                _ => return st,
            },
            _ => return st,
        };
        if work.len() < 2 {
            return st;
        }
        let sz = ctx.width(work[0]);
        for i in 0..sz {
            let mut nonzero = 0;
            for &a in &work {
                if !is_zero_bit(ctx, a, i) {
                    nonzero += 1;
                    if nonzero > 1 {
                        return st;
                    }
                }
            }
        }
        let t = ctx.mk_app(Op::Or, &work);
        Outcome::rw1(t)
    }

    fn mul_core(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        if args.len() == 1 {
            return Outcome::done(args[0]);
        }
        let sz = ctx.width(args[0]);
        let mut flattened = false;
        let work: Vec<TermId> = if self.cfg.flat {
            match flatten(ctx, Op::Mul, args) {
                Some(flat) => {
                    flattened = true;
                    flat
                }
                None => args.to_vec(),
            }
        } else {
            args.to_vec()
        };
        let mut product = BigUint::one();
        let mut num_coeffs = 0usize;
        let mut others = Vec::with_capacity(work.len());
        for &arg in &work {
            if let Some((v, _)) = ctx.numeral(arg) {
                product = numeral::normalize(product * v, sz);
                num_coeffs += 1;
            } else {
                others.push(arg);
            }
        }
        if product.is_zero() {
            let t = ctx.zero(sz);
            return Outcome::done(t);
        }
        if product.is_one() {
            // unit coefficients disappear
            if others.is_empty() {
                let t = ctx.one(sz);
                return Outcome::done(t);
            }
            if !flattened && num_coeffs == 0 {
                return Outcome::NoRule;
            }
            return match others.len() {
                1 => Outcome::done(others[0]),
                _ => {
                    let t = ctx.mk_app(Op::Mul, &others);
                    Outcome::done(t)
                }
            };
        }
        if others.is_empty() {
            let t = ctx.mk_numeral(product, sz);
            return Outcome::done(t);
        }
        let canonical = !flattened && num_coeffs == 1 && ctx.is_numeral(work[0]);
        if canonical {
            return Outcome::NoRule;
        }
        let mut new_args = Vec::with_capacity(others.len() + 1);
        new_args.push(ctx.mk_numeral(product, sz));
        new_args.extend(others);
        let t = ctx.mk_app(Op::Mul, &new_args);
        Outcome::done(t)
    }

    pub(crate) fn mk_mul(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let st = self.mul_core(ctx, args);
        if !self.cfg.mul2concat {
            return st;
        }
        let (x, y) = match st {
            Outcome::NoRule if args.len() == 2 => (args[0], args[1]),
            Outcome::Simplified {
                term,
                revisit: Revisit::Done,
            } => match ctx.app(term) {
                Some((Op::Mul, inner)) if inner.len() == 2 => (inner[0], inner[1]),
                _ => return st,
            },
            _ => return st,
        };
        if let Some((v, sz)) = ctx.numeral(x) {
            if let Some(shift) = numeral::power_of_two_shift(&v) {
                if shift >= 1 {
                    // 2^k * y keeps the low bits of y, shifted up
                    let body = self.extract(ctx, sz - shift - 1, 0, y);
                    let pad = ctx.zero(shift);
                    let t = ctx.mk_app(Op::Concat, &[body, pad]);
                    return Outcome::rw2(t);
                }
            }
        }
        st
    }

    pub(crate) fn mk_sub(&mut self, ctx: &mut Context, a: TermId, b: TermId) -> Outcome {
        let sz = ctx.width(a);
        let m1 = ctx.ones(sz);
        let minus_b = ctx.mk_app(Op::Mul, &[m1, b]);
        let t = ctx.mk_app(Op::Add, &[a, minus_b]);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_neg(&mut self, ctx: &mut Context, a: TermId) -> Outcome {
        if let Some((v, sz)) = ctx.numeral(a) {
            let negated = if v.is_zero() {
                v
            } else {
                (BigUint::one() << sz) - v
            };
            let t = ctx.mk_numeral(negated, sz);
            return Outcome::done(t);
        }
        let sz = ctx.width(a);
        let m1 = ctx.ones(sz);
        let t = ctx.mk_app(Op::Mul, &[m1, a]);
        Outcome::rw1(t)
    }
}
