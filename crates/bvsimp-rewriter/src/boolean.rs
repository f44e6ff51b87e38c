// SPDX-License-Identifier: AGPL-3.0

//! Bitwise boolean rules. `or` and `xor` are the worker operators; `and`,
//! `nand`, `nor`, and `xnor` are expressed through them by De Morgan
//! rewrites so complement merging and numeral folding happen in one place.

use std::collections::HashSet;

use num_bigint::BigUint;
use num_traits::Zero;

use bvsimp_term::{numeral, Context, Op, TermId};

use crate::bits::is_zero_bit;
use crate::{Outcome, Rewriter};

/// Splice the arguments of nested applications of `op` into one list.
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

fn is_sorted(args: &[TermId]) -> bool {
    args.windows(2).all(|w| w[0] <= w[1])
}

impl Rewriter {
    pub(crate) fn mk_bv_or(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        if args.len() == 1 {
            return Outcome::done(args[0]);
        }
        let sz = ctx.width(args[0]);
        let mut flattened = false;
        let work: Vec<TermId> = if self.cfg.flat {
            match flatten(ctx, Op::Or, args) {
                Some(flat) => {
                    flattened = true;
                    flat
                }
                None => args.to_vec(),
            }
        } else {
            args.to_vec()
        };

        let mut v1 = BigUint::zero();
        let mut num_coeffs = 0usize;
        let mut pos: HashSet<TermId> = HashSet::new();
        let mut neg: HashSet<TermId> = HashSet::new();
        let mut new_args: Vec<TermId> = Vec::with_capacity(work.len());
        let mut merged = false;
        for &arg in &work {
            if let Some((v2, _)) = ctx.numeral(arg) {
                v1 |= v2;
                num_coeffs += 1;
                continue;
            }
            if let Some((Op::Not, inner)) = ctx.app(arg) {
                let atom = inner[0];
                if pos.contains(&atom) {
                    // x | !x
                    let t = ctx.ones(sz);
                    return Outcome::done(t);
                }
                if neg.contains(&atom) {
                    merged = true;
                    continue;
                }
                neg.insert(atom);
                new_args.push(arg);
            } else {
                if pos.contains(&arg) {
                    merged = true;
                    continue;
                }
                if neg.contains(&arg) {
                    let t = ctx.ones(sz);
                    return Outcome::done(t);
                }
                pos.insert(arg);
                new_args.push(arg);
            }
        }
        if v1 == numeral::mask(sz) {
            let t = ctx.mk_numeral(v1, sz);
            return Outcome::done(t);
        }

        // two concatenations covering disjoint bit ranges interleave into
        // a single concatenation of slices
        if new_args.len() == 2
            && num_coeffs == 0
            && ctx.is_app_of(new_args[0], Op::Concat)
            && ctx.is_app_of(new_args[1], Op::Concat)
        {
            let (c1, c2) = (new_args[0], new_args[1]);
            if (0..sz).all(|i| is_zero_bit(ctx, c1, i) || is_zero_bit(ctx, c2, i)) {
                let mut parts = Vec::new();
                let mut j = sz as i64 - 1;
                while j >= 0 {
                    let mut high = j;
                    while j >= 0 && is_zero_bit(ctx, c1, j as u32) {
                        j -= 1;
                    }
                    if j != high {
                        parts.push(self.extract(ctx, high as u32, (j + 1) as u32, c2));
                    }
                    high = j;
                    while j >= 0 && is_zero_bit(ctx, c2, j as u32) {
                        j -= 1;
                    }
                    if j != high {
                        parts.push(self.extract(ctx, high as u32, (j + 1) as u32, c1));
                    }
                }
                let t = ctx.mk_concat(&parts);
                return Outcome::rw2(t);
            }
        }

        // a single residual argument under a partial mask splits into
        // alternating all-ones blocks and slices of the argument
        if !v1.is_zero() && new_args.len() == 1 {
            let t = new_args[0];
            let mut parts = Vec::new();
            let mut low = 0u32;
            let mut i = 0u32;
            while i < sz {
                while i < sz && numeral::bit(&v1, i) {
                    i += 1;
                }
                if i != low {
                    let block = ctx.ones(i - low);
                    parts.push(block);
                    low = i;
                }
                while i < sz && !numeral::bit(&v1, i) {
                    i += 1;
                }
                if i != low {
                    parts.push(self.extract(ctx, i - 1, low, t));
                    low = i;
                }
            }
            parts.reverse();
            let t = ctx.mk_concat(&parts);
            return Outcome::rw2(t);
        }

        let sorted_ok = !self.cfg.bv_sort_ac || is_sorted(&work);
        if !flattened
            && !merged
            && (num_coeffs == 0 || (num_coeffs == 1 && !v1.is_zero()))
            && sorted_ok
        {
            return Outcome::NoRule;
        }
        if !v1.is_zero() {
            new_args.push(ctx.mk_numeral(v1, sz));
        }
        match new_args.len() {
            0 => {
                let t = ctx.zero(sz);
                Outcome::done(t)
            }
            1 => Outcome::done(new_args[0]),
            _ => {
                if self.cfg.bv_sort_ac {
                    new_args.sort_unstable();
                }
                let t = ctx.mk_app(Op::Or, &new_args);
                Outcome::done(t)
            }
        }
    }

    pub(crate) fn mk_bv_xor(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        if args.len() == 1 {
            return Outcome::done(args[0]);
        }
        let sz = ctx.width(args[0]);
        let mut flattened = false;
        let work: Vec<TermId> = if self.cfg.flat {
            match flatten(ctx, Op::Xor, args) {
                Some(flat) => {
                    flattened = true;
                    flat
                }
                None => args.to_vec(),
            }
        } else {
            args.to_vec()
        };

        let mut v1 = BigUint::zero();
        let mut num_coeffs = 0usize;
        let mut pos: HashSet<TermId> = HashSet::new();
        let mut neg: HashSet<TermId> = HashSet::new();
        let mut merged = false;
        for &arg in &work {
            if let Some((v2, _)) = ctx.numeral(arg) {
                v1 ^= v2;
                num_coeffs += 1;
                continue;
            }
            if let Some((Op::Not, inner)) = ctx.app(arg) {
                let atom = inner[0];
                if neg.remove(&atom) {
                    // !x ^ !x
                    merged = true;
                } else if pos.remove(&atom) {
                    // x ^ !x contributes all ones
                    merged = true;
                    v1 ^= numeral::mask(sz);
                } else {
                    neg.insert(atom);
                }
            } else if pos.remove(&arg) {
                merged = true;
            } else if neg.remove(&arg) {
                merged = true;
                v1 ^= numeral::mask(sz);
            } else {
                pos.insert(arg);
            }
        }

        // one residual argument xored with a constant mask: ones in the mask
        // invert the corresponding slice
        if !v1.is_zero() && num_coeffs == work.len() - 1 {
            if let Some(&t) = work.iter().find(|&&a| !ctx.is_numeral(a)) {
                let not_t = ctx.mk_bv_not(t);
                let mut parts = Vec::new();
                let mut low = 0u32;
                let mut i = 0u32;
                while i < sz {
                    while i < sz && numeral::bit(&v1, i) {
                        i += 1;
                    }
                    if i != low {
                        parts.push(self.extract(ctx, i - 1, low, not_t));
                        low = i;
                    }
                    while i < sz && !numeral::bit(&v1, i) {
                        i += 1;
                    }
                    if i != low {
                        parts.push(self.extract(ctx, i - 1, low, t));
                        low = i;
                    }
                }
                parts.reverse();
                let t = ctx.mk_concat(&parts);
                return Outcome::rw3(t);
            }
        }

        let sorted_ok = !self.cfg.bv_sort_ac || is_sorted(&work);
        if !merged
            && !flattened
            && (num_coeffs == 0
                || (num_coeffs == 1 && !v1.is_zero() && v1 != numeral::mask(sz)))
            && sorted_ok
        {
            return Outcome::NoRule;
        }
        let mut new_args: Vec<TermId> = Vec::with_capacity(work.len());
        if !v1.is_zero() {
            new_args.push(ctx.mk_numeral(v1, sz));
        }
        for &arg in &work {
            if ctx.is_numeral(arg) {
                continue;
            }
            if let Some((Op::Not, inner)) = ctx.app(arg) {
                let atom = inner[0];
                if neg.remove(&atom) {
                    new_args.push(arg);
                }
            } else if pos.remove(&arg) {
                new_args.push(arg);
            }
        }
        match new_args.len() {
            0 => {
                let t = ctx.zero(sz);
                Outcome::done(t)
            }
            1 => Outcome::done(new_args[0]),
            2 if ctx.is_allone(new_args[0]) => {
                let t = ctx.mk_bv_not(new_args[1]);
                Outcome::done(t)
            }
            _ => {
                if self.cfg.bv_sort_ac {
                    new_args.sort_unstable();
                }
                let t = ctx.mk_app(Op::Xor, &new_args);
                Outcome::done(t)
            }
        }
    }

    pub(crate) fn mk_bv_not(&mut self, ctx: &mut Context, arg: TermId) -> Outcome {
        if let Some((Op::Not, inner)) = ctx.app(arg) {
            return Outcome::done(inner[0]);
        }
        if let Some((v, sz)) = ctx.numeral(arg) {
            let t = ctx.mk_numeral(v ^ numeral::mask(sz), sz);
            return Outcome::done(t);
        }
        if let Some((Op::Concat, parts)) = ctx.app(arg) {
            let parts = parts.to_vec();
            let negated: Vec<_> = parts.iter().map(|&p| ctx.mk_bv_not(p)).collect();
            let t = ctx.mk_app(Op::Concat, &negated);
            return Outcome::rw2(t);
        }
        if self.cfg.bvnot2arith {
            // !x = -1 - x
            let sz = ctx.width(arg);
            let ones = ctx.ones(sz);
            let t = ctx.mk_sub(ones, arg);
            return Outcome::rw1(t);
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_bv_and(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let negated: Vec<_> = args.iter().map(|&a| ctx.mk_bv_not(a)).collect();
        let or = ctx.mk_bv_or(&negated);
        let t = ctx.mk_bv_not(or);
        Outcome::rw3(t)
    }

    pub(crate) fn mk_bv_nand(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let negated: Vec<_> = args.iter().map(|&a| ctx.mk_bv_not(a)).collect();
        let t = ctx.mk_bv_or(&negated);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_bv_nor(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let or = ctx.mk_bv_or(args);
        let t = ctx.mk_bv_not(or);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_bv_xnor(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let xor = ctx.mk_bv_xor(args);
        let t = ctx.mk_bv_not(xor);
        Outcome::rw2(t)
    }

    pub(crate) fn mk_bv_redor(&mut self, ctx: &mut Context, arg: TermId) -> Outcome {
        if let Some((v, _)) = ctx.numeral(arg) {
            let t = if v.is_zero() { ctx.zero(1) } else { ctx.one(1) };
            return Outcome::done(t);
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_bv_redand(&mut self, ctx: &mut Context, arg: TermId) -> Outcome {
        if let Some((v, sz)) = ctx.numeral(arg) {
            let t = if v == numeral::mask(sz) {
                ctx.one(1)
            } else {
                ctx.zero(1)
            };
            return Outcome::done(t);
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_bv_comp(&mut self, ctx: &mut Context, a: TermId, b: TermId) -> Outcome {
        if a == b {
            let t = ctx.one(1);
            return Outcome::done(t);
        }
        if ctx.is_numeral(a) && ctx.is_numeral(b) {
            // distinct interned numerals are distinct values
            let t = ctx.zero(1);
            return Outcome::done(t);
        }
        let eq = ctx.mk_eq(a, b);
        let one = ctx.one(1);
        let zero = ctx.zero(1);
        let t = ctx.mk_ite(eq, one, zero);
        Outcome::rw2(t)
    }
}
