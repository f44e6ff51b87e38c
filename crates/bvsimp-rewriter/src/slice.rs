// SPDX-License-Identifier: AGPL-3.0

//! Structural rules: extraction, concatenation, extensions, repetition.

use bvsimp_term::{numeral, Context, Op, TermId, WidthInt};

use crate::{Outcome, Rewriter};

impl Rewriter {
    pub(crate) fn mk_extract(
        &mut self,
        ctx: &mut Context,
        high: WidthInt,
        low: WidthInt,
        arg: TermId,
    ) -> Outcome {
        let sz = ctx.width(arg);
        if low == 0 && high == sz - 1 {
            return Outcome::done(arg);
        }
        if let Some((v, _)) = ctx.numeral(arg) {
            let sliced = (v >> low) & numeral::mask(high - low + 1);
            let t = ctx.mk_numeral(sliced, high - low + 1);
            return Outcome::done(t);
        }
        let (op, args) = match ctx.app(arg) {
            Some((op, args)) => (op, args.to_vec()),
            None => return Outcome::NoRule,
        };
        match op {
            // compose nested extractions
            Op::Extract { low: l2, .. } => {
                let t = self.extract(ctx, high + l2, low + l2, args[0]);
                return Outcome::done(t);
            }
            Op::Concat => return self.extract_of_concat(ctx, high, low, &args),
            // extraction distributes over pointwise bitwise operators, and
            // over add/mul when the low bits are kept
            Op::Not | Op::Or | Op::Xor => {
                let new_args: Vec<_> = args
                    .iter()
                    .map(|&a| self.extract(ctx, high, low, a))
                    .collect();
                let t = ctx.mk_app(op, &new_args);
                return Outcome::rw2(t);
            }
            Op::Add | Op::Mul if low == 0 => {
                let new_args: Vec<_> = args
                    .iter()
                    .map(|&a| self.extract(ctx, high, 0, a))
                    .collect();
                let t = ctx.mk_app(op, &new_args);
                return Outcome::rw2(t);
            }
            Op::Ite => {
                let then = self.extract(ctx, high, low, args[1]);
                let els = self.extract(ctx, high, low, args[2]);
                let t = ctx.mk_ite(args[0], then, els);
                return Outcome::rw2(t);
            }
            _ => {}
        }
        Outcome::NoRule
    }

    /// Narrow an extraction into the components of a concatenation.
    /// `idx` tracks the bit position of the current component's low end,
    /// walking most-significant first.
    fn extract_of_concat(
        &mut self,
        ctx: &mut Context,
        high: WidthInt,
        low: WidthInt,
        args: &[TermId],
    ) -> Outcome {
        let mut idx = ctx.width(args[0]) + args[1..].iter().map(|&a| ctx.width(a)).sum::<WidthInt>();
        for (i, &curr) in args.iter().enumerate() {
            let curr_sz = ctx.width(curr);
            idx -= curr_sz;
            if idx > high {
                continue;
            }
            if idx <= low {
                // the whole range lies inside this component
                if low == idx && high - idx == curr_sz - 1 {
                    return Outcome::done(curr);
                }
                let t = self.extract(ctx, high - idx, low - idx, curr);
                return Outcome::rw1(t);
            }
            // the range spans this component and at least one more
            let mut new_args = Vec::new();
            let mut used_extract = false;
            if high - idx == curr_sz - 1 {
                new_args.push(curr);
            } else {
                used_extract = true;
                new_args.push(self.extract(ctx, high - idx, 0, curr));
            }
            for &next in &args[i + 1..] {
                let next_sz = ctx.width(next);
                idx -= next_sz;
                if idx > low {
                    new_args.push(next);
                    continue;
                }
                if idx == low {
                    new_args.push(next);
                    let t = ctx.mk_concat(&new_args);
                    return if used_extract {
                        Outcome::rw2(t)
                    } else {
                        Outcome::done(t)
                    };
                }
                new_args.push(self.extract(ctx, next_sz - 1, low - idx, next));
                let t = ctx.mk_concat(&new_args);
                return Outcome::rw2(t);
            }
            unreachable!("extract range exceeds concat width");
        }
        unreachable!("extract range exceeds concat width");
    }

    /// One left-to-right pass fusing adjacent numerals, flattening nested
    /// concatenations, and merging adjacent extractions of the same base.
    pub(crate) fn mk_concat(&mut self, ctx: &mut Context, args: &[TermId]) -> Outcome {
        let mut new_args: Vec<TermId> = Vec::with_capacity(args.len());
        let mut fused_numeral = false;
        let mut expanded = false;
        let mut fused_extract = false;
        for &arg in args {
            let prev = new_args.last().copied();
            if let Some((v1, sz1)) = ctx.numeral(arg) {
                if let Some((v2, sz2)) = prev.and_then(|p| ctx.numeral(p)) {
                    new_args.pop();
                    let fused = (v2 << sz1) | v1;
                    new_args.push(ctx.mk_numeral(fused, sz1 + sz2));
                    fused_numeral = true;
                    continue;
                }
                new_args.push(arg);
                continue;
            }
            if self.cfg.flat && ctx.is_app_of(arg, Op::Concat) {
                let inner = ctx.app(arg).map(|(_, a)| a.to_vec()).unwrap_or_default();
                new_args.extend(inner);
                expanded = true;
                continue;
            }
            if let (Some((Op::Extract { high: h2, low: l2 }, inner)), Some(p)) =
                (ctx.app(arg), prev)
            {
                let base = inner[0];
                if let Some((Op::Extract { high: h1, low: l1 }, pinner)) = ctx.app(p) {
                    if pinner[0] == base && l1 == h2 + 1 {
                        new_args.pop();
                        let merged = self.extract(ctx, h1, l2, base);
                        new_args.push(merged);
                        fused_extract = true;
                        continue;
                    }
                }
            }
            new_args.push(arg);
        }
        if !fused_numeral && !expanded && !fused_extract {
            return Outcome::NoRule;
        }
        if new_args.len() == 1 {
            return if fused_extract {
                Outcome::rw1(new_args[0])
            } else {
                Outcome::done(new_args[0])
            };
        }
        let t = ctx.mk_app(Op::Concat, &new_args);
        if fused_extract {
            Outcome::rw2(t)
        } else if expanded {
            Outcome::rw1(t)
        } else {
            Outcome::done(t)
        }
    }

    pub(crate) fn mk_zero_extend(&mut self, ctx: &mut Context, n: WidthInt, arg: TermId) -> Outcome {
        if n == 0 {
            return Outcome::done(arg);
        }
        if let Some((v, sz)) = ctx.numeral(arg) {
            let t = ctx.mk_numeral(v, sz + n);
            return Outcome::done(t);
        }
        let pad = ctx.zero(n);
        let t = ctx.mk_app(Op::Concat, &[pad, arg]);
        Outcome::rw1(t)
    }

    pub(crate) fn mk_sign_extend(&mut self, ctx: &mut Context, n: WidthInt, arg: TermId) -> Outcome {
        if n == 0 {
            return Outcome::done(arg);
        }
        if let Some((v, sz)) = ctx.numeral(arg) {
            let signed = numeral::to_signed(&v, sz);
            let wide = numeral::from_signed(&signed, sz + n);
            let t = ctx.mk_numeral(wide, sz + n);
            return Outcome::done(t);
        }
        if self.cfg.elim_sign_ext {
            let sz = ctx.width(arg);
            let sign = self.extract(ctx, sz - 1, sz - 1, arg);
            let mut parts = vec![sign; n as usize];
            parts.push(arg);
            let t = ctx.mk_app(Op::Concat, &parts);
            return Outcome::rw2(t);
        }
        Outcome::NoRule
    }

    pub(crate) fn mk_repeat(&mut self, ctx: &mut Context, n: WidthInt, arg: TermId) -> Outcome {
        if n == 1 {
            return Outcome::done(arg);
        }
        let parts = vec![arg; n as usize];
        let t = ctx.mk_app(Op::Concat, &parts);
        Outcome::rw1(t)
    }
}
