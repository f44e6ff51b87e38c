// SPDX-License-Identifier: AGPL-3.0

//! Structural bit-level queries used across rule families.

use bvsimp_term::{numeral, Context, Op, TermData, TermId, WidthInt};

/// Whether bit `idx` of `t` is statically known to be zero.
///
/// Walks numerals and concatenations iteratively; anything else is
/// conservatively reported as unknown (`false`). No recursion, so deeply
/// nested concatenations cannot overflow the stack.
pub(crate) fn is_zero_bit(ctx: &Context, t: TermId, idx: WidthInt) -> bool {
    let mut t = t;
    let mut idx = idx;
    'outer: loop {
        match ctx.get(t) {
            TermData::Numeral { value, .. } => return !numeral::bit(value, idx),
            TermData::App {
                op: Op::Concat,
                args,
                ..
            } => {
                // components are most-significant first; scan from the low end
                for &part in args.iter().rev() {
                    let w = ctx.width(part);
                    if idx < w {
                        t = part;
                        continue 'outer;
                    }
                    idx -= w;
                }
                unreachable!("bit index out of range of concat");
            }
            _ => return false,
        }
    }
}

/// Matches `x + (2^n - 1)`, i.e. `x - 1` in two's complement, and returns `x`.
pub(crate) fn is_x_minus_one(ctx: &Context, t: TermId) -> Option<TermId> {
    let (op, args) = ctx.app(t)?;
    if op != Op::Add || args.len() != 2 {
        return None;
    }
    if ctx.is_allone(args[0]) {
        Some(args[1])
    } else if ctx.is_allone(args[1]) {
        Some(args[0])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bvsimp_term::Context;

    #[test]
    fn test_zero_bit_of_numeral() {
        let mut ctx = Context::new();
        let n = ctx.mk_numeral_u64(0b0110, 4);
        assert!(is_zero_bit(&ctx, n, 0));
        assert!(!is_zero_bit(&ctx, n, 1));
        assert!(!is_zero_bit(&ctx, n, 2));
        assert!(is_zero_bit(&ctx, n, 3));
    }

    #[test]
    fn test_zero_bit_descends_concat() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 4);
        let z = ctx.zero(4);
        // (concat x 0000): bits 0..4 are zero, bits 4..8 unknown
        let c = ctx.mk_concat(&[x, z]);
        for i in 0..4 {
            assert!(is_zero_bit(&ctx, c, i));
            assert!(!is_zero_bit(&ctx, c, 4 + i));
        }
    }

    #[test]
    fn test_zero_bit_nested_concat() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 2);
        let z2 = ctx.zero(2);
        let inner = ctx.mk_concat(&[z2, x]);
        let n = ctx.mk_numeral_u64(0b10, 2);
        let outer = ctx.mk_concat(&[n, inner]);
        assert!(!is_zero_bit(&ctx, outer, 0)); // x, unknown
        assert!(is_zero_bit(&ctx, outer, 2)); // z2
        assert!(is_zero_bit(&ctx, outer, 3)); // z2
        assert!(is_zero_bit(&ctx, outer, 4)); // low bit of n
        assert!(!is_zero_bit(&ctx, outer, 5)); // high bit of n
    }

    #[test]
    fn test_unknown_term_is_not_zero() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 4);
        assert!(!is_zero_bit(&ctx, x, 0));
    }

    #[test]
    fn test_x_minus_one_pattern() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 8);
        let m1 = ctx.ones(8);
        let t = ctx.mk_app(Op::Add, &[x, m1]);
        assert_eq!(is_x_minus_one(&ctx, t), Some(x));
        let t2 = ctx.mk_app(Op::Add, &[m1, x]);
        assert_eq!(is_x_minus_one(&ctx, t2), Some(x));
        let one = ctx.one(8);
        let t3 = ctx.mk_app(Op::Add, &[x, one]);
        assert_eq!(is_x_minus_one(&ctx, t3), None);
    }
}
