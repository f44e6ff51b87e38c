// SPDX-License-Identifier: AGPL-3.0

//! End-to-end checks of the simplifier: directed cases for the headline
//! rules, idempotence, and randomized soundness against the concrete
//! evaluator.

use num_bigint::BigUint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bvsimp_rewriter::driver::Simplifier;
use bvsimp_rewriter::eval::{eval, Env, Value};
use bvsimp_rewriter::{Config, Rewriter};
use bvsimp_term::{numeral, Context, Op, TermId, WidthInt};

fn simplifier() -> Simplifier {
    Simplifier::new(Rewriter::new())
}

fn random_value(rng: &mut StdRng, width: WidthInt) -> Value {
    let mut value = BigUint::default();
    let mut filled = 0;
    while filled < width {
        value = (value << 64u32) | BigUint::from(rng.gen::<u64>());
        filled += 64;
    }
    Value::BitVec {
        value: numeral::normalize(value, width),
        width,
    }
}

/// Expression templates over two variables, exercising every rule family.
fn templates(ctx: &mut Context, x: TermId, y: TermId, width: WidthInt) -> Vec<TermId> {
    let zero = ctx.zero(width);
    let one = ctx.one(width);
    let ones = ctx.ones(width);
    let three = ctx.mk_numeral_u64(3 % (1u64 << width.min(63)), width);
    let mut out = vec![
        ctx.mk_app(Op::Add, &[x, y, three]),
        ctx.mk_app(Op::Add, &[x, zero]),
        ctx.mk_app(Op::Mul, &[three, x, one]),
        ctx.mk_sub(x, y),
        ctx.mk_sub(x, x),
        ctx.mk_app(Op::Neg, &[x]),
        ctx.mk_app(Op::Or, &[x, zero, y]),
        ctx.mk_app(Op::And, &[x, ones]),
        ctx.mk_app(Op::Xor, &[x, x, y]),
        ctx.mk_app(Op::Not, &[x]),
        ctx.mk_app(Op::Nand, &[x, y]),
        ctx.mk_app(Op::Nor, &[x, y]),
        ctx.mk_app(Op::Xnor, &[x, y]),
        ctx.mk_app(Op::RedOr, &[x]),
        ctx.mk_app(Op::RedAnd, &[x]),
        ctx.mk_app(Op::Comp, &[x, y]),
        ctx.mk_app(Op::Shl, &[x, one]),
        ctx.mk_app(Op::Lshr, &[x, three]),
        ctx.mk_app(Op::Ashr, &[x, one]),
        ctx.mk_app(Op::Shl, &[x, y]),
        ctx.mk_app(Op::Udiv, &[x, three]),
        ctx.mk_app(Op::Urem, &[x, three]),
        ctx.mk_app(Op::Sdiv, &[x, one]),
        ctx.mk_app(Op::Srem, &[x, three]),
        ctx.mk_app(Op::Smod, &[x, three]),
        ctx.mk_app(Op::Udiv, &[x, zero]),
        ctx.mk_app(Op::Concat, &[x, y]),
        ctx.mk_app(Op::Repeat(2), &[x]),
        ctx.mk_app(Op::ZeroExt(3), &[x]),
        ctx.mk_app(Op::SignExt(3), &[x]),
        ctx.mk_app(Op::RotateLeft(1), &[x]),
        ctx.mk_app(Op::RotateRight(2), &[x]),
    ];
    if width > 1 {
        let hi = ctx.mk_extract(width - 1, width / 2, x);
        let lo = ctx.mk_extract(width / 2 - 1, 0, x);
        out.push(ctx.mk_app(Op::Concat, &[hi, lo]));
        out.push(ctx.mk_extract(width - 1, 1, x));
    }
    let ule = ctx.mk_ule(x, y);
    let sle = ctx.mk_sle(x, three);
    let eqn = ctx.mk_eq(x, y);
    let ite = ctx.mk_ite(ule, x, y);
    out.extend([ule, sle, eqn, ite]);
    out.push(ctx.mk_ule(x, zero));
    out.push(ctx.mk_sle(x, ones));
    out
}

#[test]
fn test_randomized_soundness() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for width in [1u32, 4, 8, 64, 100] {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", width);
        let y = ctx.mk_bv_var("y", width);
        let terms = templates(&mut ctx, x, y, width);
        let mut s = simplifier();
        let simplified: Vec<TermId> =
            terms.iter().map(|&t| s.simplify(&mut ctx, t)).collect();
        for _ in 0..50 {
            let mut env = Env::new();
            env.insert(x, random_value(&mut rng, width));
            env.insert(y, random_value(&mut rng, width));
            for (&before, &after) in terms.iter().zip(&simplified) {
                let lhs = eval(&ctx, before, &env).unwrap();
                let rhs = eval(&ctx, after, &env).unwrap();
                assert_eq!(
                    lhs, rhs,
                    "width {width}: {:?} and {:?} disagree",
                    ctx.get(before),
                    ctx.get(after)
                );
            }
        }
    }
}

#[test]
fn test_simplification_is_idempotent() {
    let mut ctx = Context::new();
    let x = ctx.mk_bv_var("x", 8);
    let y = ctx.mk_bv_var("y", 8);
    let terms = templates(&mut ctx, x, y, 8);
    let mut s = simplifier();
    for t in terms {
        let once = s.simplify(&mut ctx, t);
        let mut fresh = simplifier();
        let twice = fresh.simplify(&mut ctx, once);
        assert_eq!(once, twice, "not a fixpoint: {:?}", ctx.get(once));
    }
}

#[test]
fn test_constant_shift() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let v = ctx.mk_numeral_u64(0b0110, 4);
    let one = ctx.one(4);
    let t = ctx.mk_app(Op::Shl, &[v, one]);
    let expected = ctx.mk_numeral_u64(0b1100, 4);
    assert_eq!(s.simplify(&mut ctx, t), expected);
}

#[test]
fn test_division_by_zero_policy() {
    let mut ctx = Context::new();
    let x = ctx.mk_bv_var("x", 8);
    let zero = ctx.zero(8);
    let t = ctx.mk_app(Op::Udiv, &[x, zero]);

    // hardware interpretation: x udiv 0 is all-ones
    let mut hard = Simplifier::new(Rewriter::with_config(Config {
        hi_div0: true,
        ..Default::default()
    }));
    let ones = ctx.ones(8);
    assert_eq!(hard.simplify(&mut ctx, t), ones);

    // underspecified interpretation: replaced by the witness application
    let mut soft = Simplifier::new(Rewriter::with_config(Config {
        hi_div0: false,
        ..Default::default()
    }));
    let witness = ctx.mk_app(Op::Udiv0, &[x]);
    assert_eq!(soft.simplify(&mut ctx, t), witness);
}

#[test]
fn test_slice_reassembly() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let x = ctx.mk_bv_var("x", 8);
    let hi = ctx.mk_extract(7, 4, x);
    let lo = ctx.mk_extract(3, 0, x);
    let t = ctx.mk_app(Op::Concat, &[hi, lo]);
    assert_eq!(s.simplify(&mut ctx, t), x);
}

#[test]
fn test_extract_of_concat_selects_component() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let x = ctx.mk_bv_var("x", 4);
    let y = ctx.mk_bv_var("y", 4);
    let cat = ctx.mk_app(Op::Concat, &[x, y]);
    let upper = ctx.mk_extract(7, 4, cat);
    assert_eq!(s.simplify(&mut ctx, upper), x);
    let lower = ctx.mk_extract(3, 0, cat);
    assert_eq!(s.simplify(&mut ctx, lower), y);
}

#[test]
fn test_bitwise_identities() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let x = ctx.mk_bv_var("x", 8);
    let zero = ctx.zero(8);
    let ones = ctx.ones(8);

    let or0 = ctx.mk_app(Op::Or, &[x, zero]);
    assert_eq!(s.simplify(&mut ctx, or0), x);

    let and1 = ctx.mk_app(Op::And, &[x, ones]);
    assert_eq!(s.simplify(&mut ctx, and1), x);

    let xorx = ctx.mk_app(Op::Xor, &[x, x]);
    assert_eq!(s.simplify(&mut ctx, xorx), zero);

    let notnot = ctx.mk_app(Op::Not, &[x]);
    let notnot = ctx.mk_app(Op::Not, &[notnot]);
    assert_eq!(s.simplify(&mut ctx, notnot), x);
}

#[test]
fn test_linear_equation_is_solved() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let x = ctx.mk_bv_var("x", 8);
    let three = ctx.mk_numeral_u64(3, 8);
    let six = ctx.mk_numeral_u64(6, 8);
    // 3x = 6 has the unique solution x = 2 since 3 is odd
    let lhs = ctx.mk_app(Op::Mul, &[three, x]);
    let t = ctx.mk_eq(lhs, six);
    let two = ctx.mk_numeral_u64(2, 8);
    let expected = ctx.mk_eq(x, two);
    assert_eq!(s.simplify(&mut ctx, t), expected);
}

#[test]
fn test_unsigned_bounds_collapse() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let x = ctx.mk_bv_var("x", 8);
    let zero = ctx.zero(8);
    let ones = ctx.ones(8);

    let le_zero = ctx.mk_ule(x, zero);
    let expected = ctx.mk_eq(x, zero);
    assert_eq!(s.simplify(&mut ctx, le_zero), expected);

    let le_max = ctx.mk_ule(x, ones);
    let tt = ctx.mk_true();
    assert_eq!(s.simplify(&mut ctx, le_max), tt);
}

#[test]
fn test_sum_cancellation() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    let x = ctx.mk_bv_var("x", 8);
    let y = ctx.mk_bv_var("y", 8);
    // (x + y) - (y + x) = 0
    let a = ctx.mk_app(Op::Add, &[x, y]);
    let b = ctx.mk_app(Op::Add, &[y, x]);
    let diff = ctx.mk_sub(a, b);
    let zero = ctx.zero(8);
    assert_eq!(s.simplify(&mut ctx, diff), zero);
}

#[test]
fn test_signed_remainder_signs() {
    let mut ctx = Context::new();
    let mut s = simplifier();
    // -7 srem 2 = -1, -7 smod 2 = 1
    let a = ctx.mk_numeral_u64(0xf9, 8);
    let b = ctx.mk_numeral_u64(2, 8);
    let srem = ctx.mk_app(Op::Srem, &[a, b]);
    let smod = ctx.mk_app(Op::Smod, &[a, b]);
    let minus_one = ctx.ones(8);
    let one = ctx.one(8);
    assert_eq!(s.simplify(&mut ctx, srem), minus_one);
    assert_eq!(s.simplify(&mut ctx, smod), one);
}
