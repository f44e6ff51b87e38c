// SPDX-License-Identifier: AGPL-3.0

//! Concrete evaluation of terms under a variable assignment.
//!
//! The interpreter is deliberately independent of the rewriter: every
//! operator is computed directly from its definition, with the hardware
//! interpretation for division by zero. Divide-by-zero witness applications
//! and unbound variables are reported as exceptions, never panics.

use std::collections::HashMap;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, ToPrimitive, Zero};

use bvsimp_exceptions::{SimpException, SimpResult};
use bvsimp_term::{numeral, Context, Op, TermData, TermId, WidthInt};

/// A concrete value of one of the three sorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    BitVec { value: BigUint, width: WidthInt },
    Int(BigInt),
}

impl Value {
    pub fn bv(value: u64, width: WidthInt) -> Self {
        Value::BitVec {
            value: numeral::normalize(BigUint::from(value), width),
            width,
        }
    }

    fn as_bv(&self) -> SimpResult<(&BigUint, WidthInt)> {
        match self {
            Value::BitVec { value, width } => Ok((value, *width)),
            other => Err(SimpException::Internal(format!(
                "expected bit-vector value, got {other:?}"
            ))),
        }
    }

    fn as_bool(&self) -> SimpResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(SimpException::Internal(format!(
                "expected boolean value, got {other:?}"
            ))),
        }
    }
}

pub type Env = HashMap<TermId, Value>;

/// Evaluate `t` under `env`, which maps variable handles to values.
pub fn eval(ctx: &Context, t: TermId, env: &Env) -> SimpResult<Value> {
    match ctx.get(t) {
        TermData::True => Ok(Value::Bool(true)),
        TermData::False => Ok(Value::Bool(false)),
        TermData::IntVal(v) => Ok(Value::Int(v.clone())),
        TermData::Numeral { value, width } => Ok(Value::BitVec {
            value: value.clone(),
            width: *width,
        }),
        TermData::Var { name, .. } => env
            .get(&t)
            .cloned()
            .ok_or_else(|| SimpException::UnboundVariable(name.clone())),
        TermData::App { op, args, .. } => {
            let vals: Vec<Value> = args
                .iter()
                .map(|&a| eval(ctx, a, env))
                .collect::<SimpResult<_>>()?;
            apply(*op, &vals)
        }
    }
}

fn fold_bv(vals: &[Value], f: impl Fn(BigUint, &BigUint) -> BigUint) -> SimpResult<Value> {
    let (first, width) = vals[0].as_bv()?;
    let mut acc = first.clone();
    for v in &vals[1..] {
        let (v, _) = v.as_bv()?;
        acc = f(acc, v);
    }
    Ok(Value::BitVec {
        value: numeral::normalize(acc, width),
        width,
    })
}

fn signed_pair(vals: &[Value]) -> SimpResult<(BigInt, BigInt, WidthInt)> {
    let (a, w) = vals[0].as_bv()?;
    let (b, _) = vals[1].as_bv()?;
    Ok((numeral::to_signed(a, w), numeral::to_signed(b, w), w))
}

fn bv(value: BigUint, width: WidthInt) -> Value {
    Value::BitVec {
        value: numeral::normalize(value, width),
        width,
    }
}

fn smod_value(a: &BigInt, b: &BigInt) -> BigInt {
    let u = a.abs() % b.abs();
    if u.is_zero() {
        BigInt::zero()
    } else if a.is_positive() && b.is_positive() {
        u
    } else if a.is_negative() && b.is_positive() {
        -&u + b
    } else if a.is_positive() && b.is_negative() {
        &u + b
    } else {
        -u
    }
}

fn shift_amount(v: &BigUint, width: WidthInt) -> Option<u32> {
    if *v >= BigUint::from(width) {
        None
    } else {
        v.to_u32()
    }
}

fn apply(op: Op, vals: &[Value]) -> SimpResult<Value> {
    use Op::*;
    match op {
        Bit0 => Ok(Value::bv(0, 1)),
        Bit1 => Ok(Value::bv(1, 1)),
        Add => fold_bv(vals, |a, b| a + b),
        Mul => fold_bv(vals, |a, b| a * b),
        Sub => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            let modulus = BigUint::one() << w;
            Ok(bv(a + modulus - b, w))
        }
        Neg => {
            let (a, w) = vals[0].as_bv()?;
            let modulus = BigUint::one() << w;
            Ok(bv(modulus - a, w))
        }
        Udiv | UdivI => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            if b.is_zero() {
                Ok(bv(numeral::mask(w), w))
            } else {
                Ok(bv(a / b, w))
            }
        }
        Urem | UremI => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            if b.is_zero() {
                Ok(bv(a.clone(), w))
            } else {
                Ok(bv(a % b, w))
            }
        }
        Sdiv | SdivI => {
            let (a, b, w) = signed_pair(vals)?;
            if b.is_zero() {
                let r = if a.is_negative() {
                    BigInt::one()
                } else {
                    BigInt::from(-1)
                };
                Ok(bv(numeral::from_signed(&r, w), w))
            } else {
                Ok(bv(numeral::from_signed(&(a / b), w), w))
            }
        }
        Srem | SremI => {
            let (a, b, w) = signed_pair(vals)?;
            if b.is_zero() {
                Ok(bv(numeral::from_signed(&a, w), w))
            } else {
                Ok(bv(numeral::from_signed(&(a % b), w), w))
            }
        }
        Smod | SmodI => {
            let (a, b, w) = signed_pair(vals)?;
            if b.is_zero() {
                Ok(bv(numeral::from_signed(&a, w), w))
            } else {
                Ok(bv(numeral::from_signed(&smod_value(&a, &b), w), w))
            }
        }
        Udiv0 | Sdiv0 | Urem0 | Srem0 | Smod0 => Err(SimpException::Uninterpreted(format!(
            "divide-by-zero witness {op:?}"
        ))),
        Shl => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            match shift_amount(b, w) {
                Some(k) => Ok(bv(a << k, w)),
                None => Ok(Value::bv(0, w)),
            }
        }
        Lshr => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            match shift_amount(b, w) {
                Some(k) => Ok(bv(a >> k, w)),
                None => Ok(Value::bv(0, w)),
            }
        }
        Ashr => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            let sign = numeral::has_sign_bit(a, w);
            match shift_amount(b, w) {
                Some(k) => {
                    let mut r = a >> k;
                    if sign {
                        r |= numeral::mask(w) ^ numeral::mask(w - k);
                    }
                    Ok(bv(r, w))
                }
                None => {
                    if sign {
                        Ok(bv(numeral::mask(w), w))
                    } else {
                        Ok(Value::bv(0, w))
                    }
                }
            }
        }
        Concat => {
            let mut value = BigUint::zero();
            let mut width = 0;
            for v in vals {
                let (v, w) = v.as_bv()?;
                value = (value << w) | v;
                width += w;
            }
            Ok(Value::BitVec { value, width })
        }
        Extract { high, low } => {
            let (a, _) = vals[0].as_bv()?;
            Ok(bv((a >> low) & numeral::mask(high - low + 1), high - low + 1))
        }
        Repeat(n) => {
            let (a, w) = vals[0].as_bv()?;
            let mut value = BigUint::zero();
            for _ in 0..n {
                value = (value << w) | a;
            }
            Ok(Value::BitVec {
                value,
                width: w * n,
            })
        }
        ZeroExt(n) => {
            let (a, w) = vals[0].as_bv()?;
            Ok(Value::BitVec {
                value: a.clone(),
                width: w + n,
            })
        }
        SignExt(n) => {
            let (a, w) = vals[0].as_bv()?;
            let s = numeral::to_signed(a, w);
            Ok(bv(numeral::from_signed(&s, w + n), w + n))
        }
        RotateLeft(n) => {
            let (a, w) = vals[0].as_bv()?;
            Ok(rotate_left_value(a, w, n))
        }
        RotateRight(n) => {
            let (a, w) = vals[0].as_bv()?;
            Ok(rotate_left_value(a, w, w - (n % w)))
        }
        ExtRotateLeft => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            let k = (b % BigUint::from(w)).to_u32().unwrap_or(0);
            Ok(rotate_left_value(a, w, k))
        }
        ExtRotateRight => {
            let (a, w) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            let k = (b % BigUint::from(w)).to_u32().unwrap_or(0);
            Ok(rotate_left_value(a, w, w - k))
        }
        Or => fold_bv(vals, |a, b| a | b),
        Xor => fold_bv(vals, |a, b| a ^ b),
        And => fold_bv(vals, |a, b| a & b),
        Not => {
            let (a, w) = vals[0].as_bv()?;
            Ok(bv(a ^ numeral::mask(w), w))
        }
        Nand => {
            let v = fold_bv(vals, |a, b| a & b)?;
            let (a, w) = v.as_bv()?;
            Ok(bv(a ^ numeral::mask(w), w))
        }
        Nor => {
            let v = fold_bv(vals, |a, b| a | b)?;
            let (a, w) = v.as_bv()?;
            Ok(bv(a ^ numeral::mask(w), w))
        }
        Xnor => {
            let v = fold_bv(vals, |a, b| a ^ b)?;
            let (a, w) = v.as_bv()?;
            Ok(bv(a ^ numeral::mask(w), w))
        }
        RedOr => {
            let (a, _) = vals[0].as_bv()?;
            Ok(Value::bv(u64::from(!a.is_zero()), 1))
        }
        RedAnd => {
            let (a, w) = vals[0].as_bv()?;
            Ok(Value::bv(u64::from(*a == numeral::mask(w)), 1))
        }
        Comp => {
            let (a, _) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            Ok(Value::bv(u64::from(a == b), 1))
        }
        Ule => {
            let (a, _) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            Ok(Value::Bool(a <= b))
        }
        Ult => {
            let (a, _) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            Ok(Value::Bool(a < b))
        }
        Uge => {
            let (a, _) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            Ok(Value::Bool(a >= b))
        }
        Ugt => {
            let (a, _) = vals[0].as_bv()?;
            let (b, _) = vals[1].as_bv()?;
            Ok(Value::Bool(a > b))
        }
        Sle => {
            let (a, b, _) = signed_pair(vals)?;
            Ok(Value::Bool(a <= b))
        }
        Slt => {
            let (a, b, _) = signed_pair(vals)?;
            Ok(Value::Bool(a < b))
        }
        Sge => {
            let (a, b, _) = signed_pair(vals)?;
            Ok(Value::Bool(a >= b))
        }
        Sgt => {
            let (a, b, _) = signed_pair(vals)?;
            Ok(Value::Bool(a > b))
        }
        Eq => Ok(Value::Bool(vals[0] == vals[1])),
        Ite => {
            if vals[0].as_bool()? {
                Ok(vals[1].clone())
            } else {
                Ok(vals[2].clone())
            }
        }
        BoolAnd => Ok(Value::Bool(
            vals.iter()
                .map(|v| v.as_bool())
                .collect::<SimpResult<Vec<_>>>()?
                .into_iter()
                .all(|b| b),
        )),
        BoolOr => Ok(Value::Bool(
            vals.iter()
                .map(|v| v.as_bool())
                .collect::<SimpResult<Vec<_>>>()?
                .into_iter()
                .any(|b| b),
        )),
        BoolNot => Ok(Value::Bool(!vals[0].as_bool()?)),
        BoolXor => {
            let mut acc = false;
            for v in vals {
                acc ^= v.as_bool()?;
            }
            Ok(Value::Bool(acc))
        }
        Bv2Int => {
            let (a, _) = vals[0].as_bv()?;
            Ok(Value::Int(BigInt::from(a.clone())))
        }
        Int2Bv(n) => match &vals[0] {
            Value::Int(v) => Ok(bv(numeral::from_signed(v, n), n)),
            other => Err(SimpException::Internal(format!(
                "expected integer value, got {other:?}"
            ))),
        },
        MkBv => {
            let mut value = BigUint::zero();
            for (i, v) in vals.iter().enumerate() {
                if v.as_bool()? {
                    value.set_bit(i as u64, true);
                }
            }
            Ok(Value::BitVec {
                value,
                width: vals.len() as WidthInt,
            })
        }
    }
}

fn rotate_left_value(a: &BigUint, w: WidthInt, n: WidthInt) -> Value {
    let k = n % w;
    if k == 0 {
        return Value::BitVec {
            value: a.clone(),
            width: w,
        };
    }
    let rotated = ((a << k) | (a >> (w - k))) & numeral::mask(w);
    Value::BitVec {
        value: rotated,
        width: w,
    }
}
