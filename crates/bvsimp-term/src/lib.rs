// SPDX-License-Identifier: AGPL-3.0

//! Shared immutable term graph for fixed-width bit-vector expressions.
//!
//! Terms live in an arena of hash-consed nodes indexed by [`TermId`]
//! handles; structural equality is handle equality. The arena owns every
//! node for its whole lifetime, so handles are plain `Copy` integers and
//! sharing is free. Nodes are never mutated after interning.

pub mod numeral;

use indexmap::IndexSet;
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use bvsimp_exceptions::{SimpException, SimpResult};

/// Bit-vector widths are kept well below `u32::MAX`.
pub type WidthInt = u32;

/// Sort of a term: boolean, fixed-width bit-vector, or mathematical integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sort {
    Bool,
    BitVec(WidthInt),
    Int,
}

impl Sort {
    pub fn bv_width(&self) -> WidthInt {
        match self {
            Sort::BitVec(w) => *w,
            other => panic!("expected bit-vector sort, got {:?}", other),
        }
    }

    pub fn is_bv(&self) -> bool {
        matches!(self, Sort::BitVec(_))
    }
}

/// Handle into the term arena. Ordering follows creation order, which the
/// rewriter uses as the canonical AC sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u32);

impl TermId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Operator kinds. Static parameters (extract bounds, rotate amounts,
/// extension widths) are carried on the kind itself, so an application is
/// fully described by `(op, args)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // nullary 1-bit constants
    Bit0,
    Bit1,
    // arithmetic
    Add,
    Mul,
    Sub,
    Neg,
    // division family, public forms
    Udiv,
    Sdiv,
    Urem,
    Srem,
    Smod,
    // division family, internal forms (hardware interpretation assumed)
    UdivI,
    SdivI,
    UremI,
    SremI,
    SmodI,
    // divide-by-zero witnesses, applied to the dividend
    Udiv0,
    Sdiv0,
    Urem0,
    Srem0,
    Smod0,
    // shifts
    Shl,
    Lshr,
    Ashr,
    // structure
    Concat,
    Extract { high: WidthInt, low: WidthInt },
    Repeat(WidthInt),
    ZeroExt(WidthInt),
    SignExt(WidthInt),
    RotateLeft(WidthInt),
    RotateRight(WidthInt),
    ExtRotateLeft,
    ExtRotateRight,
    // bitwise
    Or,
    Xor,
    And,
    Not,
    Nand,
    Nor,
    Xnor,
    RedOr,
    RedAnd,
    Comp,
    // comparisons (boolean-sorted)
    Ule,
    Ult,
    Uge,
    Ugt,
    Sle,
    Slt,
    Sge,
    Sgt,
    Eq,
    // control
    Ite,
    // boolean connectives
    BoolAnd,
    BoolOr,
    BoolNot,
    BoolXor,
    // conversions
    Bv2Int,
    Int2Bv(WidthInt),
    MkBv,
}

/// Interned node payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermData {
    True,
    False,
    /// Integer constant (result sort of `bv2int`).
    IntVal(BigInt),
    /// Bit-vector constant, canonical in `[0, 2^width)`.
    Numeral { value: BigUint, width: WidthInt },
    Var { name: String, sort: Sort },
    App { op: Op, sort: Sort, args: Vec<TermId> },
}

/// Arena of interned terms. One instance per simplification worker; not
/// internally synchronized.
#[derive(Default)]
pub struct Context {
    terms: IndexSet<TermData>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, data: TermData) -> TermId {
        let (idx, _) = self.terms.insert_full(data);
        debug_assert!(idx < u32::MAX as usize);
        TermId(idx as u32)
    }

    pub fn get(&self, t: TermId) -> &TermData {
        self.terms
            .get_index(t.index())
            .expect("stale term handle")
    }

    pub fn sort(&self, t: TermId) -> Sort {
        match self.get(t) {
            TermData::True | TermData::False => Sort::Bool,
            TermData::IntVal(_) => Sort::Int,
            TermData::Numeral { width, .. } => Sort::BitVec(*width),
            TermData::Var { sort, .. } => *sort,
            TermData::App { sort, .. } => *sort,
        }
    }

    /// Width of a bit-vector-sorted term. Panics on other sorts.
    pub fn width(&self, t: TermId) -> WidthInt {
        self.sort(t).bv_width()
    }

    // --- leaf constructors ----------------------------------------------

    pub fn mk_true(&mut self) -> TermId {
        self.intern(TermData::True)
    }

    pub fn mk_false(&mut self) -> TermId {
        self.intern(TermData::False)
    }

    pub fn mk_bool(&mut self, b: bool) -> TermId {
        if b {
            self.mk_true()
        } else {
            self.mk_false()
        }
    }

    pub fn mk_int(&mut self, v: BigInt) -> TermId {
        self.intern(TermData::IntVal(v))
    }

    /// Intern a numeral, reducing the value modulo `2^width`.
    pub fn mk_numeral(&mut self, value: BigUint, width: WidthInt) -> TermId {
        assert!(width > 0, "zero-width numeral");
        let value = numeral::normalize(value, width);
        self.intern(TermData::Numeral { value, width })
    }

    pub fn mk_numeral_u64(&mut self, value: u64, width: WidthInt) -> TermId {
        self.mk_numeral(BigUint::from(value), width)
    }

    pub fn zero(&mut self, width: WidthInt) -> TermId {
        self.mk_numeral_u64(0, width)
    }

    pub fn one(&mut self, width: WidthInt) -> TermId {
        self.mk_numeral_u64(1, width)
    }

    /// The all-ones numeral `2^width - 1`.
    pub fn ones(&mut self, width: WidthInt) -> TermId {
        let v = numeral::mask(width);
        self.mk_numeral(v, width)
    }

    pub fn mk_var(&mut self, name: impl Into<String>, sort: Sort) -> TermId {
        self.intern(TermData::Var {
            name: name.into(),
            sort,
        })
    }

    pub fn mk_bv_var(&mut self, name: impl Into<String>, width: WidthInt) -> TermId {
        self.mk_var(name, Sort::BitVec(width))
    }

    // --- applications ---------------------------------------------------

    /// Intern an operator application. Well-formedness (arity, parameter
    /// ranges, operand widths) is the caller's contract; violations panic.
    pub fn mk_app(&mut self, op: Op, args: &[TermId]) -> TermId {
        let sort = self.app_sort(op, args);
        self.intern(TermData::App {
            op,
            sort,
            args: args.to_vec(),
        })
    }

    fn same_width_args(&self, op: Op, args: &[TermId]) -> WidthInt {
        assert!(!args.is_empty(), "{:?}: missing arguments", op);
        let w = self.width(args[0]);
        for &a in &args[1..] {
            assert_eq!(self.width(a), w, "{:?}: operand width mismatch", op);
        }
        w
    }

    fn app_sort(&self, op: Op, args: &[TermId]) -> Sort {
        use Op::*;
        match op {
            Bit0 | Bit1 => {
                assert!(args.is_empty());
                Sort::BitVec(1)
            }
            Add | Mul | Or | Xor | And | Nand | Nor | Xnor => {
                Sort::BitVec(self.same_width_args(op, args))
            }
            Sub | Udiv | Sdiv | Urem | Srem | Smod | UdivI | SdivI | UremI | SremI | SmodI
            | Shl | Lshr | Ashr | ExtRotateLeft | ExtRotateRight => {
                assert_eq!(args.len(), 2, "{:?}: expected 2 arguments", op);
                Sort::BitVec(self.same_width_args(op, args))
            }
            Neg | Not | Udiv0 | Sdiv0 | Urem0 | Srem0 | Smod0 => {
                assert_eq!(args.len(), 1, "{:?}: expected 1 argument", op);
                Sort::BitVec(self.width(args[0]))
            }
            Concat => {
                assert!(args.len() >= 2, "concat: expected at least 2 arguments");
                Sort::BitVec(args.iter().map(|&a| self.width(a)).sum())
            }
            Extract { high, low } => {
                assert_eq!(args.len(), 1);
                let w = self.width(args[0]);
                assert!(low <= high && high < w, "extract [{high}:{low}] of width {w}");
                Sort::BitVec(high - low + 1)
            }
            Repeat(n) => {
                assert_eq!(args.len(), 1);
                assert!(n >= 1);
                Sort::BitVec(self.width(args[0]) * n)
            }
            ZeroExt(n) | SignExt(n) => {
                assert_eq!(args.len(), 1);
                Sort::BitVec(self.width(args[0]) + n)
            }
            RotateLeft(_) | RotateRight(_) => {
                assert_eq!(args.len(), 1);
                Sort::BitVec(self.width(args[0]))
            }
            RedOr | RedAnd => {
                assert_eq!(args.len(), 1);
                let _ = self.width(args[0]);
                Sort::BitVec(1)
            }
            Comp => {
                assert_eq!(args.len(), 2);
                self.same_width_args(op, args);
                Sort::BitVec(1)
            }
            Ule | Ult | Uge | Ugt | Sle | Slt | Sge | Sgt => {
                assert_eq!(args.len(), 2, "{:?}: expected 2 arguments", op);
                self.same_width_args(op, args);
                Sort::Bool
            }
            Eq => {
                assert_eq!(args.len(), 2);
                assert_eq!(self.sort(args[0]), self.sort(args[1]), "eq: sort mismatch");
                Sort::Bool
            }
            Ite => {
                assert_eq!(args.len(), 3);
                assert_eq!(self.sort(args[0]), Sort::Bool, "ite: non-boolean condition");
                assert_eq!(self.sort(args[1]), self.sort(args[2]), "ite: branch sort mismatch");
                self.sort(args[1])
            }
            BoolAnd | BoolOr | BoolXor => {
                assert!(!args.is_empty());
                for &a in args {
                    assert_eq!(self.sort(a), Sort::Bool, "{:?}: non-boolean operand", op);
                }
                Sort::Bool
            }
            BoolNot => {
                assert_eq!(args.len(), 1);
                assert_eq!(self.sort(args[0]), Sort::Bool);
                Sort::Bool
            }
            Bv2Int => {
                assert_eq!(args.len(), 1);
                let _ = self.width(args[0]);
                Sort::Int
            }
            Int2Bv(n) => {
                assert_eq!(args.len(), 1);
                assert_eq!(self.sort(args[0]), Sort::Int);
                assert!(n > 0);
                Sort::BitVec(n)
            }
            MkBv => {
                assert!(!args.is_empty());
                for &a in args {
                    assert_eq!(self.sort(a), Sort::Bool, "mkbv: non-boolean operand");
                }
                Sort::BitVec(args.len() as WidthInt)
            }
        }
    }

    // --- inspection helpers ---------------------------------------------

    /// Numeral value and width, cloned out of the arena.
    pub fn numeral(&self, t: TermId) -> Option<(BigUint, WidthInt)> {
        match self.get(t) {
            TermData::Numeral { value, width } => Some((value.clone(), *width)),
            _ => None,
        }
    }

    pub fn is_numeral(&self, t: TermId) -> bool {
        matches!(self.get(t), TermData::Numeral { .. })
    }

    pub fn is_zero(&self, t: TermId) -> bool {
        matches!(self.get(t), TermData::Numeral { value, .. } if value.is_zero())
    }

    pub fn is_one_value(&self, t: TermId) -> bool {
        matches!(self.get(t), TermData::Numeral { value, .. } if value.is_one())
    }

    /// Whether `t` is the all-ones numeral of its width.
    pub fn is_allone(&self, t: TermId) -> bool {
        match self.get(t) {
            TermData::Numeral { value, width } => *value == numeral::mask(*width),
            _ => false,
        }
    }

    pub fn app(&self, t: TermId) -> Option<(Op, &[TermId])> {
        match self.get(t) {
            TermData::App { op, args, .. } => Some((*op, args.as_slice())),
            _ => None,
        }
    }

    pub fn is_app_of(&self, t: TermId, op: Op) -> bool {
        matches!(self.get(t), TermData::App { op: o, .. } if *o == op)
    }

    /// Numeral value as `u64`, for narrow fast paths.
    pub fn numeral_u64(&self, t: TermId) -> SimpResult<u64> {
        match self.get(t) {
            TermData::Numeral { value, .. } => u64::try_from(value).map_err(|_| {
                SimpException::ValueTooLarge(format!("{value}"))
            }),
            other => Err(SimpException::NotNumeral(format!("{other:?}"))),
        }
    }

    // --- convenience builders -------------------------------------------

    pub fn mk_extract(&mut self, high: WidthInt, low: WidthInt, arg: TermId) -> TermId {
        self.mk_app(Op::Extract { high, low }, &[arg])
    }

    /// N-ary concat; a single component is returned unchanged.
    pub fn mk_concat(&mut self, args: &[TermId]) -> TermId {
        assert!(!args.is_empty());
        if args.len() == 1 {
            args[0]
        } else {
            self.mk_app(Op::Concat, args)
        }
    }

    pub fn mk_eq(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(Op::Eq, &[a, b])
    }

    pub fn mk_ite(&mut self, cond: TermId, then: TermId, els: TermId) -> TermId {
        self.mk_app(Op::Ite, &[cond, then, els])
    }

    pub fn mk_bv_not(&mut self, a: TermId) -> TermId {
        self.mk_app(Op::Not, &[a])
    }

    pub fn mk_bv_or(&mut self, args: &[TermId]) -> TermId {
        assert!(!args.is_empty());
        if args.len() == 1 {
            args[0]
        } else {
            self.mk_app(Op::Or, args)
        }
    }

    pub fn mk_bv_xor(&mut self, args: &[TermId]) -> TermId {
        assert!(!args.is_empty());
        if args.len() == 1 {
            args[0]
        } else {
            self.mk_app(Op::Xor, args)
        }
    }

    pub fn mk_add(&mut self, args: &[TermId]) -> TermId {
        assert!(!args.is_empty());
        if args.len() == 1 {
            args[0]
        } else {
            self.mk_app(Op::Add, args)
        }
    }

    pub fn mk_mul(&mut self, args: &[TermId]) -> TermId {
        assert!(!args.is_empty());
        if args.len() == 1 {
            args[0]
        } else {
            self.mk_app(Op::Mul, args)
        }
    }

    pub fn mk_sub(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(Op::Sub, &[a, b])
    }

    pub fn mk_ule(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(Op::Ule, &[a, b])
    }

    pub fn mk_sle(&mut self, a: TermId, b: TermId) -> TermId {
        self.mk_app(Op::Sle, &[a, b])
    }

    pub fn mk_bool_not(&mut self, a: TermId) -> TermId {
        self.mk_app(Op::BoolNot, &[a])
    }

    /// N-ary boolean and; collapses the empty and singleton cases.
    pub fn mk_bool_and(&mut self, args: &[TermId]) -> TermId {
        match args.len() {
            0 => self.mk_true(),
            1 => args[0],
            _ => self.mk_app(Op::BoolAnd, args),
        }
    }

    pub fn mk_bool_or(&mut self, args: &[TermId]) -> TermId {
        match args.len() {
            0 => self.mk_false(),
            1 => args[0],
            _ => self.mk_app(Op::BoolOr, args),
        }
    }

    pub fn mk_bool_xor(&mut self, args: &[TermId]) -> TermId {
        match args.len() {
            0 => self.mk_false(),
            1 => args[0],
            _ => self.mk_app(Op::BoolXor, args),
        }
    }

    /// Number of interned terms, mostly for diagnostics.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_dedups() {
        let mut ctx = Context::new();
        let a = ctx.mk_numeral_u64(5, 8);
        let b = ctx.mk_numeral_u64(5, 8);
        assert_eq!(a, b);
        let c = ctx.mk_numeral_u64(5, 16);
        assert_ne!(a, c);
    }

    #[test]
    fn test_numeral_normalized_on_creation() {
        let mut ctx = Context::new();
        let a = ctx.mk_numeral_u64(0x1ff, 8);
        assert_eq!(ctx.numeral(a).unwrap().0, BigUint::from(0xffu32));
        let b = ctx.ones(8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_app_sorts() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 4);
        let c = ctx.mk_app(Op::Concat, &[x, y]);
        assert_eq!(ctx.sort(c), Sort::BitVec(12));
        let e = ctx.mk_extract(3, 1, x);
        assert_eq!(ctx.sort(e), Sort::BitVec(3));
        let ule = ctx.mk_ule(x, x);
        assert_eq!(ctx.sort(ule), Sort::Bool);
        let cmp = ctx.mk_app(Op::Comp, &[x, x]);
        assert_eq!(ctx.sort(cmp), Sort::BitVec(1));
        let r = ctx.mk_app(Op::Repeat(3), &[y]);
        assert_eq!(ctx.sort(r), Sort::BitVec(12));
    }

    #[test]
    #[should_panic]
    fn test_extract_out_of_range_panics() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 8);
        ctx.mk_extract(8, 0, x);
    }

    #[test]
    #[should_panic]
    fn test_width_mismatch_panics() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 4);
        ctx.mk_app(Op::Add, &[x, y]);
    }

    #[test]
    fn test_structural_sharing() {
        let mut ctx = Context::new();
        let x = ctx.mk_bv_var("x", 8);
        let n1 = ctx.mk_bv_not(x);
        let n2 = ctx.mk_bv_not(x);
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_handle_order_is_creation_order() {
        let mut ctx = Context::new();
        let a = ctx.mk_bv_var("a", 8);
        let b = ctx.mk_bv_var("b", 8);
        assert!(a < b);
    }
}
