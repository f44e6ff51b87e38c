// SPDX-License-Identifier: AGPL-3.0

//! Local term-simplification engine for fixed-width bit-vector expressions.
//!
//! Given an operator application over already-simplified subterms, the
//! [`Rewriter`] either produces a semantically equivalent, more canonical
//! replacement together with a revisit count for the driver, or reports that
//! no rule applies. Each rule is a pure local rewrite; fixpoint iteration is
//! the caller's job (a reference driver lives in [`driver`]).

mod arith;
mod bits;
mod boolean;
mod compare;
mod convert;
mod divide;
pub mod driver;
mod equality;
pub mod eval;
mod shift;
mod slice;

use tracing::{debug, trace};

use bvsimp_config::RewriterConfig;
use bvsimp_term::{Context, Op, TermId, WidthInt};

pub use bvsimp_config::RewriterConfig as Config;
pub use bvsimp_term as term;

/// How many further bottom-up normalization passes the replacement term
/// needs before the driver may trust it to be in normal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Revisit {
    /// The replacement is already fully simplified.
    Done,
    One,
    Two,
    Three,
}

impl Revisit {
    pub fn passes(self) -> u8 {
        match self {
            Revisit::Done => 0,
            Revisit::One => 1,
            Revisit::Two => 2,
            Revisit::Three => 3,
        }
    }
}

/// Result of a single simplification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No rule applies; the input term stands unchanged.
    NoRule,
    Simplified { term: TermId, revisit: Revisit },
}

impl Outcome {
    pub(crate) fn done(term: TermId) -> Self {
        Outcome::Simplified {
            term,
            revisit: Revisit::Done,
        }
    }

    pub(crate) fn rw1(term: TermId) -> Self {
        Outcome::Simplified {
            term,
            revisit: Revisit::One,
        }
    }

    pub(crate) fn rw2(term: TermId) -> Self {
        Outcome::Simplified {
            term,
            revisit: Revisit::Two,
        }
    }

    pub(crate) fn rw3(term: TermId) -> Self {
        Outcome::Simplified {
            term,
            revisit: Revisit::Three,
        }
    }

    /// The replacement term, if any rule fired.
    pub fn term(&self) -> Option<TermId> {
        match self {
            Outcome::NoRule => None,
            Outcome::Simplified { term, .. } => Some(*term),
        }
    }
}

/// Single-entry memo for the most recently built extraction. Repeated
/// requests for the same `(high, low, argument)` triple are common when a
/// rule slices several aligned components; anything else misses and
/// replaces the entry.
#[derive(Default)]
struct ExtractCache {
    key: Option<(WidthInt, WidthInt, TermId)>,
    cached: Option<TermId>,
}

/// The rule dispatcher. One instance per simplification worker; the only
/// mutable state is the configuration and the narrow extract cache, so a
/// shared instance would need external synchronization.
pub struct Rewriter {
    cfg: RewriterConfig,
    extract_cache: ExtractCache,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Rewriter {
    pub fn new() -> Self {
        Self::with_config(RewriterConfig::default())
    }

    pub fn with_config(cfg: RewriterConfig) -> Self {
        Self {
            cfg,
            extract_cache: ExtractCache::default(),
        }
    }

    pub fn config(&self) -> &RewriterConfig {
        &self.cfg
    }

    pub fn update_config(&mut self, cfg: RewriterConfig) {
        debug!(?cfg, "rewriter configuration updated");
        self.cfg = cfg;
    }

    /// Build an extraction through the single-entry cache.
    pub(crate) fn extract(
        &mut self,
        ctx: &mut Context,
        high: WidthInt,
        low: WidthInt,
        arg: TermId,
    ) -> TermId {
        let key = (high, low, arg);
        if self.extract_cache.key == Some(key) {
            if let Some(t) = self.extract_cache.cached {
                return t;
            }
        }
        let t = ctx.mk_extract(high, low, arg);
        self.extract_cache.key = Some(key);
        self.extract_cache.cached = Some(t);
        t
    }

    /// Simplify a single operator application. `args` are the (already
    /// simplified) operands; static parameters travel on `op` itself.
    ///
    /// Arity and parameter-range violations are caller bugs and panic; "no
    /// applicable rule" is the ordinary non-error answer.
    pub fn simplify_app(&mut self, ctx: &mut Context, op: Op, args: &[TermId]) -> Outcome {
        let out = self.dispatch(ctx, op, args);
        if let Outcome::Simplified { term, revisit } = out {
            trace!(?op, ?term, passes = revisit.passes(), "rule fired");
        }
        out
    }

    fn dispatch(&mut self, ctx: &mut Context, op: Op, args: &[TermId]) -> Outcome {
        use Op::*;
        match op {
            Bit0 => {
                debug_assert!(args.is_empty());
                Outcome::done(ctx.zero(1))
            }
            Bit1 => {
                debug_assert!(args.is_empty());
                Outcome::done(ctx.one(1))
            }
            Ule => self.mk_leq(ctx, false, args[0], args[1]),
            Uge => self.mk_geq(ctx, false, args[0], args[1]),
            Ult => self.mk_lt(ctx, false, args[0], args[1]),
            Ugt => self.mk_lt(ctx, false, args[1], args[0]),
            Sle => self.mk_leq(ctx, true, args[0], args[1]),
            Sge => self.mk_geq(ctx, true, args[0], args[1]),
            Slt => self.mk_lt(ctx, true, args[0], args[1]),
            Sgt => self.mk_lt(ctx, true, args[1], args[0]),
            Add => self.mk_add(ctx, args),
            Mul => self.mk_mul(ctx, args),
            Sub => self.mk_sub(ctx, args[0], args[1]),
            Neg => self.mk_neg(ctx, args[0]),
            Shl => self.mk_shl(ctx, args[0], args[1]),
            Lshr => self.mk_lshr(ctx, args[0], args[1]),
            Ashr => self.mk_ashr(ctx, args[0], args[1]),
            Udiv => self.mk_udiv(ctx, args[0], args[1], self.cfg.hi_div0, false),
            Sdiv => self.mk_sdiv(ctx, args[0], args[1], self.cfg.hi_div0, false),
            Urem => self.mk_urem(ctx, args[0], args[1], self.cfg.hi_div0, false),
            Srem => self.mk_srem(ctx, args[0], args[1], self.cfg.hi_div0, false),
            Smod => self.mk_smod(ctx, args[0], args[1], self.cfg.hi_div0, false),
            UdivI => self.mk_udiv(ctx, args[0], args[1], true, true),
            SdivI => self.mk_sdiv(ctx, args[0], args[1], true, true),
            UremI => self.mk_urem(ctx, args[0], args[1], true, true),
            SremI => self.mk_srem(ctx, args[0], args[1], true, true),
            SmodI => self.mk_smod(ctx, args[0], args[1], true, true),
            // divide-by-zero witnesses are uninterpreted
            Udiv0 | Sdiv0 | Urem0 | Srem0 | Smod0 => Outcome::NoRule,
            Concat => self.mk_concat(ctx, args),
            Extract { high, low } => self.mk_extract(ctx, high, low, args[0]),
            Repeat(n) => self.mk_repeat(ctx, n, args[0]),
            ZeroExt(n) => self.mk_zero_extend(ctx, n, args[0]),
            SignExt(n) => self.mk_sign_extend(ctx, n, args[0]),
            RotateLeft(n) => self.mk_rotate_left(ctx, n, args[0]),
            RotateRight(n) => self.mk_rotate_right(ctx, n, args[0]),
            ExtRotateLeft => self.mk_ext_rotate_left(ctx, args[0], args[1]),
            ExtRotateRight => self.mk_ext_rotate_right(ctx, args[0], args[1]),
            Or => self.mk_bv_or(ctx, args),
            Xor => self.mk_bv_xor(ctx, args),
            Not => self.mk_bv_not(ctx, args[0]),
            And => self.mk_bv_and(ctx, args),
            Nand => self.mk_bv_nand(ctx, args),
            Nor => self.mk_bv_nor(ctx, args),
            Xnor => self.mk_bv_xnor(ctx, args),
            RedOr => self.mk_bv_redor(ctx, args[0]),
            RedAnd => self.mk_bv_redand(ctx, args[0]),
            Comp => self.mk_bv_comp(ctx, args[0], args[1]),
            Eq => {
                if ctx.sort(args[0]).is_bv() {
                    self.mk_eq_core(ctx, args[0], args[1])
                } else {
                    Outcome::NoRule
                }
            }
            Bv2Int => self.mk_bv2int(ctx, args[0]),
            Int2Bv(n) => self.mk_int2bv(ctx, n, args[0]),
            MkBv => self.mk_mkbv(ctx, args),
            // the boolean layer and generic ite simplification live upstream
            Ite | BoolAnd | BoolOr | BoolNot | BoolXor => Outcome::NoRule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_structure_yields_no_rule() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let y = ctx.mk_bv_var("y", 8);
        assert_eq!(rw.simplify_app(&mut ctx, Op::Add, &[x, y]), Outcome::NoRule);
        assert_eq!(rw.simplify_app(&mut ctx, Op::Shl, &[x, y]), Outcome::NoRule);
    }

    #[test]
    fn test_bit_constants_fold() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let zero = ctx.zero(1);
        let one = ctx.one(1);
        assert_eq!(
            rw.simplify_app(&mut ctx, Op::Bit0, &[]),
            Outcome::done(zero)
        );
        assert_eq!(rw.simplify_app(&mut ctx, Op::Bit1, &[]), Outcome::done(one));
    }

    #[test]
    fn test_extract_cache_reuses_entry() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let a = rw.extract(&mut ctx, 3, 0, x);
        let b = rw.extract(&mut ctx, 3, 0, x);
        assert_eq!(a, b);
        // key change invalidates, result still correct
        let c = rw.extract(&mut ctx, 7, 4, x);
        assert_ne!(a, c);
        let d = rw.extract(&mut ctx, 3, 0, x);
        assert_eq!(a, d);
    }

    #[test]
    fn test_determinism() {
        let mut ctx = Context::new();
        let mut rw = Rewriter::new();
        let x = ctx.mk_bv_var("x", 8);
        let n = ctx.mk_numeral_u64(3, 8);
        let first = rw.simplify_app(&mut ctx, Op::Shl, &[x, n]);
        let second = rw.simplify_app(&mut ctx, Op::Shl, &[x, n]);
        assert_eq!(first, second);
    }
}
