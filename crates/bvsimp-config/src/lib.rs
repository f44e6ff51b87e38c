// SPDX-License-Identifier: AGPL-3.0

//! Rewriter configuration.
//!
//! The option set mirrors the parameters of the original bit-vector
//! rewriter; defaults match its shipped defaults. The struct doubles as a
//! clap argument group so a host solver can expose the flags directly.

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Options recognized by the bit-vector rewriter.
#[derive(Debug, Clone, PartialEq, Eq, Parser, Serialize, Deserialize)]
#[clap(name = "bvsimp")]
pub struct RewriterConfig {
    /// Use the hardware interpretation for division by zero (udiv x 0 = all
    /// ones, rem x 0 = x) instead of explicit witness functions.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    #[serde(default = "default_true")]
    pub hi_div0: bool,

    /// Expand sign-extend into a concatenation of sign-bit copies.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    #[serde(default = "default_true")]
    pub elim_sign_ext: bool,

    /// Rewrite multiplication by a power of two into a concatenation.
    #[clap(long)]
    #[serde(default)]
    pub mul2concat: bool,

    /// Rewrite width-1 equalities against a numeral into boolean structure.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    #[serde(default = "default_true")]
    pub bit2bool: bool,

    /// Bit-blast equalities against a literal through or/xor/not operands.
    #[clap(long)]
    #[serde(default)]
    pub blast_eq_value: bool,

    /// Always split equalities involving a concatenation, not only when the
    /// other side is itself a concatenation, numeral, or bitwise or.
    #[clap(long)]
    #[serde(default)]
    pub split_concat_eq: bool,

    /// Rewrite unsigned division by an invertible constant into
    /// multiplication by its inverse modulo 2^n.
    #[clap(long)]
    #[serde(default)]
    pub udiv2mul: bool,

    /// Rewrite bitwise not into the arithmetic form (2^n - 1) - x.
    #[clap(long)]
    #[serde(default)]
    pub bvnot2arith: bool,

    /// Sort the operands of associative-commutative operators into the
    /// canonical term order.
    #[clap(long)]
    #[serde(default)]
    pub bv_sort_ac: bool,

    /// Flatten nested applications of associative operators.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    #[serde(default = "default_true")]
    pub flat: bool,

    /// Fold (mkbv b1 .. bn) over literal booleans into a numeral.
    #[clap(long)]
    #[serde(default)]
    pub mkbv2num: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            hi_div0: true,
            elim_sign_ext: true,
            mul2concat: false,
            bit2bool: true,
            blast_eq_value: false,
            split_concat_eq: false,
            udiv2mul: false,
            bvnot2arith: false,
            bv_sort_ac: false,
            flat: true,
            mkbv2num: false,
        }
    }
}
