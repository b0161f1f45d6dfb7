// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-block abstract stack interpretation.  A `StackMapping`
//! summarises the net effect a straight-line sequence of
//! instructions has on the operand stack, in a form that lets the CFG
//! resolver (`crate::cfg`) propagate a caller's concrete stack
//! through a block without re-executing it instruction-by-instruction.

use std::collections::{BTreeSet, HashMap};

use ruint::aliases::U256;

use crate::disassembler::Op;

/// A single symbolic stack slot produced by a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackValue {
    /// A statically known 256-bit value, stored as its raw big-endian
    /// bytes.  `PUSHn` immediates keep their original (possibly
    /// shorter than 32 byte) width; folded arithmetic results are
    /// always exactly 32 bytes.
    Literal(Vec<u8>),
    /// A copy of the `k`-th slot from the top of the caller's stack,
    /// counting after this block's `num_popped` pops (`0` is the
    /// topmost remaining slot).
    BackRef(usize),
    /// A value whose origin could not be determined.
    Unknown,
}

/// Tags describing how a value produced earlier in the block is
/// subsequently consumed.  Used by the normalized renderer
/// (`crate::render`) to annotate `PUSHn` operands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum UsageCategory {
    ArithData,
    BlockData,
    LogicData,
    MemData,
    StorData,
    BitData,
}

impl UsageCategory {
    /// The name this category is rendered under in normalized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageCategory::ArithData => "ArithData",
            UsageCategory::BlockData => "BlockData",
            UsageCategory::LogicData => "LogicData",
            UsageCategory::MemData => "MemData",
            UsageCategory::StorData => "StorData",
            UsageCategory::BitData => "BitData",
        }
    }
}

fn usage_category(name: &str) -> Option<UsageCategory> {
    use UsageCategory::*;
    match name {
        "ADD" | "MUL" | "SUB" | "EXP" | "SIGNEXTEND" => Some(ArithData),
        "BLOCKHASH" | "COINBASE" | "TIMESTAMP" | "NUMBER" => Some(BlockData),
        "LT" | "GT" | "SLT" | "SGT" | "EQ" | "ISZERO" => Some(LogicData),
        "MLOAD" => Some(MemData),
        "SLOAD" => Some(StorData),
        "BYTE" | "SHL" | "SHR" | "SAR" | "AND" | "OR" | "XOR" | "NOT" => Some(BitData),
        _ => None,
    }
}

/// The symbolic summary of a block's effect on the stack.  See
/// spec §4.D.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackMapping {
    /// Count of preexisting stack slots consumed beyond what the
    /// block itself pushes.
    pub num_popped: usize,
    /// Ordered sequence of values pushed by this block (bottom to
    /// top).
    pub pushed: Vec<StackValue>,
    /// For each entry in `pushed`, the index (into the block's `ops`)
    /// of the instruction that produced it, or `None` if it arose
    /// from a `DUP`/`SWAP` reaching into the preexisting stack.
    pub creation_op_idx: Vec<Option<usize>>,
    /// For each producing instruction index, the set of usage
    /// categories under which its result was subsequently consumed.
    pub value_usage_type: HashMap<usize, BTreeSet<UsageCategory>>,
}

impl StackMapping {
    /// Build the stack mapping for a sequence of ops, simulating
    /// their effect on a symbolic stack from an empty starting point.
    pub fn new(ops: &[Op]) -> Self {
        let mut m = StackMapping {
            num_popped: 0,
            pushed: Vec::new(),
            creation_op_idx: Vec::new(),
            value_usage_type: HashMap::new(),
        };
        for (op_idx, op) in ops.iter().enumerate() {
            m.categorize_operands(op);
            if let Some(n) = op.name.strip_prefix("PUSH") {
                let _ = n;
                m.push(StackValue::Literal(op.imm.clone()), op_idx);
            } else if op.name == "POP" {
                m.pop();
            } else if let Some(n) = op.name.strip_prefix("DUP") {
                m.dup_n(n.parse().unwrap());
            } else if let Some(n) = op.name.strip_prefix("SWAP") {
                m.swap_n(n.parse().unwrap());
            } else {
                m.misc_op(op, op_idx);
            }
        }
        m
    }

    /// Tag the instruction(s) which created this op's inputs (if
    /// known) with `op`'s usage category, if it has one.
    fn categorize_operands(&mut self, op: &Op) {
        let Some(category) = usage_category(op.name) else {
            return;
        };
        let len = self.creation_op_idx.len();
        let start = len - op.pops.min(len);
        for i in start..len {
            if let Some(creator) = self.creation_op_idx[i] {
                self.value_usage_type.entry(creator).or_default().insert(category);
            }
        }
    }

    fn push(&mut self, value: StackValue, op_idx: usize) {
        self.pushed.push(value);
        self.creation_op_idx.push(Some(op_idx));
    }

    fn pop(&mut self) {
        if self.pushed.is_empty() {
            self.num_popped += 1;
        } else {
            self.pushed.pop();
            self.creation_op_idx.pop();
        }
    }

    fn dup_n(&mut self, n: usize) {
        debug_assert!((1..=16).contains(&n));
        if n <= self.pushed.len() {
            let i = self.pushed.len() - n;
            self.pushed.push(self.pushed[i].clone());
            self.creation_op_idx.push(self.creation_op_idx[i]);
        } else {
            let k = n - self.pushed.len() - 1 + self.num_popped;
            self.pushed.push(StackValue::BackRef(k));
            self.creation_op_idx.push(None);
        }
    }

    fn swap_n(&mut self, n: usize) {
        debug_assert!((1..=16).contains(&n));
        while self.pushed.len() < n + 1 {
            self.pushed.insert(0, StackValue::BackRef(self.num_popped));
            self.creation_op_idx.insert(0, None);
            self.num_popped += 1;
        }
        let top = self.pushed.len() - 1;
        let other = top - n;
        self.pushed.swap(top, other);
        self.creation_op_idx.swap(top, other);
    }

    /// Simulate any instruction other than `PUSH`/`POP`/`DUP`/`SWAP`:
    /// pop its operands, and push either a folded literal (if every
    /// operand is known and the operation is foldable) or `Unknown`
    /// values.
    fn misc_op(&mut self, op: &Op, op_idx: usize) {
        let folded = self.try_fold(op);
        for _ in 0..op.pops {
            self.pop();
        }
        match folded {
            Some(result) => {
                assert_eq!(op.pushes, 1);
                self.push(StackValue::Literal(result.to_be_bytes::<32>().to_vec()), op_idx);
            }
            None => {
                for _ in 0..op.pushes {
                    self.push(StackValue::Unknown, op_idx);
                }
            }
        }
    }

    /// Attempt constant folding for `op`, reading its operands (top
    /// of stack first) from `self.pushed` without mutating it.  Any
    /// operand which is not a `Literal` disables folding.
    fn try_fold(&self, op: &Op) -> Option<U256> {
        let literal = |i: usize| -> Option<U256> {
            let idx = self.pushed.len().checked_sub(i + 1)?;
            match &self.pushed[idx] {
                StackValue::Literal(bytes) => Some(U256::from_be_slice(bytes)),
                _ => None,
            }
        };
        match op.name {
            "NOT" => Some(!literal(0)?),
            "ADD" | "MUL" | "SUB" | "DIV" | "SDIV" | "MOD" | "SMOD" | "EXP" | "SIGNEXTEND"
            | "AND" | "OR" | "XOR" | "BYTE" | "SHL" | "SHR" | "SAR" => {
                let lhs = literal(0)?;
                let rhs = literal(1)?;
                Some(fold_binary(op.name, lhs, rhs))
            }
            "ADDMOD" | "MULMOD" => {
                let a = literal(0)?;
                let b = literal(1)?;
                let c = literal(2)?;
                Some(match op.name {
                    "ADDMOD" => a.add_mod(b, c),
                    "MULMOD" => a.mul_mod(b, c),
                    _ => unreachable!(),
                })
            }
            _ => None,
        }
    }

    /// Transform `stack` (the caller's stack, top-last) as this
    /// block's effect would: pop `num_popped` preexisting slots (left
    /// padding with `Unknown` if the caller's stack is too short),
    /// then append `pushed`, resolving back-references against the
    /// caller's *original* stack.
    pub fn apply_mapping(&self, stack: &[StackValue]) -> Vec<StackValue> {
        let padded: Vec<StackValue> = if stack.len() < self.num_popped {
            let mut p = vec![StackValue::Unknown; self.num_popped - stack.len()];
            p.extend_from_slice(stack);
            p
        } else {
            stack.to_vec()
        };
        let keep = padded.len() - self.num_popped;
        let mut result = padded[..keep].to_vec();
        for item in &self.pushed {
            match item {
                StackValue::BackRef(k) => {
                    if *k < padded.len() {
                        result.push(padded[padded.len() - 1 - k].clone());
                    } else {
                        result.push(StackValue::Unknown);
                    }
                }
                other => result.push(other.clone()),
            }
        }
        result
    }
}

/// Fold one of the binary/ternary arithmetic, comparison or bitwise
/// opcodes over two known 256-bit operands, with full EVM semantics
/// (modular, two's-complement signed variants, division by zero is
/// zero). Grounded on the `ruint`-based arithmetic in `revm`'s
/// interpreter (`instructions/arithmetic.rs`, `instructions/i256.rs`,
/// `instructions/bitwise.rs`).
fn fold_binary(name: &str, lhs: U256, rhs: U256) -> U256 {
    match name {
        "ADD" => lhs.wrapping_add(rhs),
        "MUL" => lhs.wrapping_mul(rhs),
        "SUB" => lhs.wrapping_sub(rhs),
        "DIV" => {
            if rhs.is_zero() {
                U256::ZERO
            } else {
                lhs.wrapping_div(rhs)
            }
        }
        "SDIV" => i256_div(lhs, rhs),
        "MOD" => {
            if rhs.is_zero() {
                U256::ZERO
            } else {
                lhs.wrapping_rem(rhs)
            }
        }
        "SMOD" => i256_mod(lhs, rhs),
        "EXP" => lhs.pow(rhs),
        "SIGNEXTEND" => signextend(lhs, rhs),
        "AND" => lhs & rhs,
        "OR" => lhs | rhs,
        "XOR" => lhs ^ rhs,
        "BYTE" => byte(lhs, rhs),
        "SHL" => shl(lhs, rhs),
        "SHR" => shr(lhs, rhs),
        "SAR" => sar(lhs, rhs),
        _ => unreachable!("not a binary foldable op: {name}"),
    }
}

/// `BYTE(i, x)`: byte `i` of `x`, counting from the most significant
/// byte; zero if `i >= 32`.
fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        U256::ZERO
    } else {
        let idx = i.as_limbs()[0] as usize;
        U256::from(x.byte(31 - idx))
    }
}

fn shl(shift: U256, x: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::ZERO
    } else {
        x << (shift.as_limbs()[0] as usize)
    }
}

fn shr(shift: U256, x: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::ZERO
    } else {
        x >> (shift.as_limbs()[0] as usize)
    }
}

fn sar(shift: U256, x: U256) -> U256 {
    if shift < U256::from(256) {
        x.arithmetic_shr(shift.as_limbs()[0] as usize)
    } else if x.bit(255) {
        U256::MAX
    } else {
        U256::ZERO
    }
}

/// Plain yellow-paper `SIGNEXTEND`: given byte-width `b` and value
/// `x`, if `b >= 31` the value is unchanged; otherwise bit
/// `t = 8*(b+1) - 1` of `x` is the sign and is extended upward.  This
/// corrects the off-by-one present in the original Python this crate
/// was distilled from (see spec §9).
fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let b = b.as_limbs()[0] as usize;
    let t = 8 * (b + 1) - 1;
    let sign = x.bit(t);
    let mask = (U256::from(1) << t) - U256::from(1);
    if sign {
        x | !mask
    } else {
        x & mask
    }
}

fn two_compl(x: U256) -> U256 {
    x.wrapping_neg()
}

/// Signed two's-complement 256-bit division, rounding towards zero,
/// with division by zero yielding zero and the single overflow case
/// `MIN / -1 == MIN`.
fn i256_div(lhs: U256, rhs: U256) -> U256 {
    const MIN: U256 = U256::from_limbs([0, 0, 0, 0x8000000000000000]);
    if rhs.is_zero() {
        return U256::ZERO;
    }
    if lhs == MIN && rhs == U256::MAX {
        // rhs == -1 in two's complement
        return MIN;
    }
    let lhs_neg = lhs.bit(255);
    let rhs_neg = rhs.bit(255);
    let lhs_abs = if lhs_neg { two_compl(lhs) } else { lhs };
    let rhs_abs = if rhs_neg { two_compl(rhs) } else { rhs };
    let q = lhs_abs.wrapping_div(rhs_abs);
    if lhs_neg != rhs_neg {
        two_compl(q)
    } else {
        q
    }
}

/// Signed two's-complement 256-bit remainder (sign follows the
/// dividend), with division by zero yielding zero.
fn i256_mod(lhs: U256, rhs: U256) -> U256 {
    if rhs.is_zero() {
        return U256::ZERO;
    }
    let lhs_neg = lhs.bit(255);
    let rhs_abs = if rhs.bit(255) { two_compl(rhs) } else { rhs };
    let lhs_abs = if lhs_neg { two_compl(lhs) } else { lhs };
    let r = lhs_abs.wrapping_rem(rhs_abs);
    if lhs_neg {
        two_compl(r)
    } else {
        r
    }
}
