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

//! Splits a flat instruction stream into basic blocks, and derives
//! the per-block metadata (fall-through/jump exits, stack mapping,
//! jump target resolution) the CFG resolver builds on.

use std::collections::BTreeMap;

use crate::disassembler::{disassemble, is_jump, is_terminator, Op};
use crate::stack::{StackMapping, StackValue};

/// A maximal straight-line run of instructions, starting either at
/// address zero or a `JUMPDEST`, and ending at a terminator
/// (`JUMP`/`JUMPI`/`STOP`/`RETURN`/`REVERT`/`INVALID`/`SELFDESTRUCT`)
/// or the instruction immediately before the next `JUMPDEST`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Address of this block's first instruction.
    pub start_addr: usize,
    /// The block's instructions, in order.
    pub ops: Vec<Op>,
    /// Whether control can fall off the end of this block into the
    /// instruction immediately following it (true for any block not
    /// ending in an unconditional terminator, and for `JUMPI`).
    pub can_fallthrough: bool,
    /// Address execution falls through to, when `can_fallthrough`.
    pub fallthrough_addr: Option<usize>,
    /// Whether this block ends in `JUMP` or `JUMPI`.
    pub can_jump: bool,
    /// This block's net effect on the operand stack.
    pub stack_mapping: StackMapping,
    /// The stack mapping for every instruction in the block *except*
    /// its trailing `JUMP`/`JUMPI`, used to resolve the jump target
    /// against an arbitrary incoming stack (see
    /// [`Block::resolve_jump_target`]).
    pub jump_dest_mapping: Option<StackMapping>,
}

impl Block {
    /// Resolve this block's jump target given the stack it would be
    /// entered with.  Returns `None` if the block does not end in a
    /// jump, `Some(StackValue::Unknown)` if the destination could not
    /// be determined statically.
    pub fn resolve_jump_target(&self, incoming_stack: &[StackValue]) -> Option<StackValue> {
        let mapping = self.jump_dest_mapping.as_ref()?;
        let stack = mapping.apply_mapping(incoming_stack);
        Some(stack.last().cloned().unwrap_or(StackValue::Unknown))
    }
}

/// Split a raw bytecode sequence into its basic blocks, keyed by
/// start address.  Grounded on `evm_cfg.py`'s `create_basic_blocks`:
/// a new block begins at address zero, immediately after any
/// terminator, and at every `JUMPDEST` (even when reached by
/// fall-through, since it is a valid jump target and must be
/// independently addressable).
pub fn segment(bytes: &[u8]) -> BTreeMap<usize, Block> {
    let ops = disassemble(bytes);
    let mut blocks = BTreeMap::new();
    let mut current: Vec<Op> = Vec::new();

    let flush = |current: &mut Vec<Op>, blocks: &mut BTreeMap<usize, Block>, next_addr: Option<usize>| {
        if current.is_empty() {
            return;
        }
        let ops = std::mem::take(current);
        let start_addr = ops[0].addr;
        let last = ops.last().unwrap();
        let can_jump = is_jump(last.name);
        let ends_in_terminator = is_terminator(last.name);
        let can_fallthrough = !ends_in_terminator || last.name == "JUMPI";
        let fallthrough_addr = if can_fallthrough { next_addr } else { None };
        let jump_dest_mapping = if can_jump {
            Some(StackMapping::new(&ops[..ops.len() - 1]))
        } else {
            None
        };
        let stack_mapping = StackMapping::new(&ops);
        blocks.insert(
            start_addr,
            Block {
                start_addr,
                ops,
                can_fallthrough,
                fallthrough_addr,
                can_jump,
                stack_mapping,
                jump_dest_mapping,
            },
        );
    };

    for (i, op) in ops.iter().enumerate() {
        if op.name == "JUMPDEST" && !current.is_empty() {
            flush(&mut current, &mut blocks, Some(op.addr));
        }
        current.push(op.clone());
        if is_terminator(op.name) {
            let next_addr = ops.get(i + 1).map(|o| o.addr);
            flush(&mut current, &mut blocks, next_addr);
        }
    }
    // Trailing block that runs off the end of the bytecode without a
    // terminator. `can_fallthrough`/`fallthrough_addr` are still
    // derived from the last op, same as in `flush` -- there is just no
    // real block at that address for the resolver to find.
    if !current.is_empty() {
        let ops = std::mem::take(&mut current);
        let start_addr = ops[0].addr;
        let last = ops.last().unwrap();
        let can_fallthrough = !is_terminator(last.name) || last.name == "JUMPI";
        let fallthrough_addr = if can_fallthrough {
            Some(last.addr + last.size)
        } else {
            None
        };
        let stack_mapping = StackMapping::new(&ops);
        blocks.insert(
            start_addr,
            Block {
                start_addr,
                ops,
                can_fallthrough,
                fallthrough_addr,
                can_jump: false,
                stack_mapping,
                jump_dest_mapping: None,
            },
        );
    }
    blocks
}
