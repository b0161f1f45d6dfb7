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

//! Recovers a control-flow graph from a set of segmented blocks by
//! exploring every execution path with a worklist, propagating the
//! symbolic stack along each path so that jump targets resolved from
//! earlier `PUSH`es can be followed even once the jump itself is in a
//! different block.  Grounded on the worklist algorithm in
//! `generate_graph` (original Python), restructured onto
//! `crate::util::SortedVec` for the edge/anywhere sets, in the same
//! manner the teacher represents adjacency in `util/digraph.rs`.

use std::collections::{BTreeMap, HashSet};

use crate::block::Block;
use crate::stack::StackValue;
use crate::util::SortedVec;

/// The recovered graph: every block, the known edges between them,
/// and the set of blocks whose jump could not be resolved (and so has
/// an edge to the conceptual `[anywhere]` sink).
pub struct Graph {
    pub blocks: BTreeMap<usize, Block>,
    pub edges: SortedVec<(usize, usize)>,
    pub anywhere_from: SortedVec<usize>,
}

/// Interpret a literal stack value as a block start address, if it
/// fits in a `usize` and that address actually begins a block.
fn literal_addr(bytes: &[u8]) -> Option<usize> {
    if bytes.iter().take(bytes.len().saturating_sub(std::mem::size_of::<usize>())).any(|&b| b != 0) {
        return None;
    }
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    let n = bytes.len().min(buf.len());
    buf[buf.len() - n..].copy_from_slice(&bytes[bytes.len() - n..]);
    Some(usize::from_be_bytes(buf))
}

/// Resolve the control-flow graph for a complete set of segmented
/// blocks, starting from program counter zero.
pub fn resolve(blocks: BTreeMap<usize, Block>) -> Graph {
    let mut known_edges: SortedVec<(usize, usize)> = SortedVec::new();
    let mut anywhere_from: SortedVec<usize> = SortedVec::new();
    let mut registered_paths: HashSet<Vec<usize>> = HashSet::new();
    registered_paths.insert(vec![0]);
    let mut exe_paths: Vec<(Vec<StackValue>, Vec<usize>)> = vec![(Vec::new(), vec![0])];

    while let Some((stack, path)) = exe_paths.pop() {
        let addr = *path.last().unwrap();
        let Some(block) = blocks.get(&addr) else {
            continue;
        };
        if block.can_jump {
            match block.resolve_jump_target(&stack) {
                Some(StackValue::Literal(bytes)) => match literal_addr(&bytes) {
                    // A computed jump target that does not match any
                    // block's start address is treated identically to
                    // an unresolved jump.
                    Some(target) if blocks.contains_key(&target) => try_new_edge(
                        addr,
                        target,
                        &blocks,
                        &mut known_edges,
                        &mut registered_paths,
                        &mut exe_paths,
                        &path,
                        &stack,
                    ),
                    _ => {
                        anywhere_from.insert(addr);
                    }
                },
                _ => {
                    anywhere_from.insert(addr);
                }
            }
        }
        if block.can_fallthrough {
            if let Some(target) = block.fallthrough_addr {
                if blocks.contains_key(&target) {
                    try_new_edge(
                        addr,
                        target,
                        &blocks,
                        &mut known_edges,
                        &mut registered_paths,
                        &mut exe_paths,
                        &path,
                        &stack,
                    );
                }
            }
        }
    }
    Graph {
        blocks,
        edges: known_edges,
        anywhere_from,
    }
}

/// Record the edge `from -> to`, and if it does not close a loop back
/// onto the current path, queue the extended path for exploration
/// with the current block's stack effect applied.  If it does close a
/// loop, re-explore from `to` alone with no assumed stack contents, so
/// we do not loop forever re-deriving the same symbolic stack.
#[allow(clippy::too_many_arguments)]
fn try_new_edge(
    from: usize,
    to: usize,
    blocks: &BTreeMap<usize, Block>,
    known_edges: &mut SortedVec<(usize, usize)>,
    registered_paths: &mut HashSet<Vec<usize>>,
    exe_paths: &mut Vec<(Vec<StackValue>, Vec<usize>)>,
    path: &[usize],
    stack: &[StackValue],
) {
    known_edges.insert((from, to));
    if path.contains(&to) {
        let loop_path = vec![to];
        if registered_paths.insert(loop_path.clone()) {
            exe_paths.push((Vec::new(), loop_path));
        }
        return;
    }
    let mut new_path = path.to_vec();
    new_path.push(to);
    if registered_paths.insert(new_path.clone()) {
        let from_block = &blocks[&from];
        let new_stack = from_block.stack_mapping.apply_mapping(stack);
        exe_paths.push((new_stack, new_path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::segment;

    #[test]
    fn test_linear_stop_has_no_edges() {
        let blocks = segment(&[0x00]);
        let g = resolve(blocks);
        assert_eq!(g.edges.len(), 0);
        assert_eq!(g.anywhere_from.len(), 0);
    }

    #[test]
    fn test_resolved_jump_edge() {
        // PUSH1 4; JUMP; JUMPDEST; STOP
        let blocks = segment(&[0x60, 0x04, 0x56, 0x5b, 0x00]);
        let g = resolve(blocks);
        assert!(g.edges.contains((0, 3)));
        assert_eq!(g.anywhere_from.len(), 0);
    }

    #[test]
    fn test_unresolved_jump_goes_anywhere() {
        // JUMPDEST; JUMP  (jump target is whatever was already on the
        // stack, unknown to this block)
        let blocks = segment(&[0x5b, 0x56]);
        let g = resolve(blocks);
        assert!(g.anywhere_from.contains(0));
    }

    #[test]
    fn test_jumpi_produces_both_fallthrough_and_jump_edges() {
        // PUSH1 1 (cond); PUSH1 6 (dest); JUMPI; STOP; JUMPDEST; STOP
        // JUMPI's destination is the top of stack, i.e. the last-pushed value.
        let blocks = segment(&[0x60, 0x01, 0x60, 0x06, 0x57, 0x00, 0x5b, 0x00]);
        let g = resolve(blocks);
        assert!(g.edges.contains((0, 5)));
        assert!(g.edges.contains((0, 6)));
    }

    #[test]
    fn test_self_loop_resolves_without_divergence() {
        // JUMPDEST; PUSH1 0; JUMP
        let blocks = segment(&[0x5b, 0x60, 0x00, 0x56]);
        let g = resolve(blocks);
        assert!(g.edges.contains((0, 0)));
        assert_eq!(g.anywhere_from.len(), 0);
    }

    #[test]
    fn test_backref_jump_resolved_across_blocks() {
        // Entry: JUMPDEST; PUSH1 8 (final dest); PUSH1 6 (trampoline addr); JUMP
        // Trampoline (addr 6): JUMPDEST; JUMP, jumping to whatever the caller left
        // on top of the stack -- the literal `8` still sitting under the consumed
        // trampoline address.
        // Final (addr 8): JUMPDEST; STOP
        //
        // addr:    0    1  2    3  4    5  6    7    8  9
        // bytes: 5b   60 08   60 06  56 | 5b 56 | 5b 00
        let bytecode = [0x5b, 0x60, 0x08, 0x60, 0x06, 0x56, 0x5b, 0x56, 0x5b, 0x00];
        let blocks = segment(&bytecode);
        let g = resolve(blocks);
        assert!(g.edges.contains((0, 6)));
        assert!(g.edges.contains((6, 8)));
        assert_eq!(g.anywhere_from.len(), 0);
    }
}
