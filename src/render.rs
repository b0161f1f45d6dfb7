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

//! Renders a block's instructions into a normalized, stack-effect
//! independent text form suitable for comparing blocks across
//! otherwise-unrelated contracts: `LOGn` opcodes collapse to `LOGX`,
//! `PUSHn` immediates collapse to `PUSHX <category>` (annotated with
//! how the pushed value is used, when that usage is unambiguous), and
//! `DUP`/`SWAP`/`POP` (pure stack shuffling) are elided entirely.
//! Grounded on `evm_ops.py::normalize_op`.

use crate::block::Block;
use crate::disassembler::Op;
use crate::stack::StackMapping;

/// Render a single op, given its index within the block (used to look
/// up its usage categories in `mapping`).  Returns the empty string
/// for ops that normalize away entirely.
fn normalize_op(op: &Op, idx: usize, mapping: &StackMapping) -> String {
    if let Some(_n) = op.name.strip_prefix("LOG") {
        "LOGX\n".to_string()
    } else if op.name.starts_with("PUSH") {
        let cat_str = mapping
            .value_usage_type
            .get(&idx)
            .filter(|categories| categories.len() == 1)
            .and_then(|categories| categories.iter().next())
            .map(|c| c.as_str())
            .unwrap_or("Data");
        format!("PUSHX {cat_str}\n")
    } else if op.name.starts_with("DUP") || op.name.starts_with("SWAP") || op.name == "POP" {
        String::new()
    } else {
        format!("{}\n", op.name)
    }
}

/// Render a whole block: a `# <hex start address>` header line
/// followed by its normalized instructions.
pub fn render_block(block: &Block) -> String {
    let mut out = format!("# {:x}\n", block.start_addr);
    for (idx, op) in block.ops.iter().enumerate() {
        out.push_str(&normalize_op(op, idx, &block.stack_mapping));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::segment;

    #[test]
    fn test_logs_collapse_to_logx() {
        // JUMPDEST; PUSH1 0; PUSH1 0; LOG0
        let blocks = segment(&[0x5b, 0x60, 0x00, 0x60, 0x00, 0xa0]);
        let text = render_block(&blocks[&0]);
        assert!(text.contains("LOGX\n"));
        assert!(!text.contains("LOG0"));
    }

    #[test]
    fn test_dup_swap_pop_elided() {
        // PUSH1 1; DUP1; SWAP1; POP; STOP
        let blocks = segment(&[0x60, 0x01, 0x80, 0x90, 0x50, 0x00]);
        let text = render_block(&blocks[&0]);
        assert!(!text.contains("DUP"));
        assert!(!text.contains("SWAP"));
        assert!(!text.contains("POP"));
        assert!(text.contains("STOP"));
    }

    #[test]
    fn test_push_annotated_with_single_usage_category() {
        // PUSH1 1; PUSH1 2; ADD; STOP -- both pushes feed ADD (ArithData).
        let blocks = segment(&[0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
        let text = render_block(&blocks[&0]);
        assert_eq!(text.matches("PUSHX ArithData\n").count(), 2);
    }

    #[test]
    fn test_push_with_no_or_ambiguous_usage_is_plain_data() {
        // PUSH1 1; STOP -- the pushed value is never consumed in this block.
        let blocks = segment(&[0x60, 0x01, 0x00]);
        let text = render_block(&blocks[&0]);
        assert!(text.contains("PUSHX Data\n"));
    }
}
