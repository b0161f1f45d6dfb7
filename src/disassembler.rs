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

//! Turns a raw byte sequence into a flat stream of decoded
//! instructions (`Op`).  This is deliberately total: truncated `PUSH`
//! immediates and unassigned opcode bytes both produce well-formed
//! output rather than an error (see spec §7).

use crate::opcode::opcode_info;

/// A single decoded instruction, with its inline immediate (if any)
/// and the static arity looked up from the opcode table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Op {
    /// Byte offset of this instruction within the original sequence.
    pub addr: usize,
    /// The raw opcode byte.
    pub opcode: u8,
    /// Canonical mnemonic (e.g. `"PUSH1"`, `"JUMPI"`, `"ADD"`).
    pub name: &'static str,
    /// Raw immediate bytes.  Empty except for `PUSHn`, where its
    /// length is `n` (or less, for a truncated trailing push).
    pub imm: Vec<u8>,
    /// Total size in bytes: `1 + imm.len()`.
    pub size: usize,
    /// Number of stack slots this instruction pops.
    pub pops: usize,
    /// Number of stack slots this instruction pushes.
    pub pushes: usize,
}

impl Op {
    fn new(addr: usize, byte: u8, imm: Vec<u8>) -> Self {
        let info = opcode_info(byte);
        let size = 1 + imm.len();
        Op {
            addr,
            opcode: byte,
            name: info.name,
            imm,
            size,
            pops: info.pops,
            pushes: info.pushes,
        }
    }
}

/// Decode `bytes` into its flat instruction stream.  Truncated
/// trailing `PUSHn` immediates are decoded with whatever bytes remain
/// and the scan halts there; every other opcode byte (known or not)
/// is always fully decodable.
pub fn disassemble(bytes: &[u8]) -> Vec<Op> {
    let mut ops = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let byte = bytes[pos];
        let info = opcode_info(byte);
        if info.imm_size > 0 {
            let avail = bytes.len() - (pos + 1);
            if avail < info.imm_size {
                // Truncated push: take whatever immediate bytes remain
                // and stop scanning.
                let imm = bytes[pos + 1..].to_vec();
                ops.push(Op::new(pos, byte, imm));
                break;
            }
            let imm = bytes[pos + 1..pos + 1 + info.imm_size].to_vec();
            let size = 1 + imm.len();
            ops.push(Op::new(pos, byte, imm));
            pos += size;
        } else {
            ops.push(Op::new(pos, byte, Vec::new()));
            pos += 1;
        }
    }
    ops
}

/// Names of instructions which unconditionally (or conditionally, for
/// `JUMP`/`JUMPI`) end a basic block.
pub fn is_terminator(name: &str) -> bool {
    matches!(
        name,
        "JUMP" | "JUMPI" | "STOP" | "REVERT" | "RETURN" | "INVALID" | "SELFDESTRUCT"
    )
}

pub fn is_jump(name: &str) -> bool {
    matches!(name, "JUMP" | "JUMPI")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(disassemble(&[]), Vec::new());
    }

    #[test]
    fn test_stop() {
        let ops = disassemble(&[0x00]);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "STOP");
        assert_eq!(ops[0].addr, 0);
        assert_eq!(ops[0].size, 1);
    }

    #[test]
    fn test_push1_jump() {
        let ops = disassemble(&[0x60, 0x03, 0x56]);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].name, "PUSH1");
        assert_eq!(ops[0].imm, vec![0x03]);
        assert_eq!(ops[0].size, 2);
        assert_eq!(ops[1].addr, 2);
        assert_eq!(ops[1].name, "JUMP");
    }

    #[test]
    fn test_truncated_push() {
        // PUSH4 but only two immediate bytes available.
        let ops = disassemble(&[0x63, 0xaa, 0xbb]);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].name, "PUSH4");
        assert_eq!(ops[0].imm, vec![0xaa, 0xbb]);
        assert_eq!(ops[0].size, 3);
    }

    #[test]
    fn test_unknown_opcode() {
        let ops = disassemble(&[0x0c, 0x00]);
        assert_eq!(ops[0].name, "INVALID");
        assert_eq!(ops[0].imm.len(), 0);
        assert_eq!(ops[0].size, 1);
        assert_eq!(ops[1].name, "STOP");
    }

    #[test]
    fn test_sizes_sum_to_len() {
        let bytes = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00];
        let ops = disassemble(&bytes);
        let total: usize = ops.iter().map(|o| o.size).sum();
        assert_eq!(total, bytes.len());
    }
}
