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

//! Byte-level opcode constants and the static table mapping an opcode
//! byte to its mnemonic, immediate width and stack arity.  Per the
//! EVM yellow paper, as of the Shanghai opcode set.

// 0s: Stop and Arithmetic Operations
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0a;
pub const SIGNEXTEND: u8 = 0x0b;
// 10s: Comparison & Bitwise Logic Operations
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1a;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const SAR: u8 = 0x1d;
// 20s: Keccak256
pub const KECCAK256: u8 = 0x20;
// 30s: Environmental Information
pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const ORIGIN: u8 = 0x32;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const GASPRICE: u8 = 0x3a;
pub const EXTCODESIZE: u8 = 0x3b;
pub const EXTCODECOPY: u8 = 0x3c;
pub const RETURNDATASIZE: u8 = 0x3d;
pub const RETURNDATACOPY: u8 = 0x3e;
pub const EXTCODEHASH: u8 = 0x3f;
// 40s: Block Information
pub const BLOCKHASH: u8 = 0x40;
pub const COINBASE: u8 = 0x41;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const DIFFICULTY: u8 = 0x44;
pub const GASLIMIT: u8 = 0x45;
pub const CHAINID: u8 = 0x46;
pub const SELFBALANCE: u8 = 0x47;
pub const BASEFEE: u8 = 0x48;
// 50s: Stack, Memory, Storage and Flow Operations
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
// 60s & 70s: Push Operations
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
// 80s: Duplication Operations
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
// 90s: Exchange Operations
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
// a0s: Logging Operations
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;
// f0s: System Operations
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

/// Static information about an opcode: its canonical mnemonic, the
/// width (in bytes) of any inline immediate it carries, and how many
/// stack slots it consumes/produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpInfo {
    pub name: &'static str,
    pub imm_size: usize,
    pub pops: usize,
    pub pushes: usize,
}

impl OpInfo {
    const fn new(name: &'static str, imm_size: usize, pops: usize, pushes: usize) -> Self {
        OpInfo { name, imm_size, pops, pushes }
    }
}

/// Look up the static `(name, imm_size, pops, pushes)` tuple for a
/// given opcode byte.  Bytes with no assigned meaning yield
/// `"INVALID"` with zero immediate and zero arity, matching the
/// disassembler's treatment of unknown opcodes.
pub fn opcode_info(byte: u8) -> OpInfo {
    match byte {
        STOP => OpInfo::new("STOP", 0, 0, 0),
        ADD => OpInfo::new("ADD", 0, 2, 1),
        MUL => OpInfo::new("MUL", 0, 2, 1),
        SUB => OpInfo::new("SUB", 0, 2, 1),
        DIV => OpInfo::new("DIV", 0, 2, 1),
        SDIV => OpInfo::new("SDIV", 0, 2, 1),
        MOD => OpInfo::new("MOD", 0, 2, 1),
        SMOD => OpInfo::new("SMOD", 0, 2, 1),
        ADDMOD => OpInfo::new("ADDMOD", 0, 3, 1),
        MULMOD => OpInfo::new("MULMOD", 0, 3, 1),
        EXP => OpInfo::new("EXP", 0, 2, 1),
        SIGNEXTEND => OpInfo::new("SIGNEXTEND", 0, 2, 1),
        LT => OpInfo::new("LT", 0, 2, 1),
        GT => OpInfo::new("GT", 0, 2, 1),
        SLT => OpInfo::new("SLT", 0, 2, 1),
        SGT => OpInfo::new("SGT", 0, 2, 1),
        EQ => OpInfo::new("EQ", 0, 2, 1),
        ISZERO => OpInfo::new("ISZERO", 0, 1, 1),
        AND => OpInfo::new("AND", 0, 2, 1),
        OR => OpInfo::new("OR", 0, 2, 1),
        XOR => OpInfo::new("XOR", 0, 2, 1),
        NOT => OpInfo::new("NOT", 0, 1, 1),
        BYTE => OpInfo::new("BYTE", 0, 2, 1),
        SHL => OpInfo::new("SHL", 0, 2, 1),
        SHR => OpInfo::new("SHR", 0, 2, 1),
        SAR => OpInfo::new("SAR", 0, 2, 1),
        KECCAK256 => OpInfo::new("KECCAK256", 0, 2, 1),
        ADDRESS => OpInfo::new("ADDRESS", 0, 0, 1),
        BALANCE => OpInfo::new("BALANCE", 0, 1, 1),
        ORIGIN => OpInfo::new("ORIGIN", 0, 0, 1),
        CALLER => OpInfo::new("CALLER", 0, 0, 1),
        CALLVALUE => OpInfo::new("CALLVALUE", 0, 0, 1),
        CALLDATALOAD => OpInfo::new("CALLDATALOAD", 0, 1, 1),
        CALLDATASIZE => OpInfo::new("CALLDATASIZE", 0, 0, 1),
        CALLDATACOPY => OpInfo::new("CALLDATACOPY", 0, 3, 0),
        CODESIZE => OpInfo::new("CODESIZE", 0, 0, 1),
        CODECOPY => OpInfo::new("CODECOPY", 0, 3, 0),
        GASPRICE => OpInfo::new("GASPRICE", 0, 0, 1),
        EXTCODESIZE => OpInfo::new("EXTCODESIZE", 0, 1, 1),
        EXTCODECOPY => OpInfo::new("EXTCODECOPY", 0, 4, 0),
        RETURNDATASIZE => OpInfo::new("RETURNDATASIZE", 0, 0, 1),
        RETURNDATACOPY => OpInfo::new("RETURNDATACOPY", 0, 3, 0),
        EXTCODEHASH => OpInfo::new("EXTCODEHASH", 0, 1, 1),
        BLOCKHASH => OpInfo::new("BLOCKHASH", 0, 1, 1),
        COINBASE => OpInfo::new("COINBASE", 0, 0, 1),
        TIMESTAMP => OpInfo::new("TIMESTAMP", 0, 0, 1),
        NUMBER => OpInfo::new("NUMBER", 0, 0, 1),
        DIFFICULTY => OpInfo::new("DIFFICULTY", 0, 0, 1),
        GASLIMIT => OpInfo::new("GASLIMIT", 0, 0, 1),
        CHAINID => OpInfo::new("CHAINID", 0, 0, 1),
        SELFBALANCE => OpInfo::new("SELFBALANCE", 0, 0, 1),
        BASEFEE => OpInfo::new("BASEFEE", 0, 0, 1),
        POP => OpInfo::new("POP", 0, 1, 0),
        MLOAD => OpInfo::new("MLOAD", 0, 1, 1),
        MSTORE => OpInfo::new("MSTORE", 0, 2, 0),
        MSTORE8 => OpInfo::new("MSTORE8", 0, 2, 0),
        SLOAD => OpInfo::new("SLOAD", 0, 1, 1),
        SSTORE => OpInfo::new("SSTORE", 0, 2, 0),
        JUMP => OpInfo::new("JUMP", 0, 1, 0),
        JUMPI => OpInfo::new("JUMPI", 0, 2, 0),
        PC => OpInfo::new("PC", 0, 0, 1),
        MSIZE => OpInfo::new("MSIZE", 0, 0, 1),
        GAS => OpInfo::new("GAS", 0, 0, 1),
        JUMPDEST => OpInfo::new("JUMPDEST", 0, 0, 0),
        PUSH1..=PUSH32 => {
            let n = (byte - PUSH1 + 1) as usize;
            OpInfo::new(push_name(n), n, 0, 1)
        }
        DUP1..=DUP16 => {
            let n = (byte - DUP1 + 1) as usize;
            OpInfo::new(dup_name(n), 0, n, n + 1)
        }
        SWAP1..=SWAP16 => {
            let n = (byte - SWAP1 + 1) as usize;
            OpInfo::new(swap_name(n), 0, n + 1, n + 1)
        }
        LOG0..=LOG4 => {
            let n = (byte - LOG0) as usize;
            OpInfo::new(log_name(n), 0, n + 2, 0)
        }
        CREATE => OpInfo::new("CREATE", 0, 3, 1),
        CALL => OpInfo::new("CALL", 0, 7, 1),
        CALLCODE => OpInfo::new("CALLCODE", 0, 7, 1),
        RETURN => OpInfo::new("RETURN", 0, 2, 0),
        DELEGATECALL => OpInfo::new("DELEGATECALL", 0, 6, 1),
        CREATE2 => OpInfo::new("CREATE2", 0, 4, 1),
        STATICCALL => OpInfo::new("STATICCALL", 0, 6, 1),
        REVERT => OpInfo::new("REVERT", 0, 2, 0),
        INVALID => OpInfo::new("INVALID", 0, 0, 0),
        SELFDESTRUCT => OpInfo::new("SELFDESTRUCT", 0, 1, 0),
        _ => OpInfo::new("INVALID", 0, 0, 0),
    }
}

fn push_name(n: usize) -> &'static str {
    const NAMES: [&str; 32] = [
        "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
        "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
        "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
        "PUSH29", "PUSH30", "PUSH31", "PUSH32",
    ];
    NAMES[n - 1]
}

fn dup_name(n: usize) -> &'static str {
    const NAMES: [&str; 16] = [
        "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
        "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
    ];
    NAMES[n - 1]
}

fn swap_name(n: usize) -> &'static str {
    const NAMES: [&str; 16] = [
        "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
        "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
    ];
    NAMES[n - 1]
}

fn log_name(n: usize) -> &'static str {
    const NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];
    NAMES[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push1() {
        let info = opcode_info(PUSH1);
        assert_eq!(info.name, "PUSH1");
        assert_eq!(info.imm_size, 1);
        assert_eq!(info.pops, 0);
        assert_eq!(info.pushes, 1);
    }

    #[test]
    fn test_push32() {
        let info = opcode_info(PUSH32);
        assert_eq!(info.name, "PUSH32");
        assert_eq!(info.imm_size, 32);
    }

    #[test]
    fn test_dup16() {
        let info = opcode_info(DUP16);
        assert_eq!(info.name, "DUP16");
        assert_eq!(info.pops, 16);
        assert_eq!(info.pushes, 17);
    }

    #[test]
    fn test_swap16() {
        let info = opcode_info(SWAP16);
        assert_eq!(info.name, "SWAP16");
        assert_eq!(info.pops, 17);
        assert_eq!(info.pushes, 17);
    }

    #[test]
    fn test_log4() {
        let info = opcode_info(LOG4);
        assert_eq!(info.name, "LOG4");
        assert_eq!(info.pops, 6);
        assert_eq!(info.pushes, 0);
    }

    #[test]
    fn test_unassigned_byte_is_invalid() {
        let info = opcode_info(0x0c);
        assert_eq!(info.name, "INVALID");
        assert_eq!(info.imm_size, 0);
        assert_eq!(info.pops, 0);
        assert_eq!(info.pushes, 0);
    }

    #[test]
    fn test_jumpi_arity() {
        let info = opcode_info(JUMPI);
        assert_eq!(info.pops, 2);
        assert_eq!(info.pushes, 0);
    }
}
