//! Static control-flow graph recovery for EVM bytecode.
//!
//! Given a raw sequence of bytecode bytes, this crate recovers a
//! basic-block-level control-flow graph by disassembling the bytes
//! ([`disassembler`]), segmenting them into blocks along control-transfer
//! boundaries ([`block`]), summarising each block's effect on the
//! operand stack with an abstract interpreter ([`stack`]) precise
//! enough to constant-fold literal jump targets, and exploring every
//! reachable execution path with a worklist to resolve the edges
//! between blocks ([`cfg`]). Blocks whose jump target cannot be
//! statically determined get an edge to a conceptual `[anywhere]`
//! sink rather than failing the analysis.
//!
//! The core analysis is total: it never panics or returns an error,
//! even on truncated `PUSH` immediates, unassigned opcode bytes, or
//! empty input. Only the `evmcfg` binary, which drives file/stdin I/O
//! around this library, surfaces a `Result`.
pub mod block;
pub mod cfg;
pub mod disassembler;
pub mod dot;
pub mod opcode;
pub mod render;
pub mod stack;
pub mod util;
