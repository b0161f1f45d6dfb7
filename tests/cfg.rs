use evmcfg::block::segment;
use evmcfg::cfg::resolve;
use evmcfg::stack::StackValue;

fn lit(n: u64) -> StackValue {
    StackValue::Literal(ruint::aliases::U256::from(n).to_be_bytes::<32>().to_vec())
}

#[test]
fn test_cfg_01_stop_only() {
    // STOP
    let blocks = segment(&[0x00]);
    assert_eq!(blocks.len(), 1);
    let g = resolve(blocks);
    assert_eq!(g.edges.len(), 0);
    assert_eq!(g.anywhere_from.len(), 0);
}

#[test]
fn test_cfg_02_jump_to_valid_jumpdest() {
    // PUSH1 4; JUMP; JUMPDEST; STOP
    let blocks = segment(&[0x60, 0x04, 0x56, 0x5b, 0x00]);
    assert_eq!(blocks.len(), 2);
    let g = resolve(blocks);
    assert!(g.edges.contains((0, 3)));
    assert_eq!(g.anywhere_from.len(), 0);
}

#[test]
fn test_cfg_03_jump_to_invalid_target_goes_anywhere() {
    // PUSH1 4; JUMP; STOP (address 4 is mid-instruction, not a block)
    let blocks = segment(&[0x60, 0x04, 0x56, 0x00]);
    let g = resolve(blocks);
    assert_eq!(g.edges.len(), 0);
    // A literal jump target that names no block is treated the same as
    // an unresolved one: an edge to the `[anywhere]` sink.
    assert!(g.anywhere_from.contains(0));
}

#[test]
fn test_cfg_04_jumpi_fallthrough_and_resolved_jump() {
    // PUSH1 1 (cond) ; PUSH1 6 (dest) ; JUMPI ; STOP ; JUMPDEST ; STOP
    // JUMPI's destination is the top of stack, i.e. the last-pushed value.
    let blocks = segment(&[0x60, 0x01, 0x60, 0x06, 0x57, 0x00, 0x5b, 0x00]);
    assert_eq!(blocks.len(), 3);
    let g = resolve(blocks);
    assert!(g.edges.contains((0, 5))); // fallthrough to STOP at addr 5
    assert!(g.edges.contains((0, 6))); // conditional jump to JUMPDEST at addr 6
}

#[test]
fn test_cfg_05_backref_folds_across_jumpdest() {
    // JUMPDEST ; PUSH1 1 ; ADD ; STOP
    // The ADD's left operand is a BackRef into whatever the caller left
    // on the stack, so the result cannot be folded to a literal.
    let blocks = segment(&[0x5b, 0x60, 0x01, 0x01, 0x00]);
    let b = &blocks[&0];
    assert_eq!(b.stack_mapping.num_popped, 1);
    assert_eq!(b.stack_mapping.pushed, vec![StackValue::Unknown]);
}

#[test]
fn test_cfg_06_fully_folded_add() {
    // PUSH1 1 ; PUSH1 2 ; ADD ; STOP
    let blocks = segment(&[0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
    let b = &blocks[&0];
    assert_eq!(b.stack_mapping.num_popped, 0);
    assert_eq!(b.stack_mapping.pushed, vec![lit(3)]);
}

#[test]
fn test_cfg_07_self_loop() {
    // JUMPDEST ; PUSH1 0 ; JUMP  (jumps back to its own start)
    let blocks = segment(&[0x5b, 0x60, 0x00, 0x56]);
    assert_eq!(blocks.len(), 1);
    let g = resolve(blocks);
    assert!(g.edges.contains((0, 0)));
    assert_eq!(g.anywhere_from.len(), 0);
}

#[test]
fn test_unresolved_jump_targets_anywhere_sink() {
    // JUMPDEST ; JUMP (the jump target is whatever the caller left on
    // the stack, which is unknown at the program entry point).
    let blocks = segment(&[0x5b, 0x56]);
    let g = resolve(blocks);
    assert_eq!(g.edges.len(), 0);
    assert!(g.anywhere_from.contains(0));
}

#[test]
fn test_every_byte_belongs_to_exactly_one_block() {
    // PUSH1 1; PUSH1 2; ADD; PUSH1 8; JUMPI; JUMPDEST; STOP; JUMPDEST; STOP
    let bytecode = [
        0x60, 0x01, 0x60, 0x02, 0x01, 0x60, 0x08, 0x57, 0x5b, 0x00, 0x5b, 0x00,
    ];
    let blocks = segment(&bytecode);
    let total: usize = blocks.values().map(|b| b.ops.iter().map(|o| o.size).sum::<usize>()).sum();
    assert_eq!(total, bytecode.len());
}

#[test]
fn test_empty_bytecode_segments_to_no_blocks() {
    let blocks = segment(&[]);
    assert!(blocks.is_empty());
    let g = resolve(blocks);
    assert_eq!(g.edges.len(), 0);
    assert_eq!(g.anywhere_from.len(), 0);
}
