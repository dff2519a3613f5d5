use pretty_assertions::assert_eq;

use apio_rs::instr::Instruction;
use apio_rs::{Assembler, EmulatedPio, Error, SlotOffsets, MAX_PROGRAM_LEN};

fn asm() -> Assembler<EmulatedPio> {
    let mut a = Assembler::new(EmulatedPio::new());
    a.select_block(0).unwrap();
    a.select_sm(0).unwrap();
    a
}

#[test]
fn unmarked_program_has_degenerate_offsets() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    assert_eq!(
        a.slot_offsets(0, 0).unwrap(),
        SlotOffsets { first: 0, start: 0, wrap_bottom: 0, wrap_top: 0, end: 0 }
    );
}

#[test]
fn markers_capture_the_next_append_offset() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    a.mark_start().unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    a.mark_wrap_bottom().unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    a.mark_wrap_top().unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    let o = a.slot_offsets(0, 0).unwrap();
    assert_eq!(o.first, 0);
    assert_eq!(o.start, 1);
    assert_eq!(o.wrap_bottom, 2);
    assert_eq!(o.wrap_top, 3);
    // wrap top drags the end with it
    assert_eq!(o.end, 3);
}

#[test]
fn mark_end_extends_past_the_wrap() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    a.mark_wrap_top().unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    a.mark_end().unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    let o = a.slot_offsets(0, 0).unwrap();
    assert_eq!(o.wrap_top, 1);
    assert_eq!(o.end, 2);
}

#[test]
fn buffer_is_capped_at_32_instructions() {
    let mut a = asm();
    for _ in 0..MAX_PROGRAM_LEN {
        a.add_instr(Instruction::nop()).unwrap();
    }
    assert_eq!(a.add_instr(Instruction::nop()), Err(Error::ProgramFull(0)));
    // Nothing was written past the cap.
    a.end_block().unwrap();
    assert_eq!(a.backend().blocks[0].instr_count as usize, MAX_PROGRAM_LEN);
}

#[test]
fn sms_share_one_contiguous_buffer() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    a.select_sm(1).unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    let o = a.slot_offsets(0, 1).unwrap();
    assert_eq!(o.first, 2);
    assert_eq!(o.start, 2);
}

#[test]
fn labels_capture_known_offsets() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    let target = a.label().unwrap();
    assert_eq!(target, 1);
    a.add_instr(Instruction::jmp(target)).unwrap();
    assert_eq!(a.label_at(2).unwrap(), 4);
    a.end_block().unwrap();
    assert_eq!(a.backend().blocks[0].instr[1], 0x0001);
}

#[test]
fn selection_is_required_and_validated() {
    let mut a = Assembler::new(EmulatedPio::new());
    assert_eq!(a.select_sm(0), Err(Error::NoBlockSelected));
    assert_eq!(a.add_instr(Instruction::nop()), Err(Error::NoBlockSelected));
    assert_eq!(a.select_block(3), Err(Error::InvalidBlock(3)));
    a.select_block(2).unwrap();
    assert_eq!(a.select_sm(4), Err(Error::InvalidSm(4)));
    assert_eq!(a.add_instr(Instruction::nop()), Err(Error::NoSmSelected));
    assert_eq!(a.mark_start(), Err(Error::NoSmSelected));
    assert_eq!(a.set_clkdiv(1, 0), Err(Error::NoSmSelected));
}

#[test]
fn a_block_commits_exactly_once() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    a.end_block().unwrap();
    assert_eq!(a.add_instr(Instruction::nop()), Err(Error::BlockEnded(0)));
    assert_eq!(a.end_block(), Err(Error::BlockEnded(0)));
    assert_eq!(a.select_block(0), Err(Error::BlockEnded(0)));
    // Other blocks are still buildable.
    a.select_block(1).unwrap();
    a.select_sm(0).unwrap();
    a.add_instr(Instruction::nop()).unwrap();
    a.end_block().unwrap();
}

#[test]
fn failed_build_commits_nothing() {
    let mut a = asm();
    for _ in 0..MAX_PROGRAM_LEN {
        a.add_instr(Instruction::nop()).unwrap();
    }
    assert!(a.add_instr(Instruction::nop()).is_err());
    // The error aborts the pass before end_block; the backend saw no write.
    assert_eq!(a.backend().blocks[0].instr_count, 0);
}

#[test]
fn enable_mask_is_validated() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    a.end_block().unwrap();
    assert_eq!(a.enable_sms(0, 0), Err(Error::InvalidSmMask(0)));
    assert_eq!(a.enable_sms(0, 0x10), Err(Error::InvalidSmMask(0x10)));
    a.enable_sms(0, 0b0101).unwrap();
    assert_eq!(a.backend().blocks[0].enabled_sms, 0b0101);
}

#[test]
fn exec_queue_is_bounded() {
    let mut a = asm();
    a.add_instr(Instruction::nop()).unwrap();
    for _ in 0..apio_rs::MAX_EXEC_INSTRS {
        a.exec_instr(Instruction::nop()).unwrap();
    }
    assert_eq!(
        a.exec_instr(Instruction::nop()),
        Err(Error::ExecQueueFull { block: 0, sm: 0 })
    );
}
