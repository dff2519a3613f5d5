use pretty_assertions::assert_eq;

use apio_rs::instr::{InstrOp, Instruction, SetDestination};
use apio_rs::{regs, Assembler, EmulatedPio};

fn set(destination: SetDestination, value: u8) -> Instruction {
    Instruction::new(InstrOp::Set { destination, value })
}

/// Build the GPIO-toggle program: pindirs, then a two-instruction wrap loop.
fn build_blink(asm: &mut Assembler<impl apio_rs::Backend>) {
    asm.select_block(0).unwrap();
    asm.select_sm(0).unwrap();
    asm.add_instr(set(SetDestination::PinDirs, 1)).unwrap();
    asm.mark_wrap_bottom().unwrap();
    asm.add_instr(set(SetDestination::Pins, 1).with_delay(31)).unwrap();
    asm.mark_wrap_top().unwrap();
    asm.add_instr(set(SetDestination::Pins, 0).with_delay(31)).unwrap();
    asm.set_clkdiv(15000, 0).unwrap();
    asm.set_execctrl(0).unwrap();
    asm.set_shiftctrl(0).unwrap();
    asm.set_pinctrl(regs::set_base(0) | regs::set_count(1)).unwrap();
    asm.jmp_to_start().unwrap();
    asm.end_block().unwrap();
}

#[test]
fn blink_commits_expected_words_and_registers() {
    let mut asm = Assembler::new(EmulatedPio::new());
    build_blink(&mut asm);
    asm.enable_sms(0, 1).unwrap();

    let pio = asm.backend();
    let blk = &pio.blocks[0];
    assert_eq!(blk.instr_count, 3);
    assert_eq!(&blk.instr[..3], &[0xE081, 0xFF01, 0xFF00]);
    assert_eq!(blk.enabled_sms, 1);

    let sm = &blk.sms[0];
    assert_eq!(sm.regs.clkdiv, regs::clkdiv(15000, 0));
    // Wrap range folded into EXECCTRL from the marks.
    assert_eq!(sm.regs.execctrl, regs::wrap_bottom_bits(1) | regs::wrap_top_bits(2));
    assert_eq!(regs::wrap_bottom_from(sm.regs.execctrl), 1);
    assert_eq!(regs::wrap_top_from(sm.regs.execctrl), 2);
    assert_eq!(sm.regs.pinctrl, regs::set_count(1));
    // jmp_to_start queued an immediate jump to offset 0.
    assert_eq!(sm.pending_instrs, vec![0x0000]);
    // Offsets survive the commit.
    assert_eq!(sm.offsets.first, 0);
    assert_eq!(sm.offsets.wrap_bottom, 1);
    assert_eq!(sm.offsets.wrap_top, 2);
    assert_eq!(sm.offsets.end, 2);
}

#[test]
fn blink_listing_places_markers() {
    let mut asm = Assembler::new(EmulatedPio::new());
    build_blink(&mut asm);

    let mut lines = Vec::new();
    asm.log_sm("Blink", |l| lines.push(l.to_string())).unwrap();

    assert_eq!(lines[0], "PIO0:0 Blink (3 instructions)");
    assert!(lines[1].starts_with("  CLKDIV: 15000.00 EXECCTRL:"));
    assert_eq!(lines[2], "  .program pio0_sm0");
    assert_eq!(
        &lines[3..],
        &[
            "  .start",
            "    0: 0xE081 ; set pindirs, 1",
            "  .wrap_target",
            "    1: 0xFF01 ; set pins, 1 [31]",
            "    2: 0xFF00 ; set pins, 0 [31]",
            "  .wrap",
        ]
    );
}

#[test]
fn relative_jmp_listing_for_offset_program() {
    // Fill SM0 with ten instructions so SM1's program starts at offset 10,
    // then jump to its own first instruction.
    let mut asm = Assembler::new(EmulatedPio::new());
    asm.select_block(0).unwrap();
    asm.select_sm(0).unwrap();
    for _ in 0..10 {
        asm.add_instr(Instruction::nop()).unwrap();
    }
    asm.select_sm(1).unwrap();
    let start = asm.label().unwrap();
    assert_eq!(start, 10);
    asm.add_instr(Instruction::jmp(start)).unwrap();
    asm.end_block().unwrap();

    let offsets = asm.slot_offsets(0, 1).unwrap();
    let mut lines = Vec::new();
    apio_rs::disasm::render_program(asm.backend(), "SM1", 0, 1, offsets, |l| {
        lines.push(l.to_string())
    })
    .unwrap();
    assert!(lines.contains(&"    0: 0x000A ; jmp 0".to_string()));
}

#[test]
fn exec_instrs_flush_in_order_after_registers() {
    let mut asm = Assembler::new(EmulatedPio::new());
    asm.select_block(2).unwrap();
    asm.select_sm(3).unwrap();
    asm.add_instr(Instruction::nop()).unwrap();
    asm.exec_instr(set(SetDestination::X, 7)).unwrap();
    asm.jmp_to_start().unwrap();
    asm.end_block().unwrap();

    let sm = asm.backend().sm(2, 3).unwrap();
    assert_eq!(sm.pending_instrs, vec![0xE027, 0x0000]);
}

#[test]
fn clear_all_irqs_touches_every_block() {
    let mut pio = EmulatedPio::new();
    for b in &mut pio.blocks {
        b.irq = 0xDEAD_BEEF;
    }
    let mut asm = Assembler::new(&mut pio);
    asm.clear_all_irqs().unwrap();
    drop(asm);
    assert!(pio.blocks.iter().all(|b| b.irq == 0));
}

#[test]
fn snapshot_serializes_for_external_simulators() {
    let mut asm = Assembler::new(EmulatedPio::new());
    build_blink(&mut asm);
    let json = serde_json::to_string(asm.backend()).unwrap();
    let restored: EmulatedPio = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.blocks[0].instr[..3], asm.backend().blocks[0].instr[..3]);
    assert_eq!(restored.blocks[0].sms[0].regs, asm.backend().blocks[0].sms[0].regs);
    assert_eq!(restored.blocks[0].sms[0].offsets, asm.backend().blocks[0].sms[0].offsets);
}

#[test]
fn reset_isolates_build_passes() {
    let mut pio = EmulatedPio::new();
    {
        let mut asm = Assembler::new(&mut pio);
        asm.select_block(0).unwrap();
        asm.select_sm(0).unwrap();
        asm.add_instr(Instruction::nop()).unwrap();
        asm.end_block().unwrap();
    }
    pio.reset();
    let mut asm = Assembler::new(&mut pio);
    asm.select_block(0).unwrap();
    asm.select_sm(0).unwrap();
    asm.add_instr(Instruction::jmp(0)).unwrap();
    asm.end_block().unwrap();
    assert_eq!(pio.blocks[0].instr_count, 1);
    assert_eq!(pio.blocks[0].instr[0], 0x0000);
}
