//! Runtime PIO program builder.
//!
//! One [`Assembler`] owns the scratch instruction buffers and per-slot layout
//! records for a whole build pass. Nothing reaches the [`Backend`] until
//! [`end_block`](Assembler::end_block): a failed build aborts with the
//! hardware untouched, which matters because a half-written program on an
//! enabled SM is worse than none.
//!
//! Per block: select it, then per SM select the SM, append instructions,
//! place the start/wrap/end marks (each captures the offset of the *next*
//! appended instruction), set the SM's registers, and optionally queue
//! immediate instructions such as [`jmp_to_start`](Assembler::jmp_to_start).
//! `end_block` then commits the block's instruction memory, every selected
//! SM's registers (with the wrap range folded into EXECCTRL) and the queued
//! immediates, in that order. Enabling SMs is a separate, final step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{check_block, check_sm, Backend};
use crate::instr::Instruction;
use crate::regs::{self, SmRegisters};
use crate::{Error, MAX_EXEC_INSTRS, MAX_PIO_BLOCKS, MAX_PROGRAM_LEN, MAX_SMS_PER_BLOCK};

/// Layout of one SM's program within its block's instruction memory.
///
/// Invariant: `first <= start, wrap_bottom, wrap_top <= end < 32` and
/// `wrap_bottom <= wrap_top`, maintained by the marker calls capturing the
/// block's monotonically increasing append offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOffsets {
    pub first: u8,
    pub start: u8,
    pub wrap_bottom: u8,
    pub wrap_top: u8,
    pub end: u8,
}

#[derive(Debug, Clone, Default)]
struct SlotState {
    offsets: SlotOffsets,
    regs: SmRegisters,
    exec_queue: Vec<u16>,
    /// Set once the SM has been selected this pass; only used slots are
    /// committed.
    used: bool,
}

/// Builder for the programs of all three PIO blocks in one build pass.
pub struct Assembler<B: Backend> {
    backend: B,
    instr: [[u16; MAX_PROGRAM_LEN]; MAX_PIO_BLOCKS],
    offset: [u8; MAX_PIO_BLOCKS],
    ended: [bool; MAX_PIO_BLOCKS],
    slots: [[SlotState; MAX_SMS_PER_BLOCK]; MAX_PIO_BLOCKS],
    block: Option<u8>,
    sm: Option<u8>,
}

impl<B: Backend> Assembler<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            instr: [[0; MAX_PROGRAM_LEN]; MAX_PIO_BLOCKS],
            offset: [0; MAX_PIO_BLOCKS],
            ended: [false; MAX_PIO_BLOCKS],
            slots: Default::default(),
            block: None,
            sm: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    fn cur_block(&self) -> Result<u8, Error> {
        self.block.ok_or(Error::NoBlockSelected)
    }

    fn cur_slot(&self) -> Result<(u8, u8), Error> {
        Ok((self.cur_block()?, self.sm.ok_or(Error::NoSmSelected)?))
    }

    fn slot_mut(&mut self) -> Result<&mut SlotState, Error> {
        let (block, sm) = self.cur_slot()?;
        Ok(&mut self.slots[block as usize][sm as usize])
    }

    /// Select the block the following calls operate on. Deselects any SM.
    pub fn select_block(&mut self, block: u8) -> Result<(), Error> {
        check_block(block)?;
        if self.ended[block as usize] {
            return Err(Error::BlockEnded(block));
        }
        self.block = Some(block);
        self.sm = None;
        Ok(())
    }

    /// Select an SM within the current block. All five of its offsets are
    /// initialised to the block's current append offset, so a program with
    /// no explicit marks is the degenerate single-instruction layout.
    pub fn select_sm(&mut self, sm: u8) -> Result<(), Error> {
        let block = self.cur_block()?;
        check_sm(sm)?;
        self.sm = Some(sm);
        let here = self.offset[block as usize];
        let slot = &mut self.slots[block as usize][sm as usize];
        slot.offsets = SlotOffsets {
            first: here,
            start: here,
            wrap_bottom: here,
            wrap_top: here,
            end: here,
        };
        slot.used = true;
        Ok(())
    }

    /// The current append offset: the address the next instruction will get.
    /// Use as a JMP destination for an already-emitted instruction.
    pub fn label(&self) -> Result<u8, Error> {
        let block = self.cur_block()?;
        Ok(self.offset[block as usize])
    }

    /// A label `delta` instructions past the current append offset. The
    /// caller is responsible for actually emitting that many instructions;
    /// forward references are not resolved.
    pub fn label_at(&self, delta: u8) -> Result<u8, Error> {
        Ok(self.label()? + delta)
    }

    /// Encode and append one instruction to the current block.
    pub fn add_instr(&mut self, instr: Instruction) -> Result<(), Error> {
        let (block, _) = self.cur_slot()?;
        if self.ended[block as usize] {
            return Err(Error::BlockEnded(block));
        }
        let off = self.offset[block as usize] as usize;
        if off >= MAX_PROGRAM_LEN {
            return Err(Error::ProgramFull(block));
        }
        self.instr[block as usize][off] = instr.encode();
        self.offset[block as usize] += 1;
        Ok(())
    }

    /// Mark the next appended instruction as the SM's start point.
    pub fn mark_start(&mut self) -> Result<(), Error> {
        let here = self.label()?;
        self.slot_mut()?.offsets.start = here;
        Ok(())
    }

    /// Mark the next appended instruction as the wrap target.
    pub fn mark_wrap_bottom(&mut self) -> Result<(), Error> {
        let here = self.label()?;
        self.slot_mut()?.offsets.wrap_bottom = here;
        Ok(())
    }

    /// Mark the next appended instruction as the wrap point. Also moves the
    /// program end there; call [`mark_end`](Self::mark_end) afterwards if the
    /// program continues past the wrap.
    pub fn mark_wrap_top(&mut self) -> Result<(), Error> {
        let here = self.label()?;
        let offsets = &mut self.slot_mut()?.offsets;
        offsets.wrap_top = here;
        offsets.end = here;
        Ok(())
    }

    /// Mark the next appended instruction as the SM's last.
    pub fn mark_end(&mut self) -> Result<(), Error> {
        let here = self.label()?;
        self.slot_mut()?.offsets.end = here;
        Ok(())
    }

    /// Set the current SM's clock divisor.
    pub fn set_clkdiv(&mut self, int: u16, frac: u8) -> Result<(), Error> {
        self.slot_mut()?.regs.clkdiv = regs::clkdiv(int, frac);
        Ok(())
    }

    /// Set the current SM's EXECCTRL. Do not include the wrap range; it is
    /// folded in from the wrap marks at commit.
    pub fn set_execctrl(&mut self, value: u32) -> Result<(), Error> {
        self.slot_mut()?.regs.execctrl = value;
        Ok(())
    }

    pub fn set_shiftctrl(&mut self, value: u32) -> Result<(), Error> {
        self.slot_mut()?.regs.shiftctrl = value;
        Ok(())
    }

    pub fn set_pinctrl(&mut self, value: u32) -> Result<(), Error> {
        self.slot_mut()?.regs.pinctrl = value;
        Ok(())
    }

    /// Queue an instruction for immediate execution on the current SM once
    /// the block is committed. Queued instructions do not occupy instruction
    /// memory.
    pub fn exec_instr(&mut self, instr: Instruction) -> Result<(), Error> {
        let (block, sm) = self.cur_slot()?;
        let slot = &mut self.slots[block as usize][sm as usize];
        if slot.exec_queue.len() >= MAX_EXEC_INSTRS {
            return Err(Error::ExecQueueFull { block, sm });
        }
        slot.exec_queue.push(instr.encode());
        Ok(())
    }

    /// Queue an immediate jump to the current SM's start point, so the SM
    /// begins there when enabled.
    pub fn jmp_to_start(&mut self) -> Result<(), Error> {
        let start = self.slot_mut()?.offsets.start;
        self.exec_instr(Instruction::jmp(start))
    }

    /// Commit the current block: instruction memory first, then each used
    /// SM's registers, then its queued immediate instructions. The block can
    /// not be appended to afterwards; its offset records remain readable for
    /// disassembly.
    pub fn end_block(&mut self) -> Result<(), Error> {
        let block = self.cur_block()?;
        if self.ended[block as usize] {
            return Err(Error::BlockEnded(block));
        }
        let count = self.offset[block as usize] as usize;
        self.backend
            .write_program(block, &self.instr[block as usize][..count])?;
        for sm in 0..MAX_SMS_PER_BLOCK as u8 {
            let slot = &self.slots[block as usize][sm as usize];
            if !slot.used {
                continue;
            }
            let mut regs = slot.regs;
            regs.execctrl |= regs::wrap_bottom_bits(slot.offsets.wrap_bottom)
                | regs::wrap_top_bits(slot.offsets.wrap_top);
            self.backend.write_sm_registers(block, sm, regs)?;
            self.backend.record_offsets(block, sm, slot.offsets)?;
            for &word in &slot.exec_queue {
                self.backend.exec_instr(block, sm, word)?;
            }
        }
        self.ended[block as usize] = true;
        debug!(block, instructions = count, "committed PIO block");
        Ok(())
    }

    /// Enable SMs in a block. Call only after `end_block` has committed
    /// everything the SMs will execute.
    pub fn enable_sms(&mut self, block: u8, mask: u8) -> Result<(), Error> {
        check_block(block)?;
        if mask == 0 || mask >= 1 << MAX_SMS_PER_BLOCK {
            return Err(Error::InvalidSmMask(mask));
        }
        self.backend.enable_sms(block, mask)?;
        debug!(block, mask, "enabled SMs");
        Ok(())
    }

    /// Clear the IRQ flags of every block.
    pub fn clear_all_irqs(&mut self) -> Result<(), Error> {
        for block in 0..MAX_PIO_BLOCKS as u8 {
            self.backend.clear_irqs(block)?;
        }
        Ok(())
    }

    /// The offsets recorded for a slot, for read-back and disassembly.
    pub fn slot_offsets(&self, block: u8, sm: u8) -> Result<SlotOffsets, Error> {
        check_block(block)?;
        check_sm(sm)?;
        Ok(self.slots[block as usize][sm as usize].offsets)
    }

    /// Render the current SM's committed program through `sink`, one line at
    /// a time. Call after `end_block`, since instructions and registers are
    /// read back from the backend.
    #[cfg(feature = "disasm")]
    pub fn log_sm(&self, name: &str, sink: impl FnMut(&str)) -> Result<(), Error> {
        let (block, sm) = self.cur_slot()?;
        let offsets = self.slots[block as usize][sm as usize].offsets;
        crate::disasm::render_program(&self.backend, name, block, sm, offsets, sink)
    }
}
