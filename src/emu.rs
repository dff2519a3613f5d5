//! In-process mirror of the PIO register state, for running build passes on
//! a host without the hardware.
//!
//! [`EmulatedPio`] implements [`Backend`], so an [`Assembler`](crate::Assembler)
//! commits into it exactly as it would into the device. The struct is plain
//! data with serde derives; serializing it is the snapshot bridge for an
//! external instruction-level simulator.

use serde::{Deserialize, Serialize};

use crate::backend::{check_block, check_sm, Backend};
use crate::regs::SmRegisters;
use crate::{
    Error, SlotOffsets, MAX_EXEC_INSTRS, MAX_FIFO_DEPTH, MAX_PIO_BLOCKS, MAX_PROGRAM_LEN,
    MAX_SMS_PER_BLOCK,
};

/// Emulated state of one PIO block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulatedBlock {
    /// IRQ flag word, write-one-to-clear semantics mirrored by `clear_irqs`.
    pub irq: u32,
    /// Shared 32-slot instruction memory.
    pub instr: [u16; MAX_PROGRAM_LEN],
    /// Number of committed instruction slots.
    pub instr_count: u8,
    /// Bitmask of enabled SMs.
    pub enabled_sms: u8,
    pub sms: [EmulatedSm; MAX_SMS_PER_BLOCK],
}

/// Emulated state of one state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulatedSm {
    pub regs: SmRegisters,
    pub offsets: SlotOffsets,
    /// Instructions written to the INSTR register before enabling, in order.
    pub pending_instrs: Vec<u16>,
    pub tx_fifo: Vec<u32>,
    pub rx_fifo: Vec<u32>,
}

/// Process-local stand-in for the full PIO register surface.
///
/// Unlike the hardware, the mirror persists across build passes; call
/// [`reset`](Self::reset) at the start of each independent pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmulatedPio {
    pub blocks: [EmulatedBlock; MAX_PIO_BLOCKS],
}

impl EmulatedPio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all committed state and queued data.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn block(&self, block: u8) -> Result<&EmulatedBlock, Error> {
        check_block(block)?;
        Ok(&self.blocks[block as usize])
    }

    pub fn sm(&self, block: u8, sm: u8) -> Result<&EmulatedSm, Error> {
        check_sm(sm)?;
        Ok(&self.block(block)?.sms[sm as usize])
    }

    fn sm_mut(&mut self, block: u8, sm: u8) -> Result<&mut EmulatedSm, Error> {
        check_block(block)?;
        check_sm(sm)?;
        Ok(&mut self.blocks[block as usize].sms[sm as usize])
    }

    /// Queue a word into an SM's TX FIFO, as a write of the TXF register
    /// would.
    pub fn push_tx(&mut self, block: u8, sm: u8, value: u32) -> Result<(), Error> {
        let slot = self.sm_mut(block, sm)?;
        if slot.tx_fifo.len() >= MAX_FIFO_DEPTH {
            return Err(Error::FifoFull { block, sm });
        }
        slot.tx_fifo.push(value);
        Ok(())
    }

    /// Dequeue the oldest TX FIFO word (consumed by a simulated `pull`).
    pub fn pop_tx(&mut self, block: u8, sm: u8) -> Result<u32, Error> {
        let slot = self.sm_mut(block, sm)?;
        if slot.tx_fifo.is_empty() {
            return Err(Error::FifoEmpty { block, sm });
        }
        Ok(slot.tx_fifo.remove(0))
    }

    /// Queue a word into an SM's RX FIFO (produced by a simulated `push`).
    pub fn push_rx(&mut self, block: u8, sm: u8, value: u32) -> Result<(), Error> {
        let slot = self.sm_mut(block, sm)?;
        if slot.rx_fifo.len() >= MAX_FIFO_DEPTH {
            return Err(Error::FifoFull { block, sm });
        }
        slot.rx_fifo.push(value);
        Ok(())
    }

    /// Dequeue the oldest RX FIFO word, as a read of the RXF register would.
    pub fn pop_rx(&mut self, block: u8, sm: u8) -> Result<u32, Error> {
        let slot = self.sm_mut(block, sm)?;
        if slot.rx_fifo.is_empty() {
            return Err(Error::FifoEmpty { block, sm });
        }
        Ok(slot.rx_fifo.remove(0))
    }
}

impl Backend for EmulatedPio {
    fn write_program(&mut self, block: u8, instrs: &[u16]) -> Result<(), Error> {
        check_block(block)?;
        if instrs.len() > MAX_PROGRAM_LEN {
            return Err(Error::ProgramFull(block));
        }
        let blk = &mut self.blocks[block as usize];
        blk.instr[..instrs.len()].copy_from_slice(instrs);
        blk.instr_count = instrs.len() as u8;
        Ok(())
    }

    fn write_sm_registers(&mut self, block: u8, sm: u8, regs: SmRegisters) -> Result<(), Error> {
        self.sm_mut(block, sm)?.regs = regs;
        Ok(())
    }

    fn exec_instr(&mut self, block: u8, sm: u8, word: u16) -> Result<(), Error> {
        let slot = self.sm_mut(block, sm)?;
        if slot.pending_instrs.len() >= MAX_EXEC_INSTRS {
            return Err(Error::ExecQueueFull { block, sm });
        }
        slot.pending_instrs.push(word);
        Ok(())
    }

    fn enable_sms(&mut self, block: u8, mask: u8) -> Result<(), Error> {
        check_block(block)?;
        self.blocks[block as usize].enabled_sms = mask & 0xF;
        Ok(())
    }

    fn clear_irqs(&mut self, block: u8) -> Result<(), Error> {
        check_block(block)?;
        self.blocks[block as usize].irq = 0;
        Ok(())
    }

    fn record_offsets(&mut self, block: u8, sm: u8, offsets: SlotOffsets) -> Result<(), Error> {
        self.sm_mut(block, sm)?.offsets = offsets;
        Ok(())
    }

    fn read_instr(&self, block: u8, index: u8) -> Result<u16, Error> {
        let blk = self.block(block)?;
        if index as usize >= MAX_PROGRAM_LEN {
            return Err(Error::InvalidInstrIndex(index));
        }
        Ok(blk.instr[index as usize])
    }

    fn read_sm_registers(&self, block: u8, sm: u8) -> Result<SmRegisters, Error> {
        Ok(self.sm(block, sm)?.regs)
    }
}
