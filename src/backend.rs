//! Commit targets for assembled programs.
//!
//! The [`Assembler`](crate::Assembler) is generic over a [`Backend`], so the
//! same build sequence can be committed to real PIO registers or to an
//! in-process [`EmulatedPio`](crate::EmulatedPio) mirror. Read-back goes
//! through the same trait, so disassembly works against either target.

use crate::regs::{
    self, SmRegisters, CTRL_OFFSET, INSTR_MEM_OFFSET, IRQ_OFFSET, SM_CLKDIV, SM_EXECCTRL,
    SM_INSTR, SM_PINCTRL, SM_REG_OFFSET, SM_REG_STRIDE, SM_SHIFTCTRL,
};
use crate::{Error, SlotOffsets, MAX_PIO_BLOCKS, MAX_PROGRAM_LEN, MAX_SMS_PER_BLOCK};

pub(crate) fn check_block(block: u8) -> Result<(), Error> {
    if (block as usize) < MAX_PIO_BLOCKS {
        Ok(())
    } else {
        Err(Error::InvalidBlock(block))
    }
}

pub(crate) fn check_sm(sm: u8) -> Result<(), Error> {
    if (sm as usize) < MAX_SMS_PER_BLOCK {
        Ok(())
    } else {
        Err(Error::InvalidSm(sm))
    }
}

pub trait Backend {
    /// Write a block's instruction memory, starting at slot 0.
    fn write_program(&mut self, block: u8, instrs: &[u16]) -> Result<(), Error>;

    /// Write one SM's CLKDIV/EXECCTRL/SHIFTCTRL/PINCTRL registers.
    fn write_sm_registers(&mut self, block: u8, sm: u8, regs: SmRegisters) -> Result<(), Error>;

    /// Execute an instruction immediately on one SM, bypassing instruction
    /// memory.
    fn exec_instr(&mut self, block: u8, sm: u8, word: u16) -> Result<(), Error>;

    /// Enable the SMs selected by `mask` (bit N = SM N).
    fn enable_sms(&mut self, block: u8, mask: u8) -> Result<(), Error>;

    /// Clear all of a block's IRQ flags.
    fn clear_irqs(&mut self, block: u8) -> Result<(), Error>;

    /// Record a slot's program extents. Hardware has no register for these
    /// (the wrap range already lives in EXECCTRL), so the default is a no-op.
    fn record_offsets(&mut self, block: u8, sm: u8, offsets: SlotOffsets) -> Result<(), Error> {
        let _ = (sm, offsets);
        check_block(block)
    }

    /// Read back one committed instruction word.
    fn read_instr(&self, block: u8, index: u8) -> Result<u16, Error>;

    /// Read back one SM's configuration registers.
    fn read_sm_registers(&self, block: u8, sm: u8) -> Result<SmRegisters, Error>;
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn write_program(&mut self, block: u8, instrs: &[u16]) -> Result<(), Error> {
        (**self).write_program(block, instrs)
    }
    fn write_sm_registers(&mut self, block: u8, sm: u8, regs: SmRegisters) -> Result<(), Error> {
        (**self).write_sm_registers(block, sm, regs)
    }
    fn exec_instr(&mut self, block: u8, sm: u8, word: u16) -> Result<(), Error> {
        (**self).exec_instr(block, sm, word)
    }
    fn enable_sms(&mut self, block: u8, mask: u8) -> Result<(), Error> {
        (**self).enable_sms(block, mask)
    }
    fn clear_irqs(&mut self, block: u8) -> Result<(), Error> {
        (**self).clear_irqs(block)
    }
    fn record_offsets(&mut self, block: u8, sm: u8, offsets: SlotOffsets) -> Result<(), Error> {
        (**self).record_offsets(block, sm, offsets)
    }
    fn read_instr(&self, block: u8, index: u8) -> Result<u16, Error> {
        (**self).read_instr(block, index)
    }
    fn read_sm_registers(&self, block: u8, sm: u8) -> Result<SmRegisters, Error> {
        (**self).read_sm_registers(block, sm)
    }
}

/// Backend writing directly to the PIO register windows via volatile MMIO.
#[derive(Debug, Clone)]
pub struct HardwareBackend {
    bases: [usize; MAX_PIO_BLOCKS],
}

impl HardwareBackend {
    /// Target the device's real PIO blocks.
    ///
    /// # Safety
    ///
    /// Only sound on a device where the PIO register windows are mapped at
    /// their documented base addresses and this code has exclusive access to
    /// them.
    pub const unsafe fn new() -> Self {
        Self {
            bases: regs::BLOCK_BASES,
        }
    }

    /// Target caller-provided register windows instead of the real blocks.
    /// Used by host tests to commit into scratch memory.
    ///
    /// # Safety
    ///
    /// Each base must point at a writable, 4-byte-aligned region of at least
    /// 0x200 bytes that outlives the backend.
    pub const unsafe fn with_bases(bases: [usize; MAX_PIO_BLOCKS]) -> Self {
        Self { bases }
    }

    fn reg(&self, block: u8, offset: usize) -> *mut u32 {
        (self.bases[block as usize] + offset) as *mut u32
    }

    fn sm_reg(&self, block: u8, sm: u8, offset: usize) -> *mut u32 {
        self.reg(block, SM_REG_OFFSET + SM_REG_STRIDE * sm as usize + offset)
    }
}

impl Backend for HardwareBackend {
    fn write_program(&mut self, block: u8, instrs: &[u16]) -> Result<(), Error> {
        check_block(block)?;
        if instrs.len() > MAX_PROGRAM_LEN {
            return Err(Error::ProgramFull(block));
        }
        for (i, &word) in instrs.iter().enumerate() {
            let ptr = self.reg(block, INSTR_MEM_OFFSET + i * 4);
            unsafe { ptr.write_volatile(word as u32) };
        }
        Ok(())
    }

    fn write_sm_registers(&mut self, block: u8, sm: u8, regs: SmRegisters) -> Result<(), Error> {
        check_block(block)?;
        check_sm(sm)?;
        unsafe {
            self.sm_reg(block, sm, SM_CLKDIV).write_volatile(regs.clkdiv);
            self.sm_reg(block, sm, SM_EXECCTRL).write_volatile(regs.execctrl);
            self.sm_reg(block, sm, SM_SHIFTCTRL).write_volatile(regs.shiftctrl);
            self.sm_reg(block, sm, SM_PINCTRL).write_volatile(regs.pinctrl);
        }
        Ok(())
    }

    fn exec_instr(&mut self, block: u8, sm: u8, word: u16) -> Result<(), Error> {
        check_block(block)?;
        check_sm(sm)?;
        unsafe { self.sm_reg(block, sm, SM_INSTR).write_volatile(word as u32) };
        Ok(())
    }

    fn enable_sms(&mut self, block: u8, mask: u8) -> Result<(), Error> {
        check_block(block)?;
        unsafe { self.reg(block, CTRL_OFFSET).write_volatile((mask & 0xF) as u32) };
        Ok(())
    }

    fn clear_irqs(&mut self, block: u8) -> Result<(), Error> {
        check_block(block)?;
        unsafe { self.reg(block, IRQ_OFFSET).write_volatile(0xFFFF_FFFF) };
        Ok(())
    }

    fn read_instr(&self, block: u8, index: u8) -> Result<u16, Error> {
        check_block(block)?;
        if index as usize >= MAX_PROGRAM_LEN {
            return Err(Error::InvalidInstrIndex(index));
        }
        let ptr = self.reg(block, INSTR_MEM_OFFSET + index as usize * 4);
        Ok(unsafe { ptr.read_volatile() } as u16)
    }

    fn read_sm_registers(&self, block: u8, sm: u8) -> Result<SmRegisters, Error> {
        check_block(block)?;
        check_sm(sm)?;
        unsafe {
            Ok(SmRegisters {
                clkdiv: self.sm_reg(block, sm, SM_CLKDIV).read_volatile(),
                execctrl: self.sm_reg(block, sm, SM_EXECCTRL).read_volatile(),
                shiftctrl: self.sm_reg(block, sm, SM_SHIFTCTRL).read_volatile(),
                pinctrl: self.sm_reg(block, sm, SM_PINCTRL).read_volatile(),
            })
        }
    }
}
