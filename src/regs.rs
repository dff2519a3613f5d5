//! PIO register layout: block base addresses, register offsets and the
//! bit-field builders for the four per-SM configuration registers.
//!
//! Offsets and field positions must stay bit-exact with the hardware.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::MAX_PIO_BLOCKS;

/// Base address of each PIO block's register window.
pub const BLOCK_BASES: [usize; MAX_PIO_BLOCKS] = [0x5020_0000, 0x5030_0000, 0x5040_0000];

// Offsets from a block base.
pub const CTRL_OFFSET: usize = 0x00;
pub const FSTAT_OFFSET: usize = 0x04;
pub const FDEBUG_OFFSET: usize = 0x08;
pub const FLEVEL_OFFSET: usize = 0x0C;
pub const TXF_OFFSET: usize = 0x10;
pub const RXF_OFFSET: usize = 0x20;
pub const IRQ_OFFSET: usize = 0x30;
pub const IRQ_FORCE_OFFSET: usize = 0x34;
pub const INSTR_MEM_OFFSET: usize = 0x48;
pub const SM_REG_OFFSET: usize = 0xC8;
pub const GPIOBASE_OFFSET: usize = 0x168;

/// Stride between consecutive SM register windows.
pub const SM_REG_STRIDE: usize = 0x18;

// Offsets within one SM's register window.
pub const SM_CLKDIV: usize = 0x00;
pub const SM_EXECCTRL: usize = 0x04;
pub const SM_SHIFTCTRL: usize = 0x08;
pub const SM_ADDR: usize = 0x0C; // read only
pub const SM_INSTR: usize = 0x10;
pub const SM_PINCTRL: usize = 0x14;

// CLKDIV: integer divisor in bits 31:16, fractional part in bits 15:8.

pub fn clkdiv(int: u16, frac: u8) -> u32 {
    ((int as u32) << 16) | ((frac as u32) << 8)
}

pub fn clkdiv_int(reg: u32) -> u16 {
    (reg >> 16) as u16
}

pub fn clkdiv_frac(reg: u32) -> u8 {
    (reg >> 8) as u8
}

// EXECCTRL: wrap bottom in bits 11:7, wrap top in bits 16:12.

pub fn wrap_bottom_bits(offset: u8) -> u32 {
    ((offset as u32) & 0x1F) << 7
}

pub fn wrap_top_bits(offset: u8) -> u32 {
    ((offset as u32) & 0x1F) << 12
}

pub fn wrap_bottom_from(execctrl: u32) -> u8 {
    ((execctrl >> 7) & 0x1F) as u8
}

pub fn wrap_top_from(execctrl: u32) -> u8 {
    ((execctrl >> 12) & 0x1F) as u8
}

/// GPIO tested by `jmp pin`, EXECCTRL bits 28:24.
pub fn jmp_pin(pin: u8) -> u32 {
    ((pin as u32) & 0x1F) << 24
}

// EXECCTRL STATUS_SEL (bits 6:5) and STATUS_N (bits 4:0), consumed by
// `mov x, status`.
pub const STATUS_SEL_TXLEVEL: u32 = 0x0 << 5;
pub const STATUS_SEL_RXLEVEL: u32 = 0x1 << 5;
pub const STATUS_SEL_IRQ: u32 = 0x2 << 5;

pub fn status_n(n: u8) -> u32 {
    (n as u32) & 0x1F
}

// STATUS_N named values for IRQ mode.
pub const STATUS_N_IRQ: u32 = 0x00;
pub const STATUS_N_IRQ_PREVPIO: u32 = 0x08;
pub const STATUS_N_IRQ_NEXTPIO: u32 = 0x10;

bitflags! {
    /// SHIFTCTRL flag bits. Field-valued parts of the register are built
    /// with [`in_count`], [`push_thresh`] and [`pull_thresh`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ShiftCtrl: u32 {
        const AUTOPUSH = 1 << 16;
        const AUTOPULL = 1 << 17;
        const IN_SHIFTDIR_RIGHT = 1 << 18;
        const OUT_SHIFTDIR_RIGHT = 1 << 19;
    }
}

pub fn in_count(n: u8) -> u32 {
    (n as u32) & 0x1F
}

pub fn push_thresh(n: u8) -> u32 {
    ((n as u32) & 0x1F) << 20
}

pub fn pull_thresh(n: u8) -> u32 {
    ((n as u32) & 0x1F) << 25
}

// PINCTRL field builders.

pub fn out_base(pin: u8) -> u32 {
    (pin as u32) & 0x1F
}

pub fn set_base(pin: u8) -> u32 {
    ((pin as u32) & 0x1F) << 5
}

pub fn side_set_base(pin: u8) -> u32 {
    ((pin as u32) & 0x1F) << 10
}

pub fn in_base(pin: u8) -> u32 {
    ((pin as u32) & 0x1F) << 15
}

pub fn out_count(n: u8) -> u32 {
    ((n as u32) & 0x3F) << 20
}

pub fn set_count(n: u8) -> u32 {
    ((n as u32) & 0x07) << 26
}

pub fn side_set_count(n: u8) -> u32 {
    ((n as u32) & 0x07) << 29
}

// DREQ numbering for DMA pacing.

pub fn dreq_tx(block: u8, sm: u8) -> u8 {
    block * 8 + sm
}

pub fn dreq_rx(block: u8, sm: u8) -> u8 {
    4 + block * 8 + sm
}

/// Committed configuration of one state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmRegisters {
    pub clkdiv: u32,
    pub execctrl: u32,
    pub shiftctrl: u32,
    pub pinctrl: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clkdiv_round_trips_fields() {
        let reg = clkdiv(15000, 128);
        assert_eq!(clkdiv_int(reg), 15000);
        assert_eq!(clkdiv_frac(reg), 128);
    }

    #[test]
    fn wrap_fields_fold_and_extract() {
        let execctrl = wrap_bottom_bits(1) | wrap_top_bits(2);
        assert_eq!(execctrl, (1 << 7) | (2 << 12));
        assert_eq!(wrap_bottom_from(execctrl), 1);
        assert_eq!(wrap_top_from(execctrl), 2);
    }

    #[test]
    fn pinctrl_fields_do_not_overlap() {
        let all = out_base(31) | set_base(31) | side_set_base(31) | in_base(31)
            | out_count(63) | set_count(7) | side_set_count(7);
        let sum = out_base(31) + set_base(31) + side_set_base(31) + in_base(31)
            + out_count(63) + set_count(7) + side_set_count(7);
        assert_eq!(all, sum);
    }
}
