pub mod asm;
pub mod backend;
pub mod emu;
pub mod instr;
pub mod regs;

#[cfg(feature = "disasm")]
pub mod disasm;

pub use asm::{Assembler, SlotOffsets};
pub use backend::{Backend, HardwareBackend};
pub use emu::EmulatedPio;
pub use instr::{Instruction, InstrOp};
pub use regs::SmRegisters;

/// Number of PIO blocks on the device.
pub const MAX_PIO_BLOCKS: usize = 3;
/// State machines per PIO block.
pub const MAX_SMS_PER_BLOCK: usize = 4;
/// Instruction memory slots per PIO block.
pub const MAX_PROGRAM_LEN: usize = 32;
/// Depth of each TX/RX FIFO.
pub const MAX_FIFO_DEPTH: usize = 4;
/// Immediate instructions that may be queued per SM before enabling.
pub const MAX_EXEC_INSTRS: usize = 16;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("invalid PIO block {0}")]
    InvalidBlock(u8),
    #[error("invalid state machine {0}")]
    InvalidSm(u8),
    #[error("no PIO block selected")]
    NoBlockSelected,
    #[error("no state machine selected")]
    NoSmSelected,
    #[error("PIO{0} instruction memory full")]
    ProgramFull(u8),
    #[error("instruction index {0} out of range")]
    InvalidInstrIndex(u8),
    #[error("PIO{0} already committed")]
    BlockEnded(u8),
    #[error("immediate instruction queue full for PIO{block} SM{sm}")]
    ExecQueueFull { block: u8, sm: u8 },
    #[error("invalid state machine mask {0:#06b}")]
    InvalidSmMask(u8),
    #[error("FIFO full for PIO{block} SM{sm}")]
    FifoFull { block: u8, sm: u8 },
    #[error("FIFO empty for PIO{block} SM{sm}")]
    FifoEmpty { block: u8, sm: u8 },
}
