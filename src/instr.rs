//! Typed PIO instructions and their 16-bit encoding.
//!
//! Every instruction word is `[15:13] opcode, [12:8] delay, [7:0] payload`.
//! Field values wider than their slot are truncated to the slot width, the
//! same way the hardware ignores the upper bits.

use serde::{Deserialize, Serialize};

/// JMP condition, bits 7:5 of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JmpCondition {
    Always = 0b000,
    /// `!x` - X is zero.
    XZero = 0b001,
    /// `x--` - X is non-zero, post-decrement.
    XNonZeroDec = 0b010,
    /// `!y` - Y is zero.
    YZero = 0b011,
    /// `y--` - Y is non-zero, post-decrement.
    YNonZeroDec = 0b100,
    /// `x!=y`.
    XNotEqualY = 0b101,
    /// The EXECCTRL JMP_PIN is high.
    Pin = 0b110,
    /// `!osre` - OSR not empty.
    OsrNotEmpty = 0b111,
}

/// Addressing of IRQ indices relative to this PIO block, bits 4:3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrqIndexMode {
    Direct = 0b00,
    /// Previous PIO block's IRQs.
    Prev = 0b01,
    /// Index is added to the SM number, modulo 4.
    Rel = 0b10,
    /// Next PIO block's IRQs.
    Next = 0b11,
}

/// WAIT source, bits 6:5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaitSource {
    Gpio,
    Pin,
    Irq(IrqIndexMode),
    JmpPin,
}

impl WaitSource {
    fn bits(self) -> u16 {
        match self {
            WaitSource::Gpio => 0b00,
            WaitSource::Pin => 0b01,
            WaitSource::Irq(_) => 0b10,
            WaitSource::JmpPin => 0b11,
        }
    }
}

/// IN source, bits 7:5. Values 4 and 5 are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InSource {
    Pins = 0b000,
    X = 0b001,
    Y = 0b010,
    Null = 0b011,
    Isr = 0b110,
    Osr = 0b111,
}

/// OUT destination, bits 7:5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutDestination {
    Pins = 0b000,
    X = 0b001,
    Y = 0b010,
    Null = 0b011,
    PinDirs = 0b100,
    Pc = 0b101,
    Isr = 0b110,
    Exec = 0b111,
}

/// MOV destination, bits 7:5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovDestination {
    Pins = 0b000,
    X = 0b001,
    Y = 0b010,
    PinDirs = 0b011,
    Exec = 0b100,
    Pc = 0b101,
    Isr = 0b110,
    Osr = 0b111,
}

/// MOV operation, bits 4:3. Value 3 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovOp {
    None = 0b00,
    Invert = 0b01,
    BitReverse = 0b10,
}

/// MOV source, bits 2:0. Value 4 is reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovSource {
    Pins = 0b000,
    X = 0b001,
    Y = 0b010,
    Null = 0b011,
    Status = 0b101,
    Isr = 0b110,
    Osr = 0b111,
}

/// SET destination, bits 7:5. Remaining values are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetDestination {
    Pins = 0b000,
    X = 0b001,
    Y = 0b010,
    PinDirs = 0b100,
}

/// FIFO entry selector for the indexed MOV forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FifoIndex {
    /// Entry selected by the Y register.
    Y,
    /// Immediate entry index (0-3).
    Imm(u8),
}

impl FifoIndex {
    fn bits(self) -> u16 {
        match self {
            FifoIndex::Y => 0,
            FifoIndex::Imm(idx) => (1 << 3) | (idx as u16 & 0x3),
        }
    }
}

/// One of the eight PIO opcode classes with its payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrOp {
    Jmp {
        condition: JmpCondition,
        /// Absolute instruction memory address (0-31).
        target: u8,
    },
    Wait {
        /// Wait for a 1 (true) or a 0 (false).
        polarity: bool,
        source: WaitSource,
        index: u8,
    },
    In {
        source: InSource,
        /// 1-32; 32 encodes as 0.
        bit_count: u8,
    },
    Out {
        destination: OutDestination,
        bit_count: u8,
    },
    Push {
        if_full: bool,
        block: bool,
    },
    Pull {
        if_empty: bool,
        block: bool,
    },
    /// `mov rxfifo[index], isr`.
    MovRxFifo { index: FifoIndex },
    /// `mov txfifo[index], osr`.
    MovTxFifo { index: FifoIndex },
    Mov {
        destination: MovDestination,
        op: MovOp,
        source: MovSource,
    },
    Irq {
        clear: bool,
        wait: bool,
        mode: IrqIndexMode,
        index: u8,
    },
    Set {
        destination: SetDestination,
        /// Immediate value (0-31).
        value: u8,
    },
}

impl InstrOp {
    /// Encode opcode class and payload; delay bits are left clear.
    pub fn encode(self) -> u16 {
        match self {
            InstrOp::Jmp { condition, target } => {
                ((condition as u16) << 5) | (target as u16 & 0x1F)
            }
            InstrOp::Wait {
                polarity,
                source,
                index,
            } => {
                let mut word = 0x2000 | ((polarity as u16) << 7) | (source.bits() << 5);
                word |= match source {
                    WaitSource::Irq(mode) => ((mode as u16) << 3) | (index as u16 & 0x7),
                    _ => index as u16 & 0x1F,
                };
                word
            }
            InstrOp::In { source, bit_count } => {
                0x4000 | ((source as u16) << 5) | (bit_count as u16 & 0x1F)
            }
            InstrOp::Out {
                destination,
                bit_count,
            } => 0x6000 | ((destination as u16) << 5) | (bit_count as u16 & 0x1F),
            InstrOp::Push { if_full, block } => {
                0x8000 | ((if_full as u16) << 6) | ((block as u16) << 5)
            }
            InstrOp::Pull { if_empty, block } => {
                0x8080 | ((if_empty as u16) << 6) | ((block as u16) << 5)
            }
            InstrOp::MovRxFifo { index } => 0x8010 | index.bits(),
            InstrOp::MovTxFifo { index } => 0x8090 | index.bits(),
            InstrOp::Mov {
                destination,
                op,
                source,
            } => 0xA000 | ((destination as u16) << 5) | ((op as u16) << 3) | source as u16,
            InstrOp::Irq {
                clear,
                wait,
                mode,
                index,
            } => {
                0xC000
                    | ((clear as u16) << 6)
                    | ((wait as u16) << 5)
                    | ((mode as u16) << 3)
                    | (index as u16 & 0x7)
            }
            InstrOp::Set { destination, value } => {
                0xE000 | ((destination as u16) << 5) | (value as u16 & 0x1F)
            }
        }
    }
}

/// A single PIO instruction: opcode class plus a per-instruction delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub op: InstrOp,
    /// Extra stall cycles after the instruction, 0-31.
    pub delay: u8,
}

impl Instruction {
    pub fn new(op: InstrOp) -> Self {
        Self { op, delay: 0 }
    }

    pub fn with_delay(mut self, delay: u8) -> Self {
        self.delay = delay;
        self
    }

    /// `mov y, y` - the canonical no-op encoding (0xA042).
    pub fn nop() -> Self {
        Self::new(InstrOp::Mov {
            destination: MovDestination::Y,
            op: MovOp::None,
            source: MovSource::Y,
        })
    }

    /// Unconditional jump to an absolute instruction address.
    pub fn jmp(target: u8) -> Self {
        Self::new(InstrOp::Jmp {
            condition: JmpCondition::Always,
            target,
        })
    }

    pub fn encode(self) -> u16 {
        self.op.encode() | ((self.delay as u16 & 0x1F) << 8)
    }
}
