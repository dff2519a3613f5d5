//! Mnemonic rendering for committed instruction words.
//!
//! Decoding is total: it runs over whatever is in instruction memory, so
//! reserved bit patterns render as `reserved` rather than failing.

use crate::asm::SlotOffsets;
use crate::backend::Backend;
use crate::regs;
use crate::Error;

fn jmp_condition_str(cond: u8) -> &'static str {
    match cond & 0x7 {
        0b000 => "",
        0b001 => "!x",
        0b010 => "x--",
        0b011 => "!y",
        0b100 => "y--",
        0b101 => "x!=y",
        0b110 => "pin",
        _ => "!osre",
    }
}

fn wait_source_str(src: u8) -> &'static str {
    match src & 0x3 {
        0b00 => "gpio",
        0b01 => "pin",
        0b10 => "irq",
        _ => "jmppin",
    }
}

fn in_source_str(src: u8) -> &'static str {
    match src & 0x7 {
        0b000 => "pins",
        0b001 => "x",
        0b010 => "y",
        0b011 => "null",
        0b100 | 0b101 => "reserved",
        0b110 => "isr",
        _ => "osr",
    }
}

fn out_dest_str(dest: u8) -> &'static str {
    match dest & 0x7 {
        0b000 => "pins",
        0b001 => "x",
        0b010 => "y",
        0b011 => "null",
        0b100 => "pindirs",
        0b101 => "pc",
        0b110 => "isr",
        _ => "exec",
    }
}

fn mov_dest_str(dest: u8) -> &'static str {
    match dest & 0x7 {
        0b000 => "pins",
        0b001 => "x",
        0b010 => "y",
        0b011 => "pindirs",
        0b100 => "exec",
        0b101 => "pc",
        0b110 => "isr",
        _ => "osr",
    }
}

fn mov_op_str(op: u8) -> &'static str {
    match op & 0x3 {
        0b00 => "",
        0b01 => "~",
        0b10 => "::",
        _ => "reserved",
    }
}

fn mov_source_str(src: u8) -> &'static str {
    match src & 0x7 {
        0b000 => "pins",
        0b001 => "x",
        0b010 => "y",
        0b011 => "null",
        0b100 => "reserved",
        0b101 => "status",
        0b110 => "isr",
        _ => "osr",
    }
}

fn set_dest_str(dest: u8) -> &'static str {
    match dest & 0x7 {
        0b000 => "pins",
        0b001 => "x",
        0b010 => "y",
        0b100 => "pindirs",
        _ => "reserved",
    }
}

/// Decode one instruction word into its mnemonic.
///
/// `base` is the address of the program's first instruction; JMP targets are
/// printed relative to it, so a listing reads with addresses starting at 0.
/// Pass 0 for block-wide absolute addresses.
pub fn decode(word: u16, base: u8) -> String {
    let opcode = (word >> 13) & 0x7;
    let delay = ((word >> 8) & 0x1F) as u8;

    let body = match opcode {
        0b000 => {
            let condition = ((word >> 5) & 0x7) as u8;
            let address = (word & 0x1F) as u8;
            let target = (address as u32).wrapping_sub(base as u32);
            if condition != 0 {
                format!("jmp {}, {}", jmp_condition_str(condition), target)
            } else {
                format!("jmp {target}")
            }
        }
        0b001 => {
            let polarity = (word >> 7) & 0x1;
            let source = ((word >> 5) & 0x3) as u8;
            let mut s = format!("wait {polarity} {}", wait_source_str(source));
            let index = if source == 0b10 {
                match (word >> 3) & 0x3 {
                    0b01 => s.push_str(" prev"),
                    0b11 => s.push_str(" next"),
                    _ => {}
                }
                word & 0x7
            } else {
                word & 0x1F
            };
            s.push_str(&format!(" {index}"));
            s
        }
        0b010 => {
            let source = ((word >> 5) & 0x7) as u8;
            let bit_count = word & 0x1F;
            format!("in {}, {bit_count}", in_source_str(source))
        }
        0b011 => {
            let dest = ((word >> 5) & 0x7) as u8;
            let bit_count = word & 0x1F;
            format!("out {}, {bit_count}", out_dest_str(dest))
        }
        0b100 => {
            let to_rx = (word >> 7) & 0x1 == 0;
            if (word >> 4) & 0x1 == 0 {
                // push/pull form
                let conditional = (word >> 6) & 0x1 == 1;
                let blocking = if (word >> 5) & 0x1 == 1 { "block" } else { "noblock" };
                match (to_rx, conditional) {
                    (true, true) => format!("push iffull {blocking}"),
                    (true, false) => format!("push {blocking}"),
                    (false, true) => format!("pull ifempty {blocking}"),
                    (false, false) => format!("pull {blocking}"),
                }
            } else {
                // indexed FIFO mov form
                let idx = if (word >> 3) & 0x1 == 1 {
                    format!("{}", word & 0x3)
                } else {
                    "y".to_string()
                };
                if to_rx {
                    format!("mov rxfifo[{idx}], isr")
                } else {
                    format!("mov txfifo[{idx}], osr")
                }
            }
        }
        0b101 => {
            let dest = ((word >> 5) & 0x7) as u8;
            let op = ((word >> 3) & 0x3) as u8;
            let source = (word & 0x7) as u8;
            if dest == 0b010 && op == 0b00 && source == 0b010 {
                "nop".to_string()
            } else {
                format!(
                    "mov {}, {}{}",
                    mov_dest_str(dest),
                    mov_op_str(op),
                    mov_source_str(source)
                )
            }
        }
        0b110 => {
            let clear = (word >> 6) & 0x1 == 1;
            let wait = (word >> 5) & 0x1 == 1;
            let mode = (word >> 3) & 0x3;
            let index = word & 0x7;
            let mut s = String::from("irq ");
            match mode {
                0b01 => s.push_str("prev "),
                0b11 => s.push_str("next "),
                _ => {}
            }
            if clear {
                s.push_str("clear ");
            } else if wait {
                s.push_str("wait ");
            }
            s.push_str(&format!("{index}"));
            if mode == 0b10 {
                s.push_str(" rel");
            }
            s
        }
        _ => {
            let dest = ((word >> 5) & 0x7) as u8;
            let value = word & 0x1F;
            format!("set {}, {value}", set_dest_str(dest))
        }
    };

    if delay > 0 {
        format!("{body} [{delay}]")
    } else {
        body
    }
}

/// Render one SM's committed program as an annotated listing, one line per
/// call to `sink`.
///
/// Instructions and registers are read back through the backend; the wrap
/// markers come from the committed EXECCTRL, so the listing shows what the
/// SM will actually do rather than what the build intended.
pub fn render_program<B: Backend + ?Sized>(
    backend: &B,
    name: &str,
    block: u8,
    sm: u8,
    offsets: SlotOffsets,
    mut sink: impl FnMut(&str),
) -> Result<(), Error> {
    let regs = backend.read_sm_registers(block, sm)?;
    let wrap_bottom = regs::wrap_bottom_from(regs.execctrl);
    let wrap_top = regs::wrap_top_from(regs.execctrl);

    sink(&format!(
        "PIO{block}:{sm} {name} ({} instructions)",
        offsets.end - offsets.first + 1
    ));
    sink(&format!(
        "  CLKDIV: {}.{:02} EXECCTRL: 0x{:08X} SHIFTCTRL: 0x{:08X} PINCTRL: 0x{:08X}",
        regs::clkdiv_int(regs.clkdiv),
        regs::clkdiv_frac(regs.clkdiv),
        regs.execctrl,
        regs.shiftctrl,
        regs.pinctrl
    ));
    sink(&format!("  .program pio{block}_sm{sm}"));
    for ii in offsets.first..=offsets.end {
        if ii == offsets.start {
            sink("  .start");
        }
        if ii == wrap_bottom {
            sink("  .wrap_target");
        }
        let word = backend.read_instr(block, ii)?;
        sink(&format!(
            "    {}: 0x{word:04X} ; {}",
            ii - offsets.first,
            decode(word, offsets.first)
        ));
        if ii == wrap_top {
            sink("  .wrap");
        }
    }
    Ok(())
}
