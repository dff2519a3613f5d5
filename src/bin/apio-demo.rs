use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use apio_rs::instr::{InstrOp, Instruction, SetDestination};
use apio_rs::{regs, Assembler, EmulatedPio};

/// Build the classic GPIO-toggle program on the emulated backend and print
/// its listing.
#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble a demo PIO program against the emulated backend")]
struct Opts {
    /// Dump the emulated PIO snapshot as JSON instead of a listing
    #[arg(long)]
    json: bool,
}

fn set_pins(value: u8) -> Instruction {
    Instruction::new(InstrOp::Set {
        destination: SetDestination::Pins,
        value,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let mut asm = Assembler::new(EmulatedPio::new());
    asm.clear_all_irqs()?;
    asm.select_block(0)?;
    asm.select_sm(0)?;

    // Pin as output, then toggle it forever inside the wrap region.
    asm.add_instr(Instruction::new(InstrOp::Set {
        destination: SetDestination::PinDirs,
        value: 1,
    }))?;
    asm.mark_wrap_bottom()?;
    asm.add_instr(set_pins(1).with_delay(31))?;
    asm.mark_wrap_top()?;
    asm.add_instr(set_pins(0).with_delay(31))?;

    asm.set_clkdiv(15000, 0)?;
    asm.set_execctrl(0)?;
    asm.set_shiftctrl(0)?;
    asm.set_pinctrl(regs::set_base(0) | regs::set_count(1))?;
    asm.jmp_to_start()?;
    asm.end_block()?;
    asm.enable_sms(0, 1 << 0)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(asm.backend())?);
    } else {
        asm.log_sm("Demo SM", |line| println!("{line}"))?;
    }

    Ok(())
}
