use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use apio_rs::disasm::decode;
use apio_rs::MAX_PROGRAM_LEN;

#[derive(Parser, Debug)]
#[command(author, version, about = "PIO instruction disassembler CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode one or more 16-bit instruction words given on the command line
    Words {
        /// Instruction words (hex with 0x prefix, or decimal)
        #[arg(value_name = "WORD", required = true)]
        words: Vec<String>,
        /// Base offset for relative JMP rendering
        #[arg(long, default_value_t = 0u8)]
        base: u8,
    },
    /// Disassemble a little-endian binary program file
    File {
        /// Input file of packed little-endian 16-bit words
        #[arg(value_name = "BINFILE")]
        input: PathBuf,
        /// Base offset for relative JMP rendering
        #[arg(long, default_value_t = 0u8)]
        base: u8,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, serde::Serialize)]
struct DecodedLine {
    offset: u8,
    word: u16,
    mnemonic: String,
}

fn parse_u16(s: &str) -> Result<u16> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u16::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u16>()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Words { words, base } => {
            for w in words {
                let word = parse_u16(&w).with_context(|| format!("bad word {w:?}"))?;
                println!("0x{word:04X} ; {}", decode(word, base));
            }
        }
        Command::File {
            input,
            base,
            format,
        } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            ensure!(bytes.len() % 2 == 0, "file length is not a whole number of words");
            ensure!(
                bytes.len() / 2 <= MAX_PROGRAM_LEN,
                "program longer than {MAX_PROGRAM_LEN} instructions"
            );
            let lines: Vec<DecodedLine> = bytes
                .chunks_exact(2)
                .enumerate()
                .map(|(i, b)| {
                    let word = u16::from_le_bytes([b[0], b[1]]);
                    DecodedLine {
                        offset: i as u8,
                        word,
                        mnemonic: decode(word, base),
                    }
                })
                .collect();
            match format {
                OutputFormat::Text => {
                    for l in &lines {
                        println!("{:2}: 0x{:04X} ; {}", l.offset, l.word, l.mnemonic);
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&lines)?),
            }
        }
    }
    Ok(())
}
