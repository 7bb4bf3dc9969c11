/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tinycomp::assemble;
use tinycomp::file_reader::{DiskFileReader, FileReader};
use tinycomp::simulator::{HeadlessDriver, RunOutcome};

#[derive(Parser)]
#[clap(version, about = "Assembler and simulator for a 16-bit teaching computer")]
struct Opts {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a source file into a listing file and a load image
    Assemble {
        source: PathBuf,
        #[clap(long, default_value = "ListingFile.txt")]
        out_list: PathBuf,
        #[clap(long, default_value = "LoadFile.txt")]
        out_load: PathBuf,
    },
    /// IPL a load image and run it headless, printing collected output
    Run {
        load_image: PathBuf,
        /// Text queued into the keyboard buffer before the run
        #[clap(long)]
        input: Option<String>,
        /// File served by the TRAP 0 load-file service
        #[clap(long)]
        program_file: Option<PathBuf>,
        #[clap(long, default_value_t = 1_000_000)]
        max_cycles: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();
    let reader = DiskFileReader;

    match opts.command {
        Commands::Assemble {
            source,
            out_list,
            out_load,
        } => {
            let assembly = assemble(&source, &reader)?;
            fs::write(&out_list, &assembly.listing)
                .with_context(|| format!("failed to write {}", out_list.display()))?;
            fs::write(&out_load, &assembly.load_image)
                .with_context(|| format!("failed to write {}", out_load.display()))?;
            println!(
                "Assembled {} ({} words) to {} and {}",
                source.display(),
                assembly.words.len(),
                out_list.display(),
                out_load.display()
            );
        }
        Commands::Run {
            load_image,
            input,
            program_file,
            max_cycles,
        } => {
            let image = reader
                .read_to_string(&load_image)
                .with_context(|| format!("failed to read {}", load_image.display()))?;

            let mut driver = HeadlessDriver::new();
            driver.load(&image)?;

            if let Some(path) = program_file {
                let text = reader
                    .read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                driver
                    .machine
                    .set_program_file(text.chars().map(|c| c as u16).collect());
            }
            if let Some(text) = input {
                driver.deposit_input(&text);
            }

            let outcome = driver.run(max_cycles);
            std::io::stdout().write_all(driver.printed())?;

            match outcome {
                RunOutcome::Halted { cycles } => {
                    eprintln!("halted after {cycles} cycles");
                }
                RunOutcome::Faulted { cycles } => {
                    bail!(
                        "machine fault at PC {:04o} after {cycles} cycles (MFR {:04b})",
                        driver.machine.regs.pc(),
                        driver.machine.regs.mfr()
                    );
                }
                RunOutcome::AwaitingInput { cycles } => {
                    bail!("machine is waiting for input after {cycles} cycles; pass --input");
                }
                RunOutcome::CycleLimit { cycles } => {
                    bail!("cycle limit of {cycles} reached without HLT");
                }
            }
        }
    }

    Ok(())
}
