use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

use super::Hook;
use crate::emulator::Emulator;
use crate::error::EmulatorError;

/// Print registers, the current frame and chosen memory cells whenever the
/// instruction at a configured address has run.
#[derive(Debug)]
pub struct Dump {
    file: Option<String>,
    all: bool,
    list: List,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct List(pub HashMap<u8, Config>);

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stack: bool,
    #[serde(default)]
    pub memory: Vec<u8>,
}

impl Dump {
    pub fn arg(file: Option<String>, all: bool) -> Result<Self, EmulatorError> {
        let list = match &file {
            Some(fname) => {
                let reader = File::open(fname)
                    .map(BufReader::new)
                    .map_err(|e| EmulatorError::Config(fname.clone(), e.to_string()))?;
                serde_yaml::from_reader(reader)
                    .map_err(|e| EmulatorError::Config(fname.clone(), e.to_string()))?
            }
            None => List::default(),
        };
        Ok(Self { file, all, list })
    }

    pub fn from_list(list: List, all: bool) -> Self {
        Self {
            file: None,
            all,
            list,
        }
    }

    fn get(&self, pc: u8) -> Option<&Config> {
        self.list.0.get(&pc)
    }
}

impl Hook for Dump {
    fn init(&mut self, emu: Emulator) -> Emulator {
        if self.all {
            println!(" * Dump all");
        }
        if let Some(fname) = &self.file {
            println!(" * Dump[{}] {:?}", self.list.0.len(), fname);
        }
        emu
    }

    fn exec(&mut self, _time: u64, addr: u8, emu: Emulator) -> Emulator {
        if let Some(cfg) = self.get(addr) {
            print_reg(&emu);
            if cfg.stack {
                print_stack(&emu);
            }
            print_memory(&emu, &cfg.memory);
        } else if self.all {
            print_reg(&emu);
        }
        emu
    }
}

fn print_reg(emu: &Emulator) {
    println!(" +--------+--------+--------+--------+-------+");
    println!(
        " | a:  {:0>2X} | sp: {:0>2X} | fp: {:0>2X} | pc: {:0>2X} | f: {} |",
        emu.a, emu.sp, emu.fp, emu.pc, emu.flag as u8
    );
    println!(" +--------+--------+--------+--------+-------+");
}

/// Cells from SP up to the saved PC of the current frame
fn print_stack(emu: &Emulator) {
    let top = (emu.fp as usize + 2).min(emu.memory().len());
    for addr in emu.sp as usize..top {
        let marker = if addr == emu.fp as usize { "<- fp" } else { "" };
        println!(" | {:0>2X} : {:0>2X} {:<31}|", addr, emu.memory()[addr], marker);
    }
    println!(" +------------------------------------------+");
}

fn print_memory(emu: &Emulator, addrs: &[u8]) {
    for addr in addrs {
        match emu.memory_at(*addr) {
            Ok(value) => println!(" | {:0>2X} : {:0>2X} {:<31}|", addr, value, ""),
            Err(e) => println!(" | {:0>2X} : {:<34}|", addr, e),
        }
    }
    println!(" +------------------------------------------+");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let yaml = "
3:
  stack: true
  memory: [200, 201]
10:
  memory: [7]
";
        let list: List = serde_yaml::from_str(yaml).unwrap();
        assert!(list.0[&3].stack);
        assert_eq!(list.0[&3].memory, vec![200, 201]);
        assert!(!list.0[&10].stack);

        let mut dump = Dump::from_list(list, false);
        let mut emu = Emulator::default();
        emu.sp = 250;
        emu.fp = 252;
        emu = dump.init(emu);
        let emu = dump.exec(0, 3, emu);
        assert_eq!(emu.sp, 250);
    }
}
