use color_print::cprintln;

use super::Hook;
use crate::emulator::Emulator;

/// Print every executed instruction.
pub struct Trace {
    enabled: bool,
}

impl Trace {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Hook for Trace {
    fn init(&mut self, emu: Emulator) -> Emulator {
        if self.enabled {
            println!(" * Trace");
        }
        emu
    }

    fn exec(&mut self, time: u64, addr: u8, emu: Emulator) -> Emulator {
        if !self.enabled {
            return emu;
        }
        match emu.instruction_set().decode_at(emu.memory(), addr as usize) {
            Ok((inst, values)) => {
                cprintln!("[{:0>4}] <blue>{:0>2X}</> {}", time, addr, inst.cformat(&values))
            }
            Err(e) => cprintln!("[{:0>4}] <blue>{:0>2X}</> <red>{}</>", time, addr, e),
        }
        emu
    }
}
