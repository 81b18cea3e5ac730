use color_print::cprintln;

use super::Hook;
use crate::emulator::Emulator;

/// Echo values as the program writes them with `out`.
pub struct Output {
    printed: usize,
}

impl Output {
    pub fn new() -> Self {
        Self { printed: 0 }
    }
}

impl Hook for Output {
    fn init(&mut self, emu: Emulator) -> Emulator {
        self.printed = emu.output().len();
        emu
    }

    fn exec(&mut self, _time: u64, _addr: u8, emu: Emulator) -> Emulator {
        for value in &emu.output()[self.printed..] {
            cprintln!(" > <r,s>{}</>", value);
        }
        self.printed = emu.output().len();
        emu
    }
}
