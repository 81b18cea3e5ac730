pub mod dump;
pub mod output;
pub mod trace;

use crate::emulator::Emulator;

/// Side effect run around every executed instruction.
pub trait Hook {
    fn init(&mut self, emu: Emulator) -> Emulator;
    fn exec(&mut self, time: u64, addr: u8, emu: Emulator) -> Emulator;
}
