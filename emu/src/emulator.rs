use crate::error::EmulatorError;
use arch::InstructionSet;

pub const DEFAULT_MEMORY_SIZE: usize = 256;
pub const DEFAULT_MAX_CYCLES: u64 = 1000;

/// Accumulator stack machine with byte-wide registers and a flat memory.
///
/// The stack grows downward: a push decrements SP and then writes.
#[derive(Debug, Clone)]
pub struct Emulator {
    set: InstructionSet,
    memory: Vec<u8>,
    pub a: u8,
    pub sp: u8,
    pub fp: u8,
    pub pc: u8,
    pub flag: bool,
    halted: bool,
    output: Vec<u8>,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(InstructionSet::standard())
    }
}

impl Emulator {
    pub fn new(set: InstructionSet) -> Self {
        Self::with_memory_size(set, DEFAULT_MEMORY_SIZE)
    }

    pub fn with_memory_size(set: InstructionSet, size: usize) -> Self {
        Self {
            set,
            memory: vec![0; size],
            a: 0,
            sp: 0,
            fp: 0,
            pc: 0,
            flag: false,
            halted: false,
            output: vec![],
        }
    }

    pub fn instruction_set(&self) -> &InstructionSet {
        &self.set
    }

    pub fn reset(&mut self) {
        self.a = 0;
        self.sp = 0;
        self.fp = 0;
        self.pc = 0;
        self.flag = false;
        self.halted = false;
        self.output.clear();
    }

    pub fn clear_memory(&mut self) {
        self.memory.fill(0);
    }

    /// Copy `values` to the start of memory.
    pub fn set_all_memory(&mut self, values: &[u8]) -> Result<(), EmulatorError> {
        if values.len() > self.memory.len() {
            return Err(EmulatorError::Runtime(format!(
                "Size of program greater than memory size ({} > {})",
                values.len(),
                self.memory.len()
            )));
        }
        self.memory[..values.len()].copy_from_slice(values);
        Ok(())
    }

    /// Reset registers, clear memory and place `program` at address 0.
    pub fn load(&mut self, program: &[u8]) -> Result<(), EmulatorError> {
        self.reset();
        self.clear_memory();
        self.set_all_memory(program)
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn memory_at(&self, addr: impl Into<usize>) -> Result<u8, EmulatorError> {
        let addr = addr.into();
        self.memory
            .get(addr)
            .copied()
            .ok_or_else(|| EmulatorError::out_of_range(addr, self.memory.len()))
    }

    pub fn set_memory_at(&mut self, addr: impl Into<usize>, value: u8) -> Result<(), EmulatorError> {
        let addr = addr.into();
        let size = self.memory.len();
        let cell = self
            .memory
            .get_mut(addr)
            .ok_or_else(|| EmulatorError::out_of_range(addr, size))?;
        *cell = value;
        Ok(())
    }

    pub fn push(&mut self, value: u8) -> Result<(), EmulatorError> {
        self.sp = self.sp.wrapping_sub(1);
        self.set_memory_at(self.sp, value)
    }

    pub fn pop(&mut self) -> Result<u8, EmulatorError> {
        let value = self.memory_at(self.sp)?;
        self.sp = self.sp.wrapping_add(1);
        Ok(value)
    }

    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Values written by `out`, oldest first
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub(crate) fn write_output(&mut self, value: u8) {
        self.output.push(value);
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> Result<(), EmulatorError> {
        let addr = self.pc;
        let id = self.memory_at(addr)?;
        let (op, widths) = match self.set.get(id) {
            Some(inst) => (
                inst.op,
                inst.operands().map(|o| o.width).collect::<Vec<_>>(),
            ),
            None => return Err(EmulatorError::InvalidInstruction { id, addr }),
        };
        // Registers are a byte wide
        if let Some(width) = widths.iter().find(|w| **w > 1) {
            return Err(EmulatorError::OperandWidth { width: *width, addr });
        }
        self.pc = self.pc.wrapping_add(1);

        let mut args = Vec::with_capacity(widths.len());
        for _ in widths {
            args.push(self.memory_at(self.pc)?);
            self.pc = self.pc.wrapping_add(1);
        }

        self.execute(op, addr, &args)
    }

    /// Step until `exit`, failing once `max_cycles` instructions ran
    /// without halting. Returns the number of executed instructions.
    pub fn run(&mut self, max_cycles: u64) -> Result<u64, EmulatorError> {
        for cycle in 0..max_cycles {
            self.step()?;
            if self.halted {
                return Ok(cycle + 1);
            }
        }
        Err(EmulatorError::CyclesExceeded)
    }
}
