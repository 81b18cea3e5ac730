use crate::emulator::Emulator;
use crate::error::EmulatorError;
use arch::Op;

impl Emulator {
    /// Run the semantics of `op`. `addr` is where the instruction started,
    /// PC already points past its operands.
    pub(crate) fn execute(&mut self, op: Op, addr: u8, args: &[u8]) -> Result<(), EmulatorError> {
        // Offsets are signed and wrap with the address
        let arg = |i: usize| args.get(i).copied().unwrap_or(0);

        match op {
            Op::Invalid => {
                let id = self.memory_at(addr)?;
                return Err(EmulatorError::InvalidInstruction { id, addr });
            }
            Op::Exit => self.halt(),
            Op::Out => self.write_output(self.a),

            Op::LdaConstant => self.a = arg(0),
            Op::LdaAt => self.a = self.memory_at(arg(0))?,
            Op::LdaAtFp => self.a = self.memory_at(self.fp.wrapping_add(arg(0)))?,
            Op::LdaAtA => self.a = self.memory_at(self.a.wrapping_add(arg(0)))?,
            Op::LdaFp => self.a = self.fp.wrapping_add(arg(0)),
            Op::LdaSp => self.a = self.sp.wrapping_add(arg(0)),
            Op::LdaAtSp => self.a = self.memory_at(self.sp.wrapping_add(arg(0)))?,
            Op::StaAt => self.set_memory_at(arg(0), self.a)?,
            Op::StaAtFp => self.set_memory_at(self.fp.wrapping_add(arg(0)), self.a)?,
            Op::StaAtSp => self.set_memory_at(self.sp.wrapping_add(arg(0)), self.a)?,
            Op::StaAtAtSp => {
                let target = self.memory_at(self.sp.wrapping_add(arg(0)))?;
                self.set_memory_at(target, self.a)?;
            }
            Op::CopySpFp => {
                let value = self.memory_at(self.sp.wrapping_add(arg(0)))?;
                self.set_memory_at(self.fp.wrapping_add(arg(1)), value)?;
            }

            Op::LdspConstant => self.sp = arg(0),
            Op::LdfpConstant => self.fp = arg(0),
            Op::LdfpSp => self.fp = self.sp,
            Op::PushConstant => self.push(arg(0))?,
            Op::PushA => self.push(self.a)?,
            Op::PushSp => self.push(self.sp)?,
            Op::PushAtFp => {
                let value = self.memory_at(self.fp.wrapping_add(arg(0)))?;
                self.push(value)?;
            }
            Op::PopA => self.a = self.pop()?,
            Op::PopAddA => self.a = self.a.wrapping_add(self.pop()?),
            Op::PopSubA => self.a = self.a.wrapping_sub(self.pop()?),
            Op::PopAtFp => {
                let value = self.pop()?;
                self.set_memory_at(self.fp.wrapping_add(arg(0)), value)?;
            }
            Op::PopAtA => {
                let value = self.pop()?;
                self.set_memory_at(self.a.wrapping_add(arg(0)), value)?;
            }
            Op::SubSpConstant => self.sp = self.sp.wrapping_sub(arg(0)),
            Op::SubSpA => self.sp = self.sp.wrapping_sub(self.a),
            Op::AddSpConstant => self.sp = self.sp.wrapping_add(arg(0)),
            Op::AddSpAtSp => {
                let value = self.memory_at(self.sp.wrapping_add(arg(0)))?;
                self.sp = self.sp.wrapping_add(value);
            }

            Op::Call => {
                self.push(self.pc)?;
                self.push(self.fp)?;
                self.fp = self.sp;
                self.pc = arg(0);
            }
            Op::Ret => {
                self.sp = self.fp;
                self.fp = self.pop()?;
                self.pc = self.pop()?;
            }
            Op::Jump => self.pc = arg(0),
            Op::JumpFlag => {
                if self.flag {
                    self.pc = arg(0);
                }
            }
            Op::JumpNotFlag => {
                if !self.flag {
                    self.pc = arg(0);
                }
            }
            Op::Branch => self.pc = self.pc.wrapping_add(arg(0)),
            Op::BranchFlag => {
                if self.flag {
                    self.pc = self.pc.wrapping_add(arg(0));
                }
            }
            Op::TestZeroA => self.flag = self.a == 0,
            Op::TestNotZeroA => self.flag = self.a != 0,
            Op::TestNegativeA => self.flag = (self.a as i8) < 0,
            Op::TestNotNegativeA => self.flag = (self.a as i8) >= 0,
            Op::TestZeroPop => self.flag = self.pop()? == 0,

            Op::LogicalInvertA => self.a = (self.a == 0) as u8,
            Op::AddAConstant => self.a = self.a.wrapping_add(arg(0)),
            Op::SubAConstant => self.a = self.a.wrapping_sub(arg(0)),
            Op::AddAAtSp => {
                let value = self.memory_at(self.sp.wrapping_add(arg(0)))?;
                self.a = self.a.wrapping_add(value);
            }
            Op::SubAAtSp => {
                let value = self.memory_at(self.sp.wrapping_add(arg(0)))?;
                self.a = self.a.wrapping_sub(value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::emulator::Emulator;
    use arch::Op;

    macro_rules! test_exec {
        ($($name:ident: [$($byte:expr),* $(,)?] => |$emu:ident| $check:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let program: Vec<u8> = vec![$($byte),*];
                    let mut $emu = Emulator::default();
                    $emu.load(&program).unwrap();
                    $emu.sp = 100;
                    $emu.fp = 100;
                    $emu.run(100).unwrap();
                    assert!($check);
                }
            )*
        }
    }

    fn op(op: Op) -> u8 {
        op.into()
    }

    test_exec! {
        lda_constant: [op(Op::LdaConstant), 42, op(Op::Exit)] => |emu| emu.a == 42,
        out: [op(Op::LdaConstant), 7, op(Op::Out), op(Op::Exit)] => |emu| emu.output() == [7],
        push_pop_add: [
            op(Op::PushConstant), 5,
            op(Op::LdaConstant), 6,
            op(Op::PopAddA),
            op(Op::Exit),
        ] => |emu| emu.a == 11 && emu.sp == 100,
        pop_sub: [
            op(Op::PushConstant), 3,
            op(Op::LdaConstant), 10,
            op(Op::PopSubA),
            op(Op::Exit),
        ] => |emu| emu.a == 7,
        negative_offset: [
            op(Op::LdaConstant), 9,
            op(Op::StaAtFp), 255,
            op(Op::LdaConstant), 0,
            op(Op::LdaAtFp), 255,
            op(Op::Exit),
        ] => |emu| emu.a == 9 && emu.memory()[99] == 9,
        sta_indirect: [
            op(Op::PushConstant), 200,
            op(Op::LdaConstant), 1,
            op(Op::StaAtAtSp), 0,
            op(Op::Exit),
        ] => |emu| emu.memory()[200] == 1,
        copy_stack_to_frame: [
            op(Op::PushConstant), 33,
            op(Op::CopySpFp), 0, 254,
            op(Op::Exit),
        ] => |emu| emu.memory()[98] == 33,
        test_negative: [op(Op::LdaConstant), 200, op(Op::TestNegativeA), op(Op::Exit)] => |emu| emu.flag,
        logical_invert: [op(Op::LdaConstant), 0, op(Op::LogicalInvertA), op(Op::Exit)] => |emu| emu.a == 1,
        branch_flag: [
            op(Op::LdaConstant), 0,
            op(Op::TestZeroA),
            op(Op::BranchFlag), 2,
            op(Op::LdaConstant), 5,
            op(Op::Exit),
        ] => |emu| emu.a == 0,
        jump_not_flag: [
            op(Op::LdaConstant), 1,
            op(Op::TestZeroA),
            op(Op::JumpNotFlag), 7,
            op(Op::LdaConstant), 5,
            op(Op::Exit),
        ] => |emu| emu.a == 1,
    }

    #[test]
    fn call_and_ret_restore_frame() {
        // 0: CALL 5, 2: out, 3: exit, 4: (pad), 5: LDA #3, 7: RET
        let program = vec![
            op(Op::Call), 5,
            op(Op::Out),
            op(Op::Exit),
            0,
            op(Op::LdaConstant), 3,
            op(Op::Ret),
        ];
        let mut emu = Emulator::default();
        emu.load(&program).unwrap();
        emu.sp = 25;
        emu.fp = 25;
        emu.run(10).unwrap();
        assert_eq!(emu.output(), [3]);
        assert_eq!((emu.sp, emu.fp), (25, 25));
    }
}
