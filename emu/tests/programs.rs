use arch::InstructionSet;
use wingemu::{Emulator, EmulatorError};

fn run(source: &str, max_cycles: u64) -> Result<Emulator, EmulatorError> {
    let set = InstructionSet::standard();
    let program = wingasm::assemble(source, &set).unwrap();
    let mut emu = Emulator::new(set);
    emu.load(&program)?;
    emu.run(max_cycles)?;
    Ok(emu)
}

#[test]
fn call_and_return() {
    let emu = run(
        "
        LDFP #255
        LDSP #255
        PUSH #2
        PUSH #3
        CALL #add
        ADDSP #2
        out
        exit
        :add
        PUSH [FP #3]
        LDA [FP #2]
        POP ADDA
        RET
        ",
        100,
    )
    .unwrap();
    assert_eq!(emu.output(), &[5]);
    assert_eq!(emu.sp, 255);
    assert_eq!(emu.fp, 255);
}

#[test]
fn countdown() {
    let emu = run(
        "
        LDA #3
        :loop
        out
        SUBA #1
        TSTZ A
        JMPNF #loop
        exit
        ",
        100,
    )
    .unwrap();
    assert_eq!(emu.output(), &[3, 2, 1]);
}

#[test]
fn flag_to_register() {
    // braz skips relative to the end of its own operands
    let emu = run(
        "
        LDA #0
        TSTZ A
        LDA #1
        braz #2
        LDA #0
        out
        exit
        ",
        100,
    )
    .unwrap();
    assert_eq!(emu.output(), &[1]);
}

#[test]
fn endless_loop() {
    let result = run(
        "
        :top
        JMP #top
        ",
        50,
    );
    assert!(matches!(result, Err(EmulatorError::CyclesExceeded)));
}
