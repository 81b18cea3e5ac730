use wingc::Compiler;
use wingemu::{Emulator, DEFAULT_MAX_CYCLES};

fn step_until(emu: &mut Emulator, done: impl Fn(&Emulator) -> bool) {
    for _ in 0..DEFAULT_MAX_CYCLES {
        if done(&*emu) {
            return;
        }
        emu.step().unwrap();
    }
    panic!("condition not reached, pc={} sp={} fp={}", emu.pc, emu.sp, emu.fp);
}

/// The caller reserves the result, pushes the arguments and drops them
/// after the call. The callee only sees its own frame.
#[test]
fn struct_argument_and_result() {
    let program = Compiler::default()
        .compile_source(
            "
        struct pair:
          a:int
          b:int

        def swap(p:pair): pair
          result.a = p.b
          result.b = p.a

        def main():
          val p:pair
          p.a = 1
          p.b = 2
          val q:pair
          q = swap(p)
          print(q.a)
        ",
        )
        .unwrap();
    let main = program.entry_of("main()").unwrap();
    let swap = program.entry_of("swap(pair):pair").unwrap();

    let mut emu = Emulator::default();
    emu.load(&program.code).unwrap();

    step_until(&mut emu, |e| e.pc == main);
    let frame = emu.fp;
    assert_eq!(frame, emu.sp);
    // Two locals of two bytes each
    let locals = frame - 4;

    // Result slot, argument, saved PC and FP
    step_until(&mut emu, |e| e.pc == swap);
    assert_eq!(emu.sp, locals - 6);
    assert_eq!(emu.fp, emu.sp);

    step_until(&mut emu, |e| e.fp == frame);
    assert_eq!(emu.sp, locals - 4);

    // Drop the argument, the result stays
    emu.step().unwrap();
    assert_eq!(emu.sp, locals - 2);

    // Copied into q
    emu.step().unwrap();
    emu.step().unwrap();
    assert_eq!(emu.sp, locals);

    emu.run(DEFAULT_MAX_CYCLES).unwrap();
    assert_eq!(emu.output(), [2]);
    assert_eq!((emu.sp, emu.fp), (255, 255));
}
