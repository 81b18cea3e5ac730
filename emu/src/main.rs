use clap::Parser;
use color_print::cprintln;

use wingemu::hooks::{dump::Dump, output::Output, trace::Trace, Hook};
use wingemu::{Emulator, EmulatorError, DEFAULT_MAX_CYCLES};

#[derive(Parser, Debug)]
#[clap(
    name = "Wing Emulator",
    author = "kanade-k-1228",
    version = "v1.0.0",
    about = "Emulator for the Wing stack machine"
)]
struct Args {
    /// Maximum number of executed instructions
    #[arg(short = 't', long, default_value_t = DEFAULT_MAX_CYCLES)]
    tmax: u64,

    /// YAML file listing addresses to dump at
    #[arg(short, long)]
    dump_cfg: Option<String>,

    /// Dump registers after every instruction
    #[arg(short = 'a', long)]
    dump_all: bool,

    /// Print every executed instruction
    #[arg(long)]
    trace: bool,

    #[arg(default_value = "main.wing.bin")]
    input_file: String,
}

fn main() {
    let args = Args::parse();
    println!("Wing Emulator by kanade-k-1228");

    println!("+-----------------------------------------------+");
    println!("| {:<45} |", args.input_file);
    println!("+-----------------------------------------------+");

    if let Err(e) = run(&args) {
        cprintln!("<red,bold>error</>: {}", e);
        std::process::exit(1);
    }

    println!("=================================================");
}

fn run(args: &Args) -> Result<(), EmulatorError> {
    // ------------------------------------------------------------------------
    // Initialize state machine model
    let program = std::fs::read(&args.input_file)
        .map_err(|e| EmulatorError::FileRead(args.input_file.clone(), e.to_string()))?;
    let mut emu = Emulator::default();
    emu.load(&program)?;

    // ------------------------------------------------------------------------
    // Initialize hooks
    println!("[INIT]");
    let mut hooks: Vec<Box<dyn Hook>> = vec![
        Box::new(Trace::new(args.trace)),
        Box::new(Dump::arg(args.dump_cfg.clone(), args.dump_all)?),
        Box::new(Output::new()),
    ];
    emu = hooks.iter_mut().fold(emu, |emu, hook| hook.init(emu));

    // ------------------------------------------------------------------------
    // Main loop
    for time in 0..args.tmax {
        let addr = emu.pc;
        emu.step()?;
        emu = hooks
            .iter_mut()
            .fold(emu, |emu, hook| hook.exec(time, addr, emu));
        if emu.is_halted() {
            println!("[EXIT] after {} cycles", time + 1);
            return Ok(());
        }
    }
    Err(EmulatorError::CyclesExceeded)
}
