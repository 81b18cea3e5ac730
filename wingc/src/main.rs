use color_print::cprintln;
use wingc::{Compiler, Error, Program};
use wingemu::DEFAULT_MAX_CYCLES;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Source files, compiled as one program
    #[clap(default_value = "main.wing")]
    input: Vec<String>,

    /// Output file
    #[clap(short, long, default_value = "main.wing.bin")]
    output: String,

    /// Run the program after compiling
    #[clap(short, long)]
    run: bool,

    /// Maximum number of executed instructions
    #[clap(short, long, default_value_t = DEFAULT_MAX_CYCLES)]
    tmax: u64,

    /// Dump the linked program
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("Wing Compiler by kanade-k-1228");

    let compiler = Compiler::default();

    println!("1. Read Files");
    let mut sources = vec![];
    for path in &args.input {
        println!("  < {}", path);
        match std::fs::read_to_string(path) {
            Ok(text) => sources.push((path.clone(), text)),
            Err(e) => exit(&Error::FileOpen(path.clone(), e), path, ""),
        }
    }

    println!("2. Parse");
    let mut nodes = vec![];
    for (path, text) in &sources {
        match compiler.parse(text) {
            Ok(parsed) => {
                println!("  {}: {} definitions", path, parsed.len());
                nodes.extend(parsed);
            }
            Err(e) => exit(&e, path, text),
        }
    }

    println!("3. Compile & Link");
    let program = match compiler.compile(&nodes) {
        Ok(program) => program,
        Err(e) => exit(&e, &args.input.join(", "), ""),
    };
    println!("  {} functions, {} bytes", program.functions.len(), program.code.len());

    println!("4. Write Binary");
    println!("  > {}", &args.output);
    if let Err(e) = std::fs::write(&args.output, &program.code) {
        exit(&Error::FileWrite(args.output.clone(), e), &args.output, "");
    }

    if args.dump {
        dump(&compiler, &program);
    }

    if args.run {
        println!("5. Run");
        match wingc::run(&program, args.tmax) {
            Ok(output) => {
                let text: Vec<String> = output.iter().map(|v| v.to_string()).collect();
                println!("  {}", text.join(" "));
            }
            Err(e) => exit(&e, &args.output, ""),
        }
    }
}

fn dump(compiler: &Compiler, program: &Program) {
    println!("------+-------------------------------------------------------");
    let lines = match compiler.set.disassemble(&program.code) {
        Ok(lines) => lines,
        Err(e) => {
            cprintln!("<r,s>{}</>", e);
            return;
        }
    };
    for (addr, text) in lines {
        if let Some(signature) = program.function_at(addr as u8) {
            cprintln!("      | <green,bold>{}</>", signature);
        }
        println!("[{:0>2X}] | {}", addr, text);
    }
    println!("------+-------------------------------------------------------");
}

fn exit(error: &Error, file: &str, text: &str) -> ! {
    let lines: Vec<&str> = text.lines().collect();
    error.print_diag(file, &lines);
    std::process::exit(1);
}
