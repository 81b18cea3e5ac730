use arch::InstructionSet;
use color_print::cprintln;
use wingasm::{Assembler, Error};

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
    /// Input files, assembled one after another
    #[clap(default_value = "main.wasm")]
    input: Vec<String>,

    /// Output file
    #[clap(short, long, default_value = "main.wing.bin")]
    output: String,

    /// Dump assembly code
    #[clap(short, long)]
    dump: bool,
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("Wing Assembler by kanade-k-1228");

    let set = InstructionSet::standard();

    println!("1. Read Files");
    let mut sources = vec![];
    for path in &args.input {
        println!("  < {}", path);
        match std::fs::read_to_string(path) {
            Ok(text) => sources.push((path.clone(), text)),
            Err(e) => exit(&Error::FileOpen(path.clone(), e), path, ""),
        }
    }

    println!("2. Assemble & Resolve Labels");
    let mut bin = vec![];
    for (path, text) in &sources {
        let assembly = Assembler::new(&set, path.as_str())
            .assemble(text)
            .and_then(|asm| asm.link(&set, bin.len(), path).map(|bytes| (asm, bytes)));
        match assembly {
            Ok((asm, bytes)) => {
                println!("  {} instructions, {} bytes", asm.codes.len(), bytes.len());
                bin.extend(bytes);
            }
            Err(e) => exit(&e, path, text),
        }
    }

    println!("3. Write Binary");
    println!("  > {}", &args.output);
    if let Err(e) = std::fs::write(&args.output, &bin) {
        exit(&Error::FileWrite(args.output.clone(), e), &args.output, "");
    }

    if args.dump {
        dump(&set, &bin);
    }
}

fn dump(set: &InstructionSet, bin: &[u8]) {
    println!("------+----------+--------------------------------------------");
    let mut addr = 0;
    while addr < bin.len() {
        match set.decode_at(bin, addr) {
            Ok((inst, values)) => {
                let bytes = bin[addr..addr + inst.size()]
                    .iter()
                    .map(|b| format!("{:0>2X}", b))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("[{:0>2X}] | {:<8} | {}", addr, bytes, inst.cformat(&values));
                addr += inst.size();
            }
            Err(e) => {
                cprintln!("[{:0>2X}] | <r,s>{}</>", addr, e);
                break;
            }
        }
    }
    println!("------+----------+--------------------------------------------");
}

fn exit(error: &Error, file: &str, text: &str) -> ! {
    let lines: Vec<&str> = text.lines().collect();
    error.print_diag(file, &lines);
    std::process::exit(1);
}
