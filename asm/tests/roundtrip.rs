use arch::InstructionSet;
use wingasm::assemble;

/// Assemble, disassemble and assemble again: both images must match.
fn case(source: &str) {
    let set = InstructionSet::standard();
    let first = assemble(source, &set).unwrap();
    let listing = set.disassemble(&first).unwrap();
    for (addr, line) in &listing {
        println!("{:>3}: {}", addr, line);
    }
    let text = listing
        .iter()
        .map(|(_, line)| line.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let second = assemble(&text, &set).unwrap();
    assert_eq!(first, second);
}

macro_rules! case {
    ($name:ident, $code:expr) => {
        #[test]
        fn $name() {
            case($code);
        }
    };
}

case!(misc, "exit\nout\ninvalid");
case!(load_store, "LDA #5\nLDA [#200]\nLDA [FP #-2]\nLDA [A #1]\nSTA [[SP #0]]");
case!(stack, "PUSH #1\nPUSHA\nPOP ADDA\nSUBSP #3\nADDSP [SP #0]\nLDFP SP");
case!(copy, "CPY [SP #0] [FP #-1]");
case!(
    labels,
    "
    :loop
    TSTZ A
    JMPF #end
    SUBA #1
    JMP #loop
    :end
    exit
    "
);
case!(
    scoped,
    "
    #n = 3
    LDA #n
    scope
      #n = 4
      ADDA #n
      braz #2
    endscope
    out
    "
);
