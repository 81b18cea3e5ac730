use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Instruction group, only used for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Group {
    #[strum(serialize = "misc")]
    Misc,
    #[strum(serialize = "load/store")]
    LoadStore,
    #[strum(serialize = "stack")]
    Stack,
    #[strum(serialize = "flow control")]
    FlowControl,
    #[strum(serialize = "arithmetic")]
    Arithmetic,
}

/// Semantics the emulator knows how to execute.
///
/// The `to_string` of each variant is the mnemonic template of the standard
/// instruction set. Custom instruction sets may bind other mnemonics to the
/// same semantics as long as the operand count matches.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Op {
    // Misc
    #[strum(to_string = "invalid")]
    Invalid,
    #[strum(to_string = "exit")]
    Exit,
    #[strum(to_string = "out")]
    Out,

    // Load / store
    #[strum(to_string = "LDA #val")]
    LdaConstant,
    #[strum(to_string = "LDA [#addr]")]
    LdaAt,
    #[strum(to_string = "LDA [FP #offset]")]
    LdaAtFp,
    #[strum(to_string = "LDA [A #offset]")]
    LdaAtA,
    #[strum(to_string = "LDA FP #offset")]
    LdaFp,
    #[strum(to_string = "LDA SP #offset")]
    LdaSp,
    #[strum(to_string = "LDA [SP #offset]")]
    LdaAtSp,
    #[strum(to_string = "STA [#addr]")]
    StaAt,
    #[strum(to_string = "STA [FP #offset]")]
    StaAtFp,
    #[strum(to_string = "STA [SP #offset]")]
    StaAtSp,
    #[strum(to_string = "STA [[SP #offset]]")]
    StaAtAtSp,

    // Stack
    #[strum(to_string = "LDSP #val")]
    LdspConstant,
    #[strum(to_string = "LDFP #val")]
    LdfpConstant,
    #[strum(to_string = "LDFP SP")]
    LdfpSp,
    #[strum(to_string = "PUSH #val")]
    PushConstant,
    #[strum(to_string = "PUSHA")]
    PushA,
    #[strum(to_string = "PUSHSP")]
    PushSp,
    #[strum(to_string = "PUSH [FP #offset]")]
    PushAtFp,
    #[strum(to_string = "POPA")]
    PopA,
    #[strum(to_string = "POP ADDA")]
    PopAddA,
    #[strum(to_string = "POP SUBA")]
    PopSubA,
    #[strum(to_string = "POP [FP #offset]")]
    PopAtFp,
    #[strum(to_string = "POP [A #offset]")]
    PopAtA,
    #[strum(to_string = "SUBSP #val")]
    SubSpConstant,
    #[strum(to_string = "SUBSP A")]
    SubSpA,
    #[strum(to_string = "ADDSP #val")]
    AddSpConstant,
    #[strum(to_string = "ADDSP [SP #offset]")]
    AddSpAtSp,

    // Flow control
    #[strum(to_string = "CALL #addr")]
    Call,
    #[strum(to_string = "RET")]
    Ret,
    #[strum(to_string = "JMP #addr")]
    Jump,
    #[strum(to_string = "JMPF #addr")]
    JumpFlag,
    #[strum(to_string = "JMPNF #addr")]
    JumpNotFlag,
    #[strum(to_string = "bra #offset")]
    Branch,
    #[strum(to_string = "braz #offset")]
    BranchFlag,
    #[strum(to_string = "TSTZ A")]
    TestZeroA,
    #[strum(to_string = "TSTNZ A")]
    TestNotZeroA,
    #[strum(to_string = "TSTN A")]
    TestNegativeA,
    #[strum(to_string = "TSTNN A")]
    TestNotNegativeA,
    #[strum(to_string = "TSTZ POP")]
    TestZeroPop,

    // Arithmetic
    #[strum(to_string = "LINV A")]
    LogicalInvertA,
    #[strum(to_string = "ADDA #val")]
    AddAConstant,
    #[strum(to_string = "SUBA #val")]
    SubAConstant,
    #[strum(to_string = "ADDA [SP #offset]")]
    AddAAtSp,
    #[strum(to_string = "SUBA [SP #offset]")]
    SubAAtSp,

    // Load / store, defined last
    #[strum(to_string = "CPY [SP #spoffset] [FP #fpoffset]")]
    CopySpFp,
}

impl Op {
    pub fn group(&self) -> Group {
        use Op::*;
        match self {
            Invalid | Exit | Out => Group::Misc,
            LdaConstant | LdaAt | LdaAtFp | LdaAtA | LdaFp | LdaSp | LdaAtSp | StaAt | StaAtFp
            | StaAtSp | StaAtAtSp | CopySpFp => Group::LoadStore,
            LdspConstant | LdfpConstant | LdfpSp | PushConstant | PushA | PushSp | PushAtFp
            | PopA | PopAddA | PopSubA | PopAtFp | PopAtA | SubSpConstant | SubSpA
            | AddSpConstant | AddSpAtSp => Group::Stack,
            Call | Ret | Jump | JumpFlag | JumpNotFlag | Branch | BranchFlag | TestZeroA
            | TestNotZeroA | TestNegativeA | TestNotNegativeA | TestZeroPop => Group::FlowControl,
            LogicalInvertA | AddAConstant | SubAConstant | AddAAtSp | SubAAtSp => {
                Group::Arithmetic
            }
        }
    }

    /// Mnemonic template of the standard instruction set.
    pub fn mnemonic(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test() {
        for op in Op::iter() {
            println!("{:>2} {:<12} {}", u8::from(op), op.group(), op);
        }
        assert!(matches!(Op::try_from(0u8), Ok(Op::Invalid)));
        assert_eq!(Op::Call.mnemonic(), "CALL #addr");
        assert_eq!(Op::CopySpFp.group(), Group::LoadStore);
    }
}
