use super::actions::Action;
use super::function::BuiltFunction;
use super::layout::calculate_frame_layout;
use super::strategy::{build_value, some, Built, FunctionContext, WhereToPutResult};
use crate::actions;
use crate::error::Error;
use crate::frontend::definition::{FunctionDefinition, SignatureBuilder};
use crate::frontend::flatten::{ValueExpression, ValueKind, FUNCTION_ENTRY};
use crate::frontend::types::Datatype;
use crate::grammer::ast::FunctionKind;
use crate::grammer::reducer::{
    ADD, ARRAY_READ, ARRAY_WRITE, EQUAL, GREATER_THAN, LESS_THAN, NEGATE, NOT_EQUAL, SUB,
};
use arch::{code, InstructionSet};
use itertools::Itertools;
use wingasm::Assembler;

const PRINT: &str = "print";
const BOOL: &str = "bool";
const SIZE: &str = "size";
const CREATE_ARRAY: &str = "createArray";

/// A function written in mnemonics. Every frame field is available as a
/// `#name` variable holding its FP offset.
#[derive(Debug, Clone)]
pub struct AssemblyBuiltIn {
    pub definition: FunctionDefinition,
    pub source: &'static str,
}

const ADD_SOURCE: &str = "
    PUSH [FP #b]
    LDA [FP #a]
    POP ADDA
    STA [FP #result]
    RET
";

const SUB_SOURCE: &str = "
    PUSH [FP #b]
    LDA [FP #a]
    POP SUBA
    STA [FP #result]
    RET
";

const PRINT_STRING_SOURCE: &str = "
    #left = -1
    #at = -2
    SUBSP #2

    LDA [FP #string]
    LDA [A #0]
    STA [FP #left]
    LDA [FP #string]
    ADDA #1
    STA [FP #at]

    :loop
    LDA [FP #left]
    TSTZ A
    JMPF #end
    SUBA #1
    STA [FP #left]

    LDA [FP #at]
    LDA [A #0]
    out

    LDA [FP #at]
    ADDA #1
    STA [FP #at]
    JMP #loop

    :end
    RET
";

/// Functions the compiler provides without source
#[derive(Debug, Clone)]
pub struct BuiltIns {
    inlined: Vec<FunctionDefinition>,
    assembled: Vec<AssemblyBuiltIn>,
}

fn int_operator(name: &str, ret: Datatype) -> FunctionDefinition {
    SignatureBuilder::new(name)
        .param("a", Datatype::Integer)
        .param("b", Datatype::Integer)
        .ret(ret)
        .kind(FunctionKind::Operator)
        .build()
}

impl Default for BuiltIns {
    fn default() -> Self {
        let inlined = vec![
            SignatureBuilder::new(PRINT)
                .param("value", Datatype::Integer)
                .build(),
            SignatureBuilder::new(BOOL)
                .param("value", Datatype::Integer)
                .ret(Datatype::Boolean)
                .build(),
            SignatureBuilder::new(SIZE)
                .param("array", Datatype::string())
                .ret(Datatype::Integer)
                .kind(FunctionKind::Instance)
                .build(),
            SignatureBuilder::new(CREATE_ARRAY)
                .param("size", Datatype::Integer)
                .ret(Datatype::string())
                .build(),
            SignatureBuilder::new(ARRAY_READ)
                .param("array", Datatype::string())
                .param("index", Datatype::Integer)
                .ret(Datatype::Integer)
                .kind(FunctionKind::Operator)
                .build(),
            SignatureBuilder::new(ARRAY_WRITE)
                .param("array", Datatype::string())
                .param("index", Datatype::Integer)
                .param("value", Datatype::Integer)
                .kind(FunctionKind::Operator)
                .build(),
            SignatureBuilder::new(NEGATE)
                .param("value", Datatype::Integer)
                .ret(Datatype::Integer)
                .kind(FunctionKind::Operator)
                .build(),
            int_operator(NOT_EQUAL, Datatype::Boolean),
            int_operator(EQUAL, Datatype::Boolean),
            int_operator(LESS_THAN, Datatype::Boolean),
            int_operator(GREATER_THAN, Datatype::Boolean),
        ];
        let assembled = vec![
            AssemblyBuiltIn {
                definition: int_operator(ADD, Datatype::Integer),
                source: ADD_SOURCE,
            },
            AssemblyBuiltIn {
                definition: int_operator(SUB, Datatype::Integer),
                source: SUB_SOURCE,
            },
            AssemblyBuiltIn {
                definition: SignatureBuilder::new(PRINT)
                    .param("string", Datatype::string())
                    .build(),
                source: PRINT_STRING_SOURCE,
            },
        ];
        Self { inlined, assembled }
    }
}

impl BuiltIns {
    pub fn add_assembled(&mut self, definition: FunctionDefinition, source: &'static str) {
        self.assembled.push(AssemblyBuiltIn { definition, source });
    }

    pub fn definitions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.inlined
            .iter()
            .chain(self.assembled.iter().map(|b| &b.definition))
    }

    pub fn is_inlined(&self, definition: &FunctionDefinition) -> bool {
        self.inlined.contains(definition)
    }

    /// Inlined comparisons leave their result in the flag
    pub fn is_comparison(&self, definition: &FunctionDefinition) -> bool {
        definition.kind == FunctionKind::Operator
            && [NOT_EQUAL, EQUAL, LESS_THAN, GREATER_THAN].contains(&definition.name.as_str())
            && self.is_inlined(definition)
    }

    /// Assemble every mnemonic built-in
    pub fn build(&self, set: &InstructionSet) -> Result<Vec<BuiltFunction>, Error> {
        self.assembled
            .iter()
            .map(|builtin| assemble_builtin(builtin, set))
            .collect()
    }
}

fn assemble_builtin(builtin: &AssemblyBuiltIn, set: &InstructionSet) -> Result<BuiltFunction, Error> {
    let definition = &builtin.definition;
    let layout = calculate_frame_layout(definition, &[])?;
    let variables = layout
        .fields
        .values()
        .map(|field| format!("#{} = {}", field.name, field.offset))
        .join("\n");
    let source = format!("{variables}\n{}", builtin.source);

    let mut assembly = Assembler::new(set, definition.signature()).assemble(&source)?;
    if assembly.labels.contains_key(FUNCTION_ENTRY) {
        return Err(Error::compile(format!(
            "{definition} must not define the label {FUNCTION_ENTRY}"
        )));
    }
    assembly.labels.insert(FUNCTION_ENTRY.to_string(), 0);

    Ok(BuiltFunction {
        definition: definition.clone(),
        layout,
        codes: assembly.codes,
        labels: assembly.labels,
        constants: Default::default(),
    })
}

// ----------------------------------------------------------------------------
// Inlined

/// `a - b` left in A
fn subtract(
    a: &ValueExpression,
    b: &ValueExpression,
    ctx: &FunctionContext<'_>,
) -> Result<Box<dyn Action>, Error> {
    Ok(Box::new(actions![
        build_value(b, WhereToPutResult::TopStack, ctx)?,
        build_value(a, WhereToPutResult::A, ctx)?,
        code!(PopSubA),
    ]))
}

/// Strategy for calls to inlined built-ins
pub fn inline(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let ValueKind::Call(definition, args) = &expr.kind else {
        return Ok(None);
    };
    if !ctx.builtins.is_inlined(definition) {
        return Ok(None);
    }
    use WhereToPutResult::*;
    let arg = |i: usize| {
        args.get(i)
            .ok_or_else(|| Error::compile(format!("Missing argument {i} to {definition}")))
    };
    let value = |i: usize, at: WhereToPutResult| build_value(arg(i)?, at, ctx);
    let compare = |a: usize, b: usize| subtract(arg(a)?, arg(b)?, ctx);

    match (definition.name.as_str(), at) {
        (PRINT, A) => some(actions![value(0, A)?, code!(Out)]),
        (BOOL, A) => value(0, A).map(Some),
        (BOOL, TopStack) => value(0, TopStack).map(Some),
        (SIZE, A) => some(actions![value(0, A)?, code!(LdaAtA, offset = 0)]),
        (CREATE_ARRAY, A) => some(actions![
            value(0, A)?,
            code!(SubSpA),
            code!(PushA),
            code!(LdaSp, offset = 0),
        ]),
        // Items start right after the size cell
        (ARRAY_READ, A) => some(actions![
            value(0, TopStack)?,
            value(1, A)?,
            code!(PopAddA),
            code!(LdaAtA, offset = 1),
        ]),
        (ARRAY_WRITE, A) => some(actions![
            value(2, TopStack)?,
            value(0, TopStack)?,
            value(1, A)?,
            code!(PopAddA),
            code!(PopAtA, offset = 1),
        ]),
        (NEGATE, A) => some(actions![
            value(0, TopStack)?,
            code!(LdaConstant, val = 0),
            code!(PopSubA),
        ]),
        (NOT_EQUAL, Flag) => some(actions![compare(0, 1)?, code!(TestNotZeroA)]),
        (EQUAL, Flag) => some(actions![compare(0, 1)?, code!(TestZeroA)]),
        (LESS_THAN, Flag) => some(actions![compare(0, 1)?, code!(TestNegativeA)]),
        // a > b as b - a < 0
        (GREATER_THAN, Flag) => some(actions![compare(1, 0)?, code!(TestNegativeA)]),
        _ => Ok(None),
    }
}
