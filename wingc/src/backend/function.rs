use super::actions::{Action, CompositeAction};
use super::builtins::BuiltIns;
use super::generator::CodeGenerator;
use super::layout::{FrameLayout, GLOBALS};
use super::strategy::{build_value, resolve_address, Address, FunctionContext, WhereToPutResult};
use crate::actions;
use crate::error::Error;
use crate::frontend::definition::FunctionDefinition;
use crate::frontend::flatten::{FunctionContent, Instruction, ValueExpression, FUNCTION_ENTRY};
use arch::{code, Code};
use indexmap::{IndexMap, IndexSet};

/// Deferred constant holding the size of the locals
pub const FRAME_SIZE: &str = "frame_size";

/// Code of one function, references still symbolic
#[derive(Debug, Clone)]
pub struct BuiltFunction {
    pub definition: FunctionDefinition,
    pub layout: FrameLayout,
    pub codes: Vec<Code>,
    /// Label to code index
    pub labels: IndexMap<String, usize>,
    /// Named values references may resolve to, besides labels
    pub constants: IndexMap<String, i32>,
}

impl BuiltFunction {
    pub fn signature(&self) -> String {
        self.definition.signature()
    }

    /// Signatures of the other functions this one references, in order of
    /// first use
    pub fn dependencies(&self) -> IndexSet<String> {
        let own = self.signature();
        self.codes
            .iter()
            .flat_map(|code| code.references())
            .filter(|r| r.scope != own && r.scope != GLOBALS)
            .map(|r| r.scope.clone())
            .collect()
    }
}

pub fn build_function(content: &FunctionContent, builtins: &BuiltIns) -> Result<BuiltFunction, Error> {
    let layout = FrameLayout::for_content(content)?;
    let ctx = FunctionContext {
        layout: &layout,
        builtins,
    };
    let mut generator = CodeGenerator::new(content.definition.signature());

    generator.label(FUNCTION_ENTRY)?;
    if layout.size_of_vars > 0 {
        let frame_size = generator.reference(FRAME_SIZE);
        generator.generate(code!(SubSpConstant, val = frame_size));
    }

    let code = &content.code;
    for (index, instruction) in code.instructions.iter().enumerate() {
        for label in code.labels_at(index).filter(|l| *l != FUNCTION_ENTRY) {
            generator.label(label)?;
        }
        let action = build_instruction(instruction, &ctx, &generator)?;
        generator.emit(action.as_ref());
    }
    for label in code.labels_at(code.instructions.len()) {
        generator.label(label)?;
    }

    let (codes, labels) = generator.finish();
    let constants = IndexMap::from([(FRAME_SIZE.to_string(), layout.size_of_vars as i32)]);
    Ok(BuiltFunction {
        definition: content.definition.clone(),
        layout,
        codes,
        labels,
        constants,
    })
}

fn build_instruction(
    instruction: &Instruction,
    ctx: &FunctionContext<'_>,
    generator: &CodeGenerator,
) -> Result<Box<dyn Action>, Error> {
    Ok(match instruction {
        Instruction::Execute(value) => build_execute(value, ctx)?,
        Instruction::Assign(target, value) => {
            let size = value.ty.size().unwrap_or(0);
            match resolve_address(target, ctx)? {
                Address::Static(offset) if size == 1 => Box::new(actions![
                    build_value(value, WhereToPutResult::A, ctx)?,
                    code!(StaAtFp, offset = offset),
                ]),
                // Value first: evaluating it may need A
                Address::Static(offset) => {
                    let mut action = CompositeAction::new();
                    action.push(build_value(value, WhereToPutResult::TopStack, ctx)?);
                    for k in 0..size as i32 {
                        action = action.then(code!(PopAtFp, offset = offset + k));
                    }
                    Box::new(action)
                }
                Address::Dynamic(base, offset) => {
                    let mut action = CompositeAction::new();
                    action.push(build_value(value, WhereToPutResult::TopStack, ctx)?);
                    action.push(base);
                    for k in 0..size as i32 {
                        action = action.then(code!(PopAtA, offset = offset + k));
                    }
                    Box::new(action)
                }
            }
        }
        Instruction::Jump(label) => Box::new(code!(Jump, addr = generator.reference(label))),
        Instruction::JumpOnFalse(condition, label) => Box::new(actions![
            build_value(condition, WhereToPutResult::Flag, ctx)?,
            code!(JumpNotFlag, addr = generator.reference(label)),
        ]),
        Instruction::Return => Box::new(code!(Ret)),
    })
}

/// Results are dropped: small ones end up in A, larger ones are popped
fn build_execute(value: &ValueExpression, ctx: &FunctionContext<'_>) -> Result<Box<dyn Action>, Error> {
    match value.ty.size().unwrap_or(0) {
        0 | 1 => build_value(value, WhereToPutResult::A, ctx),
        size => Ok(Box::new(actions![
            build_value(value, WhereToPutResult::TopStack, ctx)?,
            code!(AddSpConstant, val = size as i32),
        ])),
    }
}
