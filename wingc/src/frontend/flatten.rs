use super::definition::{FunctionDefinition, FunctionTable, SignatureBuilder};
use super::types::{Datatype, TypeProvider};
use crate::error::Error;
use crate::grammer::ast::{AstNode, FunctionKind, FunctionNode};
use crate::grammer::reducer::{ARRAY_READ, ARRAY_WRITE};
use indexmap::IndexMap;

pub const RETURN_VALUE_NAME: &str = "result";
pub const FUNCTION_ENTRY: &str = "function_entry";
/// Name of the function that runs the global initializers
pub const GLOBALS_INIT: &str = "globals-init";

/// Calls whose result lives in freshly allocated stack memory
const ALLOCATING_CALLS: [&str; 1] = ["createArray"];

// ----------------------------------------------------------------------------
// Expressions

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Constant(i32),
    Load(AddressExpression),
    Call(FunctionDefinition, Vec<ValueExpression>),
    AddressOf(AddressExpression),
    ArrayLiteral(Vec<ValueExpression>),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueExpression {
    pub kind: ValueKind,
    pub ty: Datatype,
}

impl ValueExpression {
    pub fn constant(value: i32) -> Self {
        Self {
            kind: ValueKind::Constant(value),
            ty: Datatype::Integer,
        }
    }

    /// Result occupies new stack memory when evaluated
    pub fn is_allocating(&self) -> bool {
        match &self.kind {
            ValueKind::ArrayLiteral(_) | ValueKind::Text(_) => true,
            ValueKind::Call(def, _) => ALLOCATING_CALLS.contains(&def.name.as_str()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressKind {
    Variable(String),
    Global(String),
    Member(Box<AddressExpression>, String),
    Deref(Box<ValueExpression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressExpression {
    pub kind: AddressKind,
    pub ty: Datatype,
}

// ----------------------------------------------------------------------------
// Code

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Execute(ValueExpression),
    Assign(AddressExpression, ValueExpression),
    Jump(String),
    JumpOnFalse(ValueExpression, String),
    Return,
}

#[derive(Debug)]
enum CodeItem {
    Instruction(Instruction),
    Block(CodeBlock),
}

/// Labeled, nested code. Flattened once the function is complete.
#[derive(Debug)]
struct CodeBlock {
    label: String,
    items: Vec<CodeItem>,
}

impl CodeBlock {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: vec![],
        }
    }

    fn add(&mut self, instruction: Instruction) {
        self.items.push(CodeItem::Instruction(instruction));
    }

    fn add_block(&mut self, block: CodeBlock) {
        self.items.push(CodeItem::Block(block));
    }

    /// Pre-order walk; a label names the index of the block's first instruction.
    fn flatten(self, code: &mut FlatCode) -> Result<(), Error> {
        if code.labels.contains_key(&self.label) {
            return Err(Error::compile(format!("Duplicate label {}", self.label)));
        }
        code.labels.insert(self.label, code.instructions.len());
        for item in self.items {
            match item {
                CodeItem::Instruction(inst) => code.instructions.push(inst),
                CodeItem::Block(block) => block.flatten(code)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatCode {
    pub instructions: Vec<Instruction>,
    /// Label to instruction index. May equal `instructions.len()`.
    pub labels: IndexMap<String, usize>,
}

impl FlatCode {
    pub fn labels_at(&self, index: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, at)| **at == index)
            .map(|(label, _)| label.as_str())
    }
}

// ----------------------------------------------------------------------------
// Function

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Result,
    Parameter,
    Local,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub ty: Datatype,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionContent {
    pub definition: FunctionDefinition,
    /// Result first, then parameters, then locals in first-occurrence order
    pub variables: IndexMap<String, Variable>,
    pub code: FlatCode,
}

impl FunctionContent {
    pub fn variables_of(&self, kind: VariableKind) -> impl Iterator<Item = &Variable> {
        self.variables.values().filter(move |v| v.kind == kind)
    }
}

/// Locals and parameters shadow `globals`.
pub fn flatten_function(
    node: &FunctionNode,
    definition: &FunctionDefinition,
    functions: &FunctionTable,
    types: &TypeProvider,
    globals: &IndexMap<String, Variable>,
) -> Result<FunctionContent, Error> {
    let mut flattener = Flattener::new(functions, types, globals);
    flattener.add_variables(definition, &node.body)?;
    flattener.finish(definition, &node.body)
}

/// Top level declarations and assignments, in source order, become the body
/// of [`GLOBALS_INIT`]. Its variables are the globals.
pub fn flatten_globals(
    nodes: &[AstNode],
    functions: &FunctionTable,
    types: &TypeProvider,
) -> Result<FunctionContent, Error> {
    let none = IndexMap::new();
    let mut flattener = Flattener::new(functions, types, &none);
    for node in nodes {
        flattener.collect_variables(node, VariableKind::Global)?;
    }
    flattener.finish(&SignatureBuilder::new(GLOBALS_INIT).build(), nodes)
}

struct Flattener<'a> {
    functions: &'a FunctionTable,
    types: &'a TypeProvider,
    globals: &'a IndexMap<String, Variable>,
    variables: IndexMap<String, Variable>,
    counter: usize,
}

impl<'a> Flattener<'a> {
    fn new(functions: &'a FunctionTable, types: &'a TypeProvider, globals: &'a IndexMap<String, Variable>) -> Self {
        Self {
            functions,
            types,
            globals,
            variables: IndexMap::new(),
            counter: 0,
        }
    }

    fn finish(mut self, definition: &FunctionDefinition, body: &[AstNode]) -> Result<FunctionContent, Error> {
        let mut block = CodeBlock::new(FUNCTION_ENTRY);
        self.statements(body, &mut block, None)?;
        block.add(Instruction::Return);

        let mut code = FlatCode::default();
        block.flatten(&mut code)?;

        Ok(FunctionContent {
            definition: definition.clone(),
            variables: self.variables,
            code,
        })
    }

    fn add_variables(&mut self, definition: &FunctionDefinition, body: &[AstNode]) -> Result<(), Error> {
        if definition.has_return() {
            self.declare(RETURN_VALUE_NAME, definition.ret.clone(), VariableKind::Result)?;
        }
        for (name, ty) in &definition.params {
            self.declare(name, ty.clone(), VariableKind::Parameter)?;
        }
        for node in body {
            self.collect_variables(node, VariableKind::Local)?;
        }
        Ok(())
    }

    fn collect_variables(&mut self, node: &AstNode, kind: VariableKind) -> Result<(), Error> {
        if let AstNode::NewVariable { name, ty, hint } = node {
            let ty = match (ty, hint) {
                (Some(def), _) => self.types.resolve(def)?,
                (None, Some(hint)) => self.value(hint, true)?.ty,
                (None, None) => {
                    return Err(Error::compile(format!("Variable {name} needs a type or a value")))
                }
            };
            self.declare(name, ty, kind)?;
        }
        for child in node.children() {
            self.collect_variables(child, kind)?;
        }
        Ok(())
    }

    /// The first declaration wins; redeclaring with another type is an error.
    fn declare(&mut self, name: &str, ty: Datatype, kind: VariableKind) -> Result<(), Error> {
        if let Some(existing) = self.variables.get(name) {
            if existing.ty != ty {
                return Err(Error::compile(format!(
                    "Variable {name} redeclared as {ty}, was {}",
                    existing.ty
                )));
            }
            return Ok(());
        }
        match ty.size() {
            None => {
                return Err(Error::compile(format!(
                    "Variable {name} of type {ty} must be used through a pointer"
                )))
            }
            Some(0) => return Err(Error::compile(format!("Variable {name} cannot be void"))),
            Some(_) => {}
        }
        self.variables.insert(
            name.to_string(),
            Variable {
                name: name.to_string(),
                ty,
                kind,
            },
        );
        Ok(())
    }

    fn next_id(&mut self) -> usize {
        let id = self.counter;
        self.counter += 1;
        id
    }

    // ------------------------------------------------------------------------
    // Statements

    fn statements(&mut self, nodes: &[AstNode], block: &mut CodeBlock, loop_end: Option<&str>) -> Result<(), Error> {
        for node in nodes {
            self.statement(node, block, loop_end)?;
        }
        Ok(())
    }

    fn statement(&mut self, node: &AstNode, block: &mut CodeBlock, loop_end: Option<&str>) -> Result<(), Error> {
        match node {
            AstNode::NewVariable { .. } => {}
            AstNode::Assign { target, value } => self.assign(target, value, block)?,
            AstNode::If {
                condition,
                body,
                else_body,
            } => {
                let condition = self.condition(condition)?;
                let id = self.next_id();
                let end = format!("if-{id}-end");
                if else_body.is_empty() {
                    block.add(Instruction::JumpOnFalse(condition, end.clone()));
                    let mut then = CodeBlock::new(format!("if-{id}-true"));
                    self.statements(body, &mut then, loop_end)?;
                    block.add_block(then);
                } else {
                    let otherwise = format!("if-{id}-else");
                    block.add(Instruction::JumpOnFalse(condition, otherwise.clone()));
                    let mut then = CodeBlock::new(format!("if-{id}-true"));
                    self.statements(body, &mut then, loop_end)?;
                    then.add(Instruction::Jump(end.clone()));
                    block.add_block(then);
                    let mut else_block = CodeBlock::new(otherwise);
                    self.statements(else_body, &mut else_block, loop_end)?;
                    block.add_block(else_block);
                }
                block.add_block(CodeBlock::new(end));
            }
            AstNode::While { condition, body } => {
                let condition = self.condition(condition)?;
                let id = self.next_id();
                let begin = format!("while-{id}-begin");
                let end = format!("while-{id}-end");
                let mut looped = CodeBlock::new(begin.clone());
                looped.add(Instruction::JumpOnFalse(condition, end.clone()));
                self.statements(body, &mut looped, Some(end.as_str()))?;
                looped.add(Instruction::Jump(begin));
                block.add_block(looped);
                block.add_block(CodeBlock::new(end));
            }
            AstNode::Break => match loop_end {
                Some(end) => block.add(Instruction::Jump(end.to_string())),
                None => return Err(Error::compile("No loop to break from")),
            },
            AstNode::Return(value) => {
                if let Some(value) = value {
                    let target = self.address(&AstNode::ident(RETURN_VALUE_NAME)).map_err(|_| {
                        Error::compile("Cannot return a value from a function without return type")
                    })?;
                    let value = self.value(value, true)?;
                    block.add(self.checked_assign(target, value)?);
                }
                block.add(Instruction::Return);
            }
            AstNode::Function(_) | AstNode::Struct { .. } | AstNode::Import(_) => {
                return Err(Error::compile("Definitions are only allowed at top level"))
            }
            expression => {
                let value = self.value(expression, false)?;
                block.add(Instruction::Execute(value));
            }
        }
        Ok(())
    }

    fn condition(&mut self, node: &AstNode) -> Result<ValueExpression, Error> {
        let value = self.value(node, false)?;
        if value.ty != Datatype::Boolean {
            return Err(Error::compile(format!(
                "Type of condition must be bool, not {}",
                value.ty
            )));
        }
        Ok(value)
    }

    fn assign(&mut self, target: &AstNode, value: &AstNode, block: &mut CodeBlock) -> Result<(), Error> {
        let value = self.value(value, true)?;

        // a[i] = v
        if let AstNode::ArrayAccess { target, index } = target {
            let array = self.value(target, false)?;
            let index = self.value(index, false)?;
            let write = self.call(ARRAY_WRITE, FunctionKind::Operator, vec![array, index, value])?;
            block.add(Instruction::Execute(write));
            return Ok(());
        }

        let target = self.address(target)?;
        block.add(self.checked_assign(target, value)?);
        Ok(())
    }

    fn checked_assign(&self, target: AddressExpression, value: ValueExpression) -> Result<Instruction, Error> {
        if target.ty != value.ty {
            return Err(Error::compile(format!(
                "Cannot assign {} to a variable of type {}",
                value.ty, target.ty
            )));
        }
        Ok(Instruction::Assign(target, value))
    }

    // ------------------------------------------------------------------------
    // Expressions

    fn address(&mut self, node: &AstNode) -> Result<AddressExpression, Error> {
        match node {
            AstNode::Identifier(name) => {
                let variable = self
                    .variables
                    .get(name)
                    .or_else(|| self.globals.get(name))
                    .ok_or_else(|| Error::compile(format!("Variable {name} not found")))?;
                let kind = match variable.kind {
                    VariableKind::Global => AddressKind::Global(name.clone()),
                    _ => AddressKind::Variable(name.clone()),
                };
                Ok(AddressExpression {
                    kind,
                    ty: variable.ty.clone(),
                })
            }
            AstNode::Deref(pointer) => {
                let pointer = self.value(pointer, false)?;
                self.deref(pointer)
            }
            AstNode::MemberAccess { target, member } => {
                let target = self.address(target)?;
                self.member(target, member)
            }
            AstNode::MemberDeref { target, member } => {
                let pointer = self.value(target, false)?;
                let target = self.deref(pointer)?;
                self.member(target, member)
            }
            other => Err(Error::compile(format!("Cannot get the address of {other:?}"))),
        }
    }

    fn deref(&self, pointer: ValueExpression) -> Result<AddressExpression, Error> {
        let Datatype::Pointer(to) = &pointer.ty else {
            return Err(Error::compile(format!(
                "Only pointers can be dereferenced, not {}",
                pointer.ty
            )));
        };
        Ok(AddressExpression {
            ty: to.as_ref().clone(),
            kind: AddressKind::Deref(Box::new(pointer)),
        })
    }

    fn member(&self, target: AddressExpression, member: &str) -> Result<AddressExpression, Error> {
        let Some((_, ty)) = target.ty.field(member) else {
            return Err(Error::compile(format!(
                "Type {} has no field {member}",
                target.ty
            )));
        };
        Ok(AddressExpression {
            ty: ty.clone(),
            kind: AddressKind::Member(Box::new(target), member.to_string()),
        })
    }

    /// `allocate` permits expressions that allocate stack memory. Only the
    /// whole right hand side of an assignment may do so.
    fn value(&mut self, node: &AstNode, allocate: bool) -> Result<ValueExpression, Error> {
        let value = match node {
            AstNode::Constant(value) => ValueExpression::constant(*value),
            AstNode::Text(text) => ValueExpression {
                kind: ValueKind::Text(text.clone()),
                ty: Datatype::string(),
            },
            AstNode::Identifier(_)
            | AstNode::MemberAccess { .. }
            | AstNode::MemberDeref { .. }
            | AstNode::Deref(_) => {
                let address = self.address(node)?;
                ValueExpression {
                    ty: address.ty.clone(),
                    kind: ValueKind::Load(address),
                }
            }
            AstNode::AddressOf(target) => {
                let address = self.address(target)?;
                ValueExpression {
                    ty: Datatype::pointer(address.ty.clone()),
                    kind: ValueKind::AddressOf(address),
                }
            }
            AstNode::ArrayAccess { target, index } => {
                let array = self.value(target, false)?;
                let index = self.value(index, false)?;
                self.call(ARRAY_READ, FunctionKind::Operator, vec![array, index])?
            }
            AstNode::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| self.value(item, false))
                    .collect::<Result<Vec<_>, _>>()?;
                if let Some(item) = items.iter().find(|i| i.ty != Datatype::Integer) {
                    return Err(Error::compile(format!(
                        "Array literals hold int, not {}",
                        item.ty
                    )));
                }
                ValueExpression {
                    kind: ValueKind::ArrayLiteral(items),
                    ty: Datatype::string(),
                }
            }
            AstNode::Call { target, kind, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.value(arg, false))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(target, *kind, args)?
            }
            AstNode::FunctionReference(name) => {
                return Err(Error::compile(format!(
                    "Function reference {name} cannot be compiled for the emulator"
                )))
            }
            AstNode::Lambda(_) => return Err(Error::compile("Lambdas must be extracted before flattening")),
            other => return Err(Error::compile(format!("{other:?} is not a value"))),
        };
        if value.is_allocating() && !allocate {
            return Err(Error::compile(
                "Arrays and strings can only be created as the value of an assignment",
            ));
        }
        Ok(value)
    }

    fn call(&self, name: &str, kind: FunctionKind, args: Vec<ValueExpression>) -> Result<ValueExpression, Error> {
        let types: Vec<Datatype> = args.iter().map(|arg| arg.ty.clone()).collect();
        let definition = self.functions.resolve(name, kind, &types)?.clone();
        Ok(ValueExpression {
            ty: definition.ret.clone(),
            kind: ValueKind::Call(definition, args),
        })
    }
}
