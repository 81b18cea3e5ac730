use super::actions::{Action, CompositeAction, FlagToRegister};
use super::builtins::{self, BuiltIns};
use super::layout::{FrameLayout, GLOBALS};
use crate::actions;
use crate::error::Error;
use crate::frontend::flatten::{AddressExpression, AddressKind, ValueExpression, ValueKind, FUNCTION_ENTRY};
use arch::{code, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereToPutResult {
    A,
    TopStack,
    Flag,
}

/// What value building needs to know about the function being built
pub struct FunctionContext<'a> {
    pub layout: &'a FrameLayout,
    pub builtins: &'a BuiltIns,
}

pub type Built = Result<Option<Box<dyn Action>>, Error>;

type Strategy = fn(&ValueExpression, WhereToPutResult, &FunctionContext<'_>) -> Built;

/// Tried in order, the first one returning an action wins.
const STRATEGIES: [Strategy; 11] = [
    constant,
    static_load,
    address_of,
    dynamic_load,
    dynamic_push,
    builtins::inline,
    allocation,
    generic_call,
    flag_to_register,
    push_register,
    test_register,
];

pub fn build_value(
    expr: &ValueExpression,
    at: WhereToPutResult,
    ctx: &FunctionContext<'_>,
) -> Result<Box<dyn Action>, Error> {
    for strategy in STRATEGIES {
        if let Some(action) = strategy(expr, at, ctx)? {
            return Ok(action);
        }
    }
    Err(Error::compile(format!(
        "Don't know how to build {} of type {} into {at:?}",
        describe(expr),
        expr.ty
    )))
}

fn describe(expr: &ValueExpression) -> String {
    match &expr.kind {
        ValueKind::Constant(value) => format!("constant {value}"),
        ValueKind::Load(_) => "load".to_string(),
        ValueKind::Call(definition, _) => format!("call to {definition}"),
        ValueKind::AddressOf(_) => "address".to_string(),
        ValueKind::ArrayLiteral(_) => "array".to_string(),
        ValueKind::Text(text) => format!("\"{text}\""),
    }
}

pub(crate) fn some(action: impl Action + 'static) -> Built {
    Ok(Some(Box::new(action)))
}

fn size_of(expr: &ValueExpression) -> usize {
    expr.ty.size().unwrap_or(0)
}

// ----------------------------------------------------------------------------
// Addresses

pub enum Address {
    /// FP relative
    Static(i32),
    /// Action leaving the base address in A, plus an offset
    Dynamic(Box<dyn Action>, i32),
}

fn member_offset(base: &AddressExpression, member: &str) -> Result<i32, Error> {
    base.ty
        .field(member)
        .map(|(offset, _)| offset as i32)
        .ok_or_else(|| Error::compile(format!("Type {} has no field {member}", base.ty)))
}

/// Offset from FP when the address does not go through a pointer
pub fn static_offset(addr: &AddressExpression, ctx: &FunctionContext<'_>) -> Result<Option<i32>, Error> {
    match &addr.kind {
        AddressKind::Variable(name) => Ok(Some(ctx.layout.field(name)?.offset)),
        AddressKind::Member(base, member) => match static_offset(base, ctx)? {
            Some(offset) => Ok(Some(offset + member_offset(base, member)?)),
            None => Ok(None),
        },
        AddressKind::Global(_) | AddressKind::Deref(_) => Ok(None),
    }
}

pub fn resolve_address(addr: &AddressExpression, ctx: &FunctionContext<'_>) -> Result<Address, Error> {
    match &addr.kind {
        AddressKind::Variable(name) => Ok(Address::Static(ctx.layout.field(name)?.offset)),
        // Placed by the linker
        AddressKind::Global(name) => Ok(Address::Dynamic(
            Box::new(code!(LdaConstant, val = Reference::new(GLOBALS, name))),
            0,
        )),
        AddressKind::Member(base, member) => {
            let offset = member_offset(base, member)?;
            Ok(match resolve_address(base, ctx)? {
                Address::Static(o) => Address::Static(o + offset),
                Address::Dynamic(action, o) => Address::Dynamic(action, o + offset),
            })
        }
        AddressKind::Deref(pointer) => Ok(Address::Dynamic(
            build_value(pointer, WhereToPutResult::A, ctx)?,
            0,
        )),
    }
}

// ----------------------------------------------------------------------------
// Strategies

fn constant(expr: &ValueExpression, at: WhereToPutResult, _: &FunctionContext<'_>) -> Built {
    let ValueKind::Constant(value) = &expr.kind else {
        return Ok(None);
    };
    match at {
        WhereToPutResult::A => some(code!(LdaConstant, val = *value)),
        WhereToPutResult::TopStack => some(code!(PushConstant, val = *value)),
        WhereToPutResult::Flag => Ok(None),
    }
}

fn static_load(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let ValueKind::Load(addr) = &expr.kind else {
        return Ok(None);
    };
    let Some(offset) = static_offset(addr, ctx)? else {
        return Ok(None);
    };
    match (at, size_of(expr)) {
        (WhereToPutResult::A, 1) => some(code!(LdaAtFp, offset = offset)),
        // Highest byte first, so the copy keeps the field order
        (WhereToPutResult::TopStack, size) => {
            let mut action = CompositeAction::new();
            for k in (0..size as i32).rev() {
                action = action.then(code!(PushAtFp, offset = offset + k));
            }
            some(action)
        }
        _ => Ok(None),
    }
}

fn address_of(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let (ValueKind::AddressOf(addr), WhereToPutResult::A) = (&expr.kind, at) else {
        return Ok(None);
    };
    match resolve_address(addr, ctx)? {
        Address::Static(offset) => some(code!(LdaFp, offset = offset)),
        Address::Dynamic(base, 0) => Ok(Some(base)),
        Address::Dynamic(base, offset) => some(actions![base, code!(AddAConstant, val = offset)]),
    }
}

fn dynamic_load(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let (ValueKind::Load(addr), WhereToPutResult::A, 1) = (&expr.kind, at, size_of(expr)) else {
        return Ok(None);
    };
    match resolve_address(addr, ctx)? {
        Address::Dynamic(base, offset) => some(actions![base, code!(LdaAtA, offset = offset)]),
        Address::Static(_) => Ok(None),
    }
}

/// Multi-byte values behind a pointer, highest byte first. The base is
/// rebuilt for every byte since pushing needs A.
fn dynamic_push(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let ValueKind::Load(addr) = &expr.kind else {
        return Ok(None);
    };
    let size = size_of(expr);
    if at != WhereToPutResult::TopStack || size < 2 {
        return Ok(None);
    }
    let mut action = CompositeAction::new();
    for k in (0..size as i32).rev() {
        let Address::Dynamic(base, offset) = resolve_address(addr, ctx)? else {
            return Ok(None);
        };
        action.push(base);
        action = action
            .then(code!(LdaAtA, offset = offset + k))
            .then(code!(PushA));
    }
    some(action)
}

/// Items pushed last to first below a size cell; A points at the size cell.
fn allocation(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    if at != WhereToPutResult::A {
        return Ok(None);
    }
    let items: Vec<ValueExpression> = match &expr.kind {
        ValueKind::ArrayLiteral(items) => items.clone(),
        ValueKind::Text(text) => text
            .chars()
            .map(|c| ValueExpression::constant(c as i32))
            .collect(),
        _ => return Ok(None),
    };
    let mut action = CompositeAction::new();
    for item in items.iter().rev() {
        action.push(build_value(item, WhereToPutResult::TopStack, ctx)?);
    }
    some(
        action
            .then(code!(PushConstant, val = items.len() as i32))
            .then(code!(LdaSp, offset = 0)),
    )
}

/// Result slot, arguments in declaration order, call, drop the arguments.
fn generic_call(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let ValueKind::Call(definition, args) = &expr.kind else {
        return Ok(None);
    };
    if ctx.builtins.is_inlined(definition) {
        return Ok(None);
    }
    let result_size = size_of(expr);
    match (at, result_size) {
        (WhereToPutResult::Flag, _) | (WhereToPutResult::TopStack, 0) => return Ok(None),
        (WhereToPutResult::A, size) if size > 1 => return Ok(None),
        _ => {}
    }

    let mut action = CompositeAction::new();
    if result_size > 0 {
        action = action.then(code!(SubSpConstant, val = result_size as i32));
    }
    let mut args_size = 0;
    for arg in args {
        args_size += size_of(arg);
        action.push(build_value(arg, WhereToPutResult::TopStack, ctx)?);
    }
    action = action.then(code!(
        Call,
        addr = Reference::new(definition.signature(), FUNCTION_ENTRY)
    ));
    if args_size > 0 {
        action = action.then(code!(AddSpConstant, val = args_size as i32));
    }
    if at == WhereToPutResult::A && result_size == 1 {
        action = action.then(code!(PopA));
    }
    some(action)
}

fn flag_to_register(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    let (ValueKind::Call(definition, _), WhereToPutResult::A) = (&expr.kind, at) else {
        return Ok(None);
    };
    if !ctx.builtins.is_comparison(definition) {
        return Ok(None);
    }
    let test = build_value(expr, WhereToPutResult::Flag, ctx)?;
    some(actions![test, FlagToRegister])
}

fn push_register(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    if at != WhereToPutResult::TopStack || size_of(expr) != 1 {
        return Ok(None);
    }
    let value = build_value(expr, WhereToPutResult::A, ctx)?;
    some(actions![value, code!(PushA)])
}

fn test_register(expr: &ValueExpression, at: WhereToPutResult, ctx: &FunctionContext<'_>) -> Built {
    if at != WhereToPutResult::Flag || size_of(expr) != 1 {
        return Ok(None);
    }
    let value = build_value(expr, WhereToPutResult::A, ctx)?;
    some(actions![value, code!(TestNotZeroA)])
}
