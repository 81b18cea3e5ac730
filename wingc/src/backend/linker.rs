use super::function::BuiltFunction;
use super::layout::{GlobalLayout, GLOBALS};
use crate::error::Error;
use crate::frontend::flatten::FUNCTION_ENTRY;
use arch::{code, Code, InstructionSet, Reference};
use bimap::BiMap;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;

/// Largest image the 8 bit program counter can address
pub const MAX_PROGRAM_SIZE: usize = 256;

/// Linked byte image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub code: Vec<u8>,
    /// Signature to entry address
    pub functions: BiMap<String, u8>,
}

impl Program {
    pub fn entry_of(&self, signature: &str) -> Option<u8> {
        self.functions.get_by_left(signature).copied()
    }

    pub fn function_at(&self, addr: u8) -> Option<&str> {
        self.functions.get_by_right(&addr).map(|s| s.as_str())
    }
}

/// Initialize the stack, call the entries in order and halt.
fn header(stack_start: u8, entries: &[String]) -> Vec<Code> {
    let mut codes = vec![
        code!(LdfpConstant, val = stack_start as i32),
        code!(LdspConstant, val = stack_start as i32),
    ];
    for entry in entries {
        codes.push(code!(Call, addr = Reference::new(entry, FUNCTION_ENTRY)));
    }
    codes.push(code!(Exit));
    codes
}

/// Functions reachable from `entries`, breadth first
fn placement<'a>(
    functions: &'a IndexMap<String, BuiltFunction>,
    entries: &[String],
) -> Result<Vec<&'a BuiltFunction>, Error> {
    let mut queued: IndexSet<String> = entries.iter().cloned().collect();
    let mut queue: VecDeque<String> = entries.iter().cloned().collect();
    let mut placed = vec![];
    while let Some(signature) = queue.pop_front() {
        let function = functions
            .get(&signature)
            .ok_or_else(|| Error::compile(format!("Function {signature} is not defined")))?;
        for dependency in function.dependencies() {
            if queued.insert(dependency.clone()) {
                queue.push_back(dependency);
            }
        }
        placed.push(function);
    }
    Ok(placed)
}

/// Byte offset of every code index, plus the end offset
fn offsets(set: &InstructionSet, codes: &[Code]) -> Result<Vec<usize>, Error> {
    let mut offsets = vec![0];
    let mut at = 0;
    for code in codes {
        at += set.size_of(code)?;
        offsets.push(at);
    }
    Ok(offsets)
}

/// Lay out the functions reachable from `entries` behind the header, then
/// the globals behind the code.
pub fn link(
    set: &InstructionSet,
    functions: &IndexMap<String, BuiltFunction>,
    entries: &[String],
    globals: &GlobalLayout,
    stack_start: u8,
) -> Result<Program, Error> {
    let header = header(stack_start, entries);
    let placed = placement(functions, entries)?;

    // 1. Place
    let mut base = offsets(set, &header)?.last().copied().unwrap_or(0);
    let mut layout: IndexMap<String, (usize, Vec<usize>)> = IndexMap::new();
    for function in &placed {
        let offsets = offsets(set, &function.codes)?;
        let size = offsets.last().copied().unwrap_or(0);
        layout.insert(function.signature(), (base, offsets));
        base += size;
    }
    let code_end = base;
    let total = code_end + globals.size;
    if total > MAX_PROGRAM_SIZE {
        return Err(Error::compile(format!(
            "Program needs {total} bytes, only {MAX_PROGRAM_SIZE} are addressable"
        )));
    }

    // 2. Resolve
    let lookup = |r: &Reference| -> Option<i32> {
        if r.scope == GLOBALS {
            return globals.fields.get(&r.label).map(|f| code_end as i32 + f.offset);
        }
        let function = functions.get(&r.scope)?;
        let (base, offsets) = layout.get(&r.scope)?;
        match function.labels.get(&r.label) {
            Some(index) => offsets.get(*index).map(|o| (base + o) as i32),
            None => function.constants.get(&r.label).copied(),
        }
    };
    let mut code = vec![];
    for line in header.iter().chain(placed.iter().flat_map(|f| f.codes.iter())) {
        code.extend(set.encode(line, &lookup)?);
    }

    let functions = layout
        .iter()
        .map(|(signature, (base, _))| (signature.clone(), *base as u8))
        .collect();
    Ok(Program { code, functions })
}
