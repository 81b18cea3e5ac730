use arch::{Code, InstructionSet, Reference, Value};
use indexmap::IndexMap;

use crate::error::Error;
use crate::parser::{Imm, Stmt};
use crate::scope::{Scopes, Symbol};

/// Assembled, not yet placed code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub codes: Vec<Code>,
    /// Unique label name to code index; an index equal to `codes.len()`
    /// points right after the last instruction.
    pub labels: IndexMap<String, usize>,
}

impl Assembly {
    /// Byte offset of every code index, plus the end offset.
    pub fn offsets(&self, set: &InstructionSet) -> Result<Vec<usize>, Error> {
        let mut offsets = vec![0];
        for code in &self.codes {
            let last = offsets.last().copied().unwrap_or(0);
            offsets.push(last + set.size_of(code)?);
        }
        Ok(offsets)
    }

    /// Place the code at `base` and resolve the labels of `scope`.
    pub fn link(&self, set: &InstructionSet, base: usize, scope: &str) -> Result<Vec<u8>, Error> {
        let offsets = self.offsets(set)?;
        let lookup = |r: &Reference| {
            (r.scope == scope)
                .then(|| self.labels.get(&r.label))
                .flatten()
                .map(|index| (base + offsets[*index]) as i32)
        };
        let mut bytes = vec![];
        for code in &self.codes {
            bytes.extend(set.encode(code, &lookup)?);
        }
        Ok(bytes)
    }
}

pub struct Assembler<'a> {
    set: &'a InstructionSet,
    scope: String,
}

impl<'a> Assembler<'a> {
    /// `scope` becomes the scope of every label reference the code makes.
    pub fn new(set: &'a InstructionSet, scope: impl Into<String>) -> Self {
        Self {
            set,
            scope: scope.into(),
        }
    }

    pub fn assemble(&self, text: &str) -> Result<Assembly, Error> {
        let mut scopes = Scopes::new();

        // 1. Parse lines and collect labels
        let mut stmts = vec![];
        let mut index = 0;
        for (line, raw) in text.lines().enumerate() {
            let at = |e: Error| Error::Line(line, Box::new(e));
            let Some(stmt) = Stmt::parse(raw, self.set).map_err(at)? else {
                continue;
            };
            match &stmt {
                Stmt::Scope => {
                    scopes.open();
                }
                Stmt::EndScope => scopes.close().map_err(at)?,
                Stmt::Label(name) => scopes.define_label(name, index).map_err(at)?,
                Stmt::Code(..) => index += 1,
                Stmt::Variable(..) => {}
            }
            stmts.push((line, stmt));
        }
        if scopes.depth() > 0 {
            return Err(Error::UnclosedScope);
        }

        // 2. Resolve operands
        scopes.rewind();
        let mut next_scope = 1;
        let mut codes = vec![];
        for (line, stmt) in stmts {
            let at = |e: Error| Error::Line(line, Box::new(e));
            match stmt {
                Stmt::Scope => {
                    scopes.enter(next_scope);
                    next_scope += 1;
                }
                Stmt::EndScope => scopes.close().map_err(at)?,
                Stmt::Label(_) => {}
                Stmt::Variable(name, imm) => {
                    let value = match self.resolve(&scopes, &imm).map_err(at)? {
                        Value::Constant(value) => value,
                        Value::Reference(r) => return Err(at(Error::LabelAsVariable(r.label))),
                    };
                    scopes.define_variable(&name, value).map_err(at)?;
                }
                Stmt::Code(id, operands) => {
                    let op = match self.set.get(id) {
                        Some(inst) => inst.op,
                        None => return Err(at(Error::UnknownInstruction(id.to_string()))),
                    };
                    let mut code = Code::new(op);
                    for (name, imm) in operands {
                        code = code.with(&name, self.resolve(&scopes, &imm).map_err(at)?);
                    }
                    codes.push(code);
                }
            }
        }

        Ok(Assembly {
            codes,
            labels: scopes.labels(),
        })
    }

    fn resolve(&self, scopes: &Scopes, imm: &Imm) -> Result<Value, Error> {
        match imm {
            Imm::Literal(value) => Ok(Value::Constant(*value)),
            Imm::Ident(name) => match scopes.lookup(name) {
                Some(Symbol::Variable(value)) => Ok(Value::Constant(value)),
                Some(Symbol::Label(label)) => Ok(Value::Reference(Reference::new(&self.scope, label))),
                None => Err(Error::UndefinedSymbol(name.clone())),
            },
        }
    }
}

/// Assemble `text` into a byte image placed at address 0.
pub fn assemble(text: &str, set: &InstructionSet) -> Result<Vec<u8>, Error> {
    Assembler::new(set, "").assemble(text)?.link(set, 0, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::Op;

    #[test]
    fn forward_label() {
        let set = InstructionSet::standard();
        let bytes = assemble(
            "
            JMP #end
            LDA #1
            :end
            exit
            ",
            &set,
        )
        .unwrap();
        assert_eq!(
            bytes,
            vec![u8::from(Op::Jump), 4, u8::from(Op::LdaConstant), 1, u8::from(Op::Exit)]
        );
    }

    #[test]
    fn scoped_labels() {
        let set = InstructionSet::standard();
        let assembly = Assembler::new(&set, "f")
            .assemble(
                "
                :top
                scope
                  JMP #top
                  :top
                  JMP #top
                endscope
                JMP #top
                ",
            )
            .unwrap();
        let targets: Vec<_> = assembly
            .codes
            .iter()
            .flat_map(|c| c.references().map(|r| r.label.clone()))
            .collect();
        assert_eq!(targets, vec!["top@1", "top@1", "top"]);
        assert_eq!(assembly.labels.get("top"), Some(&0));
        assert_eq!(assembly.labels.get("top@1"), Some(&1));
    }

    #[test]
    fn variables() {
        let set = InstructionSet::standard();
        let bytes = assemble(
            "
            #a = 3
            scope
              #a = -1
              LDA [FP #a]
            endscope
            LDA [FP #a]
            ",
            &set,
        )
        .unwrap();
        assert_eq!(
            bytes,
            vec![u8::from(Op::LdaAtFp), 255, u8::from(Op::LdaAtFp), 3]
        );
    }

    #[test]
    fn errors() {
        let set = InstructionSet::standard();
        let err = |text: &str| match assemble(text, &set) {
            Err(Error::Line(_, e)) => *e,
            Err(e) => e,
            Ok(_) => panic!("`{text}` should not assemble"),
        };
        assert!(matches!(err("#a = 1\n#a = 2"), Error::ReassignedVariable(_)));
        assert!(matches!(err("scope\nexit"), Error::UnclosedScope));
        assert!(matches!(err("endscope"), Error::ScopeUnderflow));
        assert!(matches!(err("FOO"), Error::UnknownInstruction(_)));
        assert!(matches!(err("JMP #nowhere"), Error::UndefinedSymbol(_)));
        assert!(matches!(err(":a\n:a\nexit"), Error::RedefinedLabel(_)));
        assert!(matches!(err("LDA #300"), Error::Instruction(_)));
    }
}
