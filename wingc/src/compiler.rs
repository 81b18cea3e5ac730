use crate::backend::builtins::BuiltIns;
use crate::backend::function::{build_function, BuiltFunction};
use crate::backend::layout::GlobalLayout;
use crate::backend::linker::{link, Program};
use crate::error::Error;
use crate::frontend::definition::{FunctionDefinition, FunctionTable};
use crate::frontend::flatten::{flatten_function, flatten_globals};
use crate::frontend::lambda::extract_lambdas;
use crate::frontend::types::{Datatype, TypeProvider};
use crate::grammer::ast::{AstNode, FunctionKind};
use crate::grammer::lexer::Lexer;
use crate::grammer::parsercore::Parser;
use crate::grammer::reducer::Rules;
use arch::InstructionSet;
use indexmap::IndexMap;
use wingemu::Emulator;

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Initial SP and FP
    pub stack_start: u8,
    /// Name of the function the program starts in
    pub entry: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            stack_start: 255,
            entry: "main".to_string(),
        }
    }
}

pub struct Compiler {
    pub set: InstructionSet,
    pub rules: Rules,
    pub builtins: BuiltIns,
    pub config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(
            InstructionSet::standard(),
            Rules::default(),
            BuiltIns::default(),
            CompilerConfig::default(),
        )
    }
}

/// Everything known about a program before its functions are built
pub struct Declarations {
    pub types: TypeProvider,
    pub functions: FunctionTable,
    /// Source functions with their resolved definitions
    pub sources: Vec<(FunctionDefinition, AstNode)>,
    /// Top level declarations and their initializers
    pub globals: Vec<AstNode>,
}

/// Every built function plus what the linker needs to place them
pub struct BuiltProgram {
    /// Signatures called by the header, in order
    pub entries: Vec<String>,
    pub functions: IndexMap<String, BuiltFunction>,
    pub globals: GlobalLayout,
}

impl Compiler {
    pub fn new(set: InstructionSet, rules: Rules, builtins: BuiltIns, config: CompilerConfig) -> Self {
        Self {
            set,
            rules,
            builtins,
            config,
        }
    }

    pub fn parse(&self, source: &str) -> Result<Vec<AstNode>, Error> {
        let tokens = Lexer::new(source).parse()?;
        Parser::new(tokens, &self.rules).parse()
    }

    pub fn compile_source(&self, source: &str) -> Result<Program, Error> {
        let nodes = self.parse(source)?;
        self.compile(&nodes)
    }

    pub fn declare(&self, nodes: &[AstNode]) -> Result<Declarations, Error> {
        let mut types = TypeProvider::default();
        let mut functions = FunctionTable::default();
        for definition in self.builtins.definitions() {
            functions.add(definition.clone())?;
        }

        let mut sources = vec![];
        let mut globals = vec![];
        for node in nodes {
            match node {
                AstNode::Import(name) => {
                    return Err(Error::compile(format!("Cannot import {name}, imports are not supported")))
                }
                AstNode::Struct { name, members } => {
                    types.add_struct(name, members)?;
                }
                AstNode::Function(function) => {
                    let definition = FunctionDefinition::from_node(function, &types)?;
                    functions.add(definition.clone())?;
                    sources.push((definition, node.clone()));
                }
                AstNode::NewVariable { .. } | AstNode::Assign { .. } => globals.push(node.clone()),
                other => {
                    return Err(Error::compile(format!(
                        "Only functions, structs and globals are allowed at top level, found {other:?}"
                    )))
                }
            }
        }
        Ok(Declarations {
            types,
            functions,
            sources,
            globals,
        })
    }

    /// Build every function, source and built-in, keyed by signature. The
    /// global initializer is an entry only when it has work to do.
    pub fn build(&self, nodes: &[AstNode]) -> Result<BuiltProgram, Error> {
        let nodes = extract_lambdas(nodes);
        let declarations = self.declare(&nodes)?;

        let entry = declarations
            .functions
            .find(&self.config.entry, FunctionKind::Normal, &[])
            .filter(|f| f.ret == Datatype::Void)
            .ok_or_else(|| Error::compile(format!("No {}-function provided", self.config.entry)))?;

        let mut built = IndexMap::new();
        let mut entries = vec![];

        let init = flatten_globals(&declarations.globals, &declarations.functions, &declarations.types)?;
        let globals = GlobalLayout::new(init.variables.values())?;
        if init.code.instructions.len() > 1 {
            let function = build_function(&init, &self.builtins).map_err(|e| e.in_function(&init.definition))?;
            entries.push(function.signature());
            built.insert(function.signature(), function);
        }
        entries.push(entry.signature());

        for (definition, node) in &declarations.sources {
            let AstNode::Function(function) = node else {
                continue;
            };
            let function = flatten_function(
                function,
                definition,
                &declarations.functions,
                &declarations.types,
                &init.variables,
            )
            .and_then(|content| build_function(&content, &self.builtins))
            .map_err(|e| e.in_function(definition))?;
            built.insert(function.signature(), function);
        }
        for function in self.builtins.build(&self.set)? {
            built.insert(function.signature(), function);
        }
        Ok(BuiltProgram {
            entries,
            functions: built,
            globals,
        })
    }

    pub fn compile(&self, nodes: &[AstNode]) -> Result<Program, Error> {
        let program = self.build(nodes)?;
        link(
            &self.set,
            &program.functions,
            &program.entries,
            &program.globals,
            self.config.stack_start,
        )
    }
}

/// Run a program on a fresh emulator and collect its output.
pub fn run(program: &Program, max_cycles: u64) -> Result<Vec<u8>, Error> {
    let mut emulator = Emulator::default();
    emulator.load(&program.code)?;
    emulator.run(max_cycles)?;
    Ok(emulator.output().to_vec())
}
