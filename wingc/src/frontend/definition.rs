use super::types::{Datatype, TypeProvider};
use crate::error::Error;
use crate::grammer::ast::{FunctionKind, FunctionNode};
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: String,
    pub params: Vec<(String, Datatype)>,
    pub ret: Datatype,
    pub kind: FunctionKind,
}

impl FunctionDefinition {
    pub fn from_node(node: &FunctionNode, types: &TypeProvider) -> Result<Self, Error> {
        let mut params = Vec::new();
        for param in &node.params {
            if param.ty.explicit_new {
                return Err(Error::compile("Explicit new not allowed for parameters"));
            }
            let ty = types.resolve(&param.ty)?;
            if ty.size().is_none() {
                return Err(Error::compile(format!(
                    "Parameter {} of type {ty} must be passed through a pointer",
                    param.name
                )));
            }
            params.push((param.name.clone(), ty));
        }
        let ret = match &node.ret {
            Some(def) => types.resolve(def)?,
            None => Datatype::Void,
        };
        Ok(Self {
            name: node.name.clone(),
            params,
            ret,
            kind: node.kind,
        })
    }

    pub fn param_types(&self) -> impl Iterator<Item = &Datatype> {
        self.params.iter().map(|(_, ty)| ty)
    }

    pub fn matches(&self, name: &str, kind: FunctionKind, types: &[Datatype]) -> bool {
        self.name == name && self.kind == kind && self.param_types().eq(types.iter())
    }

    pub fn has_return(&self) -> bool {
        self.ret != Datatype::Void
    }

    /// Unique text used as the scope of the function's references
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FunctionKind::Normal => write!(f, "{}({})", self.name, self.param_types().join(","))?,
            FunctionKind::Operator => {
                write!(f, "operator {}({})", self.name, self.param_types().join(","))?
            }
            FunctionKind::Instance => {
                let mut types = self.param_types();
                let receiver = types.next().map(|t| t.to_string()).unwrap_or_default();
                write!(f, "({receiver}){}({})", self.name, types.join(","))?
            }
        }
        if self.has_return() {
            write!(f, ":{}", self.ret)?;
        }
        Ok(())
    }
}

/// Builder for definitions not written in source
pub struct SignatureBuilder {
    definition: FunctionDefinition,
}

impl SignatureBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            definition: FunctionDefinition {
                name: name.to_string(),
                params: vec![],
                ret: Datatype::Void,
                kind: FunctionKind::Normal,
            },
        }
    }

    pub fn param(mut self, name: &str, ty: Datatype) -> Self {
        self.definition.params.push((name.to_string(), ty));
        self
    }

    pub fn ret(mut self, ty: Datatype) -> Self {
        self.definition.ret = ty;
        self
    }

    pub fn kind(mut self, kind: FunctionKind) -> Self {
        self.definition.kind = kind;
        self
    }

    pub fn build(self) -> FunctionDefinition {
        self.definition
    }
}

/// Every function a call can resolve to
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: Vec<FunctionDefinition>,
}

impl FunctionTable {
    pub fn add(&mut self, definition: FunctionDefinition) -> Result<(), Error> {
        let types: Vec<Datatype> = definition.param_types().cloned().collect();
        if self.find(&definition.name, definition.kind, &types).is_some() {
            return Err(Error::compile(format!("Function {definition} is already defined")));
        }
        self.functions.push(definition);
        Ok(())
    }

    pub fn find(&self, name: &str, kind: FunctionKind, types: &[Datatype]) -> Option<&FunctionDefinition> {
        self.functions.iter().find(|f| f.matches(name, kind, types))
    }

    pub fn resolve(&self, name: &str, kind: FunctionKind, types: &[Datatype]) -> Result<&FunctionDefinition, Error> {
        self.find(name, kind, types).ok_or_else(|| {
            Error::compile(format!(
                "No function matches {}({})",
                name,
                types.iter().join(",")
            ))
        })
    }
}
