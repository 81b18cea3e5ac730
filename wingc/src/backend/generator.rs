use super::actions::Action;
use crate::error::Error;
use arch::{Code, Reference};
use indexmap::IndexMap;

/// Collects the code of one function. References made through
/// [`CodeGenerator::reference`] are scoped to that function.
#[derive(Debug)]
pub struct CodeGenerator {
    scope: String,
    codes: Vec<Code>,
    labels: IndexMap<String, usize>,
}

impl CodeGenerator {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            codes: vec![],
            labels: IndexMap::new(),
        }
    }

    pub fn reference(&self, label: &str) -> Reference {
        Reference::new(&self.scope, label)
    }

    pub fn generate(&mut self, code: Code) {
        self.codes.push(code);
    }

    pub fn emit(&mut self, action: &dyn Action) {
        action.compile(self);
    }

    /// Mark the position of the next generated code.
    pub fn label(&mut self, name: &str) -> Result<(), Error> {
        if self.labels.contains_key(name) {
            return Err(Error::compile(format!("Label {name} defined twice in {}", self.scope)));
        }
        self.labels.insert(name.to_string(), self.codes.len());
        Ok(())
    }

    pub fn finish(self) -> (Vec<Code>, IndexMap<String, usize>) {
        (self.codes, self.labels)
    }
}
