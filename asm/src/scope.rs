use indexmap::IndexMap;

use crate::error::Error;

/// Symbols of one `scope` ... `endscope` block.
#[derive(Debug, Default)]
pub struct Scope {
    pub variables: IndexMap<String, i32>,
    /// Label name to code index. Collected ahead so labels can be used
    /// before their definition.
    pub labels: IndexMap<String, usize>,
}

/// Symbol lookup result
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(i32),
    /// Unique name of a label
    Label(String),
}

/// Stack of open scopes. Ids are handed out in the order the scopes open,
/// the outermost scope is 0.
#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<Scope>,
    stack: Vec<usize>,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            stack: vec![0],
        }
    }

    pub fn open(&mut self) -> usize {
        let id = self.scopes.len();
        self.scopes.push(Scope::default());
        self.stack.push(id);
        id
    }

    /// Re-enter a scope created by an earlier pass.
    pub fn enter(&mut self, id: usize) {
        self.stack.push(id);
    }

    pub fn close(&mut self) -> Result<(), Error> {
        if self.stack.len() <= 1 {
            return Err(Error::ScopeUnderflow);
        }
        self.stack.pop();
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn current(&mut self) -> &mut Scope {
        let id = self.stack.last().copied().unwrap_or(0);
        &mut self.scopes[id]
    }

    pub fn define_label(&mut self, name: &str, index: usize) -> Result<(), Error> {
        match self.current().labels.insert(name.to_string(), index) {
            Some(_) => Err(Error::RedefinedLabel(name.to_string())),
            None => Ok(()),
        }
    }

    pub fn define_variable(&mut self, name: &str, value: i32) -> Result<(), Error> {
        let scope = self.current();
        if scope.variables.contains_key(name) {
            return Err(Error::ReassignedVariable(name.to_string()));
        }
        scope.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Drop the variables but keep the labels, ready for the next pass.
    pub fn rewind(&mut self) {
        for scope in &mut self.scopes {
            scope.variables.clear();
        }
        self.stack.truncate(1);
    }

    /// Innermost scope first; variables shadow labels of the same scope.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.stack.iter().rev().find_map(|&id| {
            let scope = &self.scopes[id];
            if let Some(value) = scope.variables.get(name) {
                return Some(Symbol::Variable(*value));
            }
            scope
                .labels
                .contains_key(name)
                .then(|| Symbol::Label(unique_label(name, id)))
        })
    }

    /// Every label under its unique name
    pub fn labels(&self) -> IndexMap<String, usize> {
        self.scopes
            .iter()
            .enumerate()
            .flat_map(|(id, scope)| {
                scope
                    .labels
                    .iter()
                    .map(move |(name, index)| (unique_label(name, id), *index))
            })
            .collect()
    }
}

/// Labels of nested scopes are private: they get the scope id appended.
fn unique_label(name: &str, scope: usize) -> String {
    match scope {
        0 => name.to_string(),
        id => format!("{name}@{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing() {
        let mut scopes = Scopes::new();
        scopes.define_variable("x", 1).unwrap();
        scopes.define_label("end", 4).unwrap();
        scopes.open();
        scopes.define_variable("x", 2).unwrap();
        scopes.define_label("end", 2).unwrap();
        assert_eq!(scopes.lookup("x"), Some(Symbol::Variable(2)));
        assert_eq!(scopes.lookup("end"), Some(Symbol::Label("end@1".into())));
        scopes.close().unwrap();
        assert_eq!(scopes.lookup("x"), Some(Symbol::Variable(1)));
        assert_eq!(scopes.lookup("end"), Some(Symbol::Label("end".into())));
        assert_eq!(scopes.lookup("nothing"), None);
        assert!(scopes.close().is_err());
    }

    #[test]
    fn reassign() {
        let mut scopes = Scopes::new();
        scopes.define_variable("x", 1).unwrap();
        assert!(matches!(
            scopes.define_variable("x", 2),
            Err(Error::ReassignedVariable(_))
        ));
    }
}
