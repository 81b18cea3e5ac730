use crate::error::Error;
use crate::grammer::ast::{Parameter, TypeDefinition};
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datatype {
    Void,
    Integer,
    Boolean,
    Composite {
        name: String,
        fields: Vec<(String, Datatype)>,
    },
    /// Sized at runtime: a size cell followed by the items
    Array(Box<Datatype>),
    Pointer(Box<Datatype>),
}

impl Datatype {
    pub fn pointer(to: Datatype) -> Self {
        Datatype::Pointer(Box::new(to))
    }

    pub fn array(of: Datatype) -> Self {
        Datatype::Array(Box::new(of))
    }

    /// `*int[]`
    pub fn string() -> Self {
        Datatype::pointer(Datatype::array(Datatype::Integer))
    }

    /// Size in bytes, `None` for types only reachable through a pointer
    pub fn size(&self) -> Option<usize> {
        match self {
            Datatype::Void => Some(0),
            Datatype::Integer | Datatype::Boolean | Datatype::Pointer(_) => Some(1),
            Datatype::Composite { fields, .. } => fields.iter().map(|(_, ty)| ty.size()).sum(),
            Datatype::Array(_) => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Datatype::Integer | Datatype::Boolean | Datatype::Pointer(_))
    }

    /// Offset and type of a field of a composite
    pub fn field(&self, member: &str) -> Option<(usize, &Datatype)> {
        let Datatype::Composite { fields, .. } = self else {
            return None;
        };
        let mut offset = 0;
        for (name, ty) in fields {
            if name == member {
                return Some((offset, ty));
            }
            offset += ty.size()?;
        }
        None
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datatype::Void => write!(f, "void"),
            Datatype::Integer => write!(f, "int"),
            Datatype::Boolean => write!(f, "bool"),
            Datatype::Composite { name, .. } => write!(f, "{name}"),
            Datatype::Array(item) => write!(f, "{item}[]"),
            Datatype::Pointer(to) => write!(f, "*{to}"),
        }
    }
}

/// Named types known to a compilation
#[derive(Debug, Clone)]
pub struct TypeProvider {
    types: IndexMap<String, Datatype>,
}

impl Default for TypeProvider {
    fn default() -> Self {
        let types = [
            ("void", Datatype::Void),
            ("int", Datatype::Integer),
            ("byte", Datatype::Integer),
            ("bool", Datatype::Boolean),
        ]
        .into_iter()
        .map(|(name, ty)| (name.to_string(), ty))
        .collect();
        Self { types }
    }
}

impl TypeProvider {
    pub fn get(&self, name: &str) -> Option<&Datatype> {
        self.types.get(name)
    }

    /// Resolve a written type
    pub fn resolve(&self, def: &TypeDefinition) -> Result<Datatype, Error> {
        let mut ty = self
            .get(&def.name)
            .cloned()
            .ok_or_else(|| Error::compile(format!("Unknown type: {}", def.name)))?;
        if def.explicit_new && ty.is_primitive() {
            return Err(Error::compile(format!(
                "Explicit new not allowed for primitive type {}",
                def.name
            )));
        }
        if def.array {
            ty = Datatype::array(ty);
        }
        if def.pointer {
            ty = Datatype::pointer(ty);
        }
        Ok(ty)
    }

    /// Register a struct. Members may only use types defined before it.
    pub fn add_struct(&mut self, name: &str, members: &[Parameter]) -> Result<Datatype, Error> {
        if self.types.contains_key(name) {
            return Err(Error::compile(format!("Type {name} is already defined")));
        }
        let mut fields: Vec<(String, Datatype)> = Vec::new();
        for member in members {
            if fields.iter().any(|(field, _)| field == &member.name) {
                return Err(Error::compile(format!("Duplicate field: {}", member.name)));
            }
            let ty = self.resolve(&member.ty)?;
            if ty.size().is_none() {
                return Err(Error::compile(format!(
                    "Field {} of type {ty} must be used through a pointer",
                    member.name
                )));
            }
            fields.push((member.name.clone(), ty));
        }
        let ty = Datatype::Composite {
            name: name.to_string(),
            fields,
        };
        self.types.insert(name.to_string(), ty.clone());
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, ty: TypeDefinition) -> Parameter {
        Parameter {
            name: name.into(),
            ty,
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(Datatype::Void.size(), Some(0));
        assert_eq!(Datatype::string().size(), Some(1));
        assert_eq!(Datatype::array(Datatype::Integer).size(), None);
        assert_eq!(Datatype::string().to_string(), "*int[]");
    }

    #[test]
    fn nested_struct() {
        let mut types = TypeProvider::default();
        types
            .add_struct(
                "children",
                &[
                    member("child1", TypeDefinition::new("int")),
                    member("child2", TypeDefinition::new("int")),
                ],
            )
            .unwrap();
        let parent = types
            .add_struct(
                "parent",
                &[
                    member("parent1", TypeDefinition::new("int")),
                    member("child", TypeDefinition::new("children")),
                ],
            )
            .unwrap();
        assert_eq!(parent.size(), Some(3));
        let (offset, child) = parent.field("child").unwrap();
        assert_eq!(offset, 1);
        assert_eq!(child.field("child2").map(|(o, _)| o), Some(1));
    }

    #[test]
    fn errors() {
        let mut types = TypeProvider::default();
        assert!(types.resolve(&TypeDefinition::new("nothing")).is_err());
        let mut new_int = TypeDefinition::new("int");
        new_int.explicit_new = true;
        assert!(types.resolve(&new_int).is_err());
        assert!(types
            .add_struct(
                "s",
                &[
                    member("a", TypeDefinition::new("int")),
                    member("a", TypeDefinition::new("int")),
                ],
            )
            .is_err());
    }
}
