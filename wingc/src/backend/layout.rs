use crate::error::Error;
use crate::frontend::flatten::{FunctionContent, Variable, VariableKind, RETURN_VALUE_NAME};
use crate::frontend::definition::FunctionDefinition;
use crate::frontend::types::Datatype;
use indexmap::IndexMap;

/// Saved FP and saved PC, written by `CALL`
pub const META_SIZE: usize = 2;
const META_NAME: &str = "meta";
/// Reference scope of global variables. Labels are variable names.
pub const GLOBALS: &str = "globals";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDataField {
    pub name: String,
    pub ty: Datatype,
    /// Relative to FP
    pub offset: i32,
    pub size: usize,
}

/// Placement of everything a function addresses through FP.
///
/// ```text
///   high  result
///         parameters (first one highest)
///   FP -> saved FP, saved PC
///   low   locals
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    pub fields: IndexMap<String, StructDataField>,
    pub size: usize,
    pub size_of_parameters: usize,
    pub size_of_meta: usize,
    pub size_of_vars: usize,
    pub size_of_return: usize,
}

impl FrameLayout {
    pub fn field(&self, name: &str) -> Result<&StructDataField, Error> {
        self.fields
            .get(name)
            .ok_or_else(|| Error::compile(format!("Variable {name} has no place in the frame")))
    }

    pub fn for_content(content: &FunctionContent) -> Result<Self, Error> {
        let locals: Vec<(String, Datatype)> = content
            .variables_of(VariableKind::Local)
            .map(|v| (v.name.clone(), v.ty.clone()))
            .collect();
        calculate_frame_layout(&content.definition, &locals)
    }
}

/// Globals packed in declaration order, right behind the program code
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalLayout {
    /// Offsets are relative to the start of the region
    pub fields: IndexMap<String, StructDataField>,
    pub size: usize,
}

impl GlobalLayout {
    pub fn new<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Result<Self, Error> {
        let mut layout = Self::default();
        for variable in variables {
            let size = size_of(&variable.name, &variable.ty)?;
            layout.fields.insert(
                variable.name.clone(),
                StructDataField {
                    name: variable.name.clone(),
                    ty: variable.ty.clone(),
                    offset: layout.size as i32,
                    size,
                },
            );
            layout.size += size;
        }
        Ok(layout)
    }
}

fn size_of(name: &str, ty: &Datatype) -> Result<usize, Error> {
    ty.size()
        .ok_or_else(|| Error::compile(format!("{name} of type {ty} has no fixed size")))
}

/// `locals` in first-occurrence order. A repeated name must repeat its type
/// and shares the first slot.
pub fn calculate_frame_layout(
    definition: &FunctionDefinition,
    locals: &[(String, Datatype)],
) -> Result<FrameLayout, Error> {
    // (name, type, size), from the top of the frame down
    let mut entries: Vec<(String, Datatype, usize)> = vec![];

    let size_of_return = size_of(RETURN_VALUE_NAME, &definition.ret)?;
    if size_of_return > 0 {
        entries.push((RETURN_VALUE_NAME.to_string(), definition.ret.clone(), size_of_return));
    }

    let mut size_of_parameters = 0;
    for (name, ty) in &definition.params {
        let size = size_of(name, ty)?;
        size_of_parameters += size;
        entries.push((name.clone(), ty.clone(), size));
    }

    entries.push((META_NAME.to_string(), Datatype::Void, META_SIZE));

    let mut size_of_vars = 0;
    for (name, ty) in locals {
        if let Some((_, existing, _)) = entries.iter().find(|(n, _, _)| n == name) {
            if existing != ty {
                return Err(Error::compile(format!(
                    "Variable {name} redeclared as {ty}, was {existing}"
                )));
            }
            continue;
        }
        let size = size_of(name, ty)?;
        size_of_vars += size;
        entries.push((name.clone(), ty.clone(), size));
    }

    let size = size_of_return + size_of_parameters + META_SIZE + size_of_vars;

    let mut fields = IndexMap::new();
    let mut from_top = 0;
    for (name, ty, field_size) in entries {
        let from_bottom = size - field_size - from_top;
        from_top += field_size;
        let offset = from_bottom as i32 - size_of_vars as i32;
        fields.insert(
            name.clone(),
            StructDataField {
                name,
                ty,
                offset,
                size: field_size,
            },
        );
    }

    Ok(FrameLayout {
        fields,
        size,
        size_of_parameters,
        size_of_meta: META_SIZE,
        size_of_vars,
        size_of_return,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::definition::SignatureBuilder;

    #[test]
    fn golden() {
        let definition = SignatureBuilder::new("test1")
            .param("param", Datatype::Integer)
            .ret(Datatype::Integer)
            .build();
        let layout =
            calculate_frame_layout(&definition, &[("var".into(), Datatype::Integer)]).unwrap();
        assert_eq!(layout.size, 5);
        assert_eq!(layout.size_of_vars, 1);
        assert_eq!(layout.field("var").unwrap().offset, -1);
        assert_eq!(layout.field("meta").unwrap().offset, 0);
        assert_eq!(layout.field("param").unwrap().offset, 2);
        assert_eq!(layout.field("result").unwrap().offset, 3);
    }

    #[test]
    fn parameters_in_push_order() {
        let definition = SignatureBuilder::new("add")
            .param("a", Datatype::Integer)
            .param("b", Datatype::Integer)
            .ret(Datatype::Integer)
            .build();
        let layout = calculate_frame_layout(&definition, &[]).unwrap();
        let offset = |name| layout.field(name).unwrap().offset;
        assert_eq!((offset("b"), offset("a"), offset("result")), (2, 3, 4));
        assert_eq!(layout.size_of_vars, 0);
    }

    #[test]
    fn globals_in_order() {
        let variable = |name: &str, ty: Datatype| Variable {
            name: name.into(),
            ty,
            kind: VariableKind::Global,
        };
        let pair = Datatype::Composite {
            name: "pair".into(),
            fields: vec![("a".into(), Datatype::Integer), ("b".into(), Datatype::Integer)],
        };
        let globals = [variable("i", Datatype::Integer), variable("p", pair)];
        let layout = GlobalLayout::new(&globals).unwrap();
        assert_eq!(layout.size, 3);
        assert_eq!(layout.fields["i"].offset, 0);
        assert_eq!(layout.fields["p"].offset, 1);
    }

    #[test]
    fn composite_locals() {
        let point = Datatype::Composite {
            name: "point".into(),
            fields: vec![("x".into(), Datatype::Integer), ("y".into(), Datatype::Integer)],
        };
        let definition = SignatureBuilder::new("main").build();
        let locals = [
            ("p".to_string(), point.clone()),
            ("i".to_string(), Datatype::Integer),
            ("p".to_string(), point),
        ];
        let layout = calculate_frame_layout(&definition, &locals).unwrap();
        assert_eq!(layout.size_of_vars, 3);
        assert_eq!(layout.field("p").unwrap().offset, -2);
        assert_eq!(layout.field("i").unwrap().offset, -3);

        let clash = [
            ("i".to_string(), Datatype::Integer),
            ("i".to_string(), Datatype::Boolean),
        ];
        assert!(calculate_frame_layout(&definition, &clash).is_err());
    }
}
