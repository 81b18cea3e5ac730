use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Normal,
    Operator,
    Instance,
}

/// Type as written in the source: `[new] [*] name [ [] ]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDefinition {
    pub name: String,
    pub pointer: bool,
    pub array: bool,
    pub explicit_new: bool,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pointer: false,
            array: false,
            explicit_new: false,
        }
    }

    pub fn pointer(mut self) -> Self {
        self.pointer = true;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.explicit_new {
            write!(f, "new ")?;
        }
        if self.pointer {
            write!(f, "*")?;
        }
        write!(f, "{}", self.name)?;
        if self.array {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionNode {
    pub name: String,
    pub kind: FunctionKind,
    pub params: Vec<Parameter>,
    pub ret: Option<TypeDefinition>,
    pub body: Vec<AstNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Body(Vec<AstNode>),
    Identifier(String),
    Constant(i32),
    Text(String),
    Call {
        target: String,
        kind: FunctionKind,
        args: Vec<AstNode>,
    },
    Function(FunctionNode),
    Struct {
        name: String,
        members: Vec<Parameter>,
    },
    If {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        else_body: Vec<AstNode>,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
    },
    Return(Option<Box<AstNode>>),
    Assign {
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
    /// Declaration with an explicit type, or with a value to take the type from
    NewVariable {
        name: String,
        ty: Option<TypeDefinition>,
        hint: Option<Box<AstNode>>,
    },
    MemberAccess {
        target: Box<AstNode>,
        member: String,
    },
    /// `ptr->member`
    MemberDeref {
        target: Box<AstNode>,
        member: String,
    },
    ArrayAccess {
        target: Box<AstNode>,
        index: Box<AstNode>,
    },
    Array(Vec<AstNode>),
    AddressOf(Box<AstNode>),
    Deref(Box<AstNode>),
    Break,
    FunctionReference(String),
    Lambda(FunctionNode),
    Import(String),
}

impl AstNode {
    pub fn ident(name: impl Into<String>) -> Self {
        AstNode::Identifier(name.into())
    }

    pub fn call(target: impl Into<String>, kind: FunctionKind, args: Vec<AstNode>) -> Self {
        AstNode::Call {
            target: target.into(),
            kind,
            args,
        }
    }

    pub fn assign(target: AstNode, value: AstNode) -> Self {
        AstNode::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&AstNode> {
        match self {
            AstNode::Body(nodes) | AstNode::Array(nodes) => nodes.iter().collect(),
            AstNode::Call { args, .. } => args.iter().collect(),
            AstNode::Function(func) | AstNode::Lambda(func) => func.body.iter().collect(),
            AstNode::If {
                condition,
                body,
                else_body,
            } => std::iter::once(condition.as_ref())
                .chain(body)
                .chain(else_body)
                .collect(),
            AstNode::While { condition, body } => {
                std::iter::once(condition.as_ref()).chain(body).collect()
            }
            AstNode::Return(value) => value.iter().map(|v| v.as_ref()).collect(),
            AstNode::Assign { target, value } => vec![target.as_ref(), value.as_ref()],
            AstNode::NewVariable { hint, .. } => hint.iter().map(|v| v.as_ref()).collect(),
            AstNode::MemberAccess { target, .. }
            | AstNode::MemberDeref { target, .. }
            | AstNode::AddressOf(target)
            | AstNode::Deref(target) => vec![target.as_ref()],
            AstNode::ArrayAccess { target, index } => vec![target.as_ref(), index.as_ref()],
            AstNode::Identifier(_)
            | AstNode::Constant(_)
            | AstNode::Text(_)
            | AstNode::Struct { .. }
            | AstNode::Break
            | AstNode::FunctionReference(_)
            | AstNode::Import(_) => vec![],
        }
    }

    /// Copy of the tree where every node for which `f` returns a value is
    /// replaced by it. Replacements are not visited again.
    pub fn replace<F>(&self, f: &mut F) -> AstNode
    where
        F: FnMut(&AstNode) -> Option<AstNode>,
    {
        if let Some(node) = f(self) {
            return node;
        }
        fn one<F>(node: &AstNode, f: &mut F) -> Box<AstNode>
        where
            F: FnMut(&AstNode) -> Option<AstNode>,
        {
            Box::new(node.replace(f))
        }
        fn many<F>(nodes: &[AstNode], f: &mut F) -> Vec<AstNode>
        where
            F: FnMut(&AstNode) -> Option<AstNode>,
        {
            nodes.iter().map(|n| n.replace(f)).collect()
        }
        match self {
            AstNode::Body(nodes) => AstNode::Body(many(nodes, f)),
            AstNode::Array(nodes) => AstNode::Array(many(nodes, f)),
            AstNode::Call { target, kind, args } => AstNode::Call {
                target: target.clone(),
                kind: *kind,
                args: many(args, f),
            },
            AstNode::Function(func) => AstNode::Function(FunctionNode {
                body: many(&func.body, f),
                ..func.clone()
            }),
            AstNode::Lambda(func) => AstNode::Lambda(FunctionNode {
                body: many(&func.body, f),
                ..func.clone()
            }),
            AstNode::If {
                condition,
                body,
                else_body,
            } => AstNode::If {
                condition: one(condition, f),
                body: many(body, f),
                else_body: many(else_body, f),
            },
            AstNode::While { condition, body } => AstNode::While {
                condition: one(condition, f),
                body: many(body, f),
            },
            AstNode::Return(value) => AstNode::Return(value.as_ref().map(|v| one(v, f))),
            AstNode::Assign { target, value } => AstNode::Assign {
                target: one(target, f),
                value: one(value, f),
            },
            AstNode::NewVariable { name, ty, hint } => AstNode::NewVariable {
                name: name.clone(),
                ty: ty.clone(),
                hint: hint.as_ref().map(|v| one(v, f)),
            },
            AstNode::MemberAccess { target, member } => AstNode::MemberAccess {
                target: one(target, f),
                member: member.clone(),
            },
            AstNode::MemberDeref { target, member } => AstNode::MemberDeref {
                target: one(target, f),
                member: member.clone(),
            },
            AstNode::ArrayAccess { target, index } => AstNode::ArrayAccess {
                target: one(target, f),
                index: one(index, f),
            },
            AstNode::AddressOf(target) => AstNode::AddressOf(one(target, f)),
            AstNode::Deref(target) => AstNode::Deref(one(target, f)),
            leaf => leaf.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_constants() {
        let node = AstNode::call(
            "add",
            FunctionKind::Operator,
            vec![AstNode::Constant(1), AstNode::ident("a")],
        );
        let replaced = node.replace(&mut |n| match n {
            AstNode::Constant(v) => Some(AstNode::Constant(v * 10)),
            _ => None,
        });
        assert_eq!(
            replaced,
            AstNode::call(
                "add",
                FunctionKind::Operator,
                vec![AstNode::Constant(10), AstNode::ident("a")],
            )
        );
        // Original is untouched
        assert_ne!(node, replaced);
        assert_eq!(replaced.children().len(), 2);
    }
}
