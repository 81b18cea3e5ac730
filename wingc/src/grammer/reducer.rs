use super::ast::{AstNode, FunctionKind, FunctionNode};
use super::token::{Token, TokenKind};
use crate::error::Error;

// Names of the operator functions the reducer produces
pub const ADD: &str = "add";
pub const SUB: &str = "sub";
pub const NEGATE: &str = "negate";
pub const LESS_THAN: &str = "lt";
pub const GREATER_THAN: &str = "gt";
pub const EQUAL: &str = "eq";
pub const NOT_EQUAL: &str = "ne";
pub const ARRAY_READ: &str = "arrayread";
pub const ARRAY_WRITE: &str = "arraywrite";

/// Item of the list being reduced
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Token(Token),
    Node(AstNode),
    Parenthesis(Vec<AstNode>),
    Brackets(Vec<AstNode>),
    Braces(Vec<AstNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    AnyNode,
    Identifier,
    Call,
    Token(TokenKind),
    Parenthesis,
    Brackets,
    Braces,
}

impl Matcher {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Matcher::AnyNode, Value::Node(_)) => true,
            (Matcher::Identifier, Value::Node(AstNode::Identifier(_))) => true,
            (Matcher::Call, Value::Node(AstNode::Call { .. })) => true,
            (Matcher::Token(kind), Value::Token(token)) => &token.kind == kind,
            (Matcher::Parenthesis, Value::Parenthesis(_)) => true,
            (Matcher::Brackets, Value::Brackets(_)) => true,
            (Matcher::Braces, Value::Braces(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,
}

impl BinaryOp {
    pub fn token(&self) -> TokenKind {
        match self {
            BinaryOp::Add => TokenKind::Plus,
            BinaryOp::LessThan => TokenKind::LAngle,
            BinaryOp::GreaterThan => TokenKind::RAngle,
            BinaryOp::Equal => TokenKind::EqualEqual,
            BinaryOp::NotEqual => TokenKind::ExclEqual,
        }
    }

    pub fn function(&self) -> &'static str {
        match self {
            BinaryOp::Add => ADD,
            BinaryOp::LessThan => LESS_THAN,
            BinaryOp::GreaterThan => GREATER_THAN,
            BinaryOp::Equal => EQUAL,
            BinaryOp::NotEqual => NOT_EQUAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `ident (args)`
    FunctionCall,
    /// `node . call(args)`
    InstanceFunction,
    /// `node . ident`
    MemberAccess,
    /// `node -> ident`
    MemberDeref,
    /// `node [index]`
    ArrayAccess,
    AddressOf,
    Deref,
    Negate,
    /// `node negate(x)` is really `node - x`
    Subtraction,
    Binary(BinaryOp),
    BracketsToArray,
    /// `{ statements }`
    BracesToLambda,
    ExtractSingle,
}

impl RuleKind {
    pub fn matchers(&self) -> Vec<Matcher> {
        use Matcher::*;
        match self {
            RuleKind::FunctionCall => vec![Identifier, Parenthesis],
            RuleKind::InstanceFunction => vec![AnyNode, Token(TokenKind::Period), Call],
            RuleKind::MemberAccess => vec![AnyNode, Token(TokenKind::Period), Identifier],
            RuleKind::MemberDeref => vec![AnyNode, Token(TokenKind::Arrow), Identifier],
            RuleKind::ArrayAccess => vec![AnyNode, Brackets],
            RuleKind::AddressOf => vec![Token(TokenKind::Ampasand), AnyNode],
            RuleKind::Deref => vec![Token(TokenKind::Star), AnyNode],
            RuleKind::Negate => vec![Token(TokenKind::Minus), AnyNode],
            RuleKind::Subtraction => vec![AnyNode, Call],
            RuleKind::Binary(op) => vec![AnyNode, Token(op.token()), AnyNode],
            RuleKind::BracketsToArray => vec![Brackets],
            RuleKind::BracesToLambda => vec![Braces],
            RuleKind::ExtractSingle => vec![Parenthesis],
        }
    }

    /// Reduce a window the matchers accepted. `None` declines the match.
    fn reduce(&self, values: &[Value]) -> Option<AstNode> {
        let node = |i: usize| match values.get(i) {
            Some(Value::Node(node)) => Some(node.clone()),
            _ => None,
        };
        let items = |i: usize| match values.get(i) {
            Some(Value::Parenthesis(items))
            | Some(Value::Brackets(items))
            | Some(Value::Braces(items)) => Some(items.clone()),
            _ => None,
        };
        let boxed = |i: usize| node(i).map(Box::new);

        match self {
            RuleKind::FunctionCall => match node(0)? {
                AstNode::Identifier(name) => {
                    Some(AstNode::call(name, FunctionKind::Normal, items(1)?))
                }
                _ => None,
            },
            RuleKind::InstanceFunction => match node(2)? {
                AstNode::Call {
                    target,
                    kind: FunctionKind::Normal,
                    args,
                } => {
                    let args = std::iter::once(node(0)?).chain(args).collect();
                    Some(AstNode::call(target, FunctionKind::Instance, args))
                }
                _ => None,
            },
            RuleKind::MemberAccess | RuleKind::MemberDeref => {
                let AstNode::Identifier(member) = node(2)? else {
                    return None;
                };
                let target = boxed(0)?;
                Some(match self {
                    RuleKind::MemberAccess => AstNode::MemberAccess { target, member },
                    _ => AstNode::MemberDeref { target, member },
                })
            }
            RuleKind::ArrayAccess => {
                let mut index = items(1)?;
                if index.len() != 1 {
                    return None;
                }
                Some(AstNode::ArrayAccess {
                    target: boxed(0)?,
                    index: Box::new(index.remove(0)),
                })
            }
            RuleKind::AddressOf => Some(AstNode::AddressOf(boxed(1)?)),
            RuleKind::Deref => Some(AstNode::Deref(boxed(1)?)),
            RuleKind::Negate => Some(AstNode::call(NEGATE, FunctionKind::Operator, vec![node(1)?])),
            RuleKind::Subtraction => match node(1)? {
                AstNode::Call {
                    target,
                    kind: FunctionKind::Operator,
                    mut args,
                } if target == NEGATE && args.len() == 1 => Some(AstNode::call(
                    SUB,
                    FunctionKind::Operator,
                    vec![node(0)?, args.remove(0)],
                )),
                _ => None,
            },
            RuleKind::Binary(op) => Some(AstNode::call(
                op.function(),
                FunctionKind::Operator,
                vec![node(0)?, node(2)?],
            )),
            RuleKind::BracketsToArray => Some(AstNode::Array(items(0)?)),
            RuleKind::BracesToLambda => Some(AstNode::Lambda(FunctionNode {
                name: String::new(),
                kind: FunctionKind::Normal,
                params: vec![],
                ret: None,
                body: items(0)?,
            })),
            RuleKind::ExtractSingle => {
                let mut items = items(0)?;
                (items.len() == 1).then(|| items.remove(0))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub kind: RuleKind,
    pub priority: i32,
}

impl Rule {
    pub fn new(kind: RuleKind, priority: i32) -> Self {
        Self { kind, priority }
    }
}

/// Reduction rules, highest priority first
#[derive(Debug, Clone)]
pub struct Rules(Vec<Rule>);

impl Rules {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| -rule.priority);
        Self(rules)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.0.iter()
    }

    /// Apply one reduction. Within one priority level the leftmost match wins.
    fn reduce_once(&self, values: &mut Vec<Value>) -> bool {
        for level in self.0.chunk_by(|a, b| a.priority == b.priority) {
            for start in 0..values.len() {
                for rule in level {
                    let matchers = rule.kind.matchers();
                    let end = start + matchers.len();
                    if end > values.len() {
                        continue;
                    }
                    let window = &values[start..end];
                    if !matchers.iter().zip(window).all(|(m, v)| m.matches(v)) {
                        continue;
                    }
                    if let Some(node) = rule.kind.reduce(window) {
                        values.splice(start..end, [Value::Node(node)]);
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn apply(&self, mut values: Vec<Value>) -> Result<AstNode, Error> {
        loop {
            if let [Value::Node(_)] = values.as_slice() {
                break;
            }
            if !self.reduce_once(&mut values) {
                let token = values.iter().find_map(|v| match v {
                    Value::Token(token) => Some(token.clone()),
                    _ => None,
                });
                return Err(Error::Parse {
                    message: "Could not parse expression".into(),
                    token,
                });
            }
        }
        match values.pop() {
            Some(Value::Node(node)) => Ok(node),
            _ => Err(Error::Parse {
                message: "Empty expression".into(),
                token: None,
            }),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        use RuleKind::*;
        Rules::new(vec![
            Rule::new(FunctionCall, 48),
            Rule::new(InstanceFunction, 40),
            Rule::new(MemberAccess, 40),
            Rule::new(MemberDeref, 40),
            Rule::new(ArrayAccess, 35),
            Rule::new(AddressOf, 30),
            Rule::new(Deref, 30),
            Rule::new(Negate, 29),
            Rule::new(Subtraction, 28),
            Rule::new(Binary(BinaryOp::Add), 28),
            Rule::new(Binary(BinaryOp::LessThan), 10),
            Rule::new(Binary(BinaryOp::GreaterThan), 10),
            Rule::new(Binary(BinaryOp::Equal), 10),
            Rule::new(Binary(BinaryOp::NotEqual), 10),
            Rule::new(BracketsToArray, 0),
            Rule::new(BracesToLambda, 0),
            Rule::new(ExtractSingle, 0),
        ])
    }
}

// ----------------------------------------------------------------------------
// Blocks

/// Collect values until a value `stop` accepts, turning `( .. )` and `[ .. ]`
/// into blocks of reduced items. Returns the values and the stop index.
fn scan(
    values: &[Value],
    stop: &dyn Fn(&Value) -> bool,
    rules: &Rules,
) -> Result<(Vec<Value>, usize), Error> {
    let mut result = vec![];
    let mut index = 0;
    while index < values.len() {
        let value = &values[index];
        if stop(value) {
            return Ok((result, index));
        }
        index += 1;

        let closing = match value {
            Value::Token(Token {
                kind: TokenKind::LParen,
                ..
            }) => TokenKind::RParen,
            Value::Token(Token {
                kind: TokenKind::LBracket,
                ..
            }) => TokenKind::RBracket,
            Value::Token(Token {
                kind: TokenKind::LBrace,
                ..
            }) => TokenKind::RBrace,
            other => {
                result.push(other.clone());
                continue;
            }
        };

        let (items, consumed) = parse_block(&values[index..], value, &closing, rules)?;
        index += consumed;
        result.push(match closing {
            TokenKind::RParen => Value::Parenthesis(items),
            TokenKind::RBracket => Value::Brackets(items),
            _ => Value::Braces(items),
        });
    }
    Ok((result, index))
}

/// Comma separated items up to `closing`. Returns the items and the number of
/// values consumed including the closing token.
fn parse_block(
    values: &[Value],
    opening: &Value,
    closing: &TokenKind,
    rules: &Rules,
) -> Result<(Vec<AstNode>, usize), Error> {
    let is_delimiter = |v: &Value| match v {
        Value::Token(token) => &token.kind == closing || token.kind == TokenKind::Comma,
        _ => false,
    };
    let mut items = vec![];
    let mut index = 0;
    loop {
        let (inner, consumed) = scan(&values[index..], &is_delimiter, rules)?;
        index += consumed;
        let Some(Value::Token(delimiter)) = values.get(index) else {
            return Err(Error::Parse {
                message: "Block not closed".into(),
                token: match opening {
                    Value::Token(token) => Some(token.clone()),
                    _ => None,
                },
            });
        };
        index += 1;
        if &delimiter.kind == closing {
            match (inner.is_empty(), items.is_empty()) {
                (false, _) => items.push(rules.apply(inner)?),
                // `f()` is fine, `f(5,)` is not
                (true, false) => {
                    return Err(Error::Parse {
                        message: "Missing item after comma".into(),
                        token: Some(delimiter.clone()),
                    })
                }
                (true, true) => {}
            }
            return Ok((items, index));
        }
        if inner.is_empty() {
            return Err(Error::Parse {
                message: "Missing item before comma".into(),
                token: Some(delimiter.clone()),
            });
        }
        items.push(rules.apply(inner)?);
    }
}

/// Reduce a run of tokens to a single node.
pub fn parse_expression(tokens: &[Token], rules: &Rules) -> Result<AstNode, Error> {
    let count = |kind: TokenKind| tokens.iter().filter(|t| t.kind == kind).count();
    if count(TokenKind::LParen) != count(TokenKind::RParen) {
        return Err(Error::Parse {
            message: "Mismatched parenthesis".into(),
            token: tokens.first().cloned(),
        });
    }
    if count(TokenKind::LBracket) != count(TokenKind::RBracket) {
        return Err(Error::Parse {
            message: "Mismatched brackets".into(),
            token: tokens.first().cloned(),
        });
    }
    if count(TokenKind::LBrace) != count(TokenKind::RBrace) {
        return Err(Error::Parse {
            message: "Mismatched braces".into(),
            token: tokens.first().cloned(),
        });
    }

    let values: Vec<Value> = tokens
        .iter()
        .map(|token| match &token.kind {
            TokenKind::Number(value) => Value::Node(AstNode::Constant(*value)),
            TokenKind::Ident(name) => Value::Node(AstNode::ident(name)),
            TokenKind::Text(text) => Value::Node(AstNode::Text(text.clone())),
            _ => Value::Token(token.clone()),
        })
        .collect();
    if values.is_empty() {
        return Err(Error::Parse {
            message: "Expected an expression".into(),
            token: None,
        });
    }

    let (values, _) = scan(&values, &|_: &Value| false, rules)?;
    rules.apply(values)
}
