use wingc::grammer::ast::{AstNode, FunctionKind, FunctionNode, Parameter, TypeDefinition};
use wingc::grammer::lexer::Lexer;
use wingc::grammer::parsercore::Parser;
use wingc::grammer::reducer::{parse_expression, Rules};
use wingc::grammer::token::TokenKind;
use wingc::Error;

fn expression(code: &str) -> Result<AstNode, Error> {
    let tokens: Vec<_> = Lexer::new(code)
        .parse()?
        .into_iter()
        .filter(|t| t.kind != TokenKind::EOL)
        .collect();
    parse_expression(&tokens, &Rules::default())
}

fn program(code: &str) -> Result<Vec<AstNode>, Error> {
    let rules = Rules::default();
    Parser::new(Lexer::new(code).parse()?, &rules).parse()
}

fn c(value: i32) -> AstNode {
    AstNode::Constant(value)
}

fn id(name: &str) -> AstNode {
    AstNode::ident(name)
}

fn op(name: &str, args: Vec<AstNode>) -> AstNode {
    AstNode::call(name, FunctionKind::Operator, args)
}

fn call(name: &str, args: Vec<AstNode>) -> AstNode {
    AstNode::call(name, FunctionKind::Normal, args)
}

macro_rules! case {
    ($name:ident, $code:expr, $expect:expr) => {
        #[test]
        fn $name() {
            let node = expression($code).unwrap();
            println!("{:?}", node);
            assert_eq!(node, $expect);
        }
    };
}

case!(left_associative, "5+6+7", op("add", vec![op("add", vec![c(5), c(6)]), c(7)]));
case!(
    comparison_binds_loosest,
    "5+6!=7+8",
    op("ne", vec![op("add", vec![c(5), c(6)]), op("add", vec![c(7), c(8)])])
);
case!(single_parenthesis, "(5)", c(5));
case!(
    parenthesized_sums,
    "(5+10)+(3+3)",
    op("add", vec![op("add", vec![c(5), c(10)]), op("add", vec![c(3), c(3)])])
);
case!(no_arguments, "hello()", call("hello", vec![]));
case!(two_arguments, "hello(5,6)", call("hello", vec![c(5), c(6)]));
case!(
    instance_call,
    "a.foo(b)",
    AstNode::call("foo", FunctionKind::Instance, vec![id("a"), id("b")])
);
case!(subtraction, "5-3", op("sub", vec![c(5), c(3)]));
case!(negation, "-3", op("negate", vec![c(3)]));
case!(
    subtraction_chain,
    "a-b-c",
    op("sub", vec![op("sub", vec![id("a"), id("b")]), id("c")])
);
case!(
    member_chain,
    "a.b->c",
    AstNode::MemberDeref {
        target: Box::new(AstNode::MemberAccess {
            target: Box::new(id("a")),
            member: "b".into(),
        }),
        member: "c".into(),
    }
);
case!(
    array_read,
    "arr[i+1]",
    AstNode::ArrayAccess {
        target: Box::new(id("arr")),
        index: Box::new(op("add", vec![id("i"), c(1)])),
    }
);
case!(
    array_literal,
    "[1,2,3]",
    AstNode::Array(vec![c(1), c(2), c(3)])
);
case!(
    address_and_deref,
    "*p < &x",
    op(
        "lt",
        vec![
            AstNode::Deref(Box::new(id("p"))),
            AstNode::AddressOf(Box::new(id("x")))
        ]
    )
);
case!(
    brace_block,
    "{5}",
    AstNode::Lambda(FunctionNode {
        name: String::new(),
        kind: FunctionKind::Normal,
        params: vec![],
        ret: None,
        body: vec![c(5)],
    })
);
case!(
    block_argument,
    "run({hello()})",
    call(
        "run",
        vec![AstNode::Lambda(FunctionNode {
            name: String::new(),
            kind: FunctionKind::Normal,
            params: vec![],
            ret: None,
            body: vec![call("hello", vec![])],
        })]
    )
);

#[test]
fn expression_errors() {
    let message = |code: &str| expression(code).unwrap_err().to_string();
    assert!(message("(5+10").contains("Mismatched parenthesis"));
    assert!(message("a[1").contains("Mismatched brackets"));
    assert!(message("f(,1)").contains("Missing item before comma"));
    assert!(message("f(5,)").contains("Missing item after comma"));
    assert!(message("{5").contains("Mismatched braces"));
    assert!(message("5 +").contains("Could not parse expression"));
}

#[test]
fn function_definitions() {
    let nodes = program(
        "
        struct point:
          x:int
          y:int

        def (p:*point) sum(): int
          return p->x + p->y

        def main():
          val p:point
          p.x = 1
        ",
    )
    .unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(
        nodes[0],
        AstNode::Struct {
            name: "point".into(),
            members: vec![
                Parameter {
                    name: "x".into(),
                    ty: TypeDefinition::new("int"),
                },
                Parameter {
                    name: "y".into(),
                    ty: TypeDefinition::new("int"),
                },
            ],
        }
    );
    let AstNode::Function(FunctionNode { name, kind, params, ret, body }) = &nodes[1] else {
        panic!("expected a function, got {:?}", nodes[1]);
    };
    assert_eq!(name, "sum");
    assert_eq!(*kind, FunctionKind::Instance);
    assert_eq!(params[0].ty, TypeDefinition::new("point").pointer());
    assert_eq!(ret.as_ref(), Some(&TypeDefinition::new("int")));
    assert!(matches!(body[0], AstNode::Return(Some(_))));
}

#[test]
fn statements() {
    let nodes = program(
        "
        def main():
          val a = 5
          while a != 0:
            if a < 3:
              break
            else:
              a = a - 1
          print a
        ",
    )
    .unwrap();
    let AstNode::Function(main) = &nodes[0] else {
        panic!("expected a function");
    };
    assert_eq!(
        main.body[0],
        AstNode::NewVariable {
            name: "a".into(),
            ty: None,
            hint: Some(Box::new(c(5))),
        }
    );
    assert_eq!(main.body[1], AstNode::assign(id("a"), c(5)));
    let AstNode::While { condition, body } = &main.body[2] else {
        panic!("expected a loop, got {:?}", main.body[2]);
    };
    assert_eq!(**condition, op("ne", vec![id("a"), c(0)]));
    assert_eq!(
        body[0],
        AstNode::If {
            condition: Box::new(op("lt", vec![id("a"), c(3)])),
            body: vec![AstNode::Break],
            else_body: vec![AstNode::assign(id("a"), op("sub", vec![id("a"), c(1)]))],
        }
    );
    assert_eq!(main.body[3], call("print", vec![id("a")]));
}

#[test]
fn globals() {
    let nodes = program(
        "
        val i = 5
        val p:point

        def main():
          print(i)
        ",
    )
    .unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(
        nodes[0],
        AstNode::NewVariable {
            name: "i".into(),
            ty: None,
            hint: Some(Box::new(c(5))),
        }
    );
    assert_eq!(nodes[1], AstNode::assign(id("i"), c(5)));
    assert_eq!(
        nodes[2],
        AstNode::NewVariable {
            name: "p".into(),
            ty: Some(TypeDefinition::new("point")),
            hint: None,
        }
    );
}

#[test]
fn program_errors() {
    let message = |code: &str| program(code).unwrap_err().to_string();
    assert!(message("print 5").contains("Expected a function, struct or global definition"));
    assert!(message("def main():\n  val = 5").contains("Don't know how to parse"));
}
