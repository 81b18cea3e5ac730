use wingc::grammer::lexer::Lexer;
use wingc::grammer::token::TokenKind::{self, *};

fn assert(code: &str, expects: Vec<TokenKind>) {
    let tokens = Lexer::new(code).parse().unwrap();

    for (idx, token) in tokens.iter().enumerate() {
        println!("{:>2}: {:<6} {:?}", idx, token.pos.to_string(), token.kind);
    }

    let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, expects);
}

macro_rules! case {
    ($name:ident, $code:expr, $expects:expr) => {
        #[test]
        fn $name() {
            assert($code, $expects);
        }
    };
}

fn ident(name: &str) -> TokenKind {
    Ident(name.to_string())
}

case!(
    declaration,
    "val a:int = 5 # five",
    vec![KwVal, ident("a"), Colon, ident("int"), Equal, Number(5), EOL]
);

case!(
    operators,
    "a!=b==-c->d",
    vec![
        ident("a"),
        ExclEqual,
        ident("b"),
        EqualEqual,
        Minus,
        ident("c"),
        Arrow,
        ident("d"),
        EOL
    ]
);

case!(
    brackets_split_runs,
    "f(-1)[&x]",
    vec![
        ident("f"),
        LParen,
        Minus,
        Number(1),
        RParen,
        LBracket,
        Ampasand,
        ident("x"),
        RBracket,
        EOL
    ]
);

case!(
    braces,
    "run({-x})",
    vec![
        ident("run"),
        LParen,
        LBrace,
        Minus,
        ident("x"),
        RBrace,
        RParen,
        EOL
    ]
);

case!(
    text,
    "print(\"hi there\")",
    vec![KwPrint, LParen, Text("hi there".into()), RParen, EOL]
);

case!(
    blocks,
    "
    def main():
      if a:
        print(1)
      print(2)
    ",
    vec![
        KwDef,
        ident("main"),
        LParen,
        RParen,
        Colon,
        EOL,
        BeginBlock,
        KwIf,
        ident("a"),
        Colon,
        EOL,
        BeginBlock,
        KwPrint,
        LParen,
        Number(1),
        RParen,
        EOL,
        EndBlock,
        KwPrint,
        LParen,
        Number(2),
        RParen,
        EOL,
        EndBlock,
    ]
);

#[test]
fn errors() {
    let message = |code: &str| Lexer::new(code).parse().unwrap_err().to_string();
    assert_eq!(message("a = \"open"), "String not closed");
    assert_eq!(message("a\n    b"), "Cannot increment indentation by more than one step");
    assert_eq!(message("a\n   b"), "Mismatched spaces");
    assert!(message("a = 99999999999").contains("too large"));
    assert!(message("a ! b").contains("operator"));
}
