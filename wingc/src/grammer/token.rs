use bimap::BiMap;
use once_cell::sync::Lazy;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Pos,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos) -> Self {
        Token { kind, pos }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Block structure
    EOL,
    BeginBlock,
    EndBlock,

    // Double character tokens
    EqualEqual, // '=='
    ExclEqual,  // '!='
    Arrow,      // '->'

    // Single character tokens
    Equal,    // '='
    Plus,     // '+'
    Minus,    // '-'
    Star,     // '*'
    Ampasand, // '&'
    Colon,    // ':'
    Comma,    // ','
    Period,   // '.'
    LParen,   // '('
    RParen,   // ')'
    LBracket, // '['
    RBracket, // ']'
    LBrace,   // '{'
    RBrace,   // '}'
    LAngle,   // '<'
    RAngle,   // '>'

    // Keywords
    KwDef,    // "def"
    KwPrint,  // "print"
    KwWhile,  // "while"
    KwIf,     // "if"
    KwElse,   // "else"
    KwReturn, // "return"
    KwStruct, // "struct"
    KwNew,    // "new"
    KwVal,    // "val"
    KwBreak,  // "break"
    KwImport, // "import"

    // Identifier
    Ident(String),

    // Literals
    Number(i32),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.col + 1)
    }
}

/// Operator text to token kind. Operator runs are split by longest match.
pub static OPERATORS: Lazy<BiMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    [
        ("==", EqualEqual),
        ("!=", ExclEqual),
        ("->", Arrow),
        ("=", Equal),
        ("+", Plus),
        ("-", Minus),
        ("*", Star),
        ("&", Ampasand),
        (":", Colon),
        (",", Comma),
        (".", Period),
        ("(", LParen),
        (")", RParen),
        ("[", LBracket),
        ("]", RBracket),
        ("{", LBrace),
        ("}", RBrace),
        ("<", LAngle),
        (">", RAngle),
    ]
    .into_iter()
    .collect()
});

pub fn keyword(s: &str) -> Option<TokenKind> {
    match s {
        "def" => Some(TokenKind::KwDef),
        "print" => Some(TokenKind::KwPrint),
        "while" => Some(TokenKind::KwWhile),
        "if" => Some(TokenKind::KwIf),
        "else" => Some(TokenKind::KwElse),
        "return" => Some(TokenKind::KwReturn),
        "struct" => Some(TokenKind::KwStruct),
        "new" => Some(TokenKind::KwNew),
        "val" => Some(TokenKind::KwVal),
        "break" => Some(TokenKind::KwBreak),
        "import" => Some(TokenKind::KwImport),
        _ => None,
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = OPERATORS.get_by_right(self) {
            return write!(f, "'{text}'");
        }
        match self {
            TokenKind::EOL => write!(f, "end of line"),
            TokenKind::BeginBlock => write!(f, "indent"),
            TokenKind::EndBlock => write!(f, "dedent"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Number(value) => write!(f, "number {value}"),
            TokenKind::Text(text) => write!(f, "string {text:?}"),
            kw => write!(f, "keyword '{}'", format!("{kw:?}").trim_start_matches("Kw").to_lowercase()),
        }
    }
}
