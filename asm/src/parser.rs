use arch::inst::{split_words, Word};
use arch::InstructionSet;
use std::num::ParseIntError;

use crate::error::Error;

// ----------------------------------------------------------------------------
// Statement

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Instruction id and its operands by name
    Code(u8, Vec<(String, Imm)>),
    Label(String),
    Variable(String, Imm),
    Scope,
    EndScope,
}

impl Stmt {
    pub fn parse(line: &str, set: &InstructionSet) -> Result<Option<Stmt>, Error> {
        let code = match line.split_once("//") {
            Some((code, _comment)) => code,
            None => line,
        };
        let words = split_words(code);

        let Some(head) = words.first() else {
            return Ok(None);
        };

        if words.len() == 1 {
            if head.eq_ignore_ascii_case("scope") {
                return Ok(Some(Stmt::Scope));
            }
            if head.eq_ignore_ascii_case("endscope") {
                return Ok(Some(Stmt::EndScope));
            }
            // :loop
            if let Some(label) = head.strip_prefix(':') {
                return Ok(Some(Stmt::Label(label.to_string())));
            }
        }

        // #name = value
        if words.len() == 3 && words[1] == "=" {
            if let Some(name) = head.strip_prefix('#') {
                return Ok(Some(Stmt::Variable(name.to_string(), Imm::parse(&words[2]))));
            }
        }

        Self::parse_code(&words, set).map(Some)
    }

    fn parse_code(words: &[String], set: &InstructionSet) -> Result<Stmt, Error> {
        'next: for inst in set.iter() {
            if inst.words().len() != words.len() {
                continue;
            }
            let mut operands = vec![];
            for (template, word) in inst.words().iter().zip(words) {
                match template {
                    Word::Fixed(fixed) => {
                        if !fixed.eq_ignore_ascii_case(word) {
                            continue 'next;
                        }
                    }
                    Word::Operand(operand) => match word.strip_prefix('#') {
                        Some(value) => operands
                            .push((operand.name.clone(), Imm::parse(value.trim_start_matches('#')))),
                        None => continue 'next,
                    },
                }
            }
            return Ok(Stmt::Code(inst.id, operands));
        }
        Err(Error::UnknownInstruction(words.join(" ")))
    }
}

// ----------------------------------------------------------------------------
// Immediate

#[derive(Debug, Clone, PartialEq)]
pub enum Imm {
    Literal(i32),
    Ident(String),
}

impl Imm {
    pub fn parse(s: &str) -> Imm {
        match parse_signed(s) {
            Ok(v) => Imm::Literal(v),
            Err(_) => Imm::Ident(s.to_string()),
        }
    }
}

fn parse_signed(s: &str) -> Result<i32, ParseIntError> {
    match s.strip_prefix('-') {
        Some(rest) => parse_with_prefix(rest).map(|v| -v),
        None => parse_with_prefix(s),
    }
}

fn parse_with_prefix(s: &str) -> Result<i32, ParseIntError> {
    if s.len() < 2 {
        s.parse::<i32>()
    } else {
        let (prefix, num) = s.split_at(2);
        match prefix {
            "0b" => i32::from_str_radix(num, 2),
            "0o" => i32::from_str_radix(num, 8),
            "0x" => i32::from_str_radix(num, 16),
            _ => s.parse::<i32>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arch::Op;

    fn parse(line: &str) -> Option<Stmt> {
        Stmt::parse(line, &InstructionSet::standard()).unwrap()
    }

    #[test]
    fn statements() {
        assert_eq!(parse("   "), None);
        assert_eq!(parse("// only a comment"), None);
        assert_eq!(parse("scope"), Some(Stmt::Scope));
        assert_eq!(parse("ENDSCOPE"), Some(Stmt::EndScope));
        assert_eq!(parse(":loop"), Some(Stmt::Label("loop".into())));
        assert_eq!(
            parse("#size = 0x10"),
            Some(Stmt::Variable("size".into(), Imm::Literal(16)))
        );
    }

    #[test]
    fn instructions() {
        assert_eq!(
            parse("lda [fp #-1] // load"),
            Some(Stmt::Code(
                u8::from(Op::LdaAtFp),
                vec![("offset".into(), Imm::Literal(-1))]
            ))
        );
        assert_eq!(
            parse("CPY [SP #0], [FP #b]"),
            Some(Stmt::Code(
                u8::from(Op::CopySpFp),
                vec![
                    ("spoffset".into(), Imm::Literal(0)),
                    ("fpoffset".into(), Imm::Ident("b".into()))
                ]
            ))
        );
        assert_eq!(parse("PUSHA"), Some(Stmt::Code(u8::from(Op::PushA), vec![])));
        assert!(Stmt::parse("LDA FOO", &InstructionSet::standard()).is_err());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_signed("42"), Ok(42));
        assert_eq!(parse_signed("-0x10"), Ok(-16));
        assert_eq!(parse_signed("0b101"), Ok(5));
        assert!(parse_signed("abc").is_err());
    }
}
