use super::token::{keyword, Pos, Token, TokenKind, OPERATORS};
use crate::error::Error;
use std::iter::Peekable;
use std::str::CharIndices;

/// Characters that always end an operator run
const ALWAYS_DELIMITER: [char; 8] = ['(', ')', '[', ']', '{', '}', ',', ':'];

pub struct Lexer<'a> {
    code: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(code: &'a str) -> Self {
        Self { code }
    }

    pub fn parse(self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        let mut base = None;
        let mut current = 0;
        let mut last_row = 0;

        for (row, line) in self.code.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (level, start) = indentation(line).map_err(|message| Error::Token {
                message,
                pos: Pos { row, col: 0 },
            })?;
            let pos = Pos { row, col: start };

            match base {
                None => base = Some(level),
                Some(_) if level > current => {
                    if level != current + 1 {
                        return Err(Error::Token {
                            message: "Cannot increment indentation by more than one step".into(),
                            pos,
                        });
                    }
                    tokens.push(Token::new(TokenKind::BeginBlock, pos));
                }
                Some(_) => {
                    for _ in level..current {
                        tokens.push(Token::new(TokenKind::EndBlock, pos));
                    }
                }
            }
            current = level;
            last_row = row;

            tokens.extend(LineLexer::new(&line[start..], row, start).parse()?);
        }

        if let Some(base) = base {
            let pos = Pos {
                row: last_row + 1,
                col: 0,
            };
            for _ in base..current {
                tokens.push(Token::new(TokenKind::EndBlock, pos));
            }
        }
        Ok(tokens)
    }
}

/// Indentation level and the byte offset where the content starts.
/// One level is two spaces or one tab.
fn indentation(line: &str) -> Result<(usize, usize), String> {
    let mut level = 0;
    let mut offset = 0;
    let (mut tabs, mut spaces) = (false, false);
    loop {
        let rest = &line[offset..];
        if rest.starts_with('\t') {
            if spaces {
                return Err("Cannot mix tabs and spaces".into());
            }
            tabs = true;
            offset += 1;
        } else if rest.starts_with("  ") {
            if tabs {
                return Err("Cannot mix tabs and spaces".into());
            }
            spaces = true;
            offset += 2;
        } else if rest.starts_with(' ') {
            return Err("Mismatched spaces".into());
        } else {
            return Ok((level, offset));
        }
        level += 1;
    }
}

struct LineLexer<'a> {
    iter: Peekable<CharIndices<'a>>,
    line: &'a str,
    row: usize,
    indent: usize,
}

impl<'a> LineLexer<'a> {
    fn new(line: &'a str, row: usize, indent: usize) -> Self {
        Self {
            iter: line.char_indices().peekable(),
            line,
            row,
            indent,
        }
    }

    fn pos(&self, idx: usize) -> Pos {
        Pos {
            row: self.row,
            col: self.indent + idx,
        }
    }

    fn error(&self, message: impl Into<String>, idx: usize) -> Error {
        Error::Token {
            message: message.into(),
            pos: self.pos(idx),
        }
    }

    fn parse(mut self) -> Result<Vec<Token>, Error> {
        let mut tokens = Vec::new();
        while let Some(&(idx, ch)) = self.iter.peek() {
            // 0. Skip whitespaces
            if ch.is_whitespace() {
                self.iter.next();
                continue;
            }

            // 1. Comment runs to end of line
            if ch == '#' {
                break;
            }

            let pos = self.pos(idx);

            // 2. String literal
            if ch == '"' {
                tokens.push(Token::new(self.parse_text(idx)?, pos));
                continue;
            }

            // 3. Number, identifier or keyword
            if is_word(ch) {
                tokens.push(Token::new(self.parse_word(idx)?, pos));
                continue;
            }

            // 4. Operators
            for (offset, kind) in self.parse_operators(idx)? {
                tokens.push(Token::new(kind, self.pos(offset)));
            }
        }
        tokens.push(Token::new(TokenKind::EOL, self.pos(self.line.len())));
        Ok(tokens)
    }

    fn parse_word(&mut self, start: usize) -> Result<TokenKind, Error> {
        let mut end = start;
        while let Some((idx, ch)) = self.iter.next_if(|(_, ch)| is_word(*ch)) {
            end = idx + ch.len_utf8();
        }
        let word = &self.line[start..end];
        if word.chars().all(|c| c.is_ascii_digit()) {
            return word
                .parse()
                .map(TokenKind::Number)
                .map_err(|_| self.error(format!("Number {word} is too large"), start));
        }
        Ok(keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string())))
    }

    // Text: "hoge"
    fn parse_text(&mut self, start: usize) -> Result<TokenKind, Error> {
        self.iter.next();
        let mut text = String::new();
        for (_, ch) in self.iter.by_ref() {
            if ch == '"' {
                return Ok(TokenKind::Text(text));
            }
            text.push(ch);
        }
        Err(self.error("String not closed", start))
    }

    /// Collect one run of operator characters and split it by longest match.
    fn parse_operators(&mut self, start: usize) -> Result<Vec<(usize, TokenKind)>, Error> {
        let mut end = start;
        while let Some(&(idx, ch)) = self.iter.peek() {
            let delimiter = ALWAYS_DELIMITER.contains(&ch);
            if idx > start && (delimiter || is_word(ch)) {
                break;
            }
            if ch.is_whitespace() || ch == '#' || ch == '"' {
                break;
            }
            self.iter.next();
            end = idx + ch.len_utf8();
            if delimiter {
                break;
            }
        }
        let run = &self.line[start..end];
        split_operators(run)
            .map(|ops| {
                let mut offset = start;
                ops.into_iter()
                    .map(|(len, kind)| {
                        let at = offset;
                        offset += len;
                        (at, kind)
                    })
                    .collect()
            })
            .ok_or_else(|| self.error(format!("Cannot parse {run} to operator"), start))
    }
}

fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Operator kinds of `run` with their byte lengths
fn split_operators(run: &str) -> Option<Vec<(usize, TokenKind)>> {
    let mut rest = run;
    let mut ops = vec![];
    while !rest.is_empty() {
        let (len, kind) = (1..=rest.len())
            .rev()
            .filter_map(|len| rest.get(..len))
            .find_map(|head| OPERATORS.get_by_left(head).map(|kind| (head.len(), kind.clone())))?;
        ops.push((len, kind));
        rest = &rest[len..];
    }
    Some(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_runs() {
        use TokenKind::*;
        let kinds = |run: &str| split_operators(run).map(|v| v.into_iter().map(|(_, k)| k).collect::<Vec<_>>());
        assert_eq!(kinds("=="), Some(vec![EqualEqual]));
        assert_eq!(kinds("=-"), Some(vec![Equal, Minus]));
        assert_eq!(kinds("->"), Some(vec![Arrow]));
        assert_eq!(kinds("!"), None);
    }

    #[test]
    fn indentation_levels() {
        assert_eq!(indentation("x"), Ok((0, 0)));
        assert_eq!(indentation("    x"), Ok((2, 4)));
        assert_eq!(indentation("\t\tx"), Ok((2, 2)));
        assert!(indentation("   x").is_err());
        assert!(indentation("\t  x").is_err());
    }
}
