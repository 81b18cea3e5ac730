use crate::error::Error;
use crate::op::{Group, Op};
use color_print::cformat;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub name: String,
    /// Width in bytes, 1 for `#name` and 2 for `##name`
    pub width: usize,
}

impl Operand {
    pub fn min(&self) -> i32 {
        -(1 << (8 * self.width - 1))
    }

    pub fn max(&self) -> i32 {
        (1 << (8 * self.width)) - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Word {
    Fixed(String),
    Operand(Operand),
}

/// One entry of an instruction set: a mnemonic template bound to an opcode id
/// and to the semantics the emulator runs for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub id: u8,
    pub mnemonic: String,
    pub op: Op,
    pub group: Group,
    words: Vec<Word>,
}

/// Split a line of mnemonic text into words.
/// Brackets are words on their own, commas separate like spaces.
pub fn split_words(text: &str) -> Vec<String> {
    text.replace('[', " [ ")
        .replace(']', " ] ")
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

impl Instruction {
    pub fn new(mnemonic: &str, id: u8, op: Op) -> Result<Self, Error> {
        let inst = Self::template(mnemonic, id, op)?;
        if inst.words.is_empty() {
            return Err(Error::EmptyMnemonic);
        }
        let found = inst.operands().count();
        let expected = Self::template(op.mnemonic(), id, op)?.operands().count();
        if found != expected {
            return Err(Error::OperandCount {
                mnemonic: mnemonic.to_string(),
                op,
                found,
                expected,
            });
        }
        Ok(inst)
    }

    fn template(mnemonic: &str, id: u8, op: Op) -> Result<Self, Error> {
        let words = split_words(mnemonic)
            .into_iter()
            .map(|word| {
                let width = word.chars().take_while(|&c| c == '#').count();
                match width {
                    0 => Ok(Word::Fixed(word)),
                    1 | 2 => Ok(Word::Operand(Operand {
                        name: word[width..].to_string(),
                        width,
                    })),
                    _ => Err(Error::OperandWidth(word)),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id,
            mnemonic: mnemonic.to_string(),
            op,
            group: op.group(),
            words,
        })
    }

    /// Instruction of the standard set for `op`
    pub(crate) fn standard(op: Op) -> Self {
        let words = split_words(op.mnemonic())
            .into_iter()
            .map(|word| match word.strip_prefix('#') {
                Some(name) => Word::Operand(Operand {
                    name: name.to_string(),
                    width: 1,
                }),
                None => Word::Fixed(word),
            })
            .collect();
        Self {
            id: op.into(),
            mnemonic: op.mnemonic().to_string(),
            op,
            group: op.group(),
            words,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        self.words.iter().filter_map(|w| match w {
            Word::Operand(operand) => Some(operand),
            Word::Fixed(_) => None,
        })
    }

    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        1 + self.operands().map(|o| o.width).sum::<usize>()
    }

    /// Normalized mnemonic used for lookups
    pub fn key(&self) -> String {
        self.words
            .iter()
            .map(|w| match w {
                Word::Fixed(text) => text.to_lowercase(),
                Word::Operand(o) => format!("{}{}", "#".repeat(o.width), o.name),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Encode with every operand given by name.
    pub fn build(&self, values: &IndexMap<String, i32>) -> Result<Vec<u8>, Error> {
        for name in values.keys() {
            if !self.operands().any(|o| &o.name == name) {
                return Err(Error::UnknownOperand(name.clone(), self.mnemonic.clone()));
            }
        }
        let mut bytes = vec![self.id];
        for operand in self.operands() {
            let value = *values
                .get(&operand.name)
                .ok_or_else(|| Error::MissingOperand(operand.name.clone(), self.mnemonic.clone()))?;
            if value < operand.min() || value > operand.max() {
                return Err(Error::OutOfRange {
                    name: operand.name.clone(),
                    value,
                    width: operand.width,
                });
            }
            let value = value as u32;
            bytes.extend((0..operand.width).map(|i| (value >> (8 * i)) as u8));
        }
        Ok(bytes)
    }

    /// Read the operand values that follow the opcode byte.
    pub fn decode(&self, operands: &[u8]) -> Option<Vec<u16>> {
        let mut values = vec![];
        let mut idx = 0;
        for operand in self.operands() {
            let bytes = operands.get(idx..idx + operand.width)?;
            values.push(
                bytes
                    .iter()
                    .enumerate()
                    .fold(0u16, |acc, (i, b)| acc | (*b as u16) << (8 * i)),
            );
            idx += operand.width;
        }
        Some(values)
    }

    /// Mnemonic text with every operand replaced by its value.
    pub fn disassemble(&self, values: &[u16]) -> String {
        let mut values = values.iter();
        let mut text = String::new();
        for word in &self.words {
            let part = match word {
                Word::Fixed(fixed) => fixed.clone(),
                Word::Operand(_) => match values.next() {
                    Some(value) => format!("#{value}"),
                    None => "#?".to_string(),
                },
            };
            if !text.is_empty() && !text.ends_with('[') && part != "]" {
                text.push(' ');
            }
            text.push_str(&part);
        }
        text
    }

    pub fn cformat(&self, values: &[u16]) -> String {
        cformat!("<r>{:<34}</> <dim>{}</>", self.disassemble(values), self.group)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3} {}", self.id, self.mnemonic)
    }
}
