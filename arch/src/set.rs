use crate::code::{Code, Reference};
use crate::error::Error;
use crate::inst::{split_words, Instruction};
use crate::op::Op;
use bimap::BiMap;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Number of opcode ids an instruction set may hand out.
pub const MAX_INSTRUCTIONS: usize = 254;

/// Every [`Op`] under its own mnemonic, ids in declaration order.
pub static STANDARD: Lazy<InstructionSet> = Lazy::new(|| {
    let mut set = InstructionSet::new();
    for op in Op::iter() {
        set.insert(Instruction::standard(op));
    }
    set
});

#[derive(Debug, Clone, Default)]
pub struct InstructionSet {
    instructions: BTreeMap<u8, Instruction>,
    mnemonics: BiMap<String, u8>,
}

impl InstructionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        STANDARD.clone()
    }

    fn insert(&mut self, inst: Instruction) {
        self.mnemonics.insert(inst.key(), inst.id);
        self.instructions.insert(inst.id, inst);
    }

    /// Lowest id not yet taken
    pub fn next_vacant(&self) -> Result<u8, Error> {
        (0..MAX_INSTRUCTIONS as u8)
            .find(|id| !self.instructions.contains_key(id))
            .ok_or(Error::SetFull)
    }

    /// Register `mnemonic` with the semantics of `op`. Without an explicit
    /// id the lowest vacant one is used.
    pub fn create(&mut self, mnemonic: &str, id: Option<u8>, op: Op) -> Result<u8, Error> {
        let id = match id {
            Some(id) if id as usize >= MAX_INSTRUCTIONS => return Err(Error::IdOutOfRange(id)),
            Some(id) if self.instructions.contains_key(&id) => {
                return Err(Error::DuplicateId(id))
            }
            Some(id) => id,
            None => self.next_vacant()?,
        };
        let inst = Instruction::new(mnemonic, id, op)?;
        if self.mnemonics.contains_left(&inst.key()) {
            return Err(Error::DuplicateMnemonic(mnemonic.to_string()));
        }
        self.insert(inst);
        Ok(id)
    }

    pub fn get(&self, id: u8) -> Option<&Instruction> {
        self.instructions.get(&id)
    }

    pub fn by_mnemonic(&self, mnemonic: &str) -> Option<&Instruction> {
        let key = split_words(mnemonic)
            .iter()
            .map(|w| match w.starts_with('#') {
                true => w.clone(),
                false => w.to_lowercase(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        self.mnemonics.get_by_left(&key).and_then(|id| self.get(*id))
    }

    pub fn by_op(&self, op: Op) -> Option<&Instruction> {
        self.instructions.values().find(|inst| inst.op == op)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.values()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn size_of(&self, code: &Code) -> Result<usize, Error> {
        self.by_op(code.op)
            .map(|inst| inst.size())
            .ok_or(Error::UnsupportedOp(code.op))
    }

    /// Encode `code`, asking `lookup` for the value of each reference.
    pub fn encode<F>(&self, code: &Code, lookup: F) -> Result<Vec<u8>, Error>
    where
        F: Fn(&Reference) -> Option<i32>,
    {
        let inst = self.by_op(code.op).ok_or(Error::UnsupportedOp(code.op))?;
        inst.build(&code.resolve(lookup)?)
    }

    /// Decode a byte image into `(address, text)` lines.
    pub fn disassemble(&self, bytes: &[u8]) -> Result<Vec<(usize, String)>, Error> {
        let mut lines = vec![];
        let mut addr = 0;
        while addr < bytes.len() {
            let (inst, values) = self.decode_at(bytes, addr)?;
            lines.push((addr, inst.disassemble(&values)));
            addr += inst.size();
        }
        Ok(lines)
    }

    pub fn decode_at(&self, bytes: &[u8], addr: usize) -> Result<(&Instruction, Vec<u16>), Error> {
        let id = *bytes.get(addr).ok_or(Error::Truncated(addr))?;
        let inst = self.get(id).ok_or(Error::UnknownOpcode(id, addr))?;
        let values = inst
            .decode(&bytes[addr + 1..])
            .ok_or(Error::Truncated(addr))?;
        Ok((inst, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_ids_follow_declaration_order() {
        let set = InstructionSet::standard();
        for inst in set.iter() {
            println!("{inst}");
            assert_eq!(inst.id, u8::from(inst.op));
        }
        assert_eq!(set.by_mnemonic("lda #val").map(|i| i.op), Some(Op::LdaConstant));
        assert_eq!(set.by_mnemonic("CPY [SP #spoffset], [FP #fpoffset]").map(|i| i.op), Some(Op::CopySpFp));
    }

    #[test]
    fn auto_ids() {
        let mut set = InstructionSet::new();
        assert_eq!(set.create("nop", Some(1), Op::Invalid), Ok(1));
        assert_eq!(set.create("halt", None, Op::Exit), Ok(0));
        assert_eq!(set.create("print", None, Op::Out), Ok(2));
        assert_eq!(set.create("load #v", None, Op::LdaConstant), Ok(3));
        assert_eq!(set.create("halt", None, Op::Exit), Err(Error::DuplicateMnemonic("halt".into())));
        assert_eq!(set.create("x", Some(1), Op::Out), Err(Error::DuplicateId(1)));
        assert_eq!(set.create("y", Some(254), Op::Out), Err(Error::IdOutOfRange(254)));
    }

    #[test]
    fn full() {
        let mut set = InstructionSet::new();
        for i in 0..MAX_INSTRUCTIONS {
            set.create(&format!("op{i}"), None, Op::Exit).unwrap();
        }
        assert_eq!(set.create("one-more", None, Op::Exit), Err(Error::SetFull));
    }

    #[test]
    fn disassemble() {
        let set = InstructionSet::standard();
        let code = [u8::from(Op::LdaConstant), 5, u8::from(Op::Out), u8::from(Op::Exit)];
        let lines = set.disassemble(&code).unwrap();
        assert_eq!(
            lines,
            vec![
                (0, "LDA #5".to_string()),
                (2, "out".to_string()),
                (3, "exit".to_string())
            ]
        );
        assert_eq!(set.disassemble(&[u8::from(Op::LdaConstant)]), Err(Error::Truncated(0)));
        assert_eq!(set.disassemble(&[250]), Err(Error::UnknownOpcode(250, 0)));
    }
}
