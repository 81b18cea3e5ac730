use super::ast::{AstNode, FunctionKind, FunctionNode, Parameter, TypeDefinition};
use super::parsercore::Parser;
use super::token::TokenKind::*;
use crate::error::Error;
use crate::{check, expect, optional, repeat};

impl<'r> Parser<'r> {
    pub fn parse(mut self) -> Result<Vec<AstNode>, Error> {
        self.parse_program()
    }
}

impl<'r> Parser<'r> {
    /// program = { def | struct | import | global | EOL }
    fn parse_program(&mut self) -> Result<Vec<AstNode>, Error> {
        let mut nodes = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                EOL => {
                    self.next();
                }
                KwDef => nodes.push(self.parse_function()?),
                KwStruct => nodes.push(self.parse_struct()?),
                // import = "import" ident EOL
                KwImport => {
                    expect!(self, KwImport)?;
                    let name = self.expect_ident()?;
                    expect!(self, EOL)?;
                    nodes.push(AstNode::Import(name));
                }
                // global = declaration
                KwVal => nodes.extend(self.parse_statement()?),
                _ => return Err(self.error("Expected a function, struct or global definition")),
            }
        }
        Ok(nodes)
    }

    /// type = [ "new" ] [ "*" ] ident [ "[" "]" ]
    fn parse_type(&mut self) -> Result<TypeDefinition, Error> {
        let explicit_new = optional!(self, KwNew).is_some();
        let pointer = optional!(self, Star).is_some();
        let name = self.expect_ident()?;
        let array = optional!(self, LBracket, expect!(self, RBracket)?).is_some();
        Ok(TypeDefinition {
            name,
            pointer,
            array,
            explicit_new,
        })
    }

    /// parameter = ident ":" type
    fn parse_parameter(&mut self) -> Result<Parameter, Error> {
        let name = self.expect_ident()?;
        expect!(self, Colon)?;
        let ty = self.parse_type()?;
        Ok(Parameter { name, ty })
    }

    /// function = "def" [ "(" parameter ")" ] ident "(" parameters ")" ":" [ type ] EOL block
    fn parse_function(&mut self) -> Result<AstNode, Error> {
        expect!(self, KwDef)?;
        let receiver = optional!(self, LParen, {
            let receiver = self.parse_parameter()?;
            expect!(self, RParen)?;
            receiver
        });
        let name = self.expect_ident()?;
        expect!(self, LParen)?;
        let params = repeat!(self, self.parse_parameter(), Comma, RParen);
        expect!(self, RParen)?;
        expect!(self, Colon)?;
        let ret = match check!(self, EOL) {
            true => None,
            false => Some(self.parse_type()?),
        };
        expect!(self, EOL)?;
        let body = self.parse_block()?;

        let kind = match receiver {
            Some(_) => FunctionKind::Instance,
            None => FunctionKind::Normal,
        };
        Ok(AstNode::Function(FunctionNode {
            name,
            kind,
            params: receiver.into_iter().chain(params).collect(),
            ret,
            body,
        }))
    }

    /// struct = "struct" ident ":" EOL BeginBlock { parameter EOL } EndBlock
    fn parse_struct(&mut self) -> Result<AstNode, Error> {
        expect!(self, KwStruct)?;
        let name = self.expect_ident()?;
        expect!(self, Colon)?;
        expect!(self, EOL)?;
        expect!(self, BeginBlock)?;
        let mut members = Vec::new();
        while optional!(self, EndBlock).is_none() {
            if optional!(self, EOL).is_some() {
                continue;
            }
            members.push(self.parse_parameter()?);
            expect!(self, EOL)?;
        }
        Ok(AstNode::Struct { name, members })
    }

    /// block = BeginBlock { statement } EndBlock
    fn parse_block(&mut self) -> Result<Vec<AstNode>, Error> {
        expect!(self, BeginBlock)?;
        let mut nodes = Vec::new();
        while optional!(self, EndBlock).is_none() {
            if self.at_end() {
                return Err(self.error("Block not closed"));
            }
            if optional!(self, EOL).is_some() {
                continue;
            }
            nodes.extend(self.parse_statement()?);
        }
        Ok(nodes)
    }

    /// Condition up to ":" followed by a block
    fn parse_conditional_block(&mut self) -> Result<(AstNode, Vec<AstNode>), Error> {
        let condition = self.expression_until(|kind| kind == &Colon)?;
        expect!(self, Colon)?;
        expect!(self, EOL)?;
        Ok((condition, self.parse_block()?))
    }

    fn parse_statement(&mut self) -> Result<Vec<AstNode>, Error> {
        let Some(token) = self.peek() else {
            return Err(self.error("Unexpected end of file"));
        };
        match token.kind {
            // if = "if" expr ":" EOL block [ "else" ":" EOL block ]
            KwIf => {
                expect!(self, KwIf)?;
                let (condition, body) = self.parse_conditional_block()?;
                let else_body = optional!(self, KwElse, {
                    expect!(self, Colon)?;
                    expect!(self, EOL)?;
                    self.parse_block()?
                });
                Ok(vec![AstNode::If {
                    condition: Box::new(condition),
                    body,
                    else_body: else_body.unwrap_or_default(),
                }])
            }

            // while = "while" expr ":" EOL block
            KwWhile => {
                expect!(self, KwWhile)?;
                let (condition, body) = self.parse_conditional_block()?;
                Ok(vec![AstNode::While {
                    condition: Box::new(condition),
                    body,
                }])
            }

            // return = "return" [ expr ] EOL
            KwReturn => {
                expect!(self, KwReturn)?;
                let value = match check!(self, EOL) {
                    true => None,
                    false => Some(Box::new(self.expression_until(|_| false)?)),
                };
                expect!(self, EOL)?;
                Ok(vec![AstNode::Return(value)])
            }

            // break = "break" EOL
            KwBreak => {
                expect!(self, KwBreak)?;
                expect!(self, EOL)?;
                Ok(vec![AstNode::Break])
            }

            // print = "print" expr EOL
            KwPrint => {
                expect!(self, KwPrint)?;
                let value = self.expression_until(|_| false)?;
                expect!(self, EOL)?;
                Ok(vec![AstNode::call("print", FunctionKind::Normal, vec![value])])
            }

            KwVal => self
                .try_parse(Self::parse_declaration_assign)
                .or_else(|| self.try_parse(Self::parse_declaration))
                .ok_or_else(|| self.error("Don't know how to parse")),

            _ => self
                .try_parse(Self::parse_assign)
                .or_else(|| self.try_parse(Self::parse_bare_expression))
                .ok_or_else(|| self.error("Don't know how to parse")),
        }
    }

    /// "val" ident [ ":" type ] "=" expr EOL
    fn parse_declaration_assign(&mut self) -> Result<Vec<AstNode>, Error> {
        expect!(self, KwVal)?;
        let name = self.expect_ident()?;
        let ty = optional!(self, Colon, self.parse_type()?);
        expect!(self, Equal)?;
        let value = self.expression_until(|_| false)?;
        expect!(self, EOL)?;
        Ok(vec![
            AstNode::NewVariable {
                name: name.clone(),
                ty,
                hint: Some(Box::new(value.clone())),
            },
            AstNode::assign(AstNode::Identifier(name), value),
        ])
    }

    /// "val" ident ":" type EOL
    fn parse_declaration(&mut self) -> Result<Vec<AstNode>, Error> {
        expect!(self, KwVal)?;
        let name = self.expect_ident()?;
        expect!(self, Colon)?;
        let ty = self.parse_type()?;
        expect!(self, EOL)?;
        Ok(vec![AstNode::NewVariable {
            name,
            ty: Some(ty),
            hint: None,
        }])
    }

    /// expr "=" expr EOL
    fn parse_assign(&mut self) -> Result<Vec<AstNode>, Error> {
        let target = self.expression_until(|kind| kind == &Equal)?;
        expect!(self, Equal)?;
        let value = self.expression_until(|_| false)?;
        expect!(self, EOL)?;
        Ok(vec![AstNode::assign(target, value)])
    }

    /// expr EOL
    fn parse_bare_expression(&mut self) -> Result<Vec<AstNode>, Error> {
        let value = self.expression_until(|_| false)?;
        expect!(self, EOL)?;
        Ok(vec![value])
    }
}
