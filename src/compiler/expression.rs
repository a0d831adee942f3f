// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! `Exprmode target = ...`: a postfix stack program closed by an end marker.

use super::*;

use crate::core::encoding::to_word;
use crate::core::opcodes::{
    expression_operation, EXPR_END, EXPR_SUB_OPCODE, EXPR_VALUE, OP_EXPRESSION,
};

/// Flag on a value push that reads a variable instead of a constant.
const EXPR_VAR_FLAG: u8 = 0x80;

impl Session<'_> {
    pub(super) fn parse_expression_mode(&mut self) -> Result<Vec<u8>, ScummError> {
        self.expect_word("Exprmode")?;
        let target = self.parse_var()?;
        self.expect_punct(Punct::Assign)?;

        let mut out = vec![OP_EXPRESSION];
        out.extend(target.encode()?);
        out.extend(self.parse_expression_leaf()?);
        out.push(EXPR_END);
        Ok(out)
    }

    /// One stack operand: a sub-expression, an embedded instruction, a
    /// variable or a constant.
    fn parse_expression_leaf(&mut self) -> Result<Vec<u8>, ScummError> {
        if self.check_punct(Punct::LParen) {
            return self.parse_sub_expression();
        }
        if self.eat_punct(Punct::Lt) {
            let bytes = self.parse_simple_construct()?;
            self.eat_semicolon();
            self.expect_punct(Punct::Gt)?;
            let mut out = vec![EXPR_SUB_OPCODE];
            out.extend(bytes);
            return Ok(out);
        }
        let span = self.current_span();
        match self.parse_operand()? {
            Operand::Var(var) => {
                let mut out = vec![EXPR_VALUE | EXPR_VAR_FLAG];
                out.extend(var.encode()?);
                Ok(out)
            }
            Operand::Literal(value) => {
                let mut out = vec![EXPR_VALUE];
                out.extend_from_slice(&to_word(value).map_err(|err| err.with_span(span))?);
                Ok(out)
            }
        }
    }

    /// `(a op b)`, emitted as both operands followed by the operator.
    fn parse_sub_expression(&mut self) -> Result<Vec<u8>, ScummError> {
        self.expect_punct(Punct::LParen)?;
        let mut out = self.parse_expression_leaf()?;

        let op_span = self.current_span();
        let operator = match self.advance() {
            Some(Token {
                kind: TokenKind::Punct(punct),
                ..
            }) => expression_operation(punct.as_str()),
            _ => None,
        };
        let Some(operator) = operator else {
            return Err(ScummError::syntax(
                "Expected an expression operator (+, -, * or /)",
            )
            .with_span(op_span));
        };

        out.extend(self.parse_expression_leaf()?);
        out.push(operator);
        self.expect_punct(Punct::RParen)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expression(source: &str) -> Result<Vec<u8>, ScummError> {
        let tokens = tokenize(source)?;
        let mut session = Session::new(&tokens, Dialect::V5, false);
        session.parse_expression_mode()
    }

    #[test]
    fn single_values() {
        assert_eq!(
            expression("Exprmode Var[1] = 7").unwrap(),
            vec![0xAC, 0x01, 0x00, 0x01, 0x07, 0x00, 0xFF]
        );
        assert_eq!(
            expression("Exprmode Var[1] = Local[3]").unwrap(),
            vec![0xAC, 0x01, 0x00, 0x81, 0x03, 0x40, 0xFF]
        );
    }

    #[test]
    fn nested_operations_are_postfix() {
        assert_eq!(
            expression("Exprmode Var[1] = ((Var[2] + 3) * 4)").unwrap(),
            vec![
                0xAC, 0x01, 0x00, 0x81, 0x02, 0x00, 0x01, 0x03, 0x00, 0x02, 0x01, 0x04, 0x00,
                0x04, 0xFF
            ]
        );
    }

    #[test]
    fn embedded_instruction() {
        assert_eq!(
            expression("Exprmode Var[1] = (<Var[0] = getRandomNr(5);> - 1)").unwrap(),
            vec![
                0xAC, 0x01, 0x00, 0x06, 0x16, 0x00, 0x00, 0x05, 0x01, 0x01, 0x00, 0x03, 0xFF
            ]
        );
    }

    #[test]
    fn assignment_is_not_an_operator() {
        let err = expression("Exprmode Var[1] = (Var[2] = 3)").unwrap_err();
        assert_eq!(err.message(), "Expected an expression operator (+, -, * or /)");
    }
}
