//! Recursive-descent parser for Symphony.
//!
//! Parsing, semantic validation and quadruple emission happen in a single
//! pass: every grammar rule calls straight into the symbol directory and
//! the quadruple generator at the same points the language's semantics
//! require, so by the time the last token is consumed the program is fully
//! compiled.
//!
//! Program shape:
//! ```text
//! program name;
//! <global variable declarations>
//! fun <ret> <name>(<params>) { <vars> <stmts> }
//! <main statements>
//! ```

use crate::codegen::QuadrupleGenerator;
use crate::directory::{Declaration, Directory, Parameter, VarKind};
use crate::lexer::{Token, TokenKind, tokenize};
use symphony_core::{
    BinOp, CompiledProgram, DataType, Operand, SymphonyError, UnOp, Value,
};
use tracing::debug;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    directory: Directory,
    generator: QuadrupleGenerator,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let stream = tokenize(source);
        Parser {
            tokens: stream.tokens,
            pos: 0,
            directory: Directory::new(),
            generator: QuadrupleGenerator::new(),
        }
    }

    /// Parse a whole program and hand back its compiled form.
    pub fn parse(mut self) -> Result<CompiledProgram, SymphonyError> {
        self.parse_program()?;
        if let Some(token) = self.current() {
            return Err(SymphonyError::grammatical(
                token.line,
                format!("unexpected '{}' after the end of the program", token.text),
            ));
        }
        debug!(quads = self.generator.quad_count(), "parse finished");
        self.generator.finish(self.directory)
    }

    // ----- token helpers -----

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    /// Line of the current token, or of the last one at end of input.
    fn line(&self) -> usize {
        self.current()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == Some(kind)
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, SymphonyError> {
        match self.current() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            Some(token) => Err(SymphonyError::grammatical(
                token.line,
                format!("expected {}, but found '{}'", what, token.text),
            )),
            None => Err(SymphonyError::grammatical(
                self.line(),
                format!("expected {}, but the program ended", what),
            )),
        }
    }

    fn expect_semicolon(&mut self) -> Result<(), SymphonyError> {
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(())
    }

    fn type_keyword(kind: TokenKind) -> Option<DataType> {
        match kind {
            TokenKind::Int => Some(DataType::Int),
            TokenKind::Dec => Some(DataType::Dec),
            TokenKind::Char => Some(DataType::Char),
            TokenKind::Str => Some(DataType::Str),
            TokenKind::Bool => Some(DataType::Bool),
            _ => None,
        }
    }

    // ----- program structure -----

    fn parse_program(&mut self) -> Result<(), SymphonyError> {
        self.expect(TokenKind::Program, "the 'program' keyword")?;
        self.expect(TokenKind::Id, "the program's name")?;
        self.expect_semicolon()?;

        let globals = self.parse_variable_declarations()?;
        // Quad 0: the jump over all function bodies, patched once they are
        // all emitted.
        self.generator.reserve_main_goto();
        let line = self.line();
        self.directory
            .declare_variables(&[], &globals, line, true, &mut self.generator)?;

        while self.check(TokenKind::Fun) {
            self.parse_function()?;
        }
        self.generator.generate_main_goto()?;

        self.parse_statements()
    }

    /// Zero or more `type name[, name]* ;` groups.
    fn parse_variable_declarations(&mut self) -> Result<Vec<Declaration>, SymphonyError> {
        let mut declarations = Vec::new();
        while let Some(data_type) = self.kind().and_then(Self::type_keyword) {
            self.advance();
            loop {
                let name = self.expect(TokenKind::Id, "a variable name")?;
                let array_size = if self.consume(TokenKind::LBracket) {
                    let size = self.parse_array_size()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    Some(size)
                } else {
                    None
                };
                declarations.push(Declaration {
                    data_type,
                    name: name.text,
                    array_size,
                });
                if !self.consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect_semicolon()?;
        }
        Ok(declarations)
    }

    /// The size literal of an array declaration. It is interned like any
    /// other literal, though nothing reads the operand back.
    fn parse_array_size(&mut self) -> Result<(DataType, i64), SymphonyError> {
        match self.kind() {
            Some(TokenKind::IntVal) => {
                let token = self.expect(TokenKind::IntVal, "an array size")?;
                let value: i64 = token.text.parse().map_err(|_| {
                    SymphonyError::grammatical(
                        token.line,
                        format!("the number {} is too large", token.text),
                    )
                })?;
                self.generator.push_constant(Value::Int(value), token.line)?;
                self.generator.discard_operand(token.line)?;
                Ok((DataType::Int, value))
            }
            Some(TokenKind::DecVal) => {
                let token = self.expect(TokenKind::DecVal, "an array size")?;
                let value: f64 = token.text.parse().map_err(|_| {
                    SymphonyError::grammatical(
                        token.line,
                        format!("the number {} cannot be read", token.text),
                    )
                })?;
                self.generator.push_constant(Value::Dec(value), token.line)?;
                self.generator.discard_operand(token.line)?;
                // The directory rejects the non-INT size; the value itself
                // is never used.
                Ok((DataType::Dec, 0))
            }
            _ => Err(SymphonyError::grammatical(
                self.line(),
                "expected an array size between '[' and ']'",
            )),
        }
    }

    fn parse_function(&mut self) -> Result<(), SymphonyError> {
        self.expect(TokenKind::Fun, "'fun'")?;
        let return_type = if self.consume(TokenKind::Void) {
            None
        } else {
            let line = self.line();
            let data_type = self
                .kind()
                .and_then(Self::type_keyword)
                .ok_or_else(|| {
                    SymphonyError::grammatical(line, "expected a return type after 'fun'")
                })?;
            self.advance();
            Some(data_type)
        };
        let name = self.expect(TokenKind::Id, "the function's name")?;
        self.directory.define_function(
            return_type,
            &name.text,
            self.generator.quad_count(),
            name.line,
        )?;

        self.expect(TokenKind::LParen, "'('")?;
        let parameters = self.parse_parameters()?;
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let variables = self.parse_variable_declarations()?;
        let line = self.line();
        self.directory.declare_variables(
            &parameters,
            &variables,
            line,
            false,
            &mut self.generator,
        )?;

        self.parse_statements()?;
        let closing = self.expect(TokenKind::RBrace, "'}'")?;
        let function = self.directory.end_definition(closing.line)?;
        self.generator.emit_endproc(function)
    }

    fn parse_parameters(&mut self) -> Result<Vec<Parameter>, SymphonyError> {
        let mut parameters = Vec::new();
        if self.kind().and_then(Self::type_keyword).is_none() {
            return Ok(parameters);
        }
        loop {
            let line = self.line();
            let data_type = self
                .kind()
                .and_then(Self::type_keyword)
                .ok_or_else(|| {
                    SymphonyError::grammatical(line, "expected a parameter type")
                })?;
            self.advance();
            let name = self.expect(TokenKind::Id, "a parameter name")?;
            parameters.push((data_type, name.text));
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(parameters)
    }

    // ----- statements -----

    fn parse_statements(&mut self) -> Result<(), SymphonyError> {
        loop {
            match self.kind() {
                Some(TokenKind::If) => self.parse_condition()?,
                Some(TokenKind::While) => self.parse_cycle()?,
                Some(TokenKind::Break) => {
                    let line = self.line();
                    self.advance();
                    self.generator.generate_break(line)?;
                    self.expect_semicolon()?;
                }
                Some(TokenKind::Return) => {
                    self.advance();
                    self.parse_expression()?;
                    let line = self.line();
                    self.generator.generate_return(&mut self.directory, line)?;
                    self.expect_semicolon()?;
                }
                Some(TokenKind::Increment) => {
                    self.parse_self_update(UnOp::Increment)?;
                    self.expect_semicolon()?;
                }
                Some(TokenKind::Decrement) => {
                    self.parse_self_update(UnOp::Decrement)?;
                    self.expect_semicolon()?;
                }
                Some(TokenKind::Id) => {
                    if self.peek_kind(1) == Some(TokenKind::LParen) {
                        let name = self.expect(TokenKind::Id, "a function name")?;
                        self.parse_call(name)?;
                    } else {
                        self.parse_assignment()?;
                    }
                    self.expect_semicolon()?;
                }
                Some(TokenKind::SpecialId) => {
                    self.parse_special_call()?;
                    self.expect_semicolon()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// `++x` / `--x`, both as a statement and inside an expression.
    fn parse_self_update(&mut self, op: UnOp) -> Result<(), SymphonyError> {
        self.advance();
        self.parse_variable_usage()?;
        let line = self.line();
        self.generator.operate_unary(op, line)
    }

    fn parse_assignment(&mut self) -> Result<(), SymphonyError> {
        let name = self.expect(TokenKind::Id, "a variable name")?;
        if self.consume(TokenKind::LBracket) {
            self.parse_expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            let line = self.line();
            self.generator.stash_array_offset(line)?;
        }
        self.expect(TokenKind::Assign, "'='")?;
        self.parse_expression()?;
        let line = self.line();
        self.generator.assign(&name.text, &self.directory, line)
    }

    fn parse_condition(&mut self) -> Result<(), SymphonyError> {
        self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'('")?;
        self.parse_expression()?;
        let line = self.line();
        self.generator.generate_boolean_structure(line, "if")?;
        self.expect(TokenKind::RParen, "')'")?;
        self.parse_block()?;

        if self.check(TokenKind::Else) || self.check(TokenKind::Elseif) {
            self.parse_elses()
        } else {
            self.generator.add_pending_if()
        }
    }

    fn parse_elses(&mut self) -> Result<(), SymphonyError> {
        if self.consume(TokenKind::Elseif) {
            self.generator.add_else_jumps()?;
            self.expect(TokenKind::LParen, "'('")?;
            self.parse_expression()?;
            let line = self.line();
            self.generator.generate_boolean_structure(line, "if")?;
            self.expect(TokenKind::RParen, "')'")?;
            self.parse_block()?;
            if self.check(TokenKind::Else) || self.check(TokenKind::Elseif) {
                self.parse_elses()?;
            } else {
                self.generator.add_pending_if()?;
            }
            self.generator.add_pending_if()
        } else {
            self.expect(TokenKind::Else, "'else'")?;
            self.generator.add_else_jumps()?;
            self.parse_block()?;
            self.generator.add_pending_if()
        }
    }

    fn parse_cycle(&mut self) -> Result<(), SymphonyError> {
        self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'('")?;
        self.generator.store_expression_position();
        self.parse_expression()?;
        let line = self.line();
        self.generator.generate_boolean_structure(line, "while")?;
        self.generator.begin_while();
        self.expect(TokenKind::RParen, "')'")?;
        self.parse_block()?;
        self.generator.add_pending_while()
    }

    fn parse_block(&mut self) -> Result<(), SymphonyError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        self.parse_statements()?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(())
    }

    // ----- calls -----

    fn parse_call(&mut self, name: Token) -> Result<(), SymphonyError> {
        self.generator
            .init_call(&name.text, &self.directory, name.line)?;
        self.expect(TokenKind::LParen, "'('")?;
        self.parse_arguments()?;
        self.expect(TokenKind::RParen, "')'")?;
        let line = self.line();
        self.generator.call(&self.directory, line)
    }

    fn parse_special_call(&mut self) -> Result<(), SymphonyError> {
        let name = self.expect(TokenKind::SpecialId, "a function name")?;
        self.generator.init_special(&name.text);
        self.expect(TokenKind::LParen, "'('")?;
        self.parse_arguments()?;
        self.expect(TokenKind::RParen, "')'")?;
        let line = self.line();
        self.generator.special_call(line)
    }

    fn parse_arguments(&mut self) -> Result<(), SymphonyError> {
        if self.check(TokenKind::RParen) {
            return Ok(());
        }
        loop {
            self.parse_expression()?;
            let line = self.line();
            self.generator.read_argument(line)?;
            if !self.consume(TokenKind::Comma) {
                break;
            }
        }
        Ok(())
    }

    // ----- expressions -----
    //
    // Precedence, low to high: `**` (right associative), unary `+`/`-`,
    // `and`/`or`, relational, `+`/`-`, `*`/`/`/`mod`, `not`, primary.

    fn parse_expression(&mut self) -> Result<(), SymphonyError> {
        self.parse_level1()?;
        if self.consume(TokenKind::Exponentiation) {
            self.parse_expression()?;
            let line = self.line();
            self.generator.operate_right(BinOp::Pow, line)?;
        }
        Ok(())
    }

    fn parse_level1(&mut self) -> Result<(), SymphonyError> {
        let op = match self.kind() {
            Some(TokenKind::Plus) => Some(UnOp::Plus),
            Some(TokenKind::Minus) => Some(UnOp::Minus),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                self.parse_level2()?;
                let line = self.line();
                self.generator.operate_unary(op, line)
            }
            None => self.parse_level2(),
        }
    }

    fn parse_level2(&mut self) -> Result<(), SymphonyError> {
        self.parse_level3()?;
        self.parse_chain(Self::logical_op, Self::parse_level3)
    }

    fn parse_level3(&mut self) -> Result<(), SymphonyError> {
        self.parse_level4()?;
        self.parse_chain(Self::relational_op, Self::parse_level4)
    }

    fn parse_level4(&mut self) -> Result<(), SymphonyError> {
        self.parse_level5()?;
        self.parse_chain(Self::additive_op, Self::parse_level5)
    }

    fn parse_level5(&mut self) -> Result<(), SymphonyError> {
        if self.consume(TokenKind::Not) {
            self.parse_level6()?;
            let line = self.line();
            return self.generator.operate_unary(UnOp::Not, line);
        }
        self.parse_level6()?;
        self.parse_chain(Self::multiplicative_op, Self::parse_level6)
    }

    /// Shared chain discipline of the left-associative levels. Later
    /// operators are collected here and handed to the generator's queue
    /// only once the whole chain is parsed, so tighter-binding chains
    /// inside an operand cannot pick them up.
    fn parse_chain(
        &mut self,
        match_op: fn(&Self) -> Option<BinOp>,
        parse_operand: fn(&mut Self) -> Result<(), SymphonyError>,
    ) -> Result<(), SymphonyError> {
        let Some(first) = match_op(self) else {
            return Ok(());
        };
        self.advance();
        parse_operand(self)?;
        let mut chained = Vec::new();
        while let Some(op) = match_op(self) {
            self.advance();
            parse_operand(self)?;
            chained.push(op);
        }
        for op in chained {
            self.generator.push_chained_operator(op);
        }
        let line = self.line();
        self.generator.operate_left(first, line)
    }

    fn logical_op(&self) -> Option<BinOp> {
        match self.kind()? {
            TokenKind::And => Some(BinOp::And),
            TokenKind::Or => Some(BinOp::Or),
            _ => None,
        }
    }

    fn relational_op(&self) -> Option<BinOp> {
        match self.kind()? {
            TokenKind::Less => Some(BinOp::Less),
            TokenKind::Greater => Some(BinOp::Greater),
            TokenKind::LessEqual => Some(BinOp::LessEqual),
            TokenKind::GreaterEqual => Some(BinOp::GreaterEqual),
            TokenKind::Equals => Some(BinOp::Equals),
            _ => None,
        }
    }

    fn additive_op(&self) -> Option<BinOp> {
        match self.kind()? {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            _ => None,
        }
    }

    fn multiplicative_op(&self) -> Option<BinOp> {
        match self.kind()? {
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Mod => Some(BinOp::Mod),
            _ => None,
        }
    }

    fn parse_level6(&mut self) -> Result<(), SymphonyError> {
        match self.kind() {
            Some(TokenKind::LParen) => {
                self.advance();
                self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(())
            }
            Some(TokenKind::IntVal) => {
                let token = self.expect(TokenKind::IntVal, "a number")?;
                let value: i64 = token.text.parse().map_err(|_| {
                    SymphonyError::grammatical(
                        token.line,
                        format!("the number {} is too large", token.text),
                    )
                })?;
                self.generator.push_constant(Value::Int(value), token.line)
            }
            Some(TokenKind::DecVal) => {
                let token = self.expect(TokenKind::DecVal, "a number")?;
                let value: f64 = token.text.parse().map_err(|_| {
                    SymphonyError::grammatical(
                        token.line,
                        format!("the number {} cannot be read", token.text),
                    )
                })?;
                self.generator.push_constant(Value::Dec(value), token.line)
            }
            Some(TokenKind::CharVal) => {
                let token = self.expect(TokenKind::CharVal, "a character")?;
                let value = token.text.chars().next().ok_or_else(|| {
                    SymphonyError::grammatical(token.line, "an empty character literal")
                })?;
                self.generator.push_constant(Value::Char(value), token.line)
            }
            Some(TokenKind::StrVal) => {
                let token = self.expect(TokenKind::StrVal, "a string")?;
                self.generator
                    .push_constant(Value::Str(token.text), token.line)
            }
            Some(TokenKind::BoolVal) => {
                let token = self.expect(TokenKind::BoolVal, "a boolean")?;
                self.generator
                    .push_constant(Value::Bool(token.text == "true"), token.line)
            }
            Some(TokenKind::Increment) => self.parse_self_update(UnOp::Increment),
            Some(TokenKind::Decrement) => self.parse_self_update(UnOp::Decrement),
            Some(TokenKind::Id) => {
                if self.peek_kind(1) == Some(TokenKind::LParen) {
                    let name = self.expect(TokenKind::Id, "a function name")?;
                    self.parse_call(name)
                } else {
                    self.parse_variable_usage()
                }
            }
            Some(TokenKind::SpecialId) => self.parse_special_call(),
            _ => Err(SymphonyError::grammatical(
                self.line(),
                match self.current() {
                    Some(token) => format!("expected a value, but found '{}'", token.text),
                    None => "expected a value, but the program ended".to_string(),
                },
            )),
        }
    }

    /// A variable reference, plain or indexed, pushed as an operand.
    fn parse_variable_usage(&mut self) -> Result<(), SymphonyError> {
        let name = self.expect(TokenKind::Id, "a variable name")?;
        if self.consume(TokenKind::LBracket) {
            self.parse_expression()?;
            self.expect(TokenKind::RBracket, "']'")?;
            let line = self.line();
            let (data_type, operand) =
                self.generator
                    .generate_access(&name.text, &self.directory, line)?;
            self.generator.push_operand(data_type, operand);
            return Ok(());
        }

        let variable = self.directory.get_variable(&name.text, name.line)?;
        match variable.kind {
            VarKind::Scalar(data_type) => {
                self.generator
                    .push_operand(data_type, Operand::direct(variable.address));
                Ok(())
            }
            VarKind::Array { .. } => Err(SymphonyError::type_error(
                name.line,
                format!(
                    "you tried to use your {} array whole; access one element \
                     with the '[]' symbols instead",
                    name.text
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphony_core::{ErrorKind, Quad};

    fn compile(source: &str) -> Result<CompiledProgram, SymphonyError> {
        Parser::new(source).parse()
    }

    #[test]
    fn test_empty_program_is_one_patched_goto() {
        let program = compile("program p;").unwrap();
        assert_eq!(program.quads.len(), 1);
        assert_eq!(program.quads[0], Quad::Goto { target: Some(1) });
    }

    #[test]
    fn test_quad_zero_jumps_over_function_bodies() {
        let program = compile(
            "program p;
             fun void beep() { A(); }
             beep();",
        )
        .unwrap();
        // GOTO main, A, ENDPROC, GOSUB
        assert_eq!(program.quads[0], Quad::Goto { target: Some(3) });
        assert!(matches!(program.quads[2], Quad::Endproc { .. }));
        assert!(matches!(program.quads[3], Quad::Gosub { .. }));
    }

    #[test]
    fn test_every_jump_lands_inside_the_program() {
        let program = compile(
            "program p;
             int n;
             n = 3;
             while (n > 0) {
                 if (n equals 2) { A(); } else { B(); }
                 n = n - 1;
             }",
        )
        .unwrap();
        let count = program.quads.len();
        for quad in &program.quads {
            if let Quad::Goto { target } | Quad::Gotof { target, .. } = quad {
                let target = target.expect("all jumps patched");
                assert!(target <= count);
            }
        }
    }

    #[test]
    fn test_same_literal_compiles_to_same_address() {
        let program = compile(
            "program p;
             int x;
             x = 5;
             x = 5 + 5;",
        )
        .unwrap();
        let fives: Vec<u32> = program
            .constants
            .iter()
            .filter(|(_, v)| **v == Value::Int(5))
            .map(|(a, _)| *a)
            .collect();
        assert_eq!(fives.len(), 1);
    }

    #[test]
    fn test_precedence_relational_binds_tighter_than_logical() {
        // 1 equals 1 and 2 equals 3 must compile; giving `and` the
        // relational results means both sides are BOOL.
        compile("program p; print(1 equals 1 and 2 equals 3);").unwrap();
    }

    #[test]
    fn test_unary_minus_before_a_literal() {
        let program = compile("program p; int x; x = -1;").unwrap();
        assert!(program
            .quads
            .iter()
            .any(|quad| matches!(quad, Quad::Unary { op: UnOp::Minus, .. })));
    }

    #[test]
    fn test_assignment_type_mismatch() {
        let err = compile("program p; int x; x = \"hi\";").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_undeclared_variable() {
        let err = compile("program p; x = 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Undeclared);
    }

    #[test]
    fn test_undeclared_function() {
        let err = compile("program p; f();").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Undeclared);
    }

    #[test]
    fn test_redeclared_variable() {
        let err = compile("program p; int x; str x;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Redeclaration);
    }

    #[test]
    fn test_break_at_top_level_is_misplaced() {
        let err = compile("program p; break;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Misplaced);
    }

    #[test]
    fn test_return_at_top_level_is_misplaced() {
        let err = compile("program p; return 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Misplaced);
    }

    #[test]
    fn test_return_in_void_function_is_misplaced() {
        let err = compile("program p; fun void f() { return 1; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Misplaced);
    }

    #[test]
    fn test_missing_return_is_misplaced() {
        let err = compile("program p; fun int f() { A(); }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Misplaced);
    }

    #[test]
    fn test_return_type_mismatch() {
        let err = compile("program p; fun int f() { return \"x\"; }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_call_arity_is_checked() {
        let err = compile(
            "program p;
             fun void f(int a) { A(); }
             f();",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Arity);
    }

    #[test]
    fn test_call_argument_types_are_checked() {
        let err = compile(
            "program p;
             fun void f(int a) { A(); }
             f(\"x\");",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_condition_must_be_boolean() {
        let err = compile("program p; if (1) { A(); }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_array_cannot_be_assigned_whole() {
        let err = compile("program p; int a[3]; a = 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_array_index_must_be_int() {
        let err = compile("program p; int a[3]; a[true] = 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_array_declaration_size_must_be_int() {
        let err = compile("program p; int a[2.5];").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_indexing_a_scalar_fails() {
        let err = compile("program p; int x; x[0] = 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_array_assignment_emits_ver_and_access() {
        let program = compile("program p; int a[3]; a[1] = 5;").unwrap();
        assert!(program
            .quads
            .iter()
            .any(|quad| matches!(quad, Quad::Ver { upper: 3, .. })));
        assert!(program
            .quads
            .iter()
            .any(|quad| matches!(quad, Quad::Access { .. })));
        // The final assignment writes through the pointer.
        assert!(program.quads.iter().any(|quad| matches!(
            quad,
            Quad::Assign {
                dest: Operand { indirect: true, .. },
                ..
            }
        )));
    }

    #[test]
    fn test_void_call_in_expression_is_a_type_error() {
        let err = compile(
            "program p;
             int x;
             fun void f() { A(); }
             x = f();",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_reserved_but_unimplemented_builtin() {
        let err = compile("program p; read();").unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotImplemented);
    }

    #[test]
    fn test_copy_rejects_expression_destination() {
        let err = compile(
            "program p;
             str s;
             copy(\"x\" + \"y\", s);",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
    }

    #[test]
    fn test_copy_accepts_variable_destination() {
        compile(
            "program p;
             str s, t;
             s = \"x\";
             copy(t, s);",
        )
        .unwrap();
    }

    #[test]
    fn test_parse_error_is_grammatical() {
        let err = compile("program p; int x = ;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Grammatical);
    }

    #[test]
    fn test_missing_program_header_is_grammatical() {
        let err = compile("int x;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Grammatical);
    }

    #[test]
    fn test_recursive_call_before_return_is_patched() {
        let program = compile(
            "program p;
             fun int f(int n) {
                 int acc;
                 acc = 1;
                 if (n > 1) { acc = n * f(n - 1); }
                 return acc;
             }
             print(f(5));",
        )
        .unwrap();
        let function = &program.functions["f"];
        let slot = function.return_address.expect("return slot assigned");
        // The self-recursive call site reads from the return slot.
        let reads_slot = program.quads.iter().any(|quad| {
            matches!(quad, Quad::Assign { src, .. } if src.address == slot && !src.indirect)
        });
        assert!(reads_slot);
    }

    #[test]
    fn test_chained_subtraction_is_left_associative() {
        // 10 - 3 - 2: ((10 - 3) - 2), so the second quad's left operand is
        // the first quad's destination.
        let program = compile("program p; print(10 - 3 - 2);").unwrap();
        let subs: Vec<&Quad> = program
            .quads
            .iter()
            .filter(|quad| matches!(quad, Quad::Binary { op: BinOp::Sub, .. }))
            .collect();
        assert_eq!(subs.len(), 2);
        let Quad::Binary { dest: first_dest, .. } = subs[0] else {
            unreachable!()
        };
        let Quad::Binary { left: second_left, .. } = subs[1] else {
            unreachable!()
        };
        assert_eq!(first_dest, second_left);
    }
}
