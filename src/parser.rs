//! Parser for JavaScript source code
//!
//! Uses recursive descent with Pratt parsing for expressions.

use std::rc::Rc;

use crate::ast::*;
use crate::error::JsError;
use crate::lexer::{keyword_text, Lexer, LexerCheckpoint, Span, Token, TokenKind};
use crate::value::{number_to_string, JsString};

/// Saved parser position for arrow-function lookahead
struct ParserCheckpoint {
    lexer: LexerCheckpoint,
    current: Token,
    previous: Token,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    /// Disables the `in` operator while parsing a `for (...)` head
    no_in: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::eof(0, 1, 1),
            no_in: false,
        }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(self.parse_statement()?);
        }

        Ok(Program { body })
    }

    /// Byte offset just past the `{ ... }` block that starts the source
    pub fn block_end(&mut self) -> Result<usize, JsError> {
        self.parse_block()?;
        Ok(self.previous.span.end)
    }

    /// Source text of each parameter in the `( ... )` list that starts the
    /// source, and the byte offset just past the closing parenthesis
    pub fn param_list(&mut self) -> Result<(Vec<String>, usize), JsError> {
        self.require_token(&TokenKind::LParen)?;
        let params = self
            .parse_spanned_params()?
            .into_iter()
            .map(|(_, span)| self.lexer.source().get(span.start..span.end).unwrap_or("").to_string())
            .collect();
        Ok((params, self.previous.span.end))
    }

    /// Byte offset just past the assignment expression that starts the source
    pub fn expression_end(&mut self) -> Result<usize, JsError> {
        let expr = self.parse_assignment_expression()?;
        Ok(expr.span().end)
    }

    // ============ STATEMENTS ============

    fn parse_statement(&mut self) -> Result<Statement, JsError> {
        crate::with_stack(|| self.parse_statement_step())
    }

    fn parse_statement_step(&mut self) -> Result<Statement, JsError> {
        if self.check_identifier() && self.peek_is(&TokenKind::Colon) {
            let label = self.parse_identifier()?;
            self.advance();
            let body = Box::new(self.parse_statement()?);
            return Ok(Statement::Labeled { label, body });
        }

        let statement = match &self.current.kind {
            TokenKind::Let | TokenKind::Const | TokenKind::Var => {
                Statement::Declaration(self.parse_declaration()?)
            }
            TokenKind::Function => return Ok(Statement::Function(self.parse_function(true)?)),
            TokenKind::LBrace => return Ok(Statement::Block(self.parse_block()?)),
            TokenKind::If => return self.parse_if(),
            TokenKind::For => return self.parse_for(),
            TokenKind::Switch => return self.parse_switch(),
            TokenKind::Try => return self.parse_try(),
            TokenKind::While => {
                self.advance();
                let test = self.parse_condition()?;
                let body = Box::new(self.parse_statement()?);
                return Ok(Statement::Loop(Loop {
                    head: LoopHead::While(test),
                    body,
                }));
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.parse_statement()?);
                self.require_token(&TokenKind::While)?;
                let test = self.parse_condition()?;
                // `do x; while (y) z` needs no semicolon after the condition
                self.match_token(&TokenKind::Semicolon);
                return Ok(Statement::Loop(Loop {
                    head: LoopHead::DoWhile(test),
                    body,
                }));
            }
            TokenKind::Return => {
                self.advance();
                let ends_here = self.check(&TokenKind::Semicolon)
                    || self.check(&TokenKind::RBrace)
                    || self.is_at_end()
                    || self.lexer.had_newline_before();
                Statement::Return(if ends_here {
                    None
                } else {
                    Some(Rc::new(self.parse_expression()?))
                })
            }
            TokenKind::Break => Statement::Break(self.parse_jump_label()?),
            TokenKind::Continue => Statement::Continue(self.parse_jump_label()?),
            TokenKind::Throw => {
                self.advance();
                if self.lexer.had_newline_before() {
                    return Err(self.error("Illegal newline after throw"));
                }
                Statement::Throw(Rc::new(self.parse_expression()?))
            }
            TokenKind::Semicolon => {
                self.advance();
                return Ok(Statement::Empty);
            }
            _ => Statement::Expression(Rc::new(self.parse_expression()?)),
        };
        self.expect_semicolon()?;
        Ok(statement)
    }

    /// `( expression )` as used by `if`, `while` and `switch`
    fn parse_condition(&mut self) -> Result<Rc<Expression>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;
        Ok(Rc::new(test))
    }

    fn variable_kind(&self) -> Option<VariableKind> {
        match self.current.kind {
            TokenKind::Var => Some(VariableKind::Var),
            TokenKind::Let => Some(VariableKind::Let),
            TokenKind::Const => Some(VariableKind::Const),
            _ => None,
        }
    }

    /// Parse `var|let|const a = 1, b` without the trailing semicolon
    fn parse_declaration(&mut self) -> Result<Declaration, JsError> {
        let Some(kind) = self.variable_kind() else {
            return Err(self.unexpected_token("variable declaration"));
        };
        self.advance();

        let mut bindings = Vec::new();
        loop {
            let name = self.parse_identifier()?;
            let init = if self.match_token(&TokenKind::Eq) {
                Some(Rc::new(self.parse_assignment_expression()?))
            } else {
                None
            };
            bindings.push((name, init));
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Declaration { kind, bindings })
    }

    /// Parse `function [name](params) { body }`
    fn parse_function(&mut self, declaration: bool) -> Result<Rc<FunctionNode>, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::Function)?;

        let name = if self.check_identifier() {
            Some(self.parse_identifier()?)
        } else if declaration {
            return Err(self.unexpected_token("function name"));
        } else {
            None
        };

        self.require_token(&TokenKind::LParen)?;
        let params = self.parse_function_params()?;
        let body = self.parse_block()?;

        Ok(Rc::new(FunctionNode {
            name,
            params,
            body: FunctionBody::Block(body),
            arrow: false,
            source: self.source_from(start),
            span: self.span_from(start),
        }))
    }

    /// Parse parameters after the opening parenthesis, consuming the closing one
    fn parse_function_params(&mut self) -> Result<Vec<FunctionParam>, JsError> {
        Ok(self.parse_spanned_params()?.into_iter().map(|(param, _)| param).collect())
    }

    fn parse_spanned_params(&mut self) -> Result<Vec<(FunctionParam, Span)>, JsError> {
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let start = self.current.span;
            let rest = self.match_token(&TokenKind::DotDotDot);
            let name = self.parse_identifier()?;
            let default = if !rest && self.match_token(&TokenKind::Eq) {
                Some(Rc::new(self.parse_assignment_expression()?))
            } else {
                None
            };
            params.push((
                FunctionParam {
                    name,
                    default,
                    rest,
                },
                self.span_from(start),
            ));
            if rest || !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, JsError> {
        self.require_token(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            body.push(self.parse_statement()?);
        }
        self.require_token(&TokenKind::RBrace)?;
        Ok(body)
    }

    fn parse_if(&mut self) -> Result<Statement, JsError> {
        self.advance();
        let test = self.parse_condition()?;
        let then = Box::new(self.parse_statement()?);
        let otherwise = if self.match_token(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            test,
            then,
            otherwise,
        })
    }

    fn parse_for(&mut self) -> Result<Statement, JsError> {
        self.advance();
        self.require_token(&TokenKind::LParen)?;

        let head = match self.parse_for_each_head()? {
            Some(head) => head,
            None => {
                let init = self.parse_for_init()?;
                self.require_token(&TokenKind::Semicolon)?;
                let test = self.parse_optional_expression(&TokenKind::Semicolon)?;
                self.require_token(&TokenKind::Semicolon)?;
                let update = self.parse_optional_expression(&TokenKind::RParen)?;
                LoopHead::For { init, test, update }
            }
        };
        self.require_token(&TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Statement::Loop(Loop { head, body }))
    }

    /// The initializer of `for (init; ...)`, where `in` is not an operator
    fn parse_for_init(&mut self) -> Result<Option<ForInit>, JsError> {
        if self.check(&TokenKind::Semicolon) {
            return Ok(None);
        }
        self.no_in = true;
        let init = if self.variable_kind().is_some() {
            self.parse_declaration().map(ForInit::Declaration)
        } else {
            self.parse_expression().map(|expr| ForInit::Expression(Rc::new(expr)))
        };
        self.no_in = false;
        init.map(Some)
    }

    fn parse_optional_expression(&mut self, end: &TokenKind) -> Result<Option<Rc<Expression>>, JsError> {
        if self.check(end) {
            Ok(None)
        } else {
            Ok(Some(Rc::new(self.parse_expression()?)))
        }
    }

    /// Try `[kind] name in|of expr`, restoring the position when the head
    /// turns out to be a plain `for (;;)` initializer.
    fn parse_for_each_head(&mut self) -> Result<Option<LoopHead>, JsError> {
        let checkpoint = self.checkpoint();
        let declared = self.variable_kind().is_some();
        if declared {
            self.advance();
        }
        let TokenKind::Identifier(name) = self.current.kind.clone() else {
            self.restore(checkpoint);
            return Ok(None);
        };
        self.advance();

        let binding = ForBinding { declared, name };
        if self.match_token(&TokenKind::In) {
            let right = Rc::new(self.parse_expression()?);
            Ok(Some(LoopHead::ForIn(binding, right)))
        } else if self.check_keyword("of") {
            self.advance();
            let right = Rc::new(self.parse_assignment_expression()?);
            Ok(Some(LoopHead::ForOf(binding, right)))
        } else {
            self.restore(checkpoint);
            Ok(None)
        }
    }

    fn parse_switch(&mut self) -> Result<Statement, JsError> {
        self.advance();
        let discriminant = self.parse_condition()?;
        self.require_token(&TokenKind::LBrace)?;

        let mut cases: Vec<SwitchCase> = Vec::new();
        while !self.match_token(&TokenKind::RBrace) {
            let test = if self.match_token(&TokenKind::Case) {
                Some(Rc::new(self.parse_expression()?))
            } else if self.match_token(&TokenKind::Default) {
                if cases.iter().any(|case| case.test.is_none()) {
                    return Err(self.error("More than one default clause in switch statement"));
                }
                None
            } else {
                return Err(self.unexpected_token("case or default"));
            };
            self.require_token(&TokenKind::Colon)?;

            let mut body = Vec::new();
            while !matches!(
                self.current.kind,
                TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
            ) {
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }

        Ok(Statement::Switch {
            discriminant,
            cases,
        })
    }

    fn parse_try(&mut self) -> Result<Statement, JsError> {
        self.advance();
        let block = self.parse_block()?;

        let catch = if self.match_token(&TokenKind::Catch) {
            let param = if self.match_token(&TokenKind::LParen) {
                let name = self.parse_identifier()?;
                self.require_token(&TokenKind::RParen)?;
                Some(name)
            } else {
                None
            };
            Some((param, self.parse_block()?))
        } else {
            None
        };
        let finally = if self.match_token(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if catch.is_none() && finally.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try(Box::new(TryStatement {
            block,
            catch,
            finally,
        })))
    }

    /// The optional label after `break` or `continue`
    fn parse_jump_label(&mut self) -> Result<Option<JsString>, JsError> {
        self.advance();
        if self.check_identifier() && !self.lexer.had_newline_before() {
            Ok(Some(self.parse_identifier()?))
        } else {
            Ok(None)
        }
    }

    // ============ EXPRESSIONS ============

    fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let expr = self.parse_assignment_expression()?;

        if !self.check(&TokenKind::Comma) {
            return Ok(expr);
        }

        let mut expressions = vec![Rc::new(expr)];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(Rc::new(self.parse_assignment_expression()?));
        }
        let span = self.span_from(start);
        Ok(Expression::Sequence(SequenceExpression { expressions, span }))
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        crate::with_stack(|| self.parse_assignment_step())
    }

    fn parse_assignment_step(&mut self) -> Result<Expression, JsError> {
        if let Some(arrow) = self.try_parse_arrow_function()? {
            return Ok(arrow);
        }

        let start = self.current.span;
        let expr = self.parse_conditional_expression()?;

        if let Some(operator) = self.current_assignment_op() {
            if !matches!(expr, Expression::Identifier(_) | Expression::Member(_)) {
                return Err(JsError::syntax_error(
                    "Invalid left-hand side in assignment",
                    start.line,
                    start.column,
                ));
            }
            self.advance();
            let value = Rc::new(self.parse_assignment_expression()?);
            let span = self.span_from(start);
            return Ok(Expression::Assignment(AssignmentExpression {
                operator,
                target: Rc::new(expr),
                value,
                span,
            }));
        }

        Ok(expr)
    }

    /// Arrow functions: `x => ...` or `(a, b = 1, ...rest) => ...`
    fn try_parse_arrow_function(&mut self) -> Result<Option<Expression>, JsError> {
        let start = self.current.span;

        let params = if self.check_identifier() && self.peek_is(&TokenKind::Arrow) {
            let name = self.parse_identifier()?;
            vec![FunctionParam {
                name,
                default: None,
                rest: false,
            }]
        } else if self.check(&TokenKind::LParen) {
            let checkpoint = self.checkpoint();
            self.advance();
            match self.parse_function_params() {
                Ok(params) if self.check(&TokenKind::Arrow) => params,
                _ => {
                    self.restore(checkpoint);
                    return Ok(None);
                }
            }
        } else {
            return Ok(None);
        };

        if self.lexer.had_newline_before() {
            return Err(self.error("No line break is allowed before '=>'"));
        }
        self.require_token(&TokenKind::Arrow)?;

        let body = if self.check(&TokenKind::LBrace) {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expression(Rc::new(self.parse_assignment_expression()?))
        };

        Ok(Some(Expression::Function(Rc::new(FunctionNode {
            name: None,
            params,
            body,
            arrow: true,
            source: self.source_from(start),
            span: self.span_from(start),
        }))))
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let test = self.parse_binary_expression(0)?;

        if self.match_token(&TokenKind::Question) {
            let no_in = std::mem::replace(&mut self.no_in, false);
            let consequent = self.parse_assignment_expression();
            self.no_in = no_in;
            let consequent = Rc::new(consequent?);
            self.require_token(&TokenKind::Colon)?;
            let alternate = Rc::new(self.parse_assignment_expression()?);
            let span = self.span_from(start);
            return Ok(Expression::Conditional(ConditionalExpression {
                test: Rc::new(test),
                consequent,
                alternate,
                span,
            }));
        }

        Ok(test)
    }

    /// Pratt parser for binary and logical expressions
    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut left = self.parse_unary_expression()?;

        while let Some((op, prec)) = self.current_binary_op() {
            if prec < min_prec {
                break;
            }
            self.advance();

            // `**` is right associative
            let right_assoc = matches!(op, Operator::Binary(BinaryOp::Exp));
            let next_prec = if right_assoc { prec } else { prec + 1 };
            let right = Rc::new(self.parse_binary_expression(next_prec)?);

            let span = self.span_from(start);
            left = match op {
                Operator::Binary(operator) => Expression::Binary(BinaryExpression {
                    operator,
                    left: Rc::new(left),
                    right,
                    span,
                }),
                Operator::Logical(operator) => Expression::Logical(LogicalExpression {
                    operator,
                    left: Rc::new(left),
                    right,
                    span,
                }),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        crate::with_stack(|| self.parse_unary_step())
    }

    fn parse_unary_step(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        if let Some(operator) = self.current_unary_op() {
            self.advance();
            let argument = Rc::new(self.parse_unary_expression()?);
            let span = self.span_from(start);
            return Ok(Expression::Unary(UnaryExpression {
                operator,
                argument,
                span,
            }));
        }

        if let Some(operator) = self.current_update_op() {
            self.advance();
            let argument = self.parse_unary_expression()?;
            self.require_simple_target(&argument)?;
            let span = self.span_from(start);
            return Ok(Expression::Update(UpdateExpression {
                operator,
                prefix: true,
                argument: Rc::new(argument),
                span,
            }));
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let expr = self.parse_left_hand_side_expression()?;

        if !self.lexer.had_newline_before() {
            if let Some(operator) = self.current_update_op() {
                self.require_simple_target(&expr)?;
                self.advance();
                let span = self.span_from(start);
                return Ok(Expression::Update(UpdateExpression {
                    operator,
                    prefix: false,
                    argument: Rc::new(expr),
                    span,
                }));
            }
        }

        Ok(expr)
    }

    fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        let mut expr = if self.match_token(&TokenKind::New) {
            let callee = Rc::new(self.parse_member_expression()?);
            let arguments = if self.check(&TokenKind::LParen) {
                self.parse_call_arguments()?
            } else {
                vec![]
            };
            let span = self.span_from(start);
            Expression::New(CallExpression {
                callee,
                arguments,
                optional: false,
                span,
            })
        } else {
            self.parse_member_expression()?
        };

        loop {
            if self.check(&TokenKind::LParen) {
                let arguments = self.parse_call_arguments()?;
                let span = self.span_from(start);
                expr = Expression::Call(CallExpression {
                    callee: Rc::new(expr),
                    arguments,
                    optional: false,
                    span,
                });
            } else if self.match_token(&TokenKind::QuestionDot) {
                if self.check(&TokenKind::LParen) {
                    let arguments = self.parse_call_arguments()?;
                    let span = self.span_from(start);
                    expr = Expression::Call(CallExpression {
                        callee: Rc::new(expr),
                        arguments,
                        optional: true,
                        span,
                    });
                } else {
                    let property = if self.match_token(&TokenKind::LBracket) {
                        let property = self.parse_expression()?;
                        self.require_token(&TokenKind::RBracket)?;
                        MemberProperty::Expression(Rc::new(property))
                    } else {
                        MemberProperty::Identifier(self.parse_identifier_name()?)
                    };
                    let span = self.span_from(start);
                    expr = Expression::Member(MemberExpression {
                        object: Rc::new(expr),
                        property,
                        optional: true,
                        span,
                    });
                }
            } else if let Some(member) = self.parse_member_suffix(&expr, start)? {
                expr = member;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_member_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        let mut expr = self.parse_primary_expression()?;

        while let Some(member) = self.parse_member_suffix(&expr, start)? {
            expr = member;
        }

        Ok(expr)
    }

    /// Parse one `.name` or `[expr]` suffix applied to `object`
    fn parse_member_suffix(
        &mut self,
        object: &Expression,
        start: Span,
    ) -> Result<Option<Expression>, JsError> {
        let property = if self.match_token(&TokenKind::Dot) {
            MemberProperty::Identifier(self.parse_identifier_name()?)
        } else if self.match_token(&TokenKind::LBracket) {
            let no_in = std::mem::replace(&mut self.no_in, false);
            let property = self.parse_expression();
            self.no_in = no_in;
            self.require_token(&TokenKind::RBracket)?;
            MemberProperty::Expression(Rc::new(property?))
        } else {
            return Ok(None);
        };

        let span = self.span_from(start);
        Ok(Some(Expression::Member(MemberExpression {
            object: Rc::new(object.clone()),
            property,
            optional: false,
            span,
        })))
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;

        let literal = match &self.current.kind {
            TokenKind::Number(n) => Some(LiteralValue::Number(*n)),
            TokenKind::String(s) => Some(LiteralValue::String(s.clone())),
            TokenKind::True => Some(LiteralValue::Boolean(true)),
            TokenKind::False => Some(LiteralValue::Boolean(false)),
            TokenKind::Null => Some(LiteralValue::Null),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expression::Literal(Literal {
                value,
                span: self.span_from(start),
            }));
        }

        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Expression::Identifier(Identifier {
                    name,
                    span: self.span_from(start),
                }))
            }
            TokenKind::This => {
                self.advance();
                Ok(Expression::This(start))
            }
            TokenKind::Slash | TokenKind::SlashEq => {
                self.current = self.lexer.rescan_as_regexp(self.current.span);
                let TokenKind::RegExp(pattern, flags) = self.current.kind.clone() else {
                    return Err(self.error("Invalid regular expression: missing /"));
                };
                self.advance();
                Ok(Expression::Literal(Literal {
                    value: LiteralValue::RegExp {
                        pattern: JsString::from(pattern),
                        flags: JsString::from(flags),
                    },
                    span: self.span_from(start),
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let no_in = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_expression();
                self.no_in = no_in;
                let expr = expr?;
                self.require_token(&TokenKind::RParen)?;
                Ok(Expression::Parenthesized(Rc::new(expr), self.span_from(start)))
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Function => Ok(Expression::Function(self.parse_function(false)?)),
            TokenKind::TemplateNoSub(text) => {
                let quasis = vec![text.clone()];
                self.advance();
                Ok(Expression::Template(TemplateLiteral {
                    quasis,
                    expressions: vec![],
                    span: self.span_from(start),
                }))
            }
            TokenKind::TemplateHead(text) => {
                let head = text.clone();
                self.parse_template_literal(head, start)
            }
            _ => Err(self.unexpected_token("expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBracket)?;

        let mut elements = Vec::new();
        while !self.check(&TokenKind::RBracket) {
            if self.check(&TokenKind::Comma) {
                self.advance();
                elements.push(ArrayElement::Hole);
                continue;
            }
            elements.push(self.parse_element()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RBracket)?;

        let span = self.span_from(start);
        Ok(Expression::Array(ArrayExpression { elements, span }))
    }

    fn parse_element(&mut self) -> Result<ArrayElement, JsError> {
        if self.match_token(&TokenKind::DotDotDot) {
            Ok(ArrayElement::Spread(Rc::new(
                self.parse_assignment_expression()?,
            )))
        } else {
            Ok(ArrayElement::Expression(Rc::new(
                self.parse_assignment_expression()?,
            )))
        }
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        let start = self.current.span;
        self.require_token(&TokenKind::LBrace)?;

        let mut properties = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            properties.push(self.parse_property()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RBrace)?;

        let span = self.span_from(start);
        Ok(Expression::Object(ObjectExpression { properties, span }))
    }

    fn parse_property(&mut self) -> Result<Property, JsError> {
        if self.match_token(&TokenKind::DotDotDot) {
            return Ok(Property::Spread(Rc::new(
                self.parse_assignment_expression()?,
            )));
        }

        let start = self.current.span;
        let shorthand = match &self.current.kind {
            TokenKind::Identifier(name) => Some(name.clone()),
            _ => None,
        };
        let key = self.parse_property_name()?;

        if self.match_token(&TokenKind::Colon) {
            let value = Rc::new(self.parse_assignment_expression()?);
            return Ok(Property::KeyValue { key, value });
        }

        // Method shorthand: `name(a, b) { ... }`
        if self.match_token(&TokenKind::LParen) {
            let params = self.parse_function_params()?;
            let body = self.parse_block()?;
            let name = match &key {
                PropertyKey::Static(name) => Some(name.clone()),
                PropertyKey::Computed(_) => None,
            };
            let value = Expression::Function(Rc::new(FunctionNode {
                name,
                params,
                body: FunctionBody::Block(body),
                arrow: false,
                source: self.source_from(start),
                span: self.span_from(start),
            }));
            return Ok(Property::KeyValue {
                key,
                value: Rc::new(value),
            });
        }

        match shorthand {
            Some(name) => Ok(Property::KeyValue {
                key,
                value: Rc::new(Expression::Identifier(Identifier {
                    name,
                    span: self.span_from(start),
                })),
            }),
            None => Err(self.unexpected_token("':'")),
        }
    }

    fn parse_property_name(&mut self) -> Result<PropertyKey, JsError> {
        let key = match &self.current.kind {
            TokenKind::Identifier(name) | TokenKind::String(name) => name.clone(),
            TokenKind::Number(n) => JsString::from(number_to_string(*n)),
            TokenKind::LBracket => {
                self.advance();
                let expr = self.parse_assignment_expression()?;
                self.require_token(&TokenKind::RBracket)?;
                return Ok(PropertyKey::Computed(Rc::new(expr)));
            }
            kind => match keyword_text(kind) {
                Some(text) => JsString::from(text),
                None => return Err(self.unexpected_token("property name")),
            },
        };
        self.advance();
        Ok(PropertyKey::Static(key))
    }

    /// Parse a template literal whose head token is current
    fn parse_template_literal(
        &mut self,
        head: JsString,
        start: Span,
    ) -> Result<Expression, JsError> {
        let mut quasis = vec![head];
        let mut expressions = Vec::new();
        self.advance();

        loop {
            let no_in = std::mem::replace(&mut self.no_in, false);
            let expr = self.parse_expression();
            self.no_in = no_in;
            expressions.push(Rc::new(expr?));

            if !self.check(&TokenKind::RBrace) {
                return Err(self.unexpected_token("'}' in template literal"));
            }
            self.current = self.lexer.rescan_template_continuation(self.current.span);
            match self.current.kind.clone() {
                TokenKind::TemplateMiddle(text) => {
                    quasis.push(text);
                    self.advance();
                }
                TokenKind::TemplateTail(text) => {
                    quasis.push(text);
                    self.advance();
                    break;
                }
                _ => return Err(self.error("Unterminated template literal")),
            }
        }

        let span = self.span_from(start);
        Ok(Expression::Template(TemplateLiteral {
            quasis,
            expressions,
            span,
        }))
    }

    fn parse_call_arguments(&mut self) -> Result<Vec<ArrayElement>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let no_in = std::mem::replace(&mut self.no_in, false);

        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RParen) {
            match self.parse_element() {
                Ok(element) => arguments.push(element),
                Err(e) => {
                    self.no_in = no_in;
                    return Err(e);
                }
            }
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.no_in = no_in;
        self.require_token(&TokenKind::RParen)?;
        Ok(arguments)
    }

    // ============ HELPERS ============

    fn parse_identifier(&mut self) -> Result<JsString, JsError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected_token("identifier")),
        }
    }

    /// After a dot any identifier or keyword can be used as a property name
    fn parse_identifier_name(&mut self) -> Result<JsString, JsError> {
        if let Some(text) = keyword_text(&self.current.kind) {
            self.advance();
            return Ok(JsString::from(text));
        }
        self.parse_identifier()
    }

    fn require_simple_target(&self, expr: &Expression) -> Result<(), JsError> {
        match expr {
            Expression::Identifier(_) | Expression::Member(_) => Ok(()),
            other => {
                let span = other.span();
                Err(JsError::syntax_error(
                    "Invalid left-hand side expression in update operation",
                    span.line,
                    span.column,
                ))
            }
        }
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            lexer: self.lexer.checkpoint(),
            current: self.current.clone(),
            previous: self.previous.clone(),
        }
    }

    fn restore(&mut self, checkpoint: ParserCheckpoint) {
        self.lexer.restore(checkpoint.lexer);
        self.current = checkpoint.current;
        self.previous = checkpoint.previous;
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), JsError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&format!("{:?}", kind)))
        }
    }

    fn expect_semicolon(&mut self) -> Result<(), JsError> {
        if self.match_token(&TokenKind::Semicolon) {
            return Ok(());
        }

        // ASI: accept if at end, before }, or after newline
        if self.is_at_end() || self.check(&TokenKind::RBrace) || self.lexer.had_newline_before() {
            return Ok(());
        }

        Err(self.unexpected_token("';'"))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    /// Check if the next token (after current) is of the given kind
    fn peek_is(&mut self, kind: &TokenKind) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        self.lexer.restore(checkpoint);
        std::mem::discriminant(&next.kind) == std::mem::discriminant(kind)
    }

    fn check_identifier(&self) -> bool {
        matches!(self.current.kind, TokenKind::Identifier(_))
    }

    fn check_keyword(&self, keyword: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(s) if s == keyword)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start,
            self.previous.span.end,
            start.line,
            start.column,
        )
    }

    fn source_from(&self, start: Span) -> JsString {
        let text = self
            .lexer
            .source()
            .get(start.start..self.previous.span.end)
            .unwrap_or("");
        JsString::from(text)
    }

    fn error(&self, message: &str) -> JsError {
        JsError::syntax_error(message, self.current.span.line, self.current.span.column)
    }

    fn unexpected_token(&self, expected: &str) -> JsError {
        let found = match &self.current.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Invalid(c) => format!("invalid token {:?}", c),
            other => format!("{:?}", other),
        };
        JsError::syntax_error(
            format!("Unexpected {}, expected {}", found, expected),
            self.current.span.line,
            self.current.span.column,
        )
    }

    fn current_binary_op(&self) -> Option<(Operator, u8)> {
        let op = match &self.current.kind {
            TokenKind::PipePipe => (Operator::Logical(LogicalOp::Or), 4),
            TokenKind::QuestionQuestion => (Operator::Logical(LogicalOp::NullishCoalescing), 4),
            TokenKind::AmpAmp => (Operator::Logical(LogicalOp::And), 5),
            TokenKind::Pipe => (Operator::Binary(BinaryOp::BitOr), 6),
            TokenKind::Caret => (Operator::Binary(BinaryOp::BitXor), 7),
            TokenKind::Amp => (Operator::Binary(BinaryOp::BitAnd), 8),
            TokenKind::EqEq => (Operator::Binary(BinaryOp::Eq), 9),
            TokenKind::BangEq => (Operator::Binary(BinaryOp::NotEq), 9),
            TokenKind::EqEqEq => (Operator::Binary(BinaryOp::StrictEq), 9),
            TokenKind::BangEqEq => (Operator::Binary(BinaryOp::StrictNotEq), 9),
            TokenKind::Lt => (Operator::Binary(BinaryOp::Lt), 10),
            TokenKind::LtEq => (Operator::Binary(BinaryOp::LtEq), 10),
            TokenKind::Gt => (Operator::Binary(BinaryOp::Gt), 10),
            TokenKind::GtEq => (Operator::Binary(BinaryOp::GtEq), 10),
            TokenKind::In if !self.no_in => (Operator::Binary(BinaryOp::In), 10),
            TokenKind::Instanceof => (Operator::Binary(BinaryOp::Instanceof), 10),
            TokenKind::LtLt => (Operator::Binary(BinaryOp::LShift), 11),
            TokenKind::GtGt => (Operator::Binary(BinaryOp::RShift), 11),
            TokenKind::GtGtGt => (Operator::Binary(BinaryOp::URShift), 11),
            TokenKind::Plus => (Operator::Binary(BinaryOp::Add), 12),
            TokenKind::Minus => (Operator::Binary(BinaryOp::Sub), 12),
            TokenKind::Star => (Operator::Binary(BinaryOp::Mul), 13),
            TokenKind::Slash => (Operator::Binary(BinaryOp::Div), 13),
            TokenKind::Percent => (Operator::Binary(BinaryOp::Mod), 13),
            TokenKind::StarStar => (Operator::Binary(BinaryOp::Exp), 14),
            _ => return None,
        };
        Some(op)
    }

    fn current_unary_op(&self) -> Option<UnaryOp> {
        match &self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        }
    }

    fn current_update_op(&self) -> Option<UpdateOp> {
        match &self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn current_assignment_op(&self) -> Option<AssignmentOp> {
        let op = match &self.current.kind {
            TokenKind::Eq => AssignmentOp::Assign,
            TokenKind::PlusEq => AssignmentOp::Binary(BinaryOp::Add),
            TokenKind::MinusEq => AssignmentOp::Binary(BinaryOp::Sub),
            TokenKind::StarEq => AssignmentOp::Binary(BinaryOp::Mul),
            TokenKind::SlashEq => AssignmentOp::Binary(BinaryOp::Div),
            TokenKind::PercentEq => AssignmentOp::Binary(BinaryOp::Mod),
            TokenKind::StarStarEq => AssignmentOp::Binary(BinaryOp::Exp),
            TokenKind::AmpEq => AssignmentOp::Binary(BinaryOp::BitAnd),
            TokenKind::PipeEq => AssignmentOp::Binary(BinaryOp::BitOr),
            TokenKind::CaretEq => AssignmentOp::Binary(BinaryOp::BitXor),
            TokenKind::LtLtEq => AssignmentOp::Binary(BinaryOp::LShift),
            TokenKind::GtGtEq => AssignmentOp::Binary(BinaryOp::RShift),
            TokenKind::GtGtGtEq => AssignmentOp::Binary(BinaryOp::URShift),
            TokenKind::AmpAmpEq => AssignmentOp::Logical(LogicalOp::And),
            TokenKind::PipePipeEq => AssignmentOp::Logical(LogicalOp::Or),
            TokenKind::QuestionQuestionEq => AssignmentOp::Logical(LogicalOp::NullishCoalescing),
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Clone, Copy)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}
