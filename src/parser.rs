//! Recursive-descent parser for the C dialect.
//!
//! The parser does not know the full C grammar. It carries a mutable set of
//! known type names, seeded with the primitive types and grown by `typedef`
//! declarations, parameter lists, and the `identifier identifier` /
//! `identifier * identifier` statement heuristics. Statements it cannot
//! classify are skipped up to the next top-level semicolon so that one
//! unknown construct never poisons a whole file.

use std::collections::BTreeSet;
use std::path::Path;

use log::{debug, info};

use crate::c_ast::{Case, CType, Expr, Param, Stmt, VarDecl};
use crate::errors::{GenError, Result, SourceLocation};
use crate::tokenizer::{define_macro, MacroTable, Token, TokenKind, Tokenizer};

const PRIMITIVE_TYPES: &[&str] = &[
    "char", "double", "float", "int", "long", "short", "unsigned", "void",
];

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
    pub types: BTreeSet<String>,
    pub structs: BTreeSet<String>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            index: 0,
            types: PRIMITIVE_TYPES.iter().map(|s| s.to_string()).collect(),
            structs: BTreeSet::new(),
        }
    }

    pub fn add_type(&mut self, name: impl Into<String>) {
        self.types.insert(name.into());
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek(0) == Some(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn match_kv(&mut self, kind: TokenKind, value: &str) -> bool {
        if self.peek(0) == Some(kind) && self.peek_value(0) == Some(value) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn next_name(&mut self) -> Result<String> {
        match self.next_token() {
            Some(token) if token.kind == TokenKind::Identifier => Ok(token.text),
            Some(token) => Err(GenError::parse(
                format!("name expected, but '{}' found", token.text),
                SourceLocation::at(token.pos),
            )),
            None => Err(GenError::parse(
                "name expected, but end of input found",
                self.pos(),
            )),
        }
    }

    pub fn has_next(&self) -> bool {
        self.index < self.tokens.len()
    }

    fn peek(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.index + offset).map(|t| t.kind)
    }

    fn peek_seq(&self, count: usize) -> Vec<TokenKind> {
        self.tokens[self.index.min(self.tokens.len())..]
            .iter()
            .take(count)
            .map(|t| t.kind)
            .collect()
    }

    fn peek_value(&self, offset: usize) -> Option<&str> {
        self.tokens.get(self.index + offset).map(|t| t.text.as_str())
    }

    fn pos(&self) -> SourceLocation {
        match self.tokens.get(self.index) {
            Some(token) => SourceLocation::at(token.pos),
            None => SourceLocation::unknown(),
        }
    }

    /// Skips everything up to the next semicolon at bracket level zero.
    fn skip_statement(&mut self) {
        let mut level: i32 = 0;
        loop {
            if level == 0 && self.match_kind(TokenKind::Semicolon) {
                return;
            }
            match self.next_token() {
                Some(token) => match token.kind {
                    TokenKind::LeftPar | TokenKind::LeftBrace | TokenKind::LeftBracket => {
                        level += 1
                    }
                    TokenKind::RightPar | TokenKind::RightBrace | TokenKind::RightBracket => {
                        level -= 1
                    }
                    _ => {}
                },
                None => return,
            }
        }
    }

    /// Parses the whole token stream as a sequence of top-level
    /// declarations. `#define` and `#include` passthrough tokens are
    /// silently dropped here.
    pub fn parse(&mut self) -> Result<Vec<Stmt>> {
        let mut result = Vec::new();
        while self.has_next() {
            if matches!(self.peek(0), Some(TokenKind::Define) | Some(TokenKind::Include)) {
                self.next_token();
            } else {
                result.push(self.parse_decl()?);
            }
        }
        Ok(result)
    }

    fn parse_decl(&mut self) -> Result<Stmt> {
        if self.match_kv(TokenKind::Keyword, "typedef") {
            let ty = self.parse_type()?;
            let name = self.next_name()?;
            self.types.insert(name.clone());
            self.match_kind(TokenKind::Semicolon);
            Ok(Stmt::TypeDecl { ty, name })
        } else {
            self.parse_var_decl()
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt> {
        let mut decor = Vec::new();
        if self.match_kv(TokenKind::Keyword, "static") {
            decor.push("static");
        }
        if self.match_kv(TokenKind::Identifier, "inline") {
            decor.push("inline");
        }
        let mut ty = self.parse_type()?;
        let name = self.next_name()?;

        if self.match_kind(TokenKind::LeftPar) {
            let params = self.parse_params()?;
            let body = if self.match_kind(TokenKind::Semicolon) {
                None
            } else {
                Some(Box::new(self.parse_stmt()?))
            };
            let result = Stmt::FunctionDecl { ty, name, params, body };
            return Ok(decorate(decor, result));
        }

        let mut names: Vec<(String, Option<Expr>)>;
        if self.match_kind(TokenKind::Equal) {
            let init = self.parse_expr()?;
            names = vec![(name, Some(init))];
        } else if self.match_kind(TokenKind::LeftBracket) {
            let mut dim = String::new();
            while !self.match_kind(TokenKind::RightBracket) {
                match self.next_token() {
                    Some(token) => dim.push_str(&token.text),
                    None => {
                        return Err(GenError::parse("unterminated array dimension", self.pos()))
                    }
                }
            }
            ty = CType::Array {
                elem: Box::new(ty),
                dimension: dim,
            };
            let init = if self.match_kind(TokenKind::Equal) {
                Some(self.parse_expr()?)
            } else {
                None
            };
            names = vec![(name, init)];
        } else {
            names = vec![(name, None)];
        }

        while self.match_kind(TokenKind::Comma) {
            let name = self.next_name()?;
            if self.match_kind(TokenKind::Equal) {
                let init = self.parse_expr()?;
                names.push((name, Some(init)));
            } else {
                names.push((name, None));
            }
        }

        if self.match_kind(TokenKind::Semicolon) {
            Ok(decorate(decor, Stmt::Var(VarDecl::new(ty, names))))
        } else {
            Err(GenError::parse(
                format!("unexpected token: '{:?}'", self.peek_value(0)),
                self.pos(),
            ))
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        let mut args = Vec::new();
        while !self.match_kind(TokenKind::RightPar) {
            if !self.has_next() {
                return Err(GenError::parse("unterminated parameter list", self.pos()));
            }
            if self.match_kind(TokenKind::Ellipsis) {
                args.push(Param::Ellipsis);
            } else {
                let ty = self.parse_type()?;
                let name = if self.peek(0) == Some(TokenKind::Identifier) {
                    Some(self.next_name()?)
                } else {
                    None
                };
                args.push(Param::Decl { ty, name });
            }
            self.match_kind(TokenKind::Comma);
        }
        Ok(args)
    }

    fn check_pointer_star(&mut self, mut ty: CType) -> CType {
        while self.match_kind(TokenKind::Star) {
            ty = CType::Pointer(Box::new(ty));
        }
        ty
    }

    fn parse_type(&mut self) -> Result<CType> {
        if self.match_kv(TokenKind::Keyword, "struct") {
            let name = if self.peek(0) == Some(TokenKind::Identifier) {
                Some(self.next_name()?)
            } else {
                None
            };
            if self.match_kind(TokenKind::LeftBrace) {
                if let Some(name) = &name {
                    if self.structs.contains(name) {
                        return Err(GenError::parse(
                            format!("redeclaration of struct '{}'", name),
                            self.pos(),
                        ));
                    }
                    self.structs.insert(name.clone());
                }
                let mut fields = Vec::new();
                while !self.match_kind(TokenKind::RightBrace) {
                    fields.push(self.parse_var_decl()?);
                }
                Ok(self.check_pointer_star(CType::Struct { name, fields }))
            } else if let Some(name) = name {
                Ok(self.check_pointer_star(CType::base(format!("struct {}", name))))
            } else {
                Err(GenError::parse("invalid struct", self.pos()))
            }
        } else if self.match_kv(TokenKind::Keyword, "enum") {
            let mut names = Vec::new();
            self.match_kind(TokenKind::LeftBrace);
            while !self.match_kind(TokenKind::RightBrace) {
                names.push(self.next_name()?);
                self.match_kind(TokenKind::Comma);
            }
            Ok(CType::Enum(names))
        } else if self.match_kv(TokenKind::Keyword, "const") {
            Ok(CType::Const(Box::new(self.parse_type()?)))
        } else if self.match_kind(TokenKind::LeftPar) {
            let result = self.parse_type()?;
            self.match_kind(TokenKind::RightPar);
            Ok(result)
        } else {
            let mut name = self.next_name()?;
            if (name == "signed" || name == "unsigned")
                && self.peek(0) == Some(TokenKind::Identifier)
                && self
                    .peek_value(0)
                    .map(|v| self.types.contains(v))
                    .unwrap_or(false)
            {
                name = format!("{} {}", name, self.next_name()?);
            }
            let result = self.check_pointer_star(CType::base(name));
            // Function pointer in the fixed `type (func)(params)` shape.
            if self.peek_seq(4)
                == [
                    TokenKind::LeftPar,
                    TokenKind::Identifier,
                    TokenKind::RightPar,
                    TokenKind::LeftPar,
                ]
                && self.peek_value(1) == Some("func")
            {
                self.index += 4;
                let mut params = Vec::new();
                while !self.match_kind(TokenKind::RightPar) {
                    params.push(self.parse_type()?);
                    self.match_kind(TokenKind::Comma);
                }
                Ok(CType::Func {
                    return_type: Box::new(result),
                    params,
                })
            } else {
                Ok(result)
            }
        }
    }

    pub fn parse_stmt(&mut self) -> Result<Stmt> {
        if self.match_kind(TokenKind::LeftBrace) {
            let mut stmts = Vec::new();
            while !self.match_kind(TokenKind::RightBrace) {
                if !self.has_next() {
                    return Err(GenError::parse("unterminated block", self.pos()));
                }
                stmts.push(self.parse_stmt()?);
            }
            return Ok(Stmt::Body(stmts));
        }
        if self.match_kind(TokenKind::Semicolon) {
            return Ok(Stmt::Empty);
        }
        if self.peek(0) == Some(TokenKind::Identifier)
            && self
                .peek_value(0)
                .map(|v| self.types.contains(v))
                .unwrap_or(false)
        {
            return self.parse_var_decl();
        }
        if self.peek_seq(2) == [TokenKind::Identifier, TokenKind::Colon] {
            let name = self.next_name()?;
            self.index += 1;
            return Ok(Stmt::Label(name));
        }
        if self.peek(0) == Some(TokenKind::Keyword)
            && matches!(self.peek_value(0), Some("const") | Some("struct"))
        {
            return self.parse_var_decl();
        }
        if self.peek(0) == Some(TokenKind::Define) {
            self.next_token();
            return self.parse_stmt();
        }
        if self.peek(0) == Some(TokenKind::Keyword) {
            let token = match self.next_token() {
                Some(token) => token,
                None => return Err(GenError::parse("unexpected end of input", self.pos())),
            };
            match token.text.as_str() {
                "return" => {
                    if self.match_kind(TokenKind::Semicolon) {
                        return Ok(Stmt::Return(None));
                    }
                    let expr = self.parse_expr()?;
                    self.match_kind(TokenKind::Semicolon);
                    return Ok(Stmt::Return(Some(expr)));
                }
                "if" => {
                    self.match_kind(TokenKind::LeftPar);
                    let test = self.parse_expr()?;
                    self.match_kind(TokenKind::RightPar);
                    let body = Box::new(self.parse_stmt()?);
                    let orelse = if self.match_kv(TokenKind::Keyword, "else") {
                        Some(Box::new(self.parse_stmt()?))
                    } else {
                        None
                    };
                    return Ok(Stmt::If { test, body, orelse });
                }
                "while" => {
                    self.match_kind(TokenKind::LeftPar);
                    let test = self.parse_expr()?;
                    self.match_kind(TokenKind::RightPar);
                    let body = Box::new(self.parse_stmt()?);
                    return Ok(Stmt::While { test, body });
                }
                "for" => {
                    self.match_kind(TokenKind::LeftPar);
                    let init = if self.peek(0) != Some(TokenKind::Semicolon) {
                        Some(Box::new(self.parse_expr_or_decl()?))
                    } else {
                        None
                    };
                    self.match_kind(TokenKind::Semicolon);
                    let test = if self.peek(0) != Some(TokenKind::Semicolon) {
                        Some(self.parse_expr()?)
                    } else {
                        None
                    };
                    self.match_kind(TokenKind::Semicolon);
                    let incr = if self.peek(0) != Some(TokenKind::RightPar) {
                        Some(Box::new(self.parse_expr_or_decl()?))
                    } else {
                        None
                    };
                    self.match_kind(TokenKind::RightPar);
                    let body = Box::new(self.parse_stmt()?);
                    return Ok(Stmt::For { init, test, incr, body });
                }
                "do" => {
                    let body = Box::new(self.parse_stmt()?);
                    if self.match_kv(TokenKind::Keyword, "while") {
                        self.match_kind(TokenKind::LeftPar);
                        let test = self.parse_expr()?;
                        self.match_kind(TokenKind::RightPar);
                        self.match_kind(TokenKind::Semicolon);
                        return Ok(Stmt::DoWhile { test, body });
                    }
                }
                "goto" => {
                    let name = self.next_name()?;
                    self.match_kind(TokenKind::Semicolon);
                    return Ok(Stmt::Goto(name));
                }
                "break" => {
                    self.match_kind(TokenKind::Semicolon);
                    return Ok(Stmt::Break);
                }
                "continue" => {
                    self.match_kind(TokenKind::Semicolon);
                    return Ok(Stmt::Continue);
                }
                "static" => {
                    let decl = Box::new(self.parse_decl()?);
                    return Ok(Stmt::Decorated {
                        decor: "static".to_string(),
                        decl,
                    });
                }
                "switch" => return self.parse_switch(),
                other => {
                    debug!("skipping unsupported statement '{}'", other);
                }
            }
            self.skip_statement();
            return Ok(Stmt::Empty);
        }
        if self.peek_seq(2) == [TokenKind::Identifier, TokenKind::Identifier]
            || self.peek_seq(3)
                == [TokenKind::Identifier, TokenKind::Star, TokenKind::Identifier]
        {
            // Two adjacent names can only be a declaration; learn the type.
            if let Some(name) = self.peek_value(0) {
                self.types.insert(name.to_string());
            }
            return self.parse_var_decl();
        }
        let result = Stmt::Expression(self.parse_expr()?);
        if !self.match_kind(TokenKind::Semicolon) {
            self.skip_statement();
        }
        Ok(result)
    }

    fn parse_case_body(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            if self.peek(0) == Some(TokenKind::Keyword)
                && matches!(self.peek_value(0), Some("case") | Some("default"))
            {
                break;
            }
            if self.peek(0) == Some(TokenKind::RightBrace) || !self.has_next() {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_switch(&mut self) -> Result<Stmt> {
        self.match_kind(TokenKind::LeftPar);
        let subject = self.parse_expr()?;
        self.match_kind(TokenKind::RightPar);
        self.match_kind(TokenKind::LeftBrace);
        let mut cases = Vec::new();
        while !self.match_kind(TokenKind::RightBrace) {
            if self.match_kv(TokenKind::Keyword, "case") {
                let label = self.parse_atom()?;
                self.match_kind(TokenKind::Colon);
                let stmts = self.parse_case_body()?;
                cases.push(Case {
                    label: Some(label),
                    stmts,
                });
            } else if self.match_kv(TokenKind::Keyword, "default") {
                self.match_kind(TokenKind::Colon);
                let stmts = self.parse_case_body()?;
                cases.push(Case { label: None, stmts });
            } else {
                return Err(GenError::parse(
                    "unexpected symbol in switch-statement",
                    self.pos(),
                ));
            }
        }
        Ok(Stmt::Switch { subject, cases })
    }

    fn parse_expr_or_decl(&mut self) -> Result<Stmt> {
        if self.peek(0) == Some(TokenKind::Identifier)
            && self
                .peek_value(0)
                .map(|v| self.types.contains(v))
                .unwrap_or(false)
        {
            self.parse_var_decl()
        } else if self.peek(0) == Some(TokenKind::Keyword) && self.peek_value(0) == Some("struct")
        {
            self.parse_var_decl()
        } else {
            Ok(Stmt::Expression(self.parse_expr()?))
        }
    }

    pub fn parse_expr(&mut self) -> Result<Expr> {
        let value = self.parse_ternary()?;
        if self.match_kind(TokenKind::Equal) {
            let source = self.parse_expr()?;
            return Ok(Expr::Assignment {
                target: Box::new(value),
                source: Box::new(source),
            });
        }
        if self.peek(0) == Some(TokenKind::AugAssign) {
            let token = match self.next_token() {
                Some(token) => token,
                None => return Err(GenError::parse("unexpected end of input", self.pos())),
            };
            let op = token.text[..token.text.len() - 1].to_string();
            let source = self.parse_expr()?;
            return Ok(Expr::AugAssignment {
                target: Box::new(value),
                op,
                source: Box::new(source),
            });
        }
        Ok(value)
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let value = self.parse_bitwise()?;
        if self.match_kind(TokenKind::QuestionMark) {
            let body = self.parse_ternary()?;
            self.match_kind(TokenKind::Colon);
            let orelse = self.parse_ternary()?;
            Ok(Expr::IfExpr {
                test: Box::new(value),
                body: Box::new(body),
                orelse: Box::new(orelse),
            })
        } else {
            Ok(value)
        }
    }

    fn parse_bitwise(&mut self) -> Result<Expr> {
        let mut value = self.parse_compare()?;
        while matches!(
            self.peek(0),
            Some(TokenKind::Operator) | Some(TokenKind::Ampersand)
        ) {
            let op = self.next_token().map(|t| t.text).unwrap_or_default();
            let right = self.parse_compare()?;
            value = Expr::BinOp {
                left: Box::new(value),
                op,
                right: Box::new(right),
            };
        }
        Ok(value)
    }

    fn parse_compare(&mut self) -> Result<Expr> {
        let value = self.parse_shift()?;
        if self.peek(0) == Some(TokenKind::Compare) {
            let op = self.next_token().map(|t| t.text).unwrap_or_default();
            let right = self.parse_shift()?;
            return Ok(Expr::Comparison {
                left: Box::new(value),
                op,
                right: Box::new(right),
            });
        }
        Ok(value)
    }

    fn parse_shift(&mut self) -> Result<Expr> {
        let value = self.parse_sum()?;
        if self.peek(0) == Some(TokenKind::ShiftOperator) {
            let op = self.next_token().map(|t| t.text).unwrap_or_default();
            let right = self.parse_sum()?;
            return Ok(Expr::BinOp {
                left: Box::new(value),
                op,
                right: Box::new(right),
            });
        }
        Ok(value)
    }

    fn parse_sum(&mut self) -> Result<Expr> {
        let mut value = self.parse_product()?;
        while matches!(self.peek(0), Some(TokenKind::Plus) | Some(TokenKind::Minus)) {
            let op = self.next_token().map(|t| t.text).unwrap_or_default();
            let right = self.parse_product()?;
            value = Expr::BinOp {
                left: Box::new(value),
                op,
                right: Box::new(right),
            };
        }
        Ok(value)
    }

    fn parse_product(&mut self) -> Result<Expr> {
        let mut value = self.parse_deref()?;
        while matches!(
            self.peek(0),
            Some(TokenKind::DivOperator) | Some(TokenKind::Star)
        ) {
            let op = self.next_token().map(|t| t.text).unwrap_or_default();
            let right = self.parse_deref()?;
            value = Expr::BinOp {
                left: Box::new(value),
                op,
                right: Box::new(right),
            };
        }
        Ok(value)
    }

    fn parse_deref(&mut self) -> Result<Expr> {
        let deref = self.match_kind(TokenKind::Star);
        let addr = self.match_kind(TokenKind::Ampersand);
        let mut value = self.parse_atom()?;
        if addr {
            value = Expr::AddressOf(Box::new(value));
        }
        if deref {
            value = Expr::Deref(Box::new(value));
        }
        self.parse_trailer(value)
    }

    fn parse_trailer(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.match_kind(TokenKind::LeftPar) {
                let mut args = Vec::new();
                while self.peek(0) != Some(TokenKind::RightPar) {
                    if !self.has_next() {
                        return Err(GenError::parse("unterminated argument list", self.pos()));
                    }
                    args.push(self.parse_expr()?);
                    self.match_kind(TokenKind::Comma);
                }
                self.match_kind(TokenKind::RightPar);
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                };
            } else if self.match_kind(TokenKind::LeftBracket) {
                let index = self.parse_expr()?;
                self.match_kind(TokenKind::RightBracket);
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.match_kind(TokenKind::Arrow) || self.match_kind(TokenKind::Dot) {
                let name = self.next_name()?;
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        if matches!(
            self.peek(0),
            Some(TokenKind::Decrement) | Some(TokenKind::Increment)
        ) {
            let op = self.next_token().map(|t| t.text).unwrap_or_default();
            expr = Expr::UnarySuffixOp {
                op,
                value: Box::new(expr),
            };
        }
        Ok(expr)
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let token = match self.next_token() {
            Some(token) => token,
            None => return Err(GenError::parse("unexpected end of input", self.pos())),
        };

        match token.kind {
            TokenKind::LeftPar => {
                // Either a parenthesised expression or a type cast.
                let is_known_type = self.peek(0) == Some(TokenKind::Identifier)
                    && self
                        .peek_value(0)
                        .map(|v| self.types.contains(v))
                        .unwrap_or(false);
                let is_pointer_cast = self.peek_seq(3)
                    == [TokenKind::Identifier, TokenKind::Star, TokenKind::RightPar];
                if is_known_type || is_pointer_cast {
                    let ty = self.parse_type()?;
                    self.match_kind(TokenKind::RightPar);
                    let value = self.parse_deref()?;
                    Ok(Expr::TypeCast {
                        ty,
                        value: Box::new(value),
                    })
                } else {
                    let expr = self.parse_expr()?;
                    self.match_kind(TokenKind::RightPar);
                    Ok(expr)
                }
            }
            TokenKind::Identifier => Ok(Expr::Name(token.text)),
            TokenKind::Null | TokenKind::Number | TokenKind::StringLit => {
                Ok(Expr::Const(token.text))
            }
            TokenKind::Plus | TokenKind::Minus | TokenKind::UnaryOp => {
                let value = self.parse_atom()?;
                if let Expr::Const(c) = &value {
                    Ok(Expr::Const(format!("{}{}", token.text, c)))
                } else {
                    Ok(Expr::UnaryOp {
                        op: token.text,
                        value: Box::new(value),
                    })
                }
            }
            TokenKind::LeftBrace => {
                let mut values = Vec::new();
                while !self.match_kind(TokenKind::RightBrace) {
                    values.push(self.parse_atom()?);
                    self.match_kind(TokenKind::Comma);
                }
                Ok(Expr::ConstArray(values))
            }
            TokenKind::Keyword if token.text == "sizeof" => {
                if self.peek_seq(2) == [TokenKind::LeftPar, TokenKind::Identifier]
                    && self
                        .peek_value(1)
                        .map(|v| self.types.contains(v))
                        .unwrap_or(false)
                {
                    let ty = self.parse_type()?;
                    Ok(Expr::SizeOfType(ty))
                } else {
                    let value = self.parse_atom()?;
                    Ok(Expr::SizeOfExpr(Box::new(value)))
                }
            }
            TokenKind::Decrement | TokenKind::Increment => {
                let value = self.parse_atom()?;
                Ok(Expr::UnaryOp {
                    op: token.text,
                    value: Box::new(value),
                })
            }
            _ => Err(GenError::parse(
                format!("unexpected symbol: '{}'", token.text),
                SourceLocation::at(token.pos),
            )),
        }
    }
}

fn decorate(decor: Vec<&str>, stmt: Stmt) -> Stmt {
    if decor.is_empty() {
        stmt
    } else {
        Stmt::Decorated {
            decor: decor.join(" "),
            decl: Box::new(stmt),
        }
    }
}

/// Parses a series of sources in sequence, carrying macro definitions,
/// learned type names and struct tags from one file to the next.
#[derive(Default)]
pub struct ParserContext {
    pub macros: MacroTable,
    pub types: BTreeSet<String>,
    pub structs: BTreeSet<String>,
}

impl ParserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, name: &str) {
        if let Some(tag) = name.strip_prefix("struct ") {
            self.structs.insert(tag.to_string());
        } else if !name.is_empty() {
            self.types.insert(name.to_string());
        }
    }

    pub fn add_types(&mut self, names: &[&str]) {
        for name in names {
            self.add_type(name);
        }
    }

    pub fn define_macro(&mut self, name: &str, body: &str) -> Result<()> {
        define_macro(&mut self.macros, name, body)
    }

    fn run<T>(&mut self, text: &str, f: impl FnOnce(&mut Parser) -> Result<T>) -> Result<T> {
        let tokens = Tokenizer::new(text, &mut self.macros).tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.types.extend(self.types.iter().cloned());
        parser.structs.extend(self.structs.iter().cloned());
        let result = f(&mut parser)?;
        self.types.extend(parser.types);
        self.structs.extend(parser.structs);
        Ok(result)
    }

    pub fn parse(&mut self, text: &str) -> Result<Vec<Stmt>> {
        self.run(text, |parser| parser.parse())
    }

    pub fn parse_expr(&mut self, text: &str) -> Result<Expr> {
        self.run(text, |parser| parser.parse_expr())
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<Vec<Stmt>> {
        info!("parsing {}", path.display());
        let text = std::fs::read_to_string(path)
            .map_err(|e| GenError::io(format!("cannot read {}", path.display()), e))?;
        self.parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Vec<Stmt> {
        ParserContext::new().parse(text).expect("parse failed")
    }

    fn parse_expr(text: &str) -> Expr {
        ParserContext::new()
            .parse_expr(text)
            .expect("parse failed")
    }

    #[test]
    fn typedef_grows_known_types() {
        let stmts = parse("typedef struct _arena PyArena;\nPyArena *arena;");
        assert_eq!(stmts.len(), 2);
        assert_eq!(
            stmts[0],
            Stmt::TypeDecl {
                ty: CType::base("struct _arena"),
                name: "PyArena".to_string(),
            }
        );
        assert_eq!(
            stmts[1],
            Stmt::Var(VarDecl::single(
                CType::pointer(CType::base("PyArena")),
                "arena"
            ))
        );
    }

    #[test]
    fn function_declaration_with_params() {
        let stmts = parse("int add(int a, int b) { return a + b; }");
        match &stmts[0] {
            Stmt::FunctionDecl { ty, name, params, body } => {
                assert_eq!(*ty, CType::base("int"));
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].name(), Some("a"));
                assert!(body.is_some());
            }
            other => panic!("expected function declaration, got {:?}", other),
        }
    }

    #[test]
    fn static_inline_function_is_decorated() {
        let stmts = parse("static inline void noop(void) {}");
        match &stmts[0] {
            Stmt::Decorated { decor, decl } => {
                assert_eq!(decor, "static inline");
                assert!(matches!(decl.as_ref(), Stmt::FunctionDecl { .. }));
            }
            other => panic!("expected decorated declaration, got {:?}", other),
        }
    }

    #[test]
    fn struct_and_enum_types() {
        let stmts = parse("typedef struct { int first; int second; } pair;");
        match &stmts[0] {
            Stmt::TypeDecl { ty: CType::Struct { name, fields }, name: tyname } => {
                assert_eq!(*name, None);
                assert_eq!(fields.len(), 2);
                assert_eq!(tyname, "pair");
            }
            other => panic!("expected struct typedef, got {:?}", other),
        }
        let stmts = parse("typedef enum { Load, Store, Del } expr_context_ty;");
        match &stmts[0] {
            Stmt::TypeDecl { ty: CType::Enum(names), .. } => {
                assert_eq!(names, &["Load", "Store", "Del"]);
            }
            other => panic!("expected enum typedef, got {:?}", other),
        }
    }

    #[test]
    fn struct_redeclaration_is_an_error() {
        let result = ParserContext::new().parse(
            "struct _s { int a; } x;\nstruct _s { int b; } y;",
        );
        assert!(result.is_err());
    }

    #[test]
    fn adjacent_identifiers_learn_a_type() {
        let stmts = parse("void f(void) { expr_ty value; stmt_ty *target; }");
        match stmts[0] {
            Stmt::FunctionDecl { ref body, .. } => match body.as_deref() {
                Some(Stmt::Body(stmts)) => {
                    assert_eq!(
                        stmts[0],
                        Stmt::Var(VarDecl::single(CType::base("expr_ty"), "value"))
                    );
                    assert_eq!(
                        stmts[1],
                        Stmt::Var(VarDecl::single(
                            CType::pointer(CType::base("stmt_ty")),
                            "target"
                        ))
                    );
                }
                other => panic!("expected body, got {:?}", other),
            },
            ref other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn expression_precedence() {
        assert_eq!(parse_expr("a + b * c"), parse_expr("a + (b * c)"));
        assert_eq!(parse_expr("a | b & c"), parse_expr("(a | b) & c"));
    }

    #[test]
    fn ternary_and_assignment() {
        let expr = parse_expr("x = a ? b : c");
        match expr {
            Expr::Assignment { source, .. } => {
                assert!(matches!(source.as_ref(), Expr::IfExpr { .. }))
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn cast_of_known_type() {
        let mut ctx = ParserContext::new();
        ctx.add_type("expr_ty");
        let expr = ctx.parse_expr("(expr_ty) value").unwrap();
        assert_eq!(
            expr,
            Expr::TypeCast {
                ty: CType::base("expr_ty"),
                value: Box::new(Expr::name("value")),
            }
        );
    }

    #[test]
    fn pointer_cast_of_unknown_type() {
        let expr = parse_expr("(KeywordTy*) kw");
        assert_eq!(
            expr,
            Expr::TypeCast {
                ty: CType::pointer(CType::base("KeywordTy")),
                value: Box::new(Expr::name("kw")),
            }
        );
    }

    #[test]
    fn sizeof_forms() {
        let expr = parse_expr("sizeof(int)");
        assert_eq!(expr, Expr::SizeOfType(CType::base("int")));
        let expr = parse_expr("sizeof(x)");
        assert!(matches!(expr, Expr::SizeOfExpr(_)));
    }

    #[test]
    fn negative_constant_folds() {
        assert_eq!(parse_expr("-1"), Expr::Const("-1".to_string()));
    }

    #[test]
    fn call_subscript_and_attribute_trailers() {
        use crate::c_ast::{CRenderer, CodeGen};
        let expr = parse_expr("f(a)->v.Name[0]");
        assert!(matches!(expr, Expr::Subscript { .. }));
        assert_eq!(CRenderer.render_expr(&expr).unwrap(), "f(a).v.Name[0]");
    }

    #[test]
    fn unknown_statement_recovers_at_semicolon() {
        let stmts = parse("void f(void) { register x = y(1, (2; 3)); return; }");
        match &stmts[0] {
            Stmt::FunctionDecl { body, .. } => match body.as_deref() {
                Some(Stmt::Body(stmts)) => {
                    assert_eq!(stmts.len(), 2);
                    assert_eq!(stmts[0], Stmt::Empty);
                    assert_eq!(stmts[1], Stmt::Return(None));
                }
                other => panic!("expected body, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn switch_with_cases_and_default() {
        let stmts = parse(
            "void f(int k) { switch (k) { case 1: return; case 2: break; default: continue; } }",
        );
        match &stmts[0] {
            Stmt::FunctionDecl { body, .. } => match body.as_deref() {
                Some(Stmt::Body(stmts)) => match &stmts[0] {
                    Stmt::Switch { cases, .. } => {
                        assert_eq!(cases.len(), 3);
                        assert!(cases[2].label.is_none());
                    }
                    other => panic!("expected switch, got {:?}", other),
                },
                other => panic!("expected body, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn context_carries_macros_and_types_across_sources() {
        let mut ctx = ParserContext::new();
        ctx.parse("#define SIZE 16\ntypedef int length_t;").unwrap();
        let stmts = ctx.parse("length_t buf[SIZE];").unwrap();
        assert_eq!(
            stmts[0],
            Stmt::Var(VarDecl::single(
                CType::Array {
                    elem: Box::new(CType::base("length_t")),
                    dimension: "16".to_string(),
                },
                "buf"
            ))
        );
    }

    #[test]
    fn macro_expansion_matches_inline_source() {
        let mut ctx = ParserContext::new();
        let expanded = ctx
            .parse("#define ADD(a,b) a+b\nint x = ADD(p, q);")
            .unwrap();
        let direct = ParserContext::new().parse("int x = p+q;").unwrap();
        assert_eq!(expanded, direct);
    }

    #[test]
    fn for_loop_with_declaration() {
        let stmts = parse("void f(void) { for (int i = 0; i < n; i++) { g(i); } }");
        match &stmts[0] {
            Stmt::FunctionDecl { body, .. } => match body.as_deref() {
                Some(Stmt::Body(stmts)) => assert!(matches!(stmts[0], Stmt::For { .. })),
                other => panic!("expected body, got {:?}", other),
            },
            other => panic!("expected function, got {:?}", other),
        }
    }
}
