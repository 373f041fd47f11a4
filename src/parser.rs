//! 谓词表达式的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   ├─ 解析参数列表 "(" name: Type, ... ")"
//!   │    └─ parse_type()
//!   ├─ 期望 "=>"
//!   └─ parse_expression() (递归下降解析)
//!        └─ parse_conditional()          a ? b : c
//!             └─ parse_or_expression()   ||
//!                  └─ parse_and_expression()   &&
//!                       └─ parse_equality_expression()   == !=
//!                            └─ parse_relational_expression()   > < >= <=
//!                                 └─ parse_additive_expression()   + -
//!                                      └─ parse_multiplicative_expression()   * / %
//!                                           └─ parse_unary_expression()   ! - (类型)
//!                                                └─ parse_postfix_expression()   .成员 .方法(...)
//!                                                     └─ parse_primary_expression()
//!                                                          ├─ 字面值
//!                                                          ├─ 参数引用
//!                                                          ├─ "(" 分组表达式 ")"
//!                                                          └─ new List<T> { ... }
//! ```
//!
//! ## 支持的语法结构
//!
//! ```text
//! (e: Order, minTotal: decimal?, ids: List<int>) => e.Total.Value >= minTotal && ids.Contains(e.Id)
//! ```
//!
//! ### 类型
//! - **关键字类型**: `bool byte sbyte short ushort int uint long ulong float double decimal char string object`
//! - **其他基础类型**: `DateTime DateTimeOffset Guid byte[]`
//! - **可空类型**: `T?`
//! - **集合**: `List<T>`, `IEnumerable<T>`, `T[]`, `ArrayList`（非泛型）
//! - 其他标识符视为实体类型，`I` 开头的视为接口类型
//!
//! ### 字面值类型
//! - **整数**: `123`, `123L`
//! - **实数**: `1.5`, `1.5f`, `1.5m`, `1.5d`
//! - **字符串/字符**: `"text"`, `'c'`
//! - **布尔/空值**: `true`, `false`, `null`
//! - **带类型的字符串**: `guid"..."`, `datetime"..."`, `datetimeoffset"..."`, `bytes"0a0b"`
//!
//! 作用于字面值的类型转换和负号在解析时直接折叠为带类型的常量，
//! 例如 `(long?)5`、`(int?)null`、`-1`。

use crate::ast::{BinaryOp, Node, NodeId, Predicate, PredicateBuilder, UnaryOp};
use crate::token::{Span, Token, TokenKind};
use crate::types::{Scalar, ScalarKind, SourceType};
use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub struct Parser<'a> {
    tokens: &'a [Token<'a>],
    position: usize,
    builder: PredicateBuilder,
    /// 参数名到参数节点的映射，同名引用共享同一个节点
    scope: HashMap<&'a str, NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self {
            message,
            span: Some(span),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} (at {}-{})", self.message, span.start, span.end),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// 对输入文本进行分词并解析为谓词
pub fn parse_predicate(input: &str) -> Result<Predicate, ParseError> {
    let tokens: Vec<_> = crate::lexer::Lexer::new(input).collect();
    Parser::new(&tokens).parse()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token<'a>]) -> Self {
        Self {
            tokens,
            position: 0,
            builder: PredicateBuilder::new(),
            scope: HashMap::new(),
        }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回当前位置之后第 n 个 token
    fn peek_nth(&self, n: usize) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position + n)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, expected: TokenKind) -> Result<&'a Token<'a>, ParseError> {
        match self.peek() {
            Some(token)
                if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) =>
            {
                self.position += 1;
                Ok(token)
            }
            Some(token) => Err(ParseError::at_position(
                format!("Expected {:?}, found {:?}", expected, token.kind),
                token.span,
            )),
            None => Err(ParseError::new(
                format!("Expected {:?}, but reached end of input", expected),
                None,
            )),
        }
    }

    /// 期望一个标识符并返回其文本
    fn expect_identifier(&mut self) -> Result<(&'a str, Span), ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                self.position += 1;
                Ok((*name, *span))
            }
            _ => Err(self.unexpected("(expected identifier)")),
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind) -> bool {
        if let Some(token) = self.peek() {
            std::mem::discriminant(&token.kind) == std::mem::discriminant(kind)
        } else {
            false
        }
    }

    /// 当前 token 匹配时消费它
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.match_token(kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, context: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::at_position(
                format!("Unexpected token {:?} {}", token.kind, context),
                token.span,
            ),
            None => ParseError::new(format!("Unexpected end of input {}", context), None),
        }
    }

    pub fn parse(&mut self) -> Result<Predicate, ParseError> {
        self.expect(TokenKind::LParen)?;
        if !self.match_token(&TokenKind::RParen) {
            loop {
                let (name, span) = self.expect_identifier()?;
                self.expect(TokenKind::Colon)?;
                let ty = self.parse_type()?;
                if self.scope.contains_key(name) {
                    return Err(ParseError::at_position(
                        format!("Duplicate parameter {}", name),
                        span,
                    ));
                }
                let id = self.builder.parameter(name, ty);
                self.scope.insert(name, id);

                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;

        let body = self.parse_expression()?;
        if self.peek().is_some() {
            return Err(self.unexpected("after predicate body"));
        }

        Ok(std::mem::take(&mut self.builder).finish(body))
    }

    /// 解析类型：关键字类型、泛型集合、可空和数组后缀
    fn parse_type(&mut self) -> Result<SourceType, ParseError> {
        let (name, _) = self.expect_identifier()?;

        let mut ty = match name {
            "List" | "IList" | "ICollection" | "IEnumerable" | "HashSet" => {
                self.expect(TokenKind::Lt)?;
                let element = self.parse_type()?;
                self.expect(TokenKind::Gt)?;
                SourceType::sequence_of(element)
            }
            "ArrayList" => SourceType::UntypedCollection,
            "object" => SourceType::Object,
            other => match ScalarKind::from_keyword(other) {
                Some(kind) => SourceType::Scalar(kind),
                None if is_interface_name(other) => SourceType::Interface(other.to_string()),
                None => SourceType::entity(other),
            },
        };

        loop {
            if self.match_token(&TokenKind::Question) && !matches!(ty, SourceType::Nullable(_)) {
                self.advance();
                ty = SourceType::Nullable(Box::new(ty));
            } else if self.match_token(&TokenKind::LBracket)
                && matches!(self.peek_nth(1), Some(Token { kind: TokenKind::RBracket, .. }))
            {
                self.position += 2;
                ty = match ty {
                    SourceType::Scalar(ScalarKind::Byte) => SourceType::Scalar(ScalarKind::Binary),
                    element => SourceType::sequence_of(element),
                };
            } else {
                break;
            }
        }
        Ok(ty)
    }

    fn parse_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<NodeId, ParseError> {
        let test = self.parse_or_expression()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let if_true = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let if_false = self.parse_expression()?;
        Ok(self.builder.conditional(test, if_true, if_false))
    }

    /// 解析左结合的二元运算链
    fn parse_binary_chain(
        &mut self,
        operators: &[(TokenKind<'static>, BinaryOp)],
        next: fn(&mut Self) -> Result<NodeId, ParseError>,
    ) -> Result<NodeId, ParseError> {
        let mut left = next(self)?;
        'chain: loop {
            for (kind, op) in operators {
                if self.eat(kind) {
                    let right = next(self)?;
                    left = self.builder.binary(*op, left, right);
                    continue 'chain;
                }
            }
            return Ok(left);
        }
    }

    fn parse_or_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_chain(&[(TokenKind::OrOr, BinaryOp::OrElse)], Self::parse_and_expression)
    }

    fn parse_and_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_chain(
            &[(TokenKind::AndAnd, BinaryOp::AndAlso)],
            Self::parse_equality_expression,
        )
    }

    fn parse_equality_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_chain(
            &[
                (TokenKind::EqEq, BinaryOp::Equal),
                (TokenKind::NotEq, BinaryOp::NotEqual),
            ],
            Self::parse_relational_expression,
        )
    }

    fn parse_relational_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_chain(
            &[
                (TokenKind::Gte, BinaryOp::GreaterThanOrEqual),
                (TokenKind::Lte, BinaryOp::LessThanOrEqual),
                (TokenKind::Gt, BinaryOp::GreaterThan),
                (TokenKind::Lt, BinaryOp::LessThan),
            ],
            Self::parse_additive_expression,
        )
    }

    fn parse_additive_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_chain(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Subtract),
            ],
            Self::parse_multiplicative_expression,
        )
    }

    fn parse_multiplicative_expression(&mut self) -> Result<NodeId, ParseError> {
        self.parse_binary_chain(
            &[
                (TokenKind::Star, BinaryOp::Multiply),
                (TokenKind::Slash, BinaryOp::Divide),
                (TokenKind::Percent, BinaryOp::Modulo),
            ],
            Self::parse_unary_expression,
        )
    }

    fn parse_unary_expression(&mut self) -> Result<NodeId, ParseError> {
        if self.eat(&TokenKind::Bang) {
            let operand = self.parse_unary_expression()?;
            return Ok(self.builder.not(operand));
        }

        if self.match_token(&TokenKind::Minus) {
            // 负数字面量直接折叠为常量
            if let Some(Token {
                kind: TokenKind::Number { text, suffix },
                span,
            }) = self.peek_nth(1)
            {
                self.position += 2;
                let value = parse_number(&format!("-{}", text), *suffix, *span)?;
                return Ok(self.builder.constant(value));
            }
            self.advance();
            let operand = self.parse_unary_expression()?;
            return Ok(self.builder.unary(UnaryOp::Negate, operand, SourceType::Object));
        }

        if let Some(ty) = self.try_parse_cast()? {
            let operand = self.parse_unary_expression()?;
            if let Some(folded) = self.fold_cast(&ty, operand) {
                return Ok(folded);
            }
            return Ok(self.builder.convert(operand, ty));
        }

        self.parse_postfix_expression()
    }

    /// 识别 `(类型)` 形式的类型转换；只有关键字基础类型（可带 `?`）才视为转换，
    /// 否则回退位置按分组表达式处理
    fn try_parse_cast(&mut self) -> Result<Option<SourceType>, ParseError> {
        if !self.match_token(&TokenKind::LParen) {
            return Ok(None);
        }
        let is_scalar_keyword = matches!(
            self.peek_nth(1),
            Some(Token { kind: TokenKind::Identifier(name), .. }) if ScalarKind::from_keyword(name).is_some()
        );
        if !is_scalar_keyword {
            return Ok(None);
        }

        let saved = self.position;
        self.advance();
        let ty = self.parse_type()?;
        let is_cast = matches!(ty, SourceType::Scalar(_) | SourceType::Nullable(_))
            && self.match_token(&TokenKind::RParen)
            && matches!(
                self.peek_nth(1).map(|t| &t.kind),
                Some(
                    TokenKind::Identifier(_)
                        | TokenKind::Number { .. }
                        | TokenKind::String(_)
                        | TokenKind::Char(_)
                        | TokenKind::True
                        | TokenKind::False
                        | TokenKind::Null
                        | TokenKind::New
                        | TokenKind::LParen
                        | TokenKind::Bang
                        | TokenKind::Minus
                )
            );
        if !is_cast {
            self.position = saved;
            return Ok(None);
        }
        self.advance(); // 消费 ")"
        Ok(Some(ty))
    }

    /// 将作用于字面值的类型转换折叠为带类型的常量
    fn fold_cast(&mut self, ty: &SourceType, operand: NodeId) -> Option<NodeId> {
        let Node::Constant(constant) = self.builder.node(operand) else {
            return None;
        };
        let target = match ty {
            SourceType::Nullable(inner) => match inner.as_ref() {
                SourceType::Scalar(kind) => *kind,
                _ => return None,
            },
            SourceType::Scalar(kind) => *kind,
            _ => return None,
        };

        let value = match &constant.value {
            // 无类型的 null
            None if constant.ty == SourceType::Object => None,
            None => return None,
            Some(value) => Some(convert_literal(value, target)?),
        };
        Some(self.builder.typed_constant(ty.clone(), value))
    }

    fn parse_postfix_expression(&mut self) -> Result<NodeId, ParseError> {
        let mut expr = self.parse_primary_expression()?;

        while self.eat(&TokenKind::Dot) {
            let (name, _) = self.expect_identifier()?;
            if self.match_token(&TokenKind::LParen) {
                let arguments = self.parse_arguments()?;
                expr = self.builder.call(name, Some(expr), arguments);
            } else if name == "Value" && matches!(self.builder.node(expr), Node::Member { .. }) {
                expr = self.builder.nullable_value(expr);
            } else {
                expr = self.builder.member(expr, name);
            }
        }
        Ok(expr)
    }

    /// 解析 `(a, b, ...)` 实参列表
    fn parse_arguments(&mut self) -> Result<Vec<NodeId>, ParseError> {
        self.expect(TokenKind::LParen)?;
        let mut arguments = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                arguments.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }
        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<NodeId, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::new(
                "Expected expression, but reached end of input".to_string(),
                None,
            ));
        };

        match &token.kind {
            TokenKind::Number { text, suffix } => {
                let value = parse_number(text, *suffix, token.span)?;
                Ok(self.builder.constant(value))
            }
            TokenKind::String(text) => Ok(self.builder.constant(Scalar::String(text.to_string()))),
            TokenKind::Char(c) => Ok(self.builder.constant(Scalar::Char(*c))),
            TokenKind::True => Ok(self.builder.constant(Scalar::Boolean(true))),
            TokenKind::False => Ok(self.builder.constant(Scalar::Boolean(false))),
            TokenKind::Null => Ok(self.builder.typed_constant(SourceType::Object, None)),
            TokenKind::LParen => {
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::New => self.parse_list_initializer(),
            TokenKind::Identifier(name) => {
                // 带类型前缀的字符串字面量，例如 guid"..."
                if let Some(Token {
                    kind: TokenKind::String(text),
                    span,
                }) = self.peek()
                {
                    if let Some(value) = parse_typed_string(name, text, *span)? {
                        self.advance();
                        return Ok(self.builder.constant(value));
                    }
                }
                // 静态调用，例如 Contains(ids, e.Id)
                if self.match_token(&TokenKind::LParen) {
                    let arguments = self.parse_arguments()?;
                    return Ok(self.builder.call(*name, None, arguments));
                }
                self.scope.get(name).copied().ok_or_else(|| {
                    ParseError::at_position(format!("Unknown identifier {}", name), token.span)
                })
            }
            other => Err(ParseError::at_position(
                format!("Unexpected token: {:?}", other),
                token.span,
            )),
        }
    }

    /// 解析 `new List<T> { a, b }` 或 `new T[] { a, b }`，"new" 已被消费
    fn parse_list_initializer(&mut self) -> Result<NodeId, ParseError> {
        let ty = self.parse_type()?;
        let element_type = match ty {
            SourceType::Sequence(element) => *element,
            SourceType::Scalar(ScalarKind::Binary) => SourceType::Scalar(ScalarKind::Byte),
            other => {
                return Err(self.unexpected(&format!("after new {} (expected a collection type)", other)))
            }
        };

        self.expect(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        if !self.eat(&TokenKind::RBrace) {
            loop {
                let element = self.parse_expression()?;
                // 常量元素按元素类型折叠
                elements.push(self.fold_cast(&element_type, element).unwrap_or(element));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RBrace)?;
        }
        Ok(self.builder.list(element_type, elements))
    }
}

/// `ITenant` 之类的名称视为接口
fn is_interface_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('I'), Some(c)) if c.is_ascii_uppercase()
    )
}

/// 按后缀解析数字字面量；无后缀的整数优先为 int，超出范围时为 long
fn parse_number(text: &str, suffix: Option<char>, span: Span) -> Result<Scalar, ParseError> {
    let invalid = || ParseError::at_position(format!("Invalid number literal {}", text), span);
    let is_real = text.contains('.');

    let value = match suffix {
        None if is_real => Scalar::Double(text.parse().map_err(|_| invalid())?),
        None => match text.parse::<i32>() {
            Ok(v) => Scalar::Int32(v),
            Err(_) => Scalar::Int64(text.parse().map_err(|_| invalid())?),
        },
        Some('l') if !is_real => Scalar::Int64(text.parse().map_err(|_| invalid())?),
        Some('f') => Scalar::Single(text.parse().map_err(|_| invalid())?),
        Some('d') => Scalar::Double(text.parse().map_err(|_| invalid())?),
        Some('m') => Scalar::Decimal(BigDecimal::from_str(text).map_err(|_| invalid())?),
        _ => return Err(invalid()),
    };
    Ok(value)
}

/// 解析 guid"..."、datetime"..."、datetimeoffset"..."、bytes"..."；
/// 前缀不是这些关键字时返回 None
fn parse_typed_string(prefix: &str, text: &str, span: Span) -> Result<Option<Scalar>, ParseError> {
    let invalid = |kind: &str| {
        ParseError::at_position(format!("Invalid {} literal \"{}\"", kind, text), span)
    };

    let value = match prefix {
        "guid" => Scalar::Guid(Uuid::parse_str(text).map_err(|_| invalid("guid"))?),
        "datetime" => {
            let value = NaiveDateTime::from_str(text).or_else(|_| {
                NaiveDate::from_str(text)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .ok_or_else(|| invalid("datetime"))
            })?;
            Scalar::DateTime(value)
        }
        "datetimeoffset" => Scalar::DateTimeOffset(
            DateTime::parse_from_rfc3339(text).map_err(|_| invalid("datetimeoffset"))?,
        ),
        "bytes" => Scalar::Binary(hex::decode(text).map_err(|_| invalid("bytes"))?),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// 数值字面量之间的显式转换；无法无损转换时返回 None
fn convert_literal(value: &Scalar, target: ScalarKind) -> Option<Scalar> {
    if value.kind() == target {
        return Some(value.clone());
    }

    let integer = match value {
        Scalar::Int32(v) => Some(i64::from(*v)),
        Scalar::Int64(v) => Some(*v),
        _ => None,
    };

    if let Some(v) = integer {
        return match target {
            ScalarKind::Byte => u8::try_from(v).ok().map(Scalar::Byte),
            ScalarKind::SByte => i8::try_from(v).ok().map(Scalar::SByte),
            ScalarKind::Int16 => i16::try_from(v).ok().map(Scalar::Int16),
            ScalarKind::UInt16 => u16::try_from(v).ok().map(Scalar::UInt16),
            ScalarKind::Int32 => i32::try_from(v).ok().map(Scalar::Int32),
            ScalarKind::UInt32 => u32::try_from(v).ok().map(Scalar::UInt32),
            ScalarKind::Int64 => Some(Scalar::Int64(v)),
            ScalarKind::UInt64 => u64::try_from(v).ok().map(Scalar::UInt64),
            ScalarKind::Single => Some(Scalar::Single(v as f32)),
            ScalarKind::Double => Some(Scalar::Double(v as f64)),
            ScalarKind::Decimal => Some(Scalar::Decimal(BigDecimal::from(v))),
            _ => None,
        };
    }

    match (value, target) {
        (Scalar::Double(v), ScalarKind::Single) => Some(Scalar::Single(*v as f32)),
        (Scalar::Single(v), ScalarKind::Double) => Some(Scalar::Double(f64::from(*v))),
        (Scalar::Double(v), ScalarKind::Decimal) => BigDecimal::from_f64(*v).map(Scalar::Decimal),
        _ => None,
    }
}
