//! 谓词表达式的词法分析器

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }

    /// 如果下一个字符是 `expected` 则消费它并返回 `matched`，否则返回 `otherwise`
    fn either(
        &mut self,
        start: usize,
        expected: char,
        matched: TokenKind<'a>,
        otherwise: TokenKind<'a>,
    ) -> Token<'a> {
        if self.peek() == Some(expected) {
            self.bump();
            self.token(matched, start)
        } else {
            self.token(otherwise, start)
        }
    }

    /// 读取数字字面量，包括小数部分和类型后缀（L、f、m、d）
    fn read_number(&mut self, start: usize) -> Token<'a> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        // 只有点号后面紧跟数字时才是小数，否则是成员访问
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = &self.input[start..self.position];

        let suffix = match self.peek() {
            Some(c @ ('L' | 'l' | 'F' | 'f' | 'M' | 'm' | 'D' | 'd')) => {
                self.bump();
                Some(c.to_ascii_lowercase())
            }
            _ => None,
        };
        self.token(TokenKind::Number { text, suffix }, start)
    }

    /// 读取双引号包围的字符串字面量
    /// 注意：开始的引号已经被调用者消费
    fn read_string(&mut self, start: usize) -> Token<'a> {
        let content_start = self.position;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            self.bump();
        }
        let content_end = self.position;
        if self.bump().is_none() {
            // 没有结束引号
            return self.token(TokenKind::Illegal('"'), start);
        }

        let content = &self.input[content_start..content_end];
        self.token(TokenKind::String(content), start)
    }

    /// 读取单引号包围的字符字面量
    fn read_char(&mut self, start: usize) -> Token<'a> {
        match (self.bump(), self.bump()) {
            (Some(c), Some('\'')) => self.token(TokenKind::Char(c), start),
            _ => self.token(TokenKind::Illegal('\''), start),
        }
    }

    /// 读取标识符或关键字
    /// 标识符可以包含字母、数字和下划线
    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        self.token(match_keyword(literal), start)
    }
}

fn match_keyword(s: &str) -> TokenKind {
    match s {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "new" => TokenKind::New,
        _ => TokenKind::Identifier(s),
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return None; // 到达输入末尾
        };

        let token = match c {
            '(' => self.token(TokenKind::LParen, start),
            ')' => self.token(TokenKind::RParen, start),
            '{' => self.token(TokenKind::LBrace, start),
            '}' => self.token(TokenKind::RBrace, start),
            '[' => self.token(TokenKind::LBracket, start),
            ']' => self.token(TokenKind::RBracket, start),
            ',' => self.token(TokenKind::Comma, start),
            ':' => self.token(TokenKind::Colon, start),
            '.' => self.token(TokenKind::Dot, start),
            '?' => self.token(TokenKind::Question, start),
            '+' => self.token(TokenKind::Plus, start),
            '-' => self.token(TokenKind::Minus, start),
            '*' => self.token(TokenKind::Star, start),
            '/' => self.token(TokenKind::Slash, start),
            '%' => self.token(TokenKind::Percent, start),
            '<' => self.either(start, '=', TokenKind::Lte, TokenKind::Lt),
            '>' => self.either(start, '=', TokenKind::Gte, TokenKind::Gt),
            '!' => self.either(start, '=', TokenKind::NotEq, TokenKind::Bang),
            '&' => self.either(start, '&', TokenKind::AndAnd, TokenKind::Illegal('&')),
            '|' => self.either(start, '|', TokenKind::OrOr, TokenKind::Illegal('|')),
            '=' => match self.peek() {
                Some('=') => self.either(start, '=', TokenKind::EqEq, TokenKind::Illegal('=')),
                Some('>') => self.either(start, '>', TokenKind::Arrow, TokenKind::Illegal('=')),
                _ => self.token(TokenKind::Illegal('='), start),
            },
            '"' => self.read_string(start),
            '\'' => self.read_char(start),
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            c => self.token(TokenKind::Illegal(c), start),
        };
        Some(token)
    }
}
