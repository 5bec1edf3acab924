use std::collections::VecDeque;

use crate::ast::Span;
use crate::error::{DbmlError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Str(String),
    /// Backtick expression.
    Expr(String),
    Number(String),
    /// `#rrggbb` color literal.
    Color(String),
    Colon,
    Comma,
    Dot,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Gt,
    Lt,
    Minus,
    LtGt,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier `{name}`"),
            TokenKind::Str(_) => "string".to_string(),
            TokenKind::Expr(_) => "expression".to_string(),
            TokenKind::Number(value) => format!("number `{value}`"),
            TokenKind::Color(value) => format!("color `{value}`"),
            TokenKind::Colon => "`:`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Dot => "`.`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::Gt => "`>`".to_string(),
            TokenKind::Lt => "`<`".to_string(),
            TokenKind::Minus => "`-`".to_string(),
            TokenKind::LtGt => "`<>`".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

pub(crate) struct Lexer<'a> {
    src: &'a str,
    line: usize,
    column: usize,
    next: VecDeque<Token>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            src,
            line: 1,
            column: 1,
            next: VecDeque::new(),
        }
    }

    pub(crate) fn next(&mut self) -> Result<Option<Token>> {
        self.lex_n(1)?;
        Ok(self.next.pop_front())
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> Result<Option<&Token>> {
        self.lex_n(n + 1)?;
        Ok(self.next.get(n))
    }

    /// Position just past the last consumed character.
    pub(crate) fn position(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
        }
    }

    fn lex_n(&mut self, n: usize) -> Result<()> {
        while self.next.len() < n {
            self.skip_whitespace()?;
            let span = self.position();
            let Some(ch) = self.try_next_char() else {
                return Ok(());
            };

            let kind = match ch {
                ':' => TokenKind::Colon,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '>' => TokenKind::Gt,
                '<' => {
                    if self.take_if(|ch| ch == '>').is_some() {
                        TokenKind::LtGt
                    } else {
                        TokenKind::Lt
                    }
                }
                '-' => match self.peek_char() {
                    Some(next) if next.is_ascii_digit() => {
                        TokenKind::Number(self.number(ch))
                    }
                    _ => TokenKind::Minus,
                },
                '#' => {
                    let mut color = String::from("#");
                    while let Some(ch) = self.take_if(|ch| ch.is_ascii_alphanumeric()) {
                        color.push(ch);
                    }
                    TokenKind::Color(color)
                }
                '`' => TokenKind::Expr(self.delimited('`', span)?),
                '"' => TokenKind::Str(self.delimited('"', span)?),
                '\'' => {
                    if self.src.starts_with("''") {
                        self.consume(2);
                        TokenKind::Str(self.triple_quoted(span)?)
                    } else {
                        TokenKind::Str(self.delimited('\'', span)?)
                    }
                }
                ch if ch.is_ascii_digit() => TokenKind::Number(self.number(ch)),
                ch if ch == '_' || ch.is_alphabetic() => {
                    let mut ident = String::new();
                    ident.push(ch);

                    while let Some(ch) = self.take_if(ident_ch) {
                        ident.push(ch);
                    }

                    TokenKind::Ident(ident)
                }
                ch => {
                    return Err(DbmlError::parse(
                        span,
                        format!("unexpected character {ch:?}"),
                    ));
                }
            };

            self.next.push_back(Token { kind, span });
        }
        Ok(())
    }

    fn number(&mut self, first: char) -> String {
        let mut value = String::new();
        value.push(first);
        while let Some(ch) = self.take_if(|ch| ch.is_ascii_digit() || ch == '.') {
            value.push(ch);
        }
        value
    }

    /// Body of a string or expression closed by `close`, with escapes resolved.
    fn delimited(&mut self, close: char, start: Span) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.try_next_char() {
                Some(ch) if ch == close => return Ok(text),
                Some('\\') => text.push(self.escape()),
                Some('\n') if close != '`' => {
                    return Err(DbmlError::parse(start, "unterminated string"));
                }
                Some(ch) => text.push(ch),
                None => return Err(DbmlError::parse(start, "unterminated string")),
            }
        }
    }

    /// Body of a `'''multi-line'''` string.
    fn triple_quoted(&mut self, start: Span) -> Result<String> {
        let mut text = String::new();
        loop {
            if self.src.starts_with("'''") {
                self.consume(3);
                return Ok(dedent(&text));
            }
            match self.try_next_char() {
                Some('\\') => text.push(self.escape()),
                Some(ch) => text.push(ch),
                None => return Err(DbmlError::parse(start, "unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> char {
        match self.try_next_char() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some(ch) => ch,
            None => '\\',
        }
    }

    fn try_next_char(&mut self) -> Option<char> {
        match self.src.chars().next() {
            Some(ch) => {
                self.consume(ch.len_utf8());
                Some(ch)
            }
            None => None,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.peek_char_n(0)
    }

    fn peek_char_n(&mut self, n: usize) -> Option<char> {
        self.src.chars().nth(n)
    }

    fn take_if<P>(&mut self, predicate: P) -> Option<char>
    where
        P: FnOnce(char) -> bool,
    {
        match self.peek_char() {
            Some(ch) if predicate(ch) => {
                self.consume(ch.len_utf8());
                Some(ch)
            }
            _ => None,
        }
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(ch) = self.peek_char() {
            match ch {
                '/' => {
                    if self.peek_char_n(1) == Some('*') {
                        let start = self.position();
                        self.consume(2);
                        self.skip_block_comment(start)?;
                    } else if self.peek_char_n(1) == Some('/') {
                        self.skip_line_comment();
                    } else {
                        return Ok(());
                    }
                }
                ch if ch.is_whitespace() => {
                    self.consume(ch.len_utf8());
                }
                _ => return Ok(()),
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self, start: Span) -> Result<()> {
        while let Some(ch) = self.peek_char() {
            match ch {
                '*' => {
                    self.consume(1);

                    if self.peek_char() == Some('/') {
                        self.consume(1);
                        return Ok(());
                    }
                }
                _ => {
                    self.consume(ch.len_utf8());
                }
            }
        }
        Err(DbmlError::parse(start, "unterminated block comment"))
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                '\n' => {
                    self.consume(1);
                    return;
                }
                _ => self.consume(ch.len_utf8()),
            }
        }
    }

    fn consume(&mut self, amount: usize) {
        let (consumed, src) = self.src.split_at(amount);
        for ch in consumed.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.src = src;
    }
}

fn ident_ch(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Strip the indentation shared by every non-blank line and the blank lines
/// around a multi-line string.
fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let body: Vec<&str> = lines
        .iter()
        .map(|line| line.get(indent..).unwrap_or("").trim_end())
        .collect();
    body.join("\n").trim_matches('\n').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        while let Some(token) = lexer.next().expect("lex") {
            out.push(token.kind);
        }
        out
    }

    #[test]
    fn lexes_strings_comments_and_operators() {
        let tokens = kinds("// header\nRef: a.b <> c.d /* inline */ [delete: 'it\\'s']");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ident("Ref".to_string()),
                TokenKind::Colon,
                TokenKind::Ident("a".to_string()),
                TokenKind::Dot,
                TokenKind::Ident("b".to_string()),
                TokenKind::LtGt,
                TokenKind::Ident("c".to_string()),
                TokenKind::Dot,
                TokenKind::Ident("d".to_string()),
                TokenKind::LBracket,
                TokenKind::Ident("delete".to_string()),
                TokenKind::Colon,
                TokenKind::Str("it's".to_string()),
                TokenKind::RBracket,
            ]
        );
    }

    #[test]
    fn lexes_numbers_colors_and_expressions() {
        assert_eq!(
            kinds("-1.5 #3498DB `now()` 42"),
            vec![
                TokenKind::Number("-1.5".to_string()),
                TokenKind::Color("#3498DB".to_string()),
                TokenKind::Expr("now()".to_string()),
                TokenKind::Number("42".to_string()),
            ]
        );
    }

    #[test]
    fn triple_quoted_strings_are_dedented() {
        assert_eq!(
            kinds("'''\n    first\n      second\n  '''"),
            vec![TokenKind::Str("first\n  second".to_string())]
        );
    }

    #[test]
    fn tracks_positions() {
        let mut lexer = Lexer::new("Table t {\n  id int\n}");
        let mut spans = Vec::new();
        while let Some(token) = lexer.next().expect("lex") {
            spans.push((token.span.line, token.span.column));
        }
        assert_eq!(spans, vec![(1, 1), (1, 7), (1, 9), (2, 3), (2, 6), (3, 1)]);
    }

    #[test]
    fn reports_unterminated_strings() {
        let mut lexer = Lexer::new("Table t {\n  note: 'open");
        let error = loop {
            match lexer.next() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected an error"),
                Err(error) => break error,
            }
        };
        assert_eq!(
            error,
            DbmlError::Parse {
                line: 2,
                column: 9,
                message: "unterminated string".to_string(),
            }
        );
    }
}
