use super::lexer::{Lexer, Token, TokenKind};
use super::Parse;

use crate::ast::Span;
use crate::error::{DbmlError, Result};

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(lexer: Lexer<'a>) -> Parser<'a> {
        Parser { lexer }
    }

    pub(crate) fn parse<T: Parse>(&mut self) -> Result<T> {
        T::parse(self)
    }

    pub(crate) fn peek_nth(&mut self, n: usize) -> Result<Option<TokenKind>> {
        Ok(self.lexer.peek_nth(n)?.map(|token| token.kind.clone()))
    }

    pub(crate) fn peek(&mut self) -> Result<Option<TokenKind>> {
        self.peek_nth(0)
    }

    pub(crate) fn is_eof(&mut self) -> Result<bool> {
        Ok(self.peek()?.is_none())
    }

    /// Span of the next token, or of the end of input.
    pub(crate) fn span(&mut self) -> Result<Span> {
        let span = self.lexer.peek_nth(0)?.map(|token| token.span);
        Ok(span.unwrap_or_else(|| self.lexer.position()))
    }

    pub(crate) fn next_token(&mut self, expected: &str) -> Result<Token> {
        match self.lexer.next()? {
            Some(token) => Ok(token),
            None => Err(DbmlError::parse(
                self.lexer.position(),
                format!("expected {expected}, found end of input"),
            )),
        }
    }

    pub(crate) fn unexpected(token: &Token, expected: &str) -> DbmlError {
        DbmlError::parse(
            token.span,
            format!("expected {expected}, found {}", token.kind.describe()),
        )
    }

    /// Consume the next token if it equals `kind`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if self.peek()?.as_ref() == Some(kind) {
            self.lexer.next()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<Span> {
        let expected = kind.describe();
        let token = self.next_token(&expected)?;
        if &token.kind == kind {
            Ok(token.span)
        } else {
            Err(Self::unexpected(&token, &expected))
        }
    }

    /// Whether the `n`th token is the identifier `keyword`, ignoring case.
    pub(crate) fn is_keyword(&mut self, n: usize, keyword: &str) -> Result<bool> {
        Ok(matches!(
            self.peek_nth(n)?,
            Some(TokenKind::Ident(ident)) if ident.eq_ignore_ascii_case(keyword)
        ))
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> Result<Span> {
        let expected = format!("`{keyword}`");
        let token = self.next_token(&expected)?;
        match &token.kind {
            TokenKind::Ident(ident) if ident.eq_ignore_ascii_case(keyword) => Ok(token.span),
            _ => Err(Self::unexpected(&token, &expected)),
        }
    }

    /// An identifier or a quoted name.
    pub(crate) fn name(&mut self, expected: &str) -> Result<(String, Span)> {
        let token = self.next_token(expected)?;
        match token.kind {
            TokenKind::Ident(name) | TokenKind::Str(name) => Ok((name, token.span)),
            _ => Err(Self::unexpected(&token, expected)),
        }
    }

    pub(crate) fn is_name(&mut self) -> Result<bool> {
        self.is_name_at(0)
    }

    pub(crate) fn is_name_at(&mut self, n: usize) -> Result<bool> {
        Ok(matches!(
            self.peek_nth(n)?,
            Some(TokenKind::Ident(_) | TokenKind::Str(_))
        ))
    }

    pub(crate) fn string(&mut self) -> Result<String> {
        let token = self.next_token("string")?;
        match token.kind {
            TokenKind::Str(text) => Ok(text),
            _ => Err(Self::unexpected(&token, "string")),
        }
    }
}
