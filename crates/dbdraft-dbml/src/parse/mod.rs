mod grammar;

mod lexer;
use lexer::Lexer;
pub(crate) use lexer::TokenKind;

mod parser;
pub(crate) use parser::Parser;

use crate::ast::Document;
use crate::error::{DbmlError, Result};

pub(crate) trait Parse: Sized {
    fn parse(parser: &mut Parser<'_>) -> Result<Self>;
}

/// Parse DBML source into a syntax tree.
pub fn parse_document(src: &str) -> Result<Document> {
    if src.trim().is_empty() {
        return Err(DbmlError::EmptySource);
    }
    let mut parser = Parser::new(Lexer::new(src));
    Document::parse(&mut parser)
}
