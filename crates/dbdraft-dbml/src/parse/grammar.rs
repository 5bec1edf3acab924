use super::{Parse, Parser, TokenKind};

use crate::ast::{
    ColumnDef, ColumnSettings, Document, EndpointDef, EnumDef, IndexColumn, IndexDef, InlineRef,
    Literal, NoteDef, RefDef, Relation, Span, TableDef,
};
use crate::error::{DbmlError, Result};

/// Value of one `key: value` entry in a `[...]` settings list.
#[derive(Debug, Clone, PartialEq)]
enum SettingValue {
    Str(String),
    Number(String),
    Expr(String),
    Color(String),
    /// One or more bare words, e.g. `set null`.
    Words(String),
    Ref(Relation, EndpointDef),
}

#[derive(Debug, Clone, PartialEq)]
struct Setting {
    /// Lowercased key words, e.g. `primary key`.
    key: String,
    value: Option<SettingValue>,
    span: Span,
}

impl Parse for Document {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let mut document = Document::default();

        while !p.is_eof()? {
            if p.is_keyword(0, "table")? {
                document.tables.push(p.parse()?);
            } else if p.is_keyword(0, "enum")? {
                document.enums.push(p.parse()?);
            } else if p.is_keyword(0, "ref")? {
                document.refs.extend(parse_refs(p)?);
            } else if p.is_keyword(0, "note")? {
                document.notes.push(p.parse()?);
            } else if p.is_keyword(0, "project")? || p.is_keyword(0, "tablegroup")? {
                skip_block(p)?;
            } else {
                let token = p.next_token("a top-level element")?;
                return Err(Parser::unexpected(
                    &token,
                    "`Table`, `enum`, `Ref`, `Note`, `Project` or `TableGroup`",
                ));
            }
        }

        Ok(document)
    }
}

/// Skip a block the model has no place for, such as `Project` or `TableGroup`.
fn skip_block(p: &mut Parser<'_>) -> Result<()> {
    let keyword = p.next_token("block keyword")?;
    loop {
        let token = p.next_token("`{`")?;
        if token.kind == TokenKind::LBrace {
            break;
        }
    }
    let mut depth = 1usize;
    while depth > 0 {
        match p.next_token("`}`")?.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => depth -= 1,
            _ => {}
        }
    }
    tracing::debug!(
        event = "dbml_block_skipped",
        block = %keyword.kind.describe(),
        line = keyword.span.line
    );
    Ok(())
}

/// `name` or `schema.name`; the schema qualifier is dropped.
fn qualified_name(p: &mut Parser<'_>, expected: &str) -> Result<(String, Span)> {
    let (mut name, span) = p.name(expected)?;
    while p.peek()? == Some(TokenKind::Dot) && p.is_name_at(1)? {
        p.expect(&TokenKind::Dot)?;
        name = p.name(expected)?.0;
    }
    Ok((name, span))
}

impl Parse for TableDef {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let span = p.expect_keyword("table")?;
        let (name, _) = qualified_name(p, "table name")?;

        let alias = if p.is_keyword(0, "as")? {
            p.expect_keyword("as")?;
            Some(p.name("table alias")?.0)
        } else {
            None
        };

        let mut table = TableDef {
            name,
            alias,
            color: None,
            note: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            span,
        };

        for setting in parse_settings(p)? {
            match (setting.key.as_str(), setting.value) {
                ("headercolor", Some(SettingValue::Color(color) | SettingValue::Str(color))) => {
                    table.color = Some(color);
                }
                ("note", Some(SettingValue::Str(note))) => table.note = Some(note),
                (key, _) => ignore_setting("table", key, setting.span),
            }
        }

        p.expect(&TokenKind::LBrace)?;
        while !p.eat(&TokenKind::RBrace)? {
            if p.is_keyword(0, "note")?
                && matches!(p.peek_nth(1)?, Some(TokenKind::Colon | TokenKind::LBrace))
            {
                table.note = Some(parse_note_body(p)?);
            } else if p.is_keyword(0, "indexes")? && p.peek_nth(1)? == Some(TokenKind::LBrace) {
                p.expect_keyword("indexes")?;
                p.expect(&TokenKind::LBrace)?;
                while !p.eat(&TokenKind::RBrace)? {
                    table.indexes.push(p.parse()?);
                }
            } else {
                table.columns.push(p.parse()?);
            }
        }

        Ok(table)
    }
}

/// `Note: '...'` or `Note { '...' }` inside a table.
fn parse_note_body(p: &mut Parser<'_>) -> Result<String> {
    p.expect_keyword("note")?;
    if p.eat(&TokenKind::Colon)? {
        return p.string();
    }
    p.expect(&TokenKind::LBrace)?;
    let note = p.string()?;
    p.expect(&TokenKind::RBrace)?;
    Ok(note)
}

impl Parse for ColumnDef {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let (name, span) = p.name("column name")?;
        let data_type = column_type(p)?;

        let mut settings = ColumnSettings::default();
        for setting in parse_settings(p)? {
            match (setting.key.as_str(), setting.value) {
                ("pk" | "primary key", None) => settings.primary = true,
                ("increment", None) => settings.increment = true,
                ("not null", None) => settings.not_null = true,
                ("null", None) => settings.not_null = false,
                ("unique", None) => settings.unique = true,
                ("default", Some(value)) => {
                    settings.default = Some(match value {
                        SettingValue::Number(number) => Literal::Number(number),
                        SettingValue::Str(text) => Literal::Str(text),
                        SettingValue::Expr(expr) => Literal::Expr(expr),
                        SettingValue::Words(words) => Literal::Keyword(words),
                        SettingValue::Color(_) | SettingValue::Ref(..) => {
                            return Err(DbmlError::parse(
                                setting.span,
                                "default must be a number, string, expression or keyword",
                            ));
                        }
                    });
                }
                ("note", Some(SettingValue::Str(note))) => settings.note = Some(note),
                ("check", Some(SettingValue::Expr(check) | SettingValue::Str(check))) => {
                    settings.check = Some(check);
                }
                ("ref", Some(SettingValue::Ref(relation, target))) => {
                    settings.inline_ref = Some(InlineRef { relation, target });
                }
                (key, _) => ignore_setting("column", key, setting.span),
            }
        }

        Ok(ColumnDef {
            name,
            data_type,
            settings,
            span,
        })
    }
}

/// Column type: a quoted name, or `name[.name][(args)]`.
fn column_type(p: &mut Parser<'_>) -> Result<String> {
    let token = p.next_token("column type")?;
    let mut text = match token.kind {
        TokenKind::Str(text) => return Ok(text),
        TokenKind::Ident(ident) => ident,
        _ => return Err(Parser::unexpected(&token, "column type")),
    };

    while p.peek()? == Some(TokenKind::Dot) {
        p.expect(&TokenKind::Dot)?;
        text.push('.');
        text.push_str(&p.name("column type")?.0);
    }

    if p.eat(&TokenKind::LParen)? {
        text.push('(');
        loop {
            let token = p.next_token("type argument")?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::Comma => text.push(','),
                TokenKind::Number(value) | TokenKind::Ident(value) => text.push_str(&value),
                TokenKind::Str(value) => text.push_str(&format!("'{value}'")),
                _ => return Err(Parser::unexpected(&token, "type argument")),
            }
        }
        text.push(')');
    }

    Ok(text)
}

impl Parse for IndexDef {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let span = p.span()?;
        let mut index = IndexDef {
            span,
            ..IndexDef::default()
        };

        if p.eat(&TokenKind::LParen)? {
            loop {
                index.columns.push(index_column(p)?);
                if p.eat(&TokenKind::RParen)? {
                    break;
                }
                p.expect(&TokenKind::Comma)?;
            }
        } else {
            index.columns.push(index_column(p)?);
        }

        for setting in parse_settings(p)? {
            match (setting.key.as_str(), setting.value) {
                ("unique", None) => index.unique = true,
                ("pk", None) => index.primary = true,
                ("name", Some(SettingValue::Str(name))) => index.name = Some(name),
                (key, _) => ignore_setting("index", key, setting.span),
            }
        }

        Ok(index)
    }
}

fn index_column(p: &mut Parser<'_>) -> Result<IndexColumn> {
    let token = p.next_token("index column")?;
    match token.kind {
        TokenKind::Ident(name) | TokenKind::Str(name) => Ok(IndexColumn::Name(name)),
        TokenKind::Expr(expr) => Ok(IndexColumn::Expr(expr)),
        _ => Err(Parser::unexpected(&token, "index column")),
    }
}

impl Parse for EnumDef {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let span = p.expect_keyword("enum")?;
        let (name, _) = qualified_name(p, "enum name")?;
        p.expect(&TokenKind::LBrace)?;

        let mut values = Vec::new();
        while !p.eat(&TokenKind::RBrace)? {
            values.push(p.name("enum value")?.0);
            for setting in parse_settings(p)? {
                ignore_setting("enum value", &setting.key, setting.span);
            }
        }

        Ok(EnumDef { name, values, span })
    }
}

impl Parse for NoteDef {
    fn parse(p: &mut Parser<'_>) -> Result<Self> {
        let span = p.expect_keyword("note")?;
        let (name, _) = p.name("note name")?;
        p.expect(&TokenKind::LBrace)?;
        let content = p.string()?;
        p.expect(&TokenKind::RBrace)?;
        Ok(NoteDef {
            name,
            content,
            span,
        })
    }
}

/// `Ref [name]: a.b > c.d [...]` or `Ref [name] { a.b > c.d [...] ... }`.
fn parse_refs(p: &mut Parser<'_>) -> Result<Vec<RefDef>> {
    let span = p.expect_keyword("ref")?;
    let name = if p.is_name()? {
        Some(p.name("ref name")?.0)
    } else {
        None
    };

    if p.eat(&TokenKind::Colon)? {
        return Ok(vec![ref_body(p, name, span)?]);
    }

    p.expect(&TokenKind::LBrace)?;
    let mut refs = Vec::new();
    while !p.eat(&TokenKind::RBrace)? {
        let span = p.span()?;
        refs.push(ref_body(p, name.clone(), span)?);
    }
    Ok(refs)
}

fn ref_body(p: &mut Parser<'_>, name: Option<String>, span: Span) -> Result<RefDef> {
    let start = endpoint(p)?;
    let relation = relation(p)?;
    let end = endpoint(p)?;

    let mut on_delete = None;
    let mut on_update = None;
    for setting in parse_settings(p)? {
        match (setting.key.as_str(), setting.value) {
            ("delete", Some(SettingValue::Words(action) | SettingValue::Str(action))) => {
                on_delete = Some(action);
            }
            ("update", Some(SettingValue::Words(action) | SettingValue::Str(action))) => {
                on_update = Some(action);
            }
            (key, _) => ignore_setting("ref", key, setting.span),
        }
    }

    Ok(RefDef {
        name,
        start,
        relation,
        end,
        on_delete,
        on_update,
        span,
    })
}

fn relation(p: &mut Parser<'_>) -> Result<Relation> {
    let token = p.next_token("relation `>`, `<`, `-` or `<>`")?;
    match token.kind {
        TokenKind::Gt => Ok(Relation::ManyToOne),
        TokenKind::Lt => Ok(Relation::OneToMany),
        TokenKind::Minus => Ok(Relation::OneToOne),
        TokenKind::LtGt => Ok(Relation::ManyToMany),
        _ => Err(Parser::unexpected(&token, "relation `>`, `<`, `-` or `<>`")),
    }
}

/// `table.column`, `schema.table.column` or `table.(a, b)`.
fn endpoint(p: &mut Parser<'_>) -> Result<EndpointDef> {
    let start = p.span()?;
    let mut segments = vec![p.name("table name")?.0];

    while p.eat(&TokenKind::Dot)? {
        if p.eat(&TokenKind::LParen)? {
            let mut columns = Vec::new();
            loop {
                columns.push(p.name("column name")?.0);
                if p.eat(&TokenKind::RParen)? {
                    break;
                }
                p.expect(&TokenKind::Comma)?;
            }
            let table = segments.pop().unwrap_or_default();
            return Ok(EndpointDef { table, columns });
        }
        segments.push(p.name("column name")?.0);
    }

    match (segments.pop(), segments.pop()) {
        (Some(column), Some(table)) => Ok(EndpointDef {
            table,
            columns: vec![column],
        }),
        _ => Err(DbmlError::parse(start, "expected `table.column`")),
    }
}

/// Optional `[key, key: value, ...]` list.
fn parse_settings(p: &mut Parser<'_>) -> Result<Vec<Setting>> {
    let mut settings = Vec::new();
    if !p.eat(&TokenKind::LBracket)? {
        return Ok(settings);
    }

    loop {
        let span = p.span()?;
        let mut words = Vec::new();
        while let Some(TokenKind::Ident(word)) = p.peek()? {
            p.next_token("setting")?;
            words.push(word.to_ascii_lowercase());
        }
        if words.is_empty() {
            let token = p.next_token("setting name")?;
            return Err(Parser::unexpected(&token, "setting name"));
        }

        let value = if p.eat(&TokenKind::Colon)? {
            Some(setting_value(p)?)
        } else {
            None
        };
        settings.push(Setting {
            key: words.join(" "),
            value,
            span,
        });

        if p.eat(&TokenKind::RBracket)? {
            return Ok(settings);
        }
        p.expect(&TokenKind::Comma)?;
    }
}

fn setting_value(p: &mut Parser<'_>) -> Result<SettingValue> {
    match p.peek()? {
        Some(TokenKind::Gt | TokenKind::Lt | TokenKind::Minus | TokenKind::LtGt) => {
            let relation = relation(p)?;
            Ok(SettingValue::Ref(relation, endpoint(p)?))
        }
        Some(TokenKind::Ident(_)) => {
            let mut words = Vec::new();
            while let Some(TokenKind::Ident(word)) = p.peek()? {
                p.next_token("setting value")?;
                words.push(word);
            }
            Ok(SettingValue::Words(words.join(" ")))
        }
        _ => {
            let token = p.next_token("setting value")?;
            match token.kind {
                TokenKind::Str(text) => Ok(SettingValue::Str(text)),
                TokenKind::Number(number) => Ok(SettingValue::Number(number)),
                TokenKind::Expr(expr) => Ok(SettingValue::Expr(expr)),
                TokenKind::Color(color) => Ok(SettingValue::Color(color)),
                _ => Err(Parser::unexpected(&token, "setting value")),
            }
        }
    }
}

fn ignore_setting(owner: &str, key: &str, span: Span) {
    tracing::debug!(event = "dbml_setting_ignored", owner, key, line = span.line);
}
