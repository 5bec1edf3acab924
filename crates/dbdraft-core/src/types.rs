use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Target SQL vocabulary of a diagram or an export request.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    MySql,
    MariaDb,
    PostgreSql,
    Sqlite,
    MsSql,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Generic,
        Dialect::MySql,
        Dialect::MariaDb,
        Dialect::PostgreSql,
        Dialect::Sqlite,
        Dialect::MsSql,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::MySql => "mysql",
            Dialect::MariaDb => "mariadb",
            Dialect::PostgreSql => "postgresql",
            Dialect::Sqlite => "sqlite",
            Dialect::MsSql => "mssql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(Dialect::Generic),
            "mysql" => Ok(Dialect::MySql),
            "mariadb" => Ok(Dialect::MariaDb),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::PostgreSql),
            "sqlite" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" | "tsql" => Ok(Dialect::MsSql),
            other => Err(Error::Unsupported(format!("unknown dialect '{other}'"))),
        }
    }
}

/// Formatting metadata for one logical type in one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    /// Whether a CHECK clause may be attached to columns of this type.
    pub has_check: bool,
    /// Whether the dialect requires an explicit length.
    pub sized: bool,
    /// Length used when a sized type is written without one.
    pub default_size: Option<u32>,
    /// Whether literal defaults must be single-quoted.
    pub quoted_default: bool,
}

const fn numeric() -> TypeInfo {
    TypeInfo {
        has_check: true,
        sized: false,
        default_size: None,
        quoted_default: false,
    }
}

const fn flag() -> TypeInfo {
    TypeInfo {
        has_check: false,
        sized: false,
        default_size: None,
        quoted_default: false,
    }
}

const fn sized(size: u32) -> TypeInfo {
    TypeInfo {
        has_check: true,
        sized: true,
        default_size: Some(size),
        quoted_default: true,
    }
}

const fn bits(size: u32) -> TypeInfo {
    TypeInfo {
        has_check: true,
        sized: true,
        default_size: Some(size),
        quoted_default: false,
    }
}

const fn text() -> TypeInfo {
    TypeInfo {
        has_check: true,
        sized: false,
        default_size: None,
        quoted_default: true,
    }
}

const fn temporal() -> TypeInfo {
    TypeInfo {
        has_check: false,
        sized: false,
        default_size: None,
        quoted_default: true,
    }
}

const fn opaque() -> TypeInfo {
    TypeInfo {
        has_check: false,
        sized: false,
        default_size: None,
        quoted_default: true,
    }
}

const MYSQL_TYPES: &[(&str, TypeInfo)] = &[
    ("TINYINT", numeric()),
    ("SMALLINT", numeric()),
    ("MEDIUMINT", numeric()),
    ("INT", numeric()),
    ("INTEGER", numeric()),
    ("BIGINT", numeric()),
    ("DECIMAL", numeric()),
    ("NUMERIC", numeric()),
    ("FLOAT", numeric()),
    ("DOUBLE", numeric()),
    ("REAL", numeric()),
    ("BIT", bits(1)),
    ("BOOLEAN", flag()),
    ("BOOL", flag()),
    ("DATE", temporal()),
    ("TIME", temporal()),
    ("DATETIME", temporal()),
    ("TIMESTAMP", temporal()),
    ("YEAR", temporal()),
    ("CHAR", sized(1)),
    ("VARCHAR", sized(255)),
    ("BINARY", sized(1)),
    ("VARBINARY", sized(255)),
    ("TINYTEXT", text()),
    ("TEXT", text()),
    ("MEDIUMTEXT", text()),
    ("LONGTEXT", text()),
    ("TINYBLOB", opaque()),
    ("BLOB", opaque()),
    ("MEDIUMBLOB", opaque()),
    ("LONGBLOB", opaque()),
    ("ENUM", text()),
    ("SET", text()),
    ("JSON", opaque()),
    ("GEOMETRY", opaque()),
    ("POINT", opaque()),
];

const MARIADB_EXTRA_TYPES: &[(&str, TypeInfo)] = &[
    ("UUID", text()),
    ("INET4", text()),
    ("INET6", text()),
];

const POSTGRES_TYPES: &[(&str, TypeInfo)] = &[
    ("SMALLINT", numeric()),
    ("INTEGER", numeric()),
    ("INT", numeric()),
    ("BIGINT", numeric()),
    ("DECIMAL", numeric()),
    ("NUMERIC", numeric()),
    ("REAL", numeric()),
    ("DOUBLE PRECISION", numeric()),
    ("SMALLSERIAL", numeric()),
    ("SERIAL", numeric()),
    ("BIGSERIAL", numeric()),
    ("MONEY", numeric()),
    ("CHAR", sized(1)),
    ("VARCHAR", sized(255)),
    ("TEXT", text()),
    ("BYTEA", opaque()),
    ("DATE", temporal()),
    ("TIME", temporal()),
    ("TIMETZ", temporal()),
    ("TIMESTAMP", temporal()),
    ("TIMESTAMPTZ", temporal()),
    ("INTERVAL", temporal()),
    ("BOOLEAN", flag()),
    ("BOOL", flag()),
    ("UUID", text()),
    ("JSON", opaque()),
    ("JSONB", opaque()),
    ("INET", text()),
    ("CIDR", text()),
    ("MACADDR", text()),
    ("BIT", bits(1)),
    ("VARBIT", bits(1)),
];

const SQLITE_TYPES: &[(&str, TypeInfo)] = &[
    ("INTEGER", numeric()),
    ("INT", numeric()),
    ("BIGINT", numeric()),
    ("REAL", numeric()),
    ("NUMERIC", numeric()),
    ("DECIMAL", numeric()),
    ("FLOAT", numeric()),
    ("DOUBLE", numeric()),
    ("BOOLEAN", flag()),
    ("TEXT", text()),
    ("CHAR", text()),
    ("VARCHAR", text()),
    ("CLOB", text()),
    ("BLOB", opaque()),
    ("DATE", temporal()),
    ("TIME", temporal()),
    ("DATETIME", temporal()),
    ("TIMESTAMP", temporal()),
];

const MSSQL_TYPES: &[(&str, TypeInfo)] = &[
    ("TINYINT", numeric()),
    ("SMALLINT", numeric()),
    ("INT", numeric()),
    ("INTEGER", numeric()),
    ("BIGINT", numeric()),
    ("BIT", flag()),
    ("DECIMAL", numeric()),
    ("NUMERIC", numeric()),
    ("MONEY", numeric()),
    ("SMALLMONEY", numeric()),
    ("FLOAT", numeric()),
    ("REAL", numeric()),
    ("DATE", temporal()),
    ("TIME", temporal()),
    ("DATETIME", temporal()),
    ("DATETIME2", temporal()),
    ("DATETIMEOFFSET", temporal()),
    ("SMALLDATETIME", temporal()),
    ("CHAR", sized(1)),
    ("VARCHAR", sized(255)),
    ("NCHAR", sized(1)),
    ("NVARCHAR", sized(255)),
    ("TEXT", text()),
    ("NTEXT", text()),
    ("BINARY", sized(1)),
    ("VARBINARY", sized(255)),
    ("IMAGE", opaque()),
    ("UNIQUEIDENTIFIER", text()),
    ("XML", opaque()),
];

const GENERIC_TYPES: &[(&str, TypeInfo)] = &[
    ("SMALLINT", numeric()),
    ("INT", numeric()),
    ("INTEGER", numeric()),
    ("BIGINT", numeric()),
    ("DECIMAL", numeric()),
    ("NUMERIC", numeric()),
    ("FLOAT", numeric()),
    ("DOUBLE", numeric()),
    ("REAL", numeric()),
    ("BOOLEAN", flag()),
    ("CHAR", sized(1)),
    ("VARCHAR", sized(255)),
    ("TEXT", text()),
    ("DATE", temporal()),
    ("TIME", temporal()),
    ("DATETIME", temporal()),
    ("TIMESTAMP", temporal()),
    ("BINARY", sized(1)),
    ("VARBINARY", sized(255)),
    ("BLOB", opaque()),
    ("JSON", opaque()),
    ("UUID", text()),
    ("ENUM", text()),
    ("SET", text()),
];

static CATALOG: LazyLock<HashMap<Dialect, HashMap<&'static str, TypeInfo>>> =
    LazyLock::new(|| {
        let build = |entries: &[&[(&'static str, TypeInfo)]]| {
            entries
                .iter()
                .flat_map(|group| group.iter().copied())
                .collect::<HashMap<_, _>>()
        };

        HashMap::from([
            (Dialect::Generic, build(&[GENERIC_TYPES])),
            (Dialect::MySql, build(&[MYSQL_TYPES])),
            (Dialect::MariaDb, build(&[MYSQL_TYPES, MARIADB_EXTRA_TYPES])),
            (Dialect::PostgreSql, build(&[POSTGRES_TYPES])),
            (Dialect::Sqlite, build(&[SQLITE_TYPES])),
            (Dialect::MsSql, build(&[MSSQL_TYPES])),
        ])
    });

/// Look up formatting metadata for a raw type such as `varchar(100)`.
pub fn type_info(dialect: Dialect, raw_type: &str) -> Option<TypeInfo> {
    let name = TypeName::parse(raw_type);
    CATALOG
        .get(&dialect)
        .and_then(|types| types.get(name.base.as_str()))
        .copied()
}

/// Raw type text split into its base name and parenthesised arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// Uppercased base name, e.g. `VARCHAR` or `DOUBLE PRECISION`.
    pub base: String,
    /// Argument text between the parentheses, e.g. `10,2`.
    pub args: Option<String>,
}

impl TypeName {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match (raw.find('('), raw.rfind(')')) {
            (Some(open), Some(close)) if close > open => {
                let args = raw[open + 1..close].trim();
                Self {
                    base: normalize_base(&raw[..open]),
                    args: (!args.is_empty()).then(|| args.to_string()),
                }
            }
            _ => Self {
                base: normalize_base(raw),
                args: None,
            },
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.args {
            Some(args) => write!(f, "{}({})", self.base, args),
            None => f.write_str(&self.base),
        }
    }
}

fn normalize_base(base: &str) -> String {
    base.split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a type for `dialect`, adding the default length to sized types written
/// without one (`VARCHAR` becomes `VARCHAR(255)`).
pub fn widen_type(dialect: Dialect, raw_type: &str) -> String {
    let mut name = TypeName::parse(raw_type);
    if name.args.is_none() {
        if let Some(info) = type_info(dialect, raw_type) {
            if info.sized {
                name.args = info.default_size.map(|size| size.to_string());
            }
        }
    }
    name.to_string()
}

const DEFAULT_KEYWORDS: &[&str] = &[
    "NULL",
    "TRUE",
    "FALSE",
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_USER",
    "LOCALTIME",
    "LOCALTIMESTAMP",
];

fn is_function_call(value: &str) -> bool {
    let Some(open) = value.find('(') else {
        return false;
    };
    value.ends_with(')')
        && open > 0
        && value[..open]
            .chars()
            .all(|ch| ch == '_' || ch == '.' || ch.is_ascii_alphanumeric())
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2
        && ((value.starts_with('\'') && value.ends_with('\''))
            || (value.starts_with('"') && value.ends_with('"')))
}

/// Render a raw default value as a SQL literal for a column of `raw_type`.
///
/// Function calls, keywords, already-quoted strings and values of unquoted
/// types pass through unchanged; everything else is single-quoted.
pub fn format_default(dialect: Dialect, raw_type: &str, value: &str) -> String {
    let value = value.trim();
    if is_function_call(value)
        || is_quoted(value)
        || DEFAULT_KEYWORDS.contains(&value.to_ascii_uppercase().as_str())
    {
        return value.to_string();
    }

    let quoted = type_info(dialect, raw_type)
        .map(|info| info.quoted_default)
        .unwrap_or(true);
    if quoted {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_names() {
        assert_eq!(
            TypeName::parse("decimal(10, 2)"),
            TypeName {
                base: "DECIMAL".to_string(),
                args: Some("10, 2".to_string()),
            }
        );
        assert_eq!(TypeName::parse("double  precision").base, "DOUBLE PRECISION");
        assert_eq!(TypeName::parse("VARCHAR()").args, None);
    }

    #[test]
    fn widens_sized_types_without_length() {
        assert_eq!(widen_type(Dialect::MySql, "varchar"), "VARCHAR(255)");
        assert_eq!(widen_type(Dialect::MsSql, "NVARCHAR"), "NVARCHAR(255)");
        assert_eq!(widen_type(Dialect::PostgreSql, "VARCHAR(40)"), "VARCHAR(40)");
        assert_eq!(widen_type(Dialect::Sqlite, "VARCHAR"), "VARCHAR");
        assert_eq!(widen_type(Dialect::MySql, "INT"), "INT");
    }

    #[test]
    fn formats_default_literals() {
        assert_eq!(format_default(Dialect::MySql, "INT", "5"), "5");
        assert_eq!(format_default(Dialect::MySql, "VARCHAR", "it's"), "'it''s'");
        assert_eq!(format_default(Dialect::PostgreSql, "TIMESTAMP", "now()"), "now()");
        assert_eq!(
            format_default(Dialect::MySql, "TIMESTAMP", "current_timestamp"),
            "current_timestamp"
        );
        assert_eq!(format_default(Dialect::MySql, "TEXT", "'x'"), "'x'");
        assert_eq!(format_default(Dialect::MySql, "MYSTERY", "x"), "'x'");
    }

    #[test]
    fn catalog_tables_list_each_type_once() {
        let tables = [
            ("generic", GENERIC_TYPES),
            ("mysql", MYSQL_TYPES),
            ("mariadb extras", MARIADB_EXTRA_TYPES),
            ("postgresql", POSTGRES_TYPES),
            ("sqlite", SQLITE_TYPES),
            ("mssql", MSSQL_TYPES),
        ];
        for (label, entries) in tables {
            let names: std::collections::HashSet<_> =
                entries.iter().map(|(name, _)| *name).collect();
            assert_eq!(names.len(), entries.len(), "{label}");
        }
        for (name, _) in MARIADB_EXTRA_TYPES {
            assert!(!MYSQL_TYPES.iter().any(|(base, _)| base == name), "{name}");
        }
    }

    #[test]
    fn parses_dialect_aliases() {
        assert_eq!("Postgres".parse::<Dialect>(), Ok(Dialect::PostgreSql));
        assert_eq!("sqlserver".parse::<Dialect>(), Ok(Dialect::MsSql));
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
