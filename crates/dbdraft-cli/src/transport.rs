//! JSON-lines bridge to a hosting page.
//!
//! Each input line is an [`Envelope`]. Envelopes from any origin other than
//! the trusted one are dropped without a reply; accepted envelopes get exactly
//! one [`Reply`] line addressed back to the trusted origin.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use dbdraft_core::{Diagnostics, Dialect};
use dbdraft_dbml::{export_dbml, import_dbml};
use dbdraft_sql::export_sql;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: String,
    pub dbml: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Accepted {
        target_origin: String,
        dbml: String,
        sql: String,
        diagnostics: Diagnostics,
    },
    Failed {
        target_origin: String,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenStats {
    pub accepted: usize,
    pub ignored: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct Listener {
    trusted_origin: String,
    dialect: Dialect,
}

impl Listener {
    pub fn new(trusted_origin: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            trusted_origin: trusted_origin.into(),
            dialect,
        }
    }

    pub fn trusted_origin(&self) -> &str {
        &self.trusted_origin
    }

    /// Answer one envelope, or `None` when it comes from an untrusted origin.
    pub fn handle(&self, envelope: &Envelope) -> Option<Reply> {
        if envelope.origin != self.trusted_origin {
            tracing::warn!(
                event = "envelope_untrusted",
                origin = %envelope.origin,
                trusted = %self.trusted_origin
            );
            return None;
        }

        let reply = match self.render(&envelope.dbml) {
            Ok((dbml, sql, diagnostics)) => Reply::Accepted {
                target_origin: self.trusted_origin.clone(),
                dbml,
                sql,
                diagnostics,
            },
            Err(error) => {
                tracing::warn!(event = "envelope_failed", error = %error);
                Reply::Failed {
                    target_origin: self.trusted_origin.clone(),
                    error,
                }
            }
        };
        Some(reply)
    }

    /// Decode and answer one raw input line. Blank and malformed lines are ignored.
    pub fn handle_line(&self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => self.handle(&envelope),
            Err(err) => {
                tracing::warn!(event = "envelope_malformed", error = %err);
                None
            }
        }
    }

    /// Serve envelopes from `input` until EOF, writing one reply line per accepted envelope.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> std::io::Result<ListenStats> {
        let mut stats = ListenStats::default();
        for line in input.lines() {
            let line = line?;
            match self.handle_line(&line) {
                Some(reply) => {
                    if matches!(reply, Reply::Failed { .. }) {
                        stats.failed += 1;
                    } else {
                        stats.accepted += 1;
                    }
                    serde_json::to_writer(&mut output, &reply)?;
                    output.write_all(b"\n")?;
                    output.flush()?;
                }
                None if line.trim().is_empty() => {}
                None => stats.ignored += 1,
            }
        }
        tracing::info!(
            event = "listen_finished",
            accepted = stats.accepted,
            ignored = stats.ignored,
            failed = stats.failed
        );
        Ok(stats)
    }

    fn render(&self, source: &str) -> Result<(String, String, Diagnostics), String> {
        let mut import = import_dbml(source).map_err(|err| err.to_string())?;
        import.diagram.database = self.dialect;
        let export = export_sql(&import.diagram, self.dialect).map_err(|err| err.to_string())?;
        let mut diagnostics = import.diagnostics;
        diagnostics.merge(export.diagnostics);
        Ok((export_dbml(&import.diagram), export.sql, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "http://localhost:3000";

    fn envelope(origin: &str, dbml: &str) -> String {
        serde_json::to_string(&Envelope {
            origin: origin.to_string(),
            dbml: dbml.to_string(),
        })
        .expect("encode")
    }

    #[test]
    fn trusted_envelopes_get_normalized_dbml_and_sql() {
        let listener = Listener::new(ORIGIN, Dialect::PostgreSql);
        let reply = listener
            .handle_line(&envelope(ORIGIN, "Table users {\n  id int [pk]\n}"))
            .expect("reply");

        let Reply::Accepted {
            target_origin,
            dbml,
            sql,
            diagnostics,
        } = reply
        else {
            panic!("expected an accepted reply");
        };
        assert_eq!(target_origin, ORIGIN);
        assert!(dbml.starts_with("Table users {"));
        assert!(sql.contains("CREATE TABLE \"users\""));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn untrusted_and_malformed_lines_are_ignored() {
        let listener = Listener::new(ORIGIN, Dialect::Sqlite);
        assert!(listener
            .handle_line(&envelope("https://evil.example", "Table t {\n  id int\n}"))
            .is_none());
        assert!(listener.handle_line("{not json").is_none());
        assert!(listener.handle_line("   ").is_none());
    }

    #[test]
    fn parse_failures_reply_with_an_error() {
        let listener = Listener::new(ORIGIN, Dialect::MySql);
        let reply = listener
            .handle_line(&envelope(ORIGIN, "Table {"))
            .expect("reply");
        assert!(matches!(reply, Reply::Failed { ref target_origin, .. } if target_origin == ORIGIN));
    }

    #[test]
    fn run_counts_and_writes_one_line_per_reply() {
        let listener = Listener::new(ORIGIN, Dialect::PostgreSql);
        let input = [
            envelope(ORIGIN, "Table a {\n  id int\n}"),
            envelope("http://other", "Table b {\n  id int\n}"),
            String::new(),
            "garbage".to_string(),
            envelope(ORIGIN, ""),
        ]
        .join("\n");

        let mut output = Vec::new();
        let stats = listener
            .run(input.as_bytes(), &mut output)
            .expect("run");
        assert_eq!(
            stats,
            ListenStats {
                accepted: 1,
                ignored: 2,
                failed: 1,
            }
        );

        let output = String::from_utf8(output).expect("utf8");
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["target_origin"], ORIGIN);
        assert!(lines[0]["sql"].is_string());
        assert!(lines[1]["error"].as_str().is_some_and(|e| e.contains("empty")));
    }
}
