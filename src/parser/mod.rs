//! Source loader: splits a source file into located statements.
//!
//! Statements end at a top-level `;`. Strings and bracket groups may contain
//! semicolons, so arrow-function bodies stay attached to their call. `//`
//! comments run to the end of the line.

use tracing::{debug, info};

use crate::error::{CompileError, ErrorKind, Result};
use crate::model::{Location, Statement};
use crate::processor::statement::parse_statement;

/// Parse a whole source file into statements in source order.
pub fn load(source: &str) -> Result<Vec<Statement>> {
    info!(bytes = source.len(), "source loaded");
    let mut statements = Vec::new();
    for (text, location) in split_statements(source)? {
        statements.push(parse_statement(&text, location)?);
    }
    debug!(statements = statements.len(), "statements parsed");
    Ok(statements)
}

fn syntax(message: impl Into<String>, location: Location) -> CompileError {
    CompileError::new(ErrorKind::Syntax, message, location)
}

fn closer(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Statement texts paired with the location of their first character.
fn split_statements(source: &str) -> Result<Vec<(String, Location)>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut start: Option<Location> = None;
    let mut groups: Vec<(char, Location)> = Vec::new();
    let mut string: Option<(char, Location)> = None;
    let mut escaped = false;

    let mut location = Location::new(1, 1);
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        let here = location;
        location = location.advance(ch);

        if let Some((quote, _)) = string {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                string = None;
            }
            continue;
        }

        if ch == '/' && chars.peek() == Some(&'/') {
            while chars.next_if(|c| *c != '\n').is_some() {
                location = location.advance('/');
            }
            continue;
        }

        if start.is_none() && !ch.is_whitespace() {
            start = Some(here);
        }

        match ch {
            '"' | '\'' | '`' => string = Some((ch, here)),
            '(' | '[' | '{' => groups.push((ch, here)),
            ')' | ']' | '}' => match groups.pop() {
                Some((open, _)) if closer(open) == ch => {}
                _ => return Err(syntax(format!("Unexpected '{ch}'"), here)),
            },
            ';' if groups.is_empty() => {
                if let Some(first) = start.take() {
                    out.push((current.trim().to_string(), first));
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }

    if let Some((quote, opened)) = string {
        return Err(syntax(format!("String literal {quote} was never closed"), opened));
    }
    if let Some((open, opened)) = groups.pop() {
        return Err(syntax(format!("'{open}' was never closed"), opened));
    }
    if start.is_some() {
        return Err(syntax("Expected ';'", location));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        split_statements(source)
            .unwrap()
            .into_iter()
            .map(|(text, _)| text)
            .collect()
    }

    #[test]
    fn test_split_statements() {
        let test_cases = vec![
            ("say a; say b;", vec!["say a", "say b"]),
            ("  ;; say a;", vec!["say a"]),
            (
                "Timer.add(cd, runOnce, @a, () => {say x; say y;});",
                vec!["Timer.add(cd, runOnce, @a, () => {say x; say y;})"],
            ),
            (
                "JMC.put(\"say ;)\"); say b;",
                vec!["JMC.put(\"say ;)\")", "say b"],
            ),
            ("say a; // say b;\nsay c;", vec!["say a", "say c"]),
            ("JMC.put(\"http://x\");", vec!["JMC.put(\"http://x\")"]),
            ("", vec![]),
        ];
        for (source, expected) in test_cases {
            assert_eq!(texts(source), expected, "source: {source:?}");
        }
    }

    #[test]
    fn test_statement_locations() {
        let statements = split_statements("say a;\n  // note\n   say b;").unwrap();
        let locations: Vec<Location> = statements.iter().map(|(_, loc)| *loc).collect();
        assert_eq!(locations, vec![Location::new(1, 1), Location::new(3, 4)]);
    }

    #[test]
    fn test_malformed_sources() {
        let test_cases = vec![
            ("say a", "Expected ';'"),
            ("Item.give(sword;", "'(' was never closed"),
            ("say a);", "Unexpected ')'"),
            ("JMC.put(\"abc);", "String literal \" was never closed"),
        ];
        for (source, message) in test_cases {
            let err = split_statements(source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax);
            assert_eq!(err.message, message, "source: {source:?}");
        }
    }

    #[test]
    fn test_load_classifies_statements() {
        let statements = load("say hi;\nTimer.set(cd, @a, 5);").unwrap();
        assert!(matches!(statements[0], Statement::Raw { .. }));
        match &statements[1] {
            Statement::Call(call) => {
                assert_eq!(call.call_string, "Timer.set");
                assert_eq!(call.location, Location::new(2, 1));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }
}
