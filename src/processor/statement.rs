//! Turns one statement's text into either an intrinsic call or a raw command.
//
//  Statement ::= CallString '(' args ')'     -> Statement::Call
//              | anything else              -> Statement::Raw
//  CallString ::= ident ('.' ident)*         (no whitespace before '(')

use crate::error::{CompileError, Result};
use crate::model::{CallSite, Location, Statement, TokenKind};
use crate::processor::lexer::{Lexer, parse_call_args};

pub fn parse_statement(text: &str, location: Location) -> Result<Statement> {
    let text = text.trim();

    let Some(open) = text.find('(') else {
        return Ok(raw(text, location));
    };
    let call_string = &text[..open];
    if !is_call_string(call_string) {
        return Ok(raw(text, location));
    }

    let group_start = advance_over(location, call_string);
    let mut lexer = Lexer::new(&text[open..], group_start);
    let group = match lexer.next() {
        Some(tok) => tok?,
        None => return Ok(raw(text, location)),
    };
    if group.kind != TokenKind::ParenRound {
        return Ok(raw(text, location));
    }
    if let Some(extra) = lexer.next() {
        let extra = extra?;
        return Err(CompileError::syntax(
            format!("Unexpected '{}' after {call_string}(...)", extra.text),
            &extra,
        ));
    }

    let inner = &group.text[1..group.text.len() - 1];
    let (positional, named) = parse_call_args(inner, group_start.advance('('))?;
    Ok(Statement::Call(CallSite {
        call_string: call_string.to_string(),
        positional,
        named,
        location,
    }))
}

fn raw(text: &str, location: Location) -> Statement {
    Statement::Raw {
        text: text.to_string(),
        location,
    }
}

fn is_call_string(text: &str) -> bool {
    !text.is_empty()
        && text.split('.').all(|part| {
            part.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn advance_over(location: Location, text: &str) -> Location {
    text.chars().fold(location, Location::advance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn call(text: &str) -> CallSite {
        match parse_statement(text, Location::new(1, 1)).unwrap() {
            Statement::Call(call) => call,
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_commands() {
        let test_cases = vec![
            "say hello",
            "say (hello)",
            "tellraw @a {\"text\":\"hi\"}",
            "execute as @a run function ns:tick",
            "1bad.name(x)",
        ];
        for src in test_cases {
            let stmt = parse_statement(src, Location::new(2, 3)).unwrap();
            assert_eq!(
                stmt,
                Statement::Raw {
                    text: src.to_string(),
                    location: Location::new(2, 3)
                }
            );
        }
    }

    #[test]
    fn test_intrinsic_call() {
        let c = call("Timer.add(cd, runOnce, @a[tag=x], function=() => {say done;})");
        assert_eq!(c.call_string, "Timer.add");
        let texts: Vec<&str> = c.positional.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["cd", "runOnce", "@a[tag=x]"]);
        assert_eq!(c.named.len(), 1);
        assert_eq!(c.named[0].0, "function");
        let body = &c.named[0].1.body;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].text, "say done");
        assert_eq!(body[0].location, Location::new(1, 51));
    }

    #[test]
    fn test_call_without_arguments() {
        let c = call("lib.helper.run()");
        assert_eq!(c.call_string, "lib.helper.run");
        assert!(c.positional.is_empty() && c.named.is_empty());
    }

    #[test]
    fn test_argument_locations() {
        let c = call("JMC.put(\"say hi\")");
        assert_eq!(c.positional[0].location, Location::new(1, 9));
    }

    #[test]
    fn test_malformed_calls() {
        let test_cases = vec!["Timer.add(a, b", "Timer.add(a) extra", "Item.give(a b)"];
        for src in test_cases {
            let err = parse_statement(src, Location::new(1, 1)).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax, "source: {src}");
        }
    }
}
