//! Inline markup (`&c`, `&<bold,#ff0000>`) to raw JSON text components.

use std::fmt;

use serde::Serialize;

use crate::error::{CompileError, ErrorKind, Result};
use crate::model::Location;
use crate::processor::datapack::{VARIABLE_OBJECTIVE, VARIABLE_SIGN};

const SIGN: char = '&';
const OPEN_BRACKET: char = '<';
const CLOSE_BRACKET: char = '>';

const COLORS: [&str; 16] = [
    "black",
    "dark_blue",
    "dark_green",
    "dark_aqua",
    "dark_red",
    "dark_purple",
    "gold",
    "gray",
    "dark_gray",
    "blue",
    "green",
    "aqua",
    "red",
    "light_purple",
    "yellow",
    "white",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Bold,
    Italic,
    Underlined,
    Strikethrough,
    Obfuscated,
}

impl Style {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "bold" => Some(Style::Bold),
            "italic" => Some(Style::Italic),
            "underlined" => Some(Style::Underlined),
            "strikethrough" => Some(Style::Strikethrough),
            "obfuscated" => Some(Style::Obfuscated),
            _ => None,
        }
    }
}

enum Code {
    Color(&'static str),
    Style(Style),
}

fn code(ch: char) -> Option<Code> {
    let code = match ch {
        '0' => Code::Color("black"),
        '1' => Code::Color("dark_blue"),
        '2' => Code::Color("dark_green"),
        '3' => Code::Color("dark_aqua"),
        '4' => Code::Color("dark_red"),
        '5' => Code::Color("dark_purple"),
        '6' => Code::Color("gold"),
        '7' => Code::Color("gray"),
        '8' => Code::Color("dark_gray"),
        '9' => Code::Color("blue"),
        'a' => Code::Color("green"),
        'b' => Code::Color("aqua"),
        'c' => Code::Color("red"),
        'd' => Code::Color("light_purple"),
        'e' => Code::Color("yellow"),
        'f' => Code::Color("white"),
        'k' => Code::Style(Style::Obfuscated),
        'l' => Code::Style(Style::Bold),
        'm' => Code::Style(Style::Strikethrough),
        'n' => Code::Style(Style::Underlined),
        'o' => Code::Style(Style::Italic),
        'r' => Code::Color("reset"),
        _ => return None,
    };
    Some(code)
}

fn is_named_color(name: &str) -> bool {
    name == "reset" || COLORS.contains(&name)
}

fn is_hex_color(prop: &str) -> bool {
    prop.len() == 7
        && prop.starts_with('#')
        && prop[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub name: String,
    pub objective: String,
}

/// One styled component. Field order is the serialized key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Dropped once the segment carries a score or selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underlined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obfuscated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl Segment {
    fn empty() -> Self {
        Segment {
            text: Some(String::new()),
            ..Segment::default()
        }
    }

    fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn set_style(&mut self, style: Style, value: bool) {
        let slot = match style {
            Style::Bold => &mut self.bold,
            Style::Italic => &mut self.italic,
            Style::Underlined => &mut self.underlined,
            Style::Strikethrough => &mut self.strikethrough,
            Style::Obfuscated => &mut self.obfuscated,
        };
        *slot = Some(value);
    }

    /// Empty-text segment inheriting color and styles.
    fn carry_over(&self) -> Self {
        Segment {
            text: Some(String::new()),
            color: self.color.clone(),
            bold: self.bold,
            italic: self.italic,
            underlined: self.underlined,
            strikethrough: self.strikethrough,
            obfuscated: self.obfuscated,
            score: None,
            selector: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextOptions {
    /// Force `italic: false` unless the text says otherwise.
    pub default_no_italic: bool,
    pub allow_score_selector: bool,
}

impl TextOptions {
    /// Chat and titles.
    pub const CHAT: TextOptions = TextOptions {
        default_no_italic: false,
        allow_score_selector: true,
    };
    /// Item names and lore.
    pub const ITEM: TextOptions = TextOptions {
        default_no_italic: true,
        allow_score_selector: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichText {
    segments: Vec<Segment>,
    default_no_italic: bool,
}

impl RichText {
    pub fn parse(raw: &str, location: Location, options: TextOptions) -> Result<Self> {
        let mut scanner = Scanner {
            segments: Vec::new(),
            current: Segment::empty(),
            current_color: None,
            location,
            allow_score_selector: options.allow_score_selector,
        };
        scanner.run(raw)?;
        Ok(RichText {
            segments: scanner.segments,
            default_no_italic: options.default_no_italic,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Element<'a> {
    Anchor(&'static str),
    Base { text: &'static str, italic: bool },
    Segment(&'a Segment),
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = match self.segments.as_slice() {
            [] => return Ok(()),
            [single] => {
                let mut single = single.clone();
                if self.default_no_italic && single.italic.is_none() {
                    single.italic = Some(false);
                }
                serde_json::to_string(&single)
            }
            many => {
                let mut elements = Vec::with_capacity(many.len() + 1);
                if !self.default_no_italic {
                    elements.push(Element::Anchor(""));
                } else if many[0].italic != Some(false) {
                    elements.push(Element::Base {
                        text: "",
                        italic: false,
                    });
                }
                elements.extend(many.iter().map(Element::Segment));
                serde_json::to_string(&elements)
            }
        };
        f.write_str(&json.map_err(|_| fmt::Error)?)
    }
}

enum State {
    Plain,
    ExpectCode,
    Bracket(String),
}

struct Scanner {
    segments: Vec<Segment>,
    current: Segment,
    current_color: Option<String>,
    location: Location,
    allow_score_selector: bool,
}

impl Scanner {
    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::new(ErrorKind::Value, message, self.location)
    }

    fn run(&mut self, raw: &str) -> Result<()> {
        let mut state = State::Plain;
        for ch in raw.chars() {
            state = match state {
                State::Bracket(mut content) => {
                    if ch == CLOSE_BRACKET {
                        self.parse_bracket(&content)?;
                        State::Plain
                    } else {
                        content.push(ch);
                        State::Bracket(content)
                    }
                }
                State::ExpectCode => match ch {
                    SIGN => {
                        self.push_text(ch);
                        State::Plain
                    }
                    OPEN_BRACKET => {
                        self.flush();
                        State::Bracket(String::new())
                    }
                    _ => {
                        self.flush();
                        self.parse_code(ch)?;
                        State::Plain
                    }
                },
                State::Plain if ch == SIGN => State::ExpectCode,
                State::Plain => {
                    self.push_text(ch);
                    State::Plain
                }
            };
        }

        match state {
            State::Bracket(_) => Err(self.error("'<' was never closed in formatted text")),
            State::ExpectCode => {
                self.flush();
                Err(self
                    .error(format!("Unexpected trailing '{SIGN}'"))
                    .with_suggestion(format!("Remove last '{SIGN}'")))
            }
            State::Plain => {
                self.flush();
                Ok(())
            }
        }
    }

    fn push_text(&mut self, ch: char) {
        if let Some(text) = self.current.text.as_mut() {
            text.push(ch);
        }
    }

    /// Moves the pending segment into the output if it has text.
    fn flush(&mut self) {
        if self.current.has_text() {
            let done = std::mem::replace(&mut self.current, Segment::empty());
            self.segments.push(done);
        }
    }

    fn set_color(&mut self, color: &str) -> Result<()> {
        if self.current.color.is_some() {
            return Err(self.error(format!("color({color}) used twice in formatted text")));
        }
        self.current.color = Some(color.to_string());
        self.current_color = Some(color.to_string());
        Ok(())
    }

    fn parse_code(&mut self, ch: char) -> Result<()> {
        match code(ch) {
            Some(Code::Color(color)) => self.set_color(color),
            Some(Code::Style(style)) => {
                if let Some(color) = &self.current_color {
                    self.current.color = Some(color.clone());
                }
                self.current.set_style(style, true);
                Ok(())
            }
            None => Err(self.error(format!("Unknown code format '{ch}'"))),
        }
    }

    fn set_score(&mut self, name: &str, objective: &str) -> Result<()> {
        if self.current.selector.is_some() {
            return Err(self.error("selector used with score in formatted text"));
        }
        if self.current.score.is_some() {
            return Err(self.error("score used twice in formatted text"));
        }
        self.current.score = Some(Score {
            name: name.to_string(),
            objective: objective.to_string(),
        });
        Ok(())
    }

    fn parse_bracket(&mut self, content: &str) -> Result<()> {
        for prop in content.split(',') {
            let prop = prop.trim();
            let (prop, value) = match prop.strip_prefix('!') {
                Some(rest) => (rest, false),
                None => (prop, true),
            };

            if is_named_color(prop) || is_hex_color(prop) {
                if !value {
                    return Err(self.error(format!("Color({prop}) cannot be false")));
                }
                self.set_color(prop)?;
            } else if let Some(style) = Style::from_name(prop) {
                self.current.set_style(style, value);
            } else if prop.starts_with(VARIABLE_SIGN) {
                if !value {
                    return Err(self.error("Score cannot be false"));
                }
                self.set_score(prop, VARIABLE_OBJECTIVE)?;
            } else if let Some((name, objective)) = prop
                .split_once(':')
                .filter(|(_, objective)| !objective.contains(':'))
            {
                if !value {
                    return Err(self.error("Score cannot be false"));
                }
                self.set_score(name, objective)?;
            } else if prop.starts_with('@') {
                if !value {
                    return Err(self.error("Selector cannot be false"));
                }
                if self.current.score.is_some() {
                    return Err(self.error("score used with selector in formatted text"));
                }
                if self.current.selector.is_some() {
                    return Err(self.error("selector used twice in formatted text"));
                }
                self.current.selector = Some(prop.to_string());
            } else {
                return Err(self.error(format!("Unknown property '{prop}'")));
            }
        }

        if self.current.color.is_none() {
            self.current.color = self.current_color.clone();
        }

        if self.current.score.is_some() || self.current.selector.is_some() {
            if !self.allow_score_selector {
                let what = if self.current.score.is_some() { "score" } else { "selector" };
                return Err(self.error(format!(
                    "{what} is not allowed in this context in formatted text"
                )));
            }
            let next = self.current.carry_over();
            let mut done = std::mem::replace(&mut self.current, next);
            done.text = None;
            self.segments.push(done);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(raw: &str, options: TextOptions) -> Result<String> {
        RichText::parse(raw, Location::new(1, 1), options).map(|t| t.to_string())
    }

    #[test]
    fn test_formatted_text() {
        let test_cases = vec![
            ("", TextOptions::CHAT, ""),
            ("Hello", TextOptions::CHAT, r#"{"text":"Hello"}"#),
            (
                "&4&lName",
                TextOptions::CHAT,
                r#"{"text":"Name","color":"dark_red","bold":true}"#,
            ),
            (
                "&<red,bold>Name",
                TextOptions::ITEM,
                r#"{"text":"Name","color":"red","bold":true,"italic":false}"#,
            ),
            ("a && b", TextOptions::CHAT, r#"{"text":"a & b"}"#),
            (
                "&<#00ff00>hex",
                TextOptions::CHAT,
                r##"{"text":"hex","color":"#00ff00"}"##,
            ),
            (
                "&cRed&lBold",
                TextOptions::CHAT,
                r#"["",{"text":"Red","color":"red"},{"text":"Bold","color":"red","bold":true}]"#,
            ),
            (
                "One&aTwo",
                TextOptions::ITEM,
                r#"[{"text":"","italic":false},{"text":"One"},{"text":"Two","color":"green"}]"#,
            ),
            (
                "&<!italic>One&aTwo",
                TextOptions::ITEM,
                r#"[{"text":"One","italic":false},{"text":"Two","color":"green"}]"#,
            ),
            (
                "Score: &<gold,$points>",
                TextOptions::CHAT,
                r#"["",{"text":"Score: "},{"color":"gold","score":{"name":"$points","objective":"__variable__"}}]"#,
            ),
            (
                "&<@s,bold>!",
                TextOptions::CHAT,
                r#"["",{"bold":true,"selector":"@s"},{"text":"!","bold":true}]"#,
            ),
            (
                "&<kills:@s>",
                TextOptions::CHAT,
                r#"{"score":{"name":"kills","objective":"@s"}}"#,
            ),
        ];
        for (raw, options, expected) in test_cases {
            assert_eq!(compile(raw, options).unwrap(), expected, "input: {raw}");
        }
    }

    #[test]
    fn test_formatted_text_errors() {
        let test_cases = vec![
            ("&<red", TextOptions::CHAT, "'<' was never closed in formatted text"),
            ("&<red,blue>", TextOptions::CHAT, "color(blue) used twice in formatted text"),
            ("&4&c", TextOptions::CHAT, "color(red) used twice in formatted text"),
            ("&<!red>", TextOptions::CHAT, "Color(red) cannot be false"),
            ("&<!$x>", TextOptions::CHAT, "Score cannot be false"),
            ("&<!@a>", TextOptions::CHAT, "Selector cannot be false"),
            ("&<$x,@a>", TextOptions::CHAT, "score used with selector in formatted text"),
            ("&<@a,$x>", TextOptions::CHAT, "selector used with score in formatted text"),
            ("&<$x,$y>", TextOptions::CHAT, "score used twice in formatted text"),
            ("&<@a,@s>", TextOptions::CHAT, "selector used twice in formatted text"),
            ("&<shiny>", TextOptions::CHAT, "Unknown property 'shiny'"),
            ("&z", TextOptions::CHAT, "Unknown code format 'z'"),
            ("&<$x>", TextOptions::ITEM, "score is not allowed in this context in formatted text"),
            ("&<@p>", TextOptions::ITEM, "selector is not allowed in this context in formatted text"),
            ("Name&", TextOptions::CHAT, "Unexpected trailing '&'"),
        ];
        for (raw, options, message) in test_cases {
            let err = compile(raw, options).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Value, "input: {raw}");
            assert_eq!(err.message, message, "input: {raw}");
        }
    }

    #[test]
    fn test_trailing_sign_suggestion() {
        let err = compile("Name&", TextOptions::CHAT).unwrap_err();
        assert_eq!(err.suggestion.as_deref(), Some("Remove last '&'"));
    }

    #[test]
    fn test_segments_skip_empty_text() {
        let text = RichText::parse("&a&<bold>", Location::new(1, 1), TextOptions::CHAT).unwrap();
        assert!(text.is_empty());
        assert_eq!(text.to_string(), "");
    }
}
