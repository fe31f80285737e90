use clap::Parser;
use std::path::PathBuf;

use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Input source file (statements separated by `;`)
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    /// Namespace of the generated datapack
    #[arg(long, default_value = "jmc", value_parser = parse_namespace)]
    pub namespace: String,
    /// `pack_format` written to pack.mcmeta
    #[arg(long, default_value_t = 10)]
    pub pack_format: u32,
    /// Description written to pack.mcmeta
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    /// More output per occurrence (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Namespaces are lowercase resource-location segments.
fn parse_namespace(value: &str) -> Result<String, String> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '.' | '-'));
    if valid {
        Ok(value.to_string())
    } else {
        Err(format!(
            "invalid namespace '{value}': only [a-z0-9_.-] characters are allowed"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_validation() {
        let test_cases = vec![
            ("jmc", true),
            ("my_pack.v2-b", true),
            ("", false),
            ("MyPack", false),
            ("a b", false),
            ("ns:x", false),
        ];
        for (input, ok) in test_cases {
            assert_eq!(parse_namespace(input).is_ok(), ok, "namespace: {input:?}");
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["datapack-lower", "in.jmc", "out"]).unwrap();
        assert_eq!(cli.namespace, "jmc");
        assert_eq!(cli.pack_format, 10);
        assert_eq!(cli.log_format, LogFormat::Compact);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::try_parse_from(["datapack-lower", "in.jmc", "out", "-vv", "--namespace", "demo"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.namespace, "demo");

        assert!(Cli::try_parse_from(["datapack-lower", "in.jmc", "out", "--namespace", "Bad"]).is_err());
    }
}
