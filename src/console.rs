//! Line commands for interactive mode.

use crate::models::Field;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  set <field> [value]   overwrite text|hash|url|ip|domain (empty value clears)
  file <path>           select a file for upload
  upload                upload the selected file
  summarize             summarize the text field
  show                  print the current report
  wait                  wait for all in-flight requests
  help                  show this help
  quit                  exit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Field, String),
    File(PathBuf),
    Upload,
    Summarize,
    Show,
    Wait,
    Help,
    Quit,
}

/// Parse a console line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None => (rest, ""),
            };
            if field.is_empty() {
                return Err("usage: set <field> [value]".to_string());
            }
            Command::Set(field.parse()?, value.to_string())
        }
        "file" => {
            if rest.is_empty() {
                return Err("usage: file <path>".to_string());
            }
            Command::File(PathBuf::from(rest))
        }
        "upload" => Command::Upload,
        "summarize" | "gpt" => Command::Summarize,
        "show" | "report" => Command::Show,
        "wait" => Command::Wait,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        // Bare `<field> <value>` is shorthand for `set`.
        other => match other.parse::<Field>() {
            Ok(field) => Command::Set(field, rest.to_string()),
            Err(_) => return Err(format!("unknown command: {} (try `help`)", other)),
        },
    };

    Ok(Some(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        assert_eq!(
            parse_command("set hash abc123").unwrap(),
            Some(Command::Set(Field::Hash, "abc123".to_string()))
        );
        assert_eq!(
            parse_command("  set text  two words here ").unwrap(),
            Some(Command::Set(Field::Text, "two words here".to_string()))
        );
        assert_eq!(
            parse_command("set domain").unwrap(),
            Some(Command::Set(Field::Domain, String::new()))
        );
    }

    #[test]
    fn test_parse_field_shorthand() {
        assert_eq!(
            parse_command("ip 198.51.100.4").unwrap(),
            Some(Command::Set(Field::Ip, "198.51.100.4".to_string()))
        );
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(parse_command("upload").unwrap(), Some(Command::Upload));
        assert_eq!(parse_command("SUMMARIZE").unwrap(), Some(Command::Summarize));
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
        assert_eq!(
            parse_command("file ./samples/a b.pdf").unwrap(),
            Some(Command::File(PathBuf::from("./samples/a b.pdf")))
        );
    }

    #[test]
    fn test_parse_blank_and_comments() {
        assert_eq!(parse_command("").unwrap(), None);
        assert_eq!(parse_command("   # note").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("set").is_err());
        assert!(parse_command("set port 22").is_err());
        assert!(parse_command("file").is_err());
        assert!(parse_command("launch").is_err());
    }
}
