//! Command-line assembly with per-argument escaping.
//!
//! Values coming from configuration (paths, profile names, log files) may
//! contain characters the shell interprets; each argument declares how it
//! wants to be protected when the line ends up in a crontab.

use std::collections::BTreeMap;

/// How a single argument is protected against shell interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// Backslash-escape spaces, double quotes and `$`.
    Escape,
    /// Wrap in double quotes when needed, leaving `$` and glob characters
    /// live for the shell.
    KeepGlobQuote,
    /// Use the value verbatim.
    NoEscape,
}

/// Ordered command-line builder: named flags first (sorted by flag name,
/// each rendered as `--name value`), positional arguments after.
#[derive(Debug, Clone, Default)]
pub struct Args {
    flags: BTreeMap<String, Vec<String>>,
    args: Vec<String>,
}

impl Args {
    pub fn new() -> Self {
        Args::default()
    }

    pub fn add_flag(&mut self, name: &str, value: &str, arg_type: ArgType) {
        self.flags
            .entry(name.to_string())
            .or_default()
            .push(escape_value(value, arg_type));
    }

    pub fn add_flags(&mut self, name: &str, values: &[&str], arg_type: ArgType) {
        for value in values {
            self.add_flag(name, value, arg_type);
        }
    }

    pub fn add_arg(&mut self, value: &str, arg_type: ArgType) {
        self.args.push(escape_value(value, arg_type));
    }

    pub fn add_args(&mut self, values: &[&str], arg_type: ArgType) {
        for value in values {
            self.add_arg(value, arg_type);
        }
    }

    /// All arguments in final order, ready to join with single spaces.
    pub fn get_all(&self) -> Vec<String> {
        let mut all = Vec::new();
        for (name, values) in &self.flags {
            for value in values {
                all.push(format!("--{name}"));
                all.push(value.clone());
            }
        }
        all.extend(self.args.iter().cloned());
        all
    }
}

fn escape_value(value: &str, arg_type: ArgType) -> String {
    // cmd.exe has no notion of backslash escaping; the value goes through as is
    if cfg!(windows) {
        return value.to_string();
    }
    match arg_type {
        ArgType::NoEscape => value.to_string(),
        ArgType::Escape => {
            let mut escaped = String::with_capacity(value.len());
            for c in value.chars() {
                if c == ' ' || c == '"' || c == '$' {
                    escaped.push('\\');
                }
                escaped.push(c);
            }
            escaped
        }
        ArgType::KeepGlobQuote => {
            if value.contains(' ') || value.contains('"') || value.contains('$') {
                format!("\"{}\"", value.replace('"', "\\\""))
            } else {
                value.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_produces_no_arguments() {
        assert_eq!(Args::new().get_all(), Vec::<String>::new());
    }

    #[test]
    fn flags_render_before_positional_arguments() {
        let mut args = Args::new();
        args.add_flags("aaa", &["one", "two"], ArgType::Escape);
        args.add_flag("bbb", "three", ArgType::Escape);
        assert_eq!(
            args.get_all(),
            vec!["--aaa", "one", "--aaa", "two", "--bbb", "three"]
        );
    }

    #[test]
    fn positional_arguments_keep_order() {
        let mut args = Args::new();
        args.add_args(&["one", "two"], ArgType::Escape);
        args.add_arg("three", ArgType::Escape);
        assert_eq!(args.get_all(), vec!["one", "two", "three"]);
    }

    #[cfg(not(windows))]
    #[test]
    fn escaping_modes() {
        let mut args = Args::new();
        args.add_flags("aaa", &["simple", "with space", "with\"quote"], ArgType::Escape);
        args.add_flags(
            "bbb",
            &["simple", "with space", "with\"quote"],
            ArgType::KeepGlobQuote,
        );
        args.add_args(
            &["with space", "with\"quote", "with$variable"],
            ArgType::Escape,
        );
        args.add_arg("with space\"quote", ArgType::KeepGlobQuote);
        args.add_arg("with$variable", ArgType::KeepGlobQuote);

        let expected = vec![
            "--aaa",
            "simple",
            "--aaa",
            r"with\ space",
            "--aaa",
            r#"with\"quote"#,
            "--bbb",
            "simple",
            "--bbb",
            r#""with space""#,
            "--bbb",
            r#""with\"quote""#,
            r"with\ space",
            r#"with\"quote"#,
            r"with\$variable",
            r#""with space\"quote""#,
            "\"with$variable\"",
        ];
        assert_eq!(args.get_all(), expected);
    }

    #[cfg(windows)]
    #[test]
    fn no_escaping_on_windows() {
        let mut args = Args::new();
        args.add_arg("with space", ArgType::Escape);
        args.add_arg("with$variable", ArgType::KeepGlobQuote);
        assert_eq!(args.get_all(), vec!["with space", "with$variable"]);
    }
}
