//! Splits one console line into a command name and its raw arguments.

/// A parsed console line. Arguments are raw strings; coercion is up to each handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Parse a line. Returns `None` for a blank line.
///
/// The line is trimmed at both ends and then split on single spaces, so runs
/// of spaces inside the line produce empty arguments rather than collapsing.
pub fn parse(line: &str) -> Option<ParsedCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut tokens = line.split(' ').map(str::to_string);
    let name = tokens.next()?;
    Some(ParsedCommand {
        name,
        args: tokens.collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        parse(line).unwrap().args
    }

    #[test]
    fn blank_lines_produce_nothing() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("\t\n"), None);
    }

    #[test]
    fn first_token_is_the_name() {
        let parsed = parse("shape rect 100 100").unwrap();
        assert_eq!(parsed.name, "shape");
        assert_eq!(parsed.args, vec!["rect", "100", "100"]);
    }

    #[test]
    fn name_only() {
        let parsed = parse("help").unwrap();
        assert_eq!(parsed.name, "help");
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let parsed = parse("  whoami  ").unwrap();
        assert_eq!(parsed.name, "whoami");
        assert!(parsed.args.is_empty());
    }

    #[test]
    fn inner_space_runs_are_not_collapsed() {
        assert_eq!(args("shape rect  100"), vec!["rect", "", "100"]);
    }

    #[test]
    fn tabs_are_not_separators() {
        let parsed = parse("ls\tfonts").unwrap();
        assert_eq!(parsed.name, "ls\tfonts");
    }

    #[test]
    fn case_is_preserved() {
        assert_eq!(parse("HELP").unwrap().name, "HELP");
    }
}
