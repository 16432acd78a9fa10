//! Help text built from the command table.

use crate::error::ConsoleError;

use super::CommandName;

/// Commands listed by a bare `help`, in display order.
const LISTED: &[CommandName] = &[
    CommandName::Ls,
    CommandName::Shape,
    CommandName::Selection,
    CommandName::Analytics,
    CommandName::Whoami,
    CommandName::Clear,
    CommandName::Exit,
];

/// Without a topic: an aligned `name  : summary` table, preceded by two blank
/// lines. With a topic: usage and summary of that one command.
pub fn help_text(topic: Option<&str>) -> Result<String, ConsoleError> {
    match topic {
        None => Ok(overview()),
        Some(name) => {
            let cmd = CommandName::from_name(name).ok_or_else(|| ConsoleError::NotFound {
                name: name.to_string(),
            })?;
            let info = cmd.info();
            Ok(format!("{}\n  {}", info.usage, info.summary))
        }
    }
}

fn overview() -> String {
    let width = LISTED
        .iter()
        .map(|c| c.info().name.len())
        .max()
        .unwrap_or(0);
    let lines: Vec<String> = LISTED
        .iter()
        .map(|c| {
            let info = c.info();
            format!("{:<pad$}: {}", info.name, info.summary, pad = width + 2)
        })
        .collect();
    format!("\n\n{}\n", lines.join("\n"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn overview_is_aligned() {
        let text = help_text(None).unwrap();
        assert!(text.starts_with("\n\nls         : List fonts, styles, components\n"));
        assert!(text.contains("\nselection  : Show selected elements info\n"));
        assert!(text.ends_with("exit       : Close the plugin\n"));
        assert_eq!(text.lines().filter(|l| !l.is_empty()).count(), LISTED.len());
    }

    #[test]
    fn topic_shows_usage() {
        assert_eq!(
            help_text(Some("ls")).unwrap(),
            "ls <fonts|styles|components|help> [--current]\n  List fonts, styles, components"
        );
        assert_eq!(
            help_text(Some("nope")).unwrap_err(),
            ConsoleError::NotFound { name: "nope".into() }
        );
    }
}
