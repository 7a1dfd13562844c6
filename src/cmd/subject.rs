/*!
Subject enum for the `list` subcommand.

  tools       registered MCP tools (with parameter summary)
  prompts     prompt templates
  categories  security testing categories

Parsed case-insensitively; the singular form is accepted (`list tool`).
*/

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Subject {
    /// Registered MCP tools
    Tools,
    /// Prompt templates
    Prompts,
    /// Security testing categories
    Categories,
}

impl Subject {
    pub const fn variants() -> &'static [Subject] {
        &[Subject::Tools, Subject::Prompts, Subject::Categories]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Tools => "tools",
            Subject::Prompts => "prompts",
            Subject::Categories => "categories",
        }
    }

    /// Case-insensitive parse; the singular form is accepted too.
    pub fn from_str_ci(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_lowercase();
        let norm = norm.strip_suffix('s').unwrap_or(&norm);
        match norm {
            "tool" => Some(Subject::Tools),
            "prompt" => Some(Subject::Prompts),
            "categorie" | "category" => Some(Subject::Categories),
            _ => None,
        }
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Subject::from_str_ci(s).ok_or_else(|| {
            let expected: Vec<&str> = Subject::variants().iter().map(Subject::as_str).collect();
            format!("unknown subject '{s}' (expected one of: {})", expected.join(", "))
        })
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Subject;

    #[test]
    fn parse_case_insensitive() {
        assert_eq!(Subject::from_str_ci("TOOLS"), Some(Subject::Tools));
        assert_eq!(Subject::from_str_ci("tool"), Some(Subject::Tools));
        assert_eq!(Subject::from_str_ci(" Prompts "), Some(Subject::Prompts));
        assert_eq!(Subject::from_str_ci("category"), Some(Subject::Categories));
        assert_eq!(Subject::from_str_ci("categories"), Some(Subject::Categories));
        assert_eq!(Subject::from_str_ci("resources"), None);
    }

    #[test]
    fn from_str_lists_expected_subjects() {
        assert_eq!("Prompt".parse::<Subject>(), Ok(Subject::Prompts));
        let err = "resources".parse::<Subject>().unwrap_err();
        assert_eq!(
            err,
            "unknown subject 'resources' (expected one of: tools, prompts, categories)"
        );
    }

    #[test]
    fn display_round_trips() {
        for s in Subject::variants() {
            assert_eq!(Subject::from_str_ci(&s.to_string()), Some(*s));
        }
    }
}
