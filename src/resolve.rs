//! Expansion of command specs into concrete command lines
//!
//! A command spec is `<executable-or-glob> [arguments]`. Only the first
//! space-delimited token is glob-expanded; arguments are carried over
//! verbatim to every match.

use glob::glob;
use log::trace;

use crate::error::AgentError;

/// Resolve an ordered list of command specs into executable command lines.
///
/// A spec whose glob matches nothing is kept as-is on the assumption that
/// the executable is on the search path. Glob failures are returned as
/// non-fatal errors alongside the commands that did resolve; the failed
/// spec contributes no commands.
pub fn resolve_commands<S: AsRef<str>>(specs: &[S]) -> (Vec<String>, Vec<AgentError>) {
    let mut commands = Vec::with_capacity(specs.len());
    let mut errors = Vec::new();

    for spec in specs {
        let spec = spec.as_ref();
        let (token, rest) = match spec.split_once(' ') {
            Some((token, rest)) => (token, Some(rest)),
            None => (spec, None),
        };

        let paths = match glob(token) {
            Ok(paths) => paths,
            Err(err) => {
                errors.push(AgentError::glob(spec, err));
                continue;
            }
        };

        let mut matches = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => matches.push(path.display().to_string()),
                Err(err) => errors.push(AgentError::Io(err.into_error())),
            }
        }

        if matches.is_empty() {
            // No filesystem matches; assume the command resolves via PATH
            // and run the spec unchanged.
            trace!("No glob matches for '{}', keeping literal spec", token);
            commands.push(spec.to_string());
        } else {
            for matched in matches {
                match rest {
                    Some(rest) => commands.push(format!("{} {}", matched, rest)),
                    None => commands.push(matched),
                }
            }
        }
    }

    (commands, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_no_match_keeps_literal_spec() {
        let (commands, errors) = resolve_commands(&["nonexistent_glob_*.sh"]);

        assert_eq!(commands, ["nonexistent_glob_*.sh"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_no_match_keeps_arguments() {
        let (commands, errors) = resolve_commands(&["mycollector --foo=bar"]);

        assert_eq!(commands, ["mycollector --foo=bar"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_glob_expands_with_arguments() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("collect_a.sh")).unwrap();
        File::create(dir.path().join("collect_b.sh")).unwrap();
        File::create(dir.path().join("other.txt")).unwrap();

        let spec = format!("{}/collect_*.sh --foo=bar", dir.path().display());
        let (mut commands, errors) = resolve_commands(&[spec]);

        assert!(errors.is_empty());
        commands.sort();
        assert_eq!(
            commands,
            [
                format!("{}/collect_a.sh --foo=bar", dir.path().display()),
                format!("{}/collect_b.sh --foo=bar", dir.path().display()),
            ]
        );
    }

    #[test]
    fn test_glob_expands_without_arguments() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("collect_a.sh")).unwrap();

        let spec = format!("{}/collect_*.sh", dir.path().display());
        let (commands, errors) = resolve_commands(&[spec]);

        assert!(errors.is_empty());
        assert_eq!(
            commands,
            [format!("{}/collect_a.sh", dir.path().display())]
        );
    }

    #[test]
    fn test_bad_pattern_is_non_fatal() {
        let (commands, errors) = resolve_commands(&["a[bad pattern", "echo ok"]);

        assert_eq!(commands, ["echo ok"]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AgentError::Glob { .. }));
    }

    #[test]
    fn test_specs_resolve_in_order() {
        let (commands, errors) = resolve_commands(&["first_cmd", "second_cmd -v"]);

        assert_eq!(commands, ["first_cmd", "second_cmd -v"]);
        assert!(errors.is_empty());
    }
}
