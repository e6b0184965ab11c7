//! # Execution Hooks
//!
//! The filesystem adapter never runs SQL itself. Operators configure a shell
//! command per direction (for example `psql "$DATABASE_URL" -f {path}`) and
//! the adapter runs it with the placeholders filled in.
//!
//! Placeholders: `{path}`, `{version}`, `{name}`. Values are shell-quoted.

use super::errors::{AdapterError, AdapterResult};
use super::MigrationVersion;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// A shell command template run for one migration direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    template: String,
}

impl Hook {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Command line with placeholders substituted
    pub fn render(&self, path: &Path, version: MigrationVersion, name: &str) -> String {
        self.template
            .replace("{path}", &shell_quote(&path.to_string_lossy()))
            .replace("{version}", &version.to_string())
            .replace("{name}", &shell_quote(name))
    }

    /// Run the hook through `sh -c`, failing on a non-zero exit.
    pub fn run(&self, path: &Path, version: MigrationVersion, name: &str) -> AdapterResult<()> {
        let command = self.render(path, version, name);
        debug!(%command, "running migration hook");

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .output()
            .map_err(|e| AdapterError::HookSpawn {
                command: command.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(AdapterError::HookFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        info!(version, %command, "migration hook finished");
        Ok(())
    }
}

/// Single-quote a value for POSIX sh.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_render_substitutes_placeholders() {
        let hook = Hook::new("psql -f {path} -v v={version} -v n={name}");
        let rendered = hook.render(&PathBuf::from("db/migrate/1_a.sql"), 1, "a");
        assert_eq!(rendered, "psql -f 'db/migrate/1_a.sql' -v v=1 -v n='a'");
    }

    #[test]
    fn test_render_quotes_single_quotes() {
        let hook = Hook::new("cat {path}");
        let rendered = hook.render(&PathBuf::from("it's.sql"), 1, "x");
        assert_eq!(rendered, r"cat 'it'\''s.sql'");
    }

    #[test]
    fn test_run_success() {
        let hook = Hook::new("test -n {name}");
        hook.run(Path::new("x"), 1, "a").unwrap();
    }

    #[test]
    fn test_run_failure_carries_stderr() {
        let hook = Hook::new("echo boom >&2; exit 4");
        let err = hook.run(Path::new("x"), 1, "a").unwrap_err();
        match err {
            AdapterError::HookFailed { code, stderr, .. } => {
                assert_eq!(code, Some(4));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
