//! CLI command implementations
//!
//! Every command builds its collaborators from one [`Config`]: the
//! filesystem adapter, the version stamper and the schema dumper. The
//! console then hands them to a [`Session`]; `status` and `bring-to-top`
//! run once and print JSON.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::migrations::hooks::Hook;
use crate::migrations::{
    build_catalog, ActionError, ActionExecutor, ActionKind, ActionOutcome, MigrationAdapter,
    MigrationRunner, MigrationStatus, SequentialStamper, TimestampStamper, VersionStamper,
};
use crate::schema_dump::{CommandSchemaDumper, NoopSchemaDumper, SchemaDumper};

use super::args::{Cli, Command};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::prompt::InquirePrompter;
use super::session::Session;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "migconsole.json";

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding migration files (default "db/migrate")
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: PathBuf,

    /// Applied-versions ledger (default "<migrations_dir>/.ledger.json")
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,

    /// Shell template that applies one migration
    #[serde(default)]
    pub up_command: Option<String>,

    /// Shell template that reverts one migration
    #[serde(default)]
    pub down_command: Option<String>,

    #[serde(default)]
    pub schema_dump: SchemaDumpConfig,

    /// "timestamp" or "sequential"
    #[serde(default = "default_version_scheme")]
    pub version_scheme: String,
}

/// Post-action schema dump settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDumpConfig {
    /// Command whose stdout is the schema; dumping is off when unset
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default = "default_schema_output")]
    pub output: PathBuf,
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("db/migrate")
}
fn default_version_scheme() -> String {
    "timestamp".to_string()
}
fn default_schema_output() -> PathBuf {
    PathBuf::from("db/schema.sql")
}

impl Default for SchemaDumpConfig {
    fn default() -> Self {
        Self {
            command: None,
            output: default_schema_output(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            ledger_path: None,
            up_command: None,
            down_command: None,
            schema_dump: SchemaDumpConfig::default(),
            version_scheme: default_version_scheme(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Resolve the config for a run.
    ///
    /// An explicit path must exist. Without one, `migconsole.json` in the
    /// working directory is used when present and defaults otherwise.
    pub fn resolve(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load(path)
                } else {
                    debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.migrations_dir.as_os_str().is_empty() {
            return Err(CliError::config_error("migrations_dir must not be empty"));
        }

        if !matches!(self.version_scheme.as_str(), "timestamp" | "sequential") {
            return Err(CliError::config_error(format!(
                "Invalid version_scheme: '{}'. Must be 'timestamp' or 'sequential'.",
                self.version_scheme
            )));
        }

        for (field, template) in [
            ("up_command", &self.up_command),
            ("down_command", &self.down_command),
        ] {
            if let Some(template) = template {
                if !template.contains("{path}") {
                    return Err(CliError::config_error(format!(
                        "{} must contain the {{path}} placeholder",
                        field
                    )));
                }
            }
        }

        if self.schema_dump.command.is_some() && self.schema_dump.output.as_os_str().is_empty() {
            return Err(CliError::config_error(
                "schema_dump.output must be set when schema_dump.command is",
            ));
        }

        Ok(())
    }

    /// Apply command line overrides on top of file values
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.migrations_dir {
            self.migrations_dir = dir.clone();
        }
        if let Some(ledger) = &cli.ledger {
            self.ledger_path = Some(ledger.clone());
        }
    }

    /// Ledger location, next to the migrations unless configured
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger_path
            .clone()
            .unwrap_or_else(|| self.migrations_dir.join(".ledger.json"))
    }

    pub fn stamper(&self) -> Box<dyn VersionStamper> {
        match self.version_scheme.as_str() {
            "sequential" => Box::new(SequentialStamper),
            _ => Box::new(TimestampStamper::new()),
        }
    }

    pub fn dumper(&self) -> Box<dyn SchemaDumper> {
        match &self.schema_dump.command {
            Some(command) => Box::new(CommandSchemaDumper::new(
                command.clone(),
                self.schema_dump.output.clone(),
            )),
            None => Box::new(NoopSchemaDumper),
        }
    }

    /// Open the filesystem adapter described by this config
    pub fn runner(&self) -> CliResult<MigrationRunner> {
        let runner = MigrationRunner::open(&self.migrations_dir, self.ledger_path())?;
        Ok(runner.with_hooks(
            self.up_command.as_deref().map(Hook::new),
            self.down_command.as_deref().map(Hook::new),
        ))
    }
}

/// Main CLI entry point
///
/// Resolves the config and dispatches to the requested command.
pub fn run(cli: &Cli) -> CliResult<()> {
    let mut config = Config::resolve(cli.config.as_deref())?;
    config.apply_overrides(cli);
    config.validate()?;

    debug!(
        migrations_dir = %config.migrations_dir.display(),
        ledger = %config.ledger_path().display(),
        "configuration loaded"
    );

    run_command(&config, cli.command())
}

/// Run one command against a resolved config
pub fn run_command(config: &Config, cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Console => console(config),
        Command::Status => status(config, &mut io::stdout()),
        Command::BringToTop { version, rerun } => {
            bring_to_top(config, version, rerun, &mut io::stdout())
        }
    }
}

/// Interactive console until the operator is done
pub fn console(config: &Config) -> CliResult<()> {
    let mut runner = config.runner()?;
    let stamper = config.stamper();
    let dumper = config.dumper();

    let executor = ActionExecutor::new(&mut runner, stamper.as_ref(), dumper.as_ref());
    let mut prompter = InquirePrompter::new();
    Session::new(executor, &mut prompter).run()
}

/// Print the catalog as JSON
pub fn status(config: &Config, out: &mut dyn Write) -> CliResult<()> {
    let runner = config.runner()?;
    let report = status_report(&runner)?;
    write_json(out, &report)
}

fn status_report(adapter: &dyn MigrationAdapter) -> CliResult<Value> {
    let catalog = build_catalog(adapter)?;
    Ok(json!({
        "last_version": adapter.last_version()?,
        "migrations": catalog,
    }))
}

/// Renumber one migration without the console
pub fn bring_to_top(
    config: &Config,
    version: u64,
    rerun: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let mut runner = config.runner()?;
    let stamper = config.stamper();
    let dumper = config.dumper();

    let migration = build_catalog(&runner)?
        .into_iter()
        .find(|m| m.version == version)
        .ok_or_else(|| CliError::migration_not_found(version))?;
    // Only an applied migration can be re-run
    let rerun = rerun && migration.status == MigrationStatus::Up;

    let mut executor = ActionExecutor::new(&mut runner, stamper.as_ref(), dumper.as_ref());
    let outcome = executor
        .execute(ActionKind::BringToTop, &migration, || rerun)
        .map_err(action_error)?;

    match outcome {
        ActionOutcome::Moved { from, to } => {
            info!(from, to, rerun, "migration brought to top");
            write_json(
                out,
                &json!({ "from": from, "to": to, "name": migration.name, "rerun": rerun }),
            )
        }
        other => Err(CliError::action_failed(format!(
            "unexpected outcome {:?}",
            other
        ))),
    }
}

fn action_error(err: ActionError) -> CliError {
    let mut message = err.to_string();
    for frame in err.trace() {
        message.push_str("\n    ");
        message.push_str(frame);
    }
    CliError::action_failed(message)
}

fn write_json(out: &mut dyn Write, value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(CliErrorCode::ActionFailed, e.to_string()))?;
    writeln!(out, "{}", text)
        .map_err(|e| CliError::new(CliErrorCode::ActionFailed, format!("stdout: {}", e)))
}
