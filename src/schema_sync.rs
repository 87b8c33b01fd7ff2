//! Schema sync through an external schema tool.
//!
//! The tool (Atlas by default) is a black box: we hand it the target URL, a
//! scratch "dev" URL it may wipe freely while planning, and the declarative
//! schema file, then judge the result by exit status alone.
//!
//! Process execution sits behind [`CommandRunner`] so the suite setup can be
//! exercised with a fake instead of a real binary.

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::config::Config;
use crate::redact::{redact_args, redact_dsn};

/// Exit status of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status: {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Result of running a command: its status and everything it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: CommandStatus,
    /// stdout followed by stderr.
    pub output: String,
}

/// Runs a program to completion and captures its output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String], dir: &Path) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], dir: &Path) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .with_context(|| {
                format!(
                    "Failed to execute {} in {} (is it installed and on PATH?)",
                    program,
                    dir.display()
                )
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.into_owned(),
            (true, false) => stderr.into_owned(),
            (false, false) if stdout.ends_with('\n') => format!("{}{}", stdout, stderr),
            (false, false) => format!("{}\n{}", stdout, stderr),
        };

        Ok(CommandOutput {
            status: CommandStatus {
                code: output.status.code(),
            },
            output: combined,
        })
    }
}

/// One `schema apply` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaApply {
    pub tool: String,
    pub schema_file: PathBuf,
    pub working_dir: PathBuf,
    pub target_url: String,
    pub dev_url: String,
    pub auto_approve: bool,
}

impl SchemaApply {
    /// Apply the configured schema file to the configured database, using the
    /// configured dev database as scratch space. Always auto-approved.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(SchemaApply {
            tool: config.schema.tool.clone(),
            schema_file: config.schema.file.clone(),
            working_dir: config.schema.dir.clone(),
            target_url: config.database.url()?,
            dev_url: config.dev_database().url()?,
            auto_approve: true,
        })
    }

    /// `schema apply --to file://<file> --url <target> --dev-url <dev> [--auto-approve]`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "schema".to_string(),
            "apply".to_string(),
            "--to".to_string(),
            format!("file://{}", self.schema_file.display()),
            "--url".to_string(),
            self.target_url.clone(),
            "--dev-url".to_string(),
            self.dev_url.clone(),
        ];
        if self.auto_approve {
            args.push("--auto-approve".to_string());
        }
        args
    }
}

/// Bring the target database's schema in line with the schema file.
///
/// Returns the tool's combined output on success. On a non-zero exit the
/// error carries both the exit status and the full output.
pub fn sync_schema(runner: &dyn CommandRunner, apply: &SchemaApply) -> Result<String> {
    let args = apply.args();
    info!(
        tool = %apply.tool,
        target = %redact_dsn(&apply.target_url),
        dir = %apply.working_dir.display(),
        "applying schema"
    );
    debug!(args = ?redact_args(&args), "schema tool arguments");

    let out = runner.run(&apply.tool, &args, &apply.working_dir)?;

    if !out.status.success() {
        bail!(
            "Error running {} schema apply: {}\n\nOutput: {}",
            apply.tool,
            out.status,
            out.output.trim_end()
        );
    }

    debug!(output = %out.output.trim_end(), "schema apply finished");
    Ok(out.output)
}
