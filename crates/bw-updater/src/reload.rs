//! Content-filter reload signal
//!
//! After new rules are committed (or the list falls back to the preloaded
//! default) the consumer of the rule files has to be told to reload them.

use std::process::Command;

/// Error type for reload signalling.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    #[error("failed to run reload command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("reload command '{program}' exited with {status}")]
    Failed { program: String, status: std::process::ExitStatus },
}

/// "Apply new rules" call into the content filter.
pub trait ReloadSignal: Send + Sync {
    fn reload(&self) -> Result<(), ReloadError>;
}

/// Reload signal that only logs; for consumers that poll the rule files.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReload;

impl ReloadSignal for LogReload {
    fn reload(&self) -> Result<(), ReloadError> {
        log::info!("Rule files updated; no reload command configured");
        Ok(())
    }
}

/// Runs an external command to make the content filter reload.
#[derive(Debug, Clone)]
pub struct CommandReload {
    program: String,
    args: Vec<String>,
}

impl CommandReload {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl ReloadSignal for CommandReload {
    fn reload(&self) -> Result<(), ReloadError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|source| ReloadError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ReloadError::Failed {
                program: self.program.clone(),
                status,
            });
        }

        log::info!("Reload command '{}' completed", self.program);
        Ok(())
    }
}
