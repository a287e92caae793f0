// src/system/launcher.rs

//! Shell-backed process launcher.

use crate::constants::LABEL_ENV_VAR;
use crate::core::execution::{LaunchError, ProcessLauncher};
use crate::models::ProcessHandle;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, ExitStatus, Stdio};

/// Default shell invocation; the command line is appended as the last argument.
pub fn default_shell() -> &'static str {
    if cfg!(target_os = "windows") {
        "cmd /C"
    } else {
        "sh -c"
    }
}

/// Launches commands as child processes of the configured shell.
#[derive(Debug)]
pub struct ShellLauncher {
    shell: String,
    cwd: PathBuf,
    attach_stdin: bool,
    next_id: u64,
    children: HashMap<ProcessHandle, Child>,
}

impl ShellLauncher {
    /// Runs commands through `shell` (or [`default_shell`]) inside `cwd`.
    pub fn new(shell: Option<&str>, cwd: &Path) -> Self {
        Self {
            shell: shell.unwrap_or(default_shell()).to_string(),
            cwd: dunce::simplified(cwd).to_path_buf(),
            attach_stdin: false,
            next_id: 0,
            children: HashMap::new(),
        }
    }

    /// Lets launched processes read from the terminal. Only sensible when a single
    /// process runs in the foreground.
    pub fn attach_stdin(&mut self, attach: bool) {
        self.attach_stdin = attach;
    }

    /// Number of processes still tracked.
    pub fn live_count(&self) -> usize {
        self.children.len()
    }

    /// Blocks until the process behind `handle` exits. `None` for unknown handles.
    pub fn wait(&mut self, handle: ProcessHandle) -> std::io::Result<Option<ExitStatus>> {
        match self.children.remove(&handle) {
            Some(mut child) => child.wait().map(Some),
            None => Ok(None),
        }
    }

    fn shell_parts(&self) -> Result<(String, Vec<String>), LaunchError> {
        let parts =
            shlex::split(&self.shell).ok_or_else(|| LaunchError::CommandParse(self.shell.clone()))?;
        match parts.split_first() {
            Some((program, args)) => Ok((program.clone(), args.to_vec())),
            None => Err(LaunchError::CommandParse(self.shell.clone())),
        }
    }
}

impl ProcessLauncher for ShellLauncher {
    fn spawn(&mut self, label: &str, command: &str) -> Result<ProcessHandle, LaunchError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }
        let (program, args) = self.shell_parts()?;

        let stdin = if self.attach_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        };
        let child = StdCommand::new(&program)
            .args(&args)
            .arg(command)
            .current_dir(&self.cwd)
            .env(LABEL_ENV_VAR, label)
            .stdin(stdin)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                command: command.to_string(),
                source,
            })?;

        self.next_id += 1;
        let handle = ProcessHandle::new(self.next_id);
        log::debug!("Spawned '{}' (PID: {}) as {:?}", command, child.id(), handle);
        self.children.insert(handle, child);
        Ok(handle)
    }

    fn dispose(&mut self, handle: ProcessHandle) {
        let Some(mut child) = self.children.remove(&handle) else {
            return;
        };
        log::debug!("Killing child process (PID: {})...", child.id());
        match child.kill() {
            Ok(()) => {}
            // Already exited.
            Err(e) if e.kind() == ErrorKind::InvalidInput => {}
            Err(e) => log::warn!("Failed to kill child process {}: {}", child.id(), e),
        }
        child.wait().ok();
    }

    fn poll_exited(&mut self) -> Vec<ProcessHandle> {
        let mut exited = Vec::new();
        for (handle, child) in self.children.iter_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    log::debug!("Process {:?} exited with {}", handle, status);
                    exited.push(*handle);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Lost track of process {:?}: {}", handle, e);
                    exited.push(*handle);
                }
            }
        }
        for handle in &exited {
            self.children.remove(handle);
        }
        exited
    }
}
