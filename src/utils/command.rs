// src/utils/command.rs
use std::{
    fmt,
    io::{self, Read},
    process::{Command, Output, Stdio},
    thread,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` failed ({status}): {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// A program plus its argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Value of a `--name=value` style flag, if present.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        let prefix = format!("{}=", name);
        self.args.iter().find_map(|a| a.strip_prefix(prefix.as_str()))
    }

    fn spawn_error(&self, source: io::Error) -> CommandError {
        CommandError::Spawn {
            command: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of one external process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn status_line(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    pub fn check(&self, invocation: &Invocation) -> Result<(), CommandError> {
        if self.success {
            return Ok(());
        }
        Err(CommandError::Failed {
            command: invocation.to_string(),
            status: self.status_line(),
            stderr: self.stderr.trim().to_string(),
        })
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Executes external tools on behalf of the generators.
pub trait CommandRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutput, CommandError>;

    /// Runs `producer | consumer` and returns both outputs. The producer's
    /// stdout is consumed by the pipe, so only its stderr is captured.
    fn pipe(
        &mut self,
        producer: &Invocation,
        consumer: &Invocation,
    ) -> Result<(ToolOutput, ToolOutput), CommandError>;
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ToolOutput, CommandError> {
        tracing::debug!(command = %invocation, "executing");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .output()
            .map_err(|e| invocation.spawn_error(e))?;

        Ok(ToolOutput::from(output))
    }

    fn pipe(
        &mut self,
        producer: &Invocation,
        consumer: &Invocation,
    ) -> Result<(ToolOutput, ToolOutput), CommandError> {
        tracing::debug!(command = %format!("{} | {}", producer, consumer), "executing");

        let mut child = Command::new(&producer.program)
            .args(&producer.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| producer.spawn_error(e))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                return Err(producer.spawn_error(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "stdout was not captured",
                )));
            }
        };

        // drained concurrently so a chatty producer cannot fill its stderr pipe
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                buf
            })
        });

        let consumer_output = match Command::new(&consumer.program)
            .args(&consumer.args)
            .stdin(Stdio::from(stdout))
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(consumer.spawn_error(e));
            }
        };

        let status = child.wait().map_err(|e| producer.spawn_error(e))?;
        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        let producer_output = Output {
            status,
            stdout: Vec::new(),
            stderr,
        };

        Ok((
            ToolOutput::from(producer_output),
            ToolOutput::from(consumer_output),
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_display_joins_arguments() {
        let inv = Invocation::new("kubectl")
            .args(["config", "use-context"])
            .arg("default");
        assert_eq!(inv.to_string(), "kubectl config use-context default");
    }

    #[test]
    fn flag_value_reads_equals_style_flags() {
        let inv = Invocation::new("kubectl").args(["--kubeconfig=/tmp/a.kubeconfig", "--embed-certs=true"]);
        assert_eq!(inv.flag_value("--kubeconfig"), Some("/tmp/a.kubeconfig"));
        assert_eq!(inv.flag_value("--server"), None);
    }

    #[test]
    fn check_reports_status_and_stderr() {
        let out = testing::failed(2, "boom\n");
        let err = out.check(&Invocation::new("cfssl")).unwrap_err();
        assert_eq!(err.to_string(), "`cfssl` failed (exit code 2): boom");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_pipes_stdout_into_consumer() {
        let mut runner = SystemRunner;
        let (producer, consumer) = runner
            .pipe(
                &Invocation::new("echo").arg("hello"),
                &Invocation::new("tr").args(["a-z", "A-Z"]),
            )
            .unwrap();
        assert!(producer.success);
        assert!(consumer.success);
        assert_eq!(consumer.stdout.trim(), "HELLO");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_survives_large_producer_stderr() {
        let mut runner = SystemRunner;
        let (producer, consumer) = runner
            .pipe(
                &Invocation::new("sh").args(["-c", "head -c 262144 /dev/zero | tr '\\0' x >&2; echo done"]),
                &Invocation::new("cat"),
            )
            .unwrap();
        assert!(producer.success);
        assert_eq!(producer.stderr.len(), 262144);
        assert_eq!(consumer.stdout.trim(), "done");
    }

    #[test]
    fn system_runner_reports_missing_binary() {
        let mut runner = SystemRunner;
        let err = runner
            .run(&Invocation::new("definitely-not-a-real-binary-kthw"))
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
