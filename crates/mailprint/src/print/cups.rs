//! CUPS print service driven through the standard `lpstat` / `lp` clients.

use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use super::error::{PrintError, Result};
use super::service::{PrintJob, PrintService};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to a CUPS server, the local default one unless `host` is set.
#[derive(Debug, Clone)]
pub struct CupsClient {
    host: Option<String>,
    timeout: Duration,
}

impl CupsClient {
    pub fn new(host: Option<String>) -> Self {
        Self {
            host,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    fn command(&self, program: &str) -> TokioCommand {
        let mut cmd = TokioCommand::new(program);
        if let Some(host) = &self.host {
            cmd.arg("-h").arg(host);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: TokioCommand, program: &'static str) -> Result<Output> {
        tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                PrintError::Timeout(format!(
                    "{} did not finish within {}s",
                    program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|source| PrintError::ServiceUnavailable { program, source })
    }
}

#[async_trait]
impl PrintService for CupsClient {
    async fn list_queues(&self) -> Result<Vec<String>> {
        let mut cmd = self.command("lpstat");
        cmd.arg("-a");

        let output = self.run(cmd, "lpstat").await?;
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            if stderr.contains("No destinations added") {
                return Ok(Vec::new());
            }
            return Err(classify_failure("lpstat", &stderr));
        }

        let queues = parse_queue_list(&String::from_utf8_lossy(&output.stdout));
        debug!("Print server advertises {} queue(s)", queues.len());
        Ok(queues)
    }

    async fn print_file(&self, job: &PrintJob) -> Result<Option<String>> {
        let mut cmd = self.command("lp");
        cmd.arg("-d")
            .arg(&job.queue)
            .arg("-t")
            .arg(&job.label)
            .arg("--")
            .arg(&job.path);

        let output = self.run(cmd, "lp").await?;
        if !output.status.success() {
            return Err(classify_failure(
                "lp",
                &String::from_utf8_lossy(&output.stderr),
            ));
        }

        let job_id = parse_request_id(&String::from_utf8_lossy(&output.stdout));
        info!(
            queue = %job.queue,
            job_id = job_id.as_deref().unwrap_or("unknown"),
            "Print job accepted"
        );
        Ok(job_id)
    }
}

/// Extracts queue names from `lpstat -a` output
/// (`Office_Laser accepting requests since ...`). Indented lines carry the
/// reason a queue is rejecting jobs and are skipped.
fn parse_queue_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| line.split_whitespace().next())
        .map(|name| name.to_string())
        .collect()
}

/// Extracts the job id from `lp` output (`request id is Office_Laser-42 (1 file(s))`).
fn parse_request_id(stdout: &str) -> Option<String> {
    let rest = stdout.split("request id is ").nth(1)?;
    rest.split_whitespace().next().map(|id| id.to_string())
}

fn classify_failure(program: &'static str, stderr: &str) -> PrintError {
    let message = stderr.trim().to_string();
    let lower = message.to_ascii_lowercase();

    if lower.contains("unable to connect")
        || lower.contains("connection refused")
        || lower.contains("scheduler is not running")
        || lower.contains("no route to host")
    {
        PrintError::ConnectionFailed(message)
    } else {
        PrintError::CommandFailed { program, message }
    }
}
