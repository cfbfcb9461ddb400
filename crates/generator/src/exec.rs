use std::{path::PathBuf, process::Stdio, time::Duration};

use {
    tokio::{
        io::{AsyncBufReadExt, AsyncReadExt, BufReader},
        process::Command,
    },
    tracing::{debug, warn},
};

/// Options controlling one process run.
#[derive(Debug, Clone)]
pub struct ExecOpts {
    pub timeout: Duration,
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecOpts {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            working_dir: None,
        }
    }
}

/// How a process run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The process exited on its own. `exit_code` is -1 when it was killed by a signal.
    Exited { exit_code: i32, stdout: String },
    /// The timeout elapsed; the process has been killed and reaped.
    TimedOut,
}

/// Run `program args...` to completion with a hard timeout.
///
/// Stdout is collected in full; stderr is forwarded line by line to the
/// `debug` log. On timeout the child is killed and waited for before
/// returning. Only spawn and wait failures are errors.
pub async fn run(program: &str, args: &[String], opts: &ExecOpts) -> std::io::Result<ExecOutcome> {
    debug!(
        program,
        arg_count = args.len(),
        timeout_secs = opts.timeout.as_secs(),
        "spawning generator"
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(ref dir) = opts.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take();
    let mut stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout
            && let Err(e) = out.read_to_end(&mut buf).await
        {
            warn!(error = %e, "error reading generator stdout");
        }
        buf
    });

    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let Some(err) = stderr else { return };
        let mut lines = BufReader::new(err).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!(line = %line.trim_end(), "generator stderr"),
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "stopped reading generator stderr");
                    break;
                },
            }
        }
    });

    let waited = tokio::time::timeout(opts.timeout, async {
        let status = child.wait().await?;
        let stdout = (&mut stdout_task).await.unwrap_or_default();
        Ok::<_, std::io::Error>((status, stdout))
    })
    .await;

    match waited {
        Ok(Ok((status, stdout))) => {
            let exit_code = status.code().unwrap_or(-1);
            debug!(exit_code, stdout_len = stdout.len(), "generator done");
            Ok(ExecOutcome::Exited {
                exit_code,
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
            })
        },
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            Err(e)
        },
        Err(_) => {
            warn!(
                program,
                timeout_secs = opts.timeout.as_secs(),
                "generator timed out, killing"
            );
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill generator");
            }
            stdout_task.abort();
            stderr_task.abort();
            Ok(ExecOutcome::TimedOut)
        },
    }
}
