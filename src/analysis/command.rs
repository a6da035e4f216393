use super::{AnalysisService, types::*};
use crate::{config::Analysis, types::JobId};
use anyhow::{Context, Result, anyhow};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Submits analysis jobs through an external program: the request goes to the
/// program's stdin as JSON and a `{"job_id": ...}` object is read back from
/// its stdout.
pub struct CommandAnalysisService {
    cfg: Analysis,
    program: PathBuf,
}

impl CommandAnalysisService {
    pub fn new(cfg: &Analysis) -> Result<Self> {
        let program = cfg.program.trim();
        if program.is_empty() {
            return Err(anyhow!("analysis.program is not configured"));
        }
        Ok(Self {
            cfg: cfg.clone(),
            program: expand_tilde(program),
        })
    }

    fn run_json<I: serde::Serialize, O: for<'de> serde::Deserialize<'de>>(
        &self,
        input: &I,
        timeout_seconds: Option<u64>,
    ) -> Result<O> {
        debug!(
            "analysis run {} timeout={:?}",
            self.program.display(),
            timeout_seconds
        );
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.cfg.args);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        for (k, v) in &self.cfg.env {
            cmd.env(k, v);
        }

        let bytes = serde_json::to_vec(input)?;
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning analysis program: {}", self.program.display()))?;

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin
                .write_all(&bytes)
                .and_then(|_| stdin.flush())
                .with_context(|| "writing request to analysis program"),
            None => Err(anyhow!("no stdin")),
        };
        if let Err(err) = written {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err);
        }

        let output = if let Some(secs) = timeout_seconds {
            wait_with_timeout(&mut child, Duration::from_secs(secs))?
        } else {
            child
                .wait_with_output()
                .with_context(|| "waiting for analysis program")?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "analysis program failed ({}): {}",
                output.status,
                stderr.trim()
            ));
        }

        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("analysis stderr: {}", stderr.trim());
        }

        let out: O = serde_json::from_slice(&output.stdout)
            .with_context(|| "parsing analysis program JSON output")?;
        Ok(out)
    }
}

impl AnalysisService for CommandAnalysisService {
    fn submit(&self, req: &AnalysisRequest) -> Result<JobId> {
        let timeout = if self.cfg.timeout_seconds > 0 {
            Some(self.cfg.timeout_seconds)
        } else {
            None
        };
        let out: SubmitOut = self.run_json(req, timeout)?;
        if let Some(err) = out.error.as_deref() {
            return Err(anyhow!("analysis service rejected {}: {err}", req.correlation_tag));
        }
        let raw = out
            .job_id
            .ok_or_else(|| anyhow!("analysis service returned no job_id"))?;
        Ok(JobId::new(raw)?)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output> {
    // Drain both pipes while waiting so a chatty child can't block on a full buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            let stdout = stdout_thread
                .join()
                .map_err(|_| anyhow!("stdout reader thread panicked"))??;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("analysis program timed out after {:?}", timeout);
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            let stderr = stderr_thread
                .join()
                .map_err(|_| anyhow!("stderr reader thread panicked"))??;
            let _ = stdout_thread.join();
            return Err(anyhow!(
                "analysis program exceeded timeout ({:?}); stderr: {}",
                timeout,
                String::from_utf8_lossy(&stderr).trim()
            ));
        }

        std::thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{
        chunk_plan::ChunkRange,
        types::{DocumentRef, NotificationTarget},
    };

    fn request() -> AnalysisRequest {
        let chunk = ChunkRange::new(0, 2).unwrap();
        AnalysisRequest {
            document: DocumentRef::new("bucket", "doc.pdf").unwrap(),
            page_ranges: vec![chunk.to_service()],
            correlation_tag: CorrelationTag::for_chunk(chunk),
            notification_target: NotificationTarget::default(),
            feature_types: vec!["TABLES".into()],
        }
    }

    fn shell(script: &str, timeout_seconds: u64) -> CommandAnalysisService {
        CommandAnalysisService::new(&Analysis {
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            timeout_seconds,
            ..Analysis::default()
        })
        .unwrap()
    }

    #[test]
    fn reads_job_id_from_stdout() {
        let svc = shell(r#"cat >/dev/null; echo '{"job_id":"job-42"}'"#, 10);
        let job = svc.submit(&request()).unwrap();
        assert_eq!(job.as_str(), "job-42");
    }

    #[test]
    fn service_error_field_fails_submission() {
        let svc = shell(r#"cat >/dev/null; echo '{"error":"bad document"}'"#, 10);
        let err = svc.submit(&request()).unwrap_err();
        assert!(format!("{err:#}").contains("bad document"));
    }

    #[test]
    fn nonzero_exit_fails_submission() {
        let svc = shell("cat >/dev/null; echo boom >&2; exit 3", 10);
        let err = svc.submit(&request()).unwrap_err();
        assert!(format!("{err:#}").contains("boom"));
    }

    #[test]
    fn timeout_kills_the_program() {
        let svc = shell("exec sleep 5", 1);
        let err = svc.submit(&request()).unwrap_err();
        assert!(format!("{err:#}").contains("timeout"));
    }

    #[test]
    fn program_that_ignores_stdin_is_reaped() {
        let svc = shell("exit 0", 10);
        let mut req = request();
        req.feature_types = vec!["X".repeat(1024); 1024];
        let err = svc.submit(&req).unwrap_err();
        assert!(format!("{err:#}").contains("writing request"), "{err:#}");
    }

    #[test]
    fn empty_program_is_rejected() {
        assert!(CommandAnalysisService::new(&Analysis::default()).is_err());
    }
}
