//! C1: the per-language sandboxed run engine (spec §4.1).
//!
//! Design note: the Docker log stream is framed per spec §4.1 step 8 (an
//! 8-byte header — byte 0 stream id, bytes 4..8 big-endian payload
//! length — ahead of each frame's payload). `bollard`'s `Docker::logs`
//! already demultiplexes this for [`container::BollardRuntime::fetch_logs`],
//! so nothing in this crate parses the raw frame layout directly.

pub mod container;
pub mod placeholder;
pub mod workdir;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::cancel::CancelToken;
use crate::constants::{
    HELPER_DOWNLOAD_MAX_ATTEMPTS, HELPER_DOWNLOAD_RETRY_DELAY, LANGUAGE_JAVA, NO_OUTPUT_STREAM_LOG,
    TIMEOUT_COMMAND_EXIT_CODE,
};
use crate::error::{CoreError, CoreResult};
use crate::models::run::{LanguageRunConfig, RunOutcome};
use crate::utils::time::host_soft_deadline;

use container::{ContainerRuntime, ContainerSpec};
use workdir::Workdir;

/// One-shot sandboxed executor for a single language.
///
/// Stateless across calls except for the lazily-populated helper
/// library cache (spec §4.1 step 3: "if that library is not yet
/// staged"). The cache is a shared directory reused across runs of this
/// language rather than re-downloaded into every workdir, avoiding a
/// network round trip per judgement once the first one has staged it.
pub struct LanguageRunner {
    config: LanguageRunConfig,
    runtime: Arc<dyn ContainerRuntime>,
    http: reqwest::Client,
    cache_dir: PathBuf,
    library_ready: Arc<OnceCell<PathBuf>>,
}

impl LanguageRunner {
    pub fn new(config: LanguageRunConfig, runtime: Arc<dyn ContainerRuntime>, cache_dir: PathBuf) -> Self {
        Self {
            config,
            runtime,
            http: reqwest::Client::new(),
            cache_dir,
            library_ready: Arc::new(OnceCell::new()),
        }
    }

    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Run `submission_source` against `test_source` under `time_limit`
    /// (ms) / `memory_limit` (bytes). Implements spec §4.1 steps 1-10.
    pub async fn run(
        &self,
        test_source: &str,
        submission_source: &str,
        time_limit_ms: u64,
        memory_limit_bytes: u64,
        cancel: CancelToken,
    ) -> CoreResult<RunOutcome> {
        let workdir = Workdir::create()?;
        workdir
            .write_file(&self.config.code_file_name, submission_source)
            .await?;
        workdir.write_file(&self.config.test_file_name, test_source).await?;

        if self.config.needs_helper_library() {
            self.stage_helper_library(&workdir).await?;
        }

        let time_limit = crate::utils::time::format_timeout(time_limit_ms);
        let argv = placeholder::substitute(
            &self.config.command_template,
            &time_limit,
            &self.config.test_file_name,
            &self.config.code_file_name,
        );

        let spec = ContainerSpec {
            image: self.config.image.clone(),
            argv,
            host_workdir: workdir.path().display().to_string(),
            cpu_quota: self.config.cpu_quota,
            memory_bytes: memory_limit_bytes as i64,
        };

        let container_id = self.runtime.create_container(spec).await?;
        let outcome = self.run_in_container(&container_id, time_limit_ms, cancel).await;
        // Container removal happens on every exit path (spec invariant),
        // regardless of how `run_in_container` resolved.
        let _ = self.runtime.remove_container(&container_id).await;
        outcome
    }

    async fn run_in_container(
        &self,
        container_id: &str,
        time_limit_ms: u64,
        cancel: CancelToken,
    ) -> CoreResult<RunOutcome> {
        if let Err(e) = self.runtime.start_container(container_id).await {
            return Err(e);
        }

        let soft_deadline = host_soft_deadline(time_limit_ms);
        let wait = self
            .runtime
            .wait_container(container_id, soft_deadline, cancel)
            .await?;

        if wait.timed_out {
            return Err(CoreError::TimeLimit);
        }

        let (stdout_bytes, stderr_bytes) = self.runtime.fetch_logs(container_id).await?;
        let stdout = String::from_utf8_lossy(&stdout_bytes).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_bytes).into_owned();

        if stdout.is_empty() && stderr.is_empty() {
            return Err(CoreError::EmptyOutput("no output".to_string()));
        }

        let return_log = self.assemble_log(&stdout, &stderr)?;

        Ok(RunOutcome {
            return_log,
            // The in-container `timeout` wrapper is the primary TLE
            // signal; the host soft deadline above is the fallback for a
            // container that never reports back at all.
            time_limit_exceeded: wait.exit_code == TIMEOUT_COMMAND_EXIT_CODE,
            memory_limit_exceeded: wait.oom_killed,
            stdout,
            stderr,
            exit_code: wait.exit_code,
        })
    }

    /// Concatenate the captured streams per spec §4.1 "Output assembly",
    /// then apply the language-specific post-filter.
    fn assemble_log(&self, stdout: &str, stderr: &str) -> CoreResult<String> {
        let mut parts = Vec::new();
        if self.config.stderr_captured {
            parts.push(stderr);
        }
        if self.config.stdout_captured {
            parts.push(stdout);
        }

        if parts.is_empty() {
            return Err(CoreError::EmptyOutput(NO_OUTPUT_STREAM_LOG.to_string()));
        }

        let combined = parts.join("\n");
        let filtered = if self.config.language == LANGUAGE_JAVA {
            crate::classifier::junit::filter(&combined)
        } else {
            combined
        };

        Ok(filtered)
    }

    async fn stage_helper_library(&self, workdir: &Workdir) -> CoreResult<()> {
        let library_name = self
            .config
            .test_library_name
            .as_deref()
            .expect("needs_helper_library guarantees this is Some");
        let url = self
            .config
            .download_test_url
            .as_deref()
            .expect("needs_helper_library guarantees this is Some");

        let cache_path = self.cache_dir.join(library_name);
        let library_ready = Arc::clone(&self.library_ready);
        let http = self.http.clone();
        let url = url.to_string();
        let cache_path_for_init = cache_path.clone();

        let staged = library_ready
            .get_or_try_init(|| async move {
                download_with_retries(&http, &url, &cache_path_for_init).await?;
                Ok::<_, CoreError>(cache_path_for_init)
            })
            .await?;

        workdir.copy_from(staged, library_name).await
    }
}

async fn download_with_retries(
    http: &reqwest::Client,
    url: &str,
    dest: &std::path::Path,
) -> CoreResult<()> {
    if tokio::fs::metadata(dest).await.is_ok() {
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::SandboxSetup(format!("create cache dir: {e}")))?;
    }

    let mut last_err = None;
    for attempt in 1..=HELPER_DOWNLOAD_MAX_ATTEMPTS {
        match try_download(http, url, dest).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(attempt, %url, error = %e, "helper library download failed");
                last_err = Some(e);
                if attempt < HELPER_DOWNLOAD_MAX_ATTEMPTS {
                    tokio::time::sleep(HELPER_DOWNLOAD_RETRY_DELAY).await;
                }
            }
        }
    }

    Err(CoreError::SandboxSetup(format!(
        "download {url} failed after {HELPER_DOWNLOAD_MAX_ATTEMPTS} attempts: {}",
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}

async fn try_download(http: &reqwest::Client, url: &str, dest: &std::path::Path) -> CoreResult<()> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| CoreError::SandboxSetup(e.to_string()))?
        .error_for_status()
        .map_err(|e| CoreError::SandboxSetup(e.to_string()))?;

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CoreError::SandboxSetup(e.to_string()))?;

    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| CoreError::SandboxSetup(e.to_string()))?;

    Ok(())
}
