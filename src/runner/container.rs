//! Container lifecycle over the Docker Engine API (spec §6), behind a
//! [`ContainerRuntime`] trait so [`super::LanguageRunner`] can be driven
//! against a `mockall` double in tests without a live daemon.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, LogsOptionsBuilder, RemoveContainerOptionsBuilder,
    StartContainerOptions, WaitContainerOptionsBuilder,
};
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::Docker;
use futures::StreamExt;

use crate::cancel::CancelToken;
use crate::constants::CONTAINER_WORKDIR;
use crate::error::{CoreError, CoreResult};

/// Everything [`ContainerRuntime::create_container`] needs, gathered
/// from the language config, the per-judgement argv, and the problem's
/// resource limits (spec §4.1 step 5).
pub struct ContainerSpec {
    pub image: String,
    pub argv: Vec<String>,
    pub host_workdir: String,
    pub cpu_quota: i64,
    pub memory_bytes: i64,
}

/// Outcome of waiting for a container to stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitOutcome {
    pub exit_code: i64,
    pub oom_killed: bool,
    /// Host soft deadline fired before the container stopped on its own.
    pub timed_out: bool,
}

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ContainerRuntime: Send + Sync {
    async fn pull_image(&self, image: &str) -> CoreResult<()>;
    async fn create_container(&self, spec: ContainerSpec) -> CoreResult<String>;
    async fn start_container(&self, id: &str) -> CoreResult<()>;
    /// Waits for the container to leave the running state, racing a
    /// host-side soft deadline and cancellation (spec §5, §9's
    /// "dual-channel select" note: first signal wins, the other is
    /// discarded).
    async fn wait_container(
        &self,
        id: &str,
        soft_deadline: Duration,
        cancel: CancelToken,
    ) -> CoreResult<WaitOutcome>;
    /// Fetches and demultiplexes the container's combined log output.
    async fn fetch_logs(&self, id: &str) -> CoreResult<(Vec<u8>, Vec<u8>)>;
    async fn remove_container(&self, id: &str) -> CoreResult<()>;
}

/// `bollard`-backed [`ContainerRuntime`].
pub struct BollardRuntime {
    docker: Docker,
}

impl BollardRuntime {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Connect using `DOCKER_SOCKET`, or bollard's platform default when
    /// unset/empty.
    pub fn connect(socket_path: &str) -> CoreResult<Self> {
        let docker = if socket_path.is_empty() {
            Docker::connect_with_local_defaults()
        } else {
            Docker::connect_with_unix(socket_path, 120, bollard::API_DEFAULT_VERSION)
        }
        .map_err(|e| CoreError::Docker(e.to_string()))?;
        Ok(Self::new(docker))
    }
}

#[async_trait]
impl ContainerRuntime for BollardRuntime {
    async fn pull_image(&self, image: &str) -> CoreResult<()> {
        use bollard::query_parameters::CreateImageOptionsBuilder;

        let options = CreateImageOptionsBuilder::default().from_image(image).build();
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(item) = stream.next().await {
            item.map_err(|e| CoreError::Docker(e.to_string()))?;
        }
        Ok(())
    }

    async fn create_container(&self, spec: ContainerSpec) -> CoreResult<String> {
        let options = CreateContainerOptionsBuilder::default().build();

        let host_config = HostConfig {
            binds: Some(vec![format!("{}:{}", spec.host_workdir, CONTAINER_WORKDIR)]),
            cpu_quota: Some(spec.cpu_quota),
            memory: Some(spec.memory_bytes),
            memory_swap: Some(spec.memory_bytes),
            network_mode: Some("host".to_string()),
            ..Default::default()
        };

        let body = ContainerCreateBody {
            image: Some(spec.image),
            cmd: Some(spec.argv),
            working_dir: Some(CONTAINER_WORKDIR.to_string()),
            host_config: Some(host_config),
            labels: Some(HashMap::new()),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), body)
            .await
            .map_err(|e| CoreError::SandboxStart(e.to_string()))?;

        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> CoreResult<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions>)
            .await
            .map_err(|e| {
                CoreError::SandboxStart(format!("start {id}: {e}"))
            })
    }

    async fn wait_container(
        &self,
        id: &str,
        soft_deadline: Duration,
        cancel: CancelToken,
    ) -> CoreResult<WaitOutcome> {
        let options = WaitContainerOptionsBuilder::default()
            .condition("not-running")
            .build();
        let mut wait_stream = self.docker.wait_container(id, Some(options));

        tokio::select! {
            next = wait_stream.next() => {
                match next {
                    Some(Ok(response)) => Ok(WaitOutcome {
                        exit_code: response.status_code,
                        oom_killed: response
                            .error
                            .as_ref()
                            .map(|e| e.message.as_deref().unwrap_or_default().contains("OOM"))
                            .unwrap_or(false),
                        timed_out: false,
                    }),
                    Some(Err(e)) => Err(CoreError::SandboxWait(e.to_string())),
                    None => Err(CoreError::SandboxWait(format!("wait stream for {id} closed with no response"))),
                }
            }
            _ = tokio::time::sleep(soft_deadline) => {
                Ok(WaitOutcome { exit_code: -1, oom_killed: false, timed_out: true })
            }
            _ = cancel.cancelled() => {
                Err(CoreError::Cancelled)
            }
        }
    }

    async fn fetch_logs(&self, id: &str) -> CoreResult<(Vec<u8>, Vec<u8>)> {
        use bollard::container::LogOutput;

        let options = LogsOptionsBuilder::default()
            .stdout(true)
            .stderr(true)
            .build();
        let mut stream = self.docker.logs(id, Some(options));

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        while let Some(item) = stream.next().await {
            match item.map_err(|e| CoreError::SandboxWait(format!("logs {id}: {e}")))? {
                LogOutput::StdOut { message } => stdout.extend_from_slice(&message),
                LogOutput::StdErr { message } => stderr.extend_from_slice(&message),
                LogOutput::Console { message } => stdout.extend_from_slice(&message),
                LogOutput::StdIn { .. } => {}
            }
        }

        Ok((stdout, stderr))
    }

    async fn remove_container(&self, id: &str) -> CoreResult<()> {
        let options = RemoveContainerOptionsBuilder::default().force(true).build();
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| CoreError::Docker(format!("remove {id}: {e}")))
    }
}
