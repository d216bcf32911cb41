//! SSH Dispatcher
//!
//! Production [`RemoteDispatcher`] spawning one `ssh` child per node via
//! `tokio::process` and streaming its standard output line by line. A node
//! whose child cannot be spawned still reports an [`DispatchEvent::Exited`]
//! with [`SPAWN_FAILURE_RC`], so local failures land in the same proxy
//! error path as remote ones.

use crate::dispatch::{DispatchEvent, NodeSet, RemoteDispatcher, SPAWN_FAILURE_RC};
use crate::error::Result;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Channel depth per submission; enough to keep slow consumers from
/// stalling many nodes' readers at once.
const CHANNEL_DEPTH: usize = 256;

/// Configuration for the SSH dispatcher
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Path to the ssh binary.
    pub ssh_path: String,
    /// Extra arguments inserted before the host, e.g. `-o BatchMode=yes`.
    pub ssh_args: Vec<String>,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            ssh_path: "ssh".to_string(),
            ssh_args: vec![
                "-o".to_string(),
                "BatchMode=yes".to_string(),
            ],
        }
    }
}

/// Dispatcher running commands over ssh, one child process per node.
pub struct SshDispatcher {
    config: SshConfig,
}

impl SshDispatcher {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    async fn run_node(
        config: SshConfig,
        node: String,
        command: String,
        tx: mpsc::Sender<DispatchEvent>,
    ) {
        let mut child = match Command::new(&config.ssh_path)
            .args(&config.ssh_args)
            .arg(&node)
            .arg(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn ssh for {}: {}", node, e);
                let _ = tx
                    .send(DispatchEvent::Exited {
                        node,
                        code: SPAWN_FAILURE_RC,
                    })
                    .await;
                return;
            }
        };

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx
                    .send(DispatchEvent::OutputLine {
                        node: node.clone(),
                        line,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }

        let code = match child.wait().await {
            // Killed by signal: no exit code, report as spawn-level failure.
            Ok(status) => status.code().unwrap_or(SPAWN_FAILURE_RC),
            Err(e) => {
                warn!("Failed to reap ssh for {}: {}", node, e);
                SPAWN_FAILURE_RC
            }
        };
        debug!("ssh to {} exited with code {}", node, code);
        let _ = tx.send(DispatchEvent::Exited { node, code }).await;
    }
}

#[async_trait]
impl RemoteDispatcher for SshDispatcher {
    async fn submit(
        &self,
        command: &str,
        nodes: &NodeSet,
    ) -> Result<mpsc::Receiver<DispatchEvent>> {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        debug!("Submitting '{}' to {}", command, nodes);

        for node in nodes.iter() {
            tokio::spawn(Self::run_node(
                self.config.clone(),
                node.to_string(),
                command.to_string(),
                tx.clone(),
            ));
        }
        // Receiver closes once every per-node task has dropped its sender.
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exercises the real child-process path with /bin/sh standing in for
    // ssh: each "node" becomes the -c argument, which the stub ignores.
    #[tokio::test]
    async fn test_spawn_failure_reports_synthetic_exit() {
        let dispatcher = SshDispatcher::new(SshConfig {
            ssh_path: "/nonexistent/ssh-binary".into(),
            ssh_args: vec![],
        });
        let nodes: NodeSet = ["nas1"].into_iter().collect();
        let mut rx = dispatcher.submit("status -f fs1", &nodes).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            DispatchEvent::Exited {
                node: "nas1".into(),
                code: SPAWN_FAILURE_RC,
            }
        );
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_streams_lines_then_exit() {
        // sh -c 'echo one; echo two; exit 3' — the node argument lands in
        // $0 and is unused.
        let dispatcher = SshDispatcher::new(SshConfig {
            ssh_path: "sh".into(),
            ssh_args: vec!["-c".into(), "echo one; echo two; exit 3".into()],
        });
        let nodes: NodeSet = ["nas1"].into_iter().collect();
        let mut rx = dispatcher.submit("ignored", &nodes).await.unwrap();

        let mut lines = Vec::new();
        let mut exit = None;
        while let Some(event) = rx.recv().await {
            match event {
                DispatchEvent::OutputLine { line, .. } => lines.push(line),
                DispatchEvent::Exited { code, .. } => exit = Some(code),
            }
        }
        assert_eq!(lines, vec!["one", "two"]);
        assert_eq!(exit, Some(3));
    }
}
