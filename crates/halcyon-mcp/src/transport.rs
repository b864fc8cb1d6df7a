//! The two mutually-exclusive ways to reach an MCP server: a stdio
//! subprocess, or an HTTP endpoint (spec §6: "command XOR url").

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::error::{McpError, McpResult};
use crate::rpc::{RpcRequest, RpcResponse};

/// One connected server's transport, holding whatever state a call needs
/// to round-trip a JSON-RPC request.
pub enum Transport {
    /// A subprocess speaking line-delimited JSON-RPC over stdio.
    Stdio(Mutex<StdioTransport>),
    /// An HTTP endpoint speaking JSON-RPC over POST.
    Http(HttpTransport),
}

impl Transport {
    /// Send one JSON-RPC call and return its `result` (or the RPC error).
    pub async fn call(&self, name: &str, method: &str, params: Option<Value>) -> McpResult<Value> {
        match self {
            Transport::Stdio(inner) => inner.lock().await.call(name, method, params).await,
            Transport::Http(inner) => inner.call(name, method, params).await,
        }
    }

    /// Tear down the transport (kills the child process, if any).
    pub async fn shutdown(&self) {
        if let Transport::Stdio(inner) = self {
            let mut guard = inner.lock().await;
            let _ = guard.child.start_kill();
        }
    }
}

/// A running server subprocess, with its stdin/stdout held open.
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl StdioTransport {
    /// Spawn `command args...` with the given environment and working
    /// directory.
    pub fn spawn(
        name: &str,
        command: &str,
        args: &[String],
        env: &std::collections::HashMap<String, String>,
        cwd: Option<&std::path::Path>,
    ) -> McpResult<Self> {
        let mut cmd = Command::new(command);
        cmd.args(args).envs(env).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::null()).kill_on_drop(true);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|source| McpError::Spawn { name: name.to_owned(), source })?;
        let stdin = child.stdin.take().ok_or_else(|| McpError::Spawn {
            name: name.to_owned(),
            source: std::io::Error::other("child has no stdin"),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::Spawn {
            name: name.to_owned(),
            source: std::io::Error::other("child has no stdout"),
        })?;

        Ok(Self { child, stdin, reader: BufReader::new(stdout), next_id: 1 })
    }

    async fn call(&mut self, name: &str, method: &str, params: Option<Value>) -> McpResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = RpcRequest::new(id, method, params);
        self.stdin
            .write_all(request.to_line().as_bytes())
            .await
            .map_err(|source| McpError::Spawn { name: name.to_owned(), source })?;
        self.stdin.flush().await.map_err(|source| McpError::Spawn { name: name.to_owned(), source })?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await.map_err(|source| McpError::Spawn { name: name.to_owned(), source })?;
        if read == 0 {
            return Err(McpError::MalformedResponse(format!("server '{name}' closed stdout")));
        }

        parse_response(name, &line)
    }
}

/// A server reached over HTTP, one JSON-RPC call per POST.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    next_id: std::sync::atomic::AtomicU64,
}

impl HttpTransport {
    /// Build a transport targeting `url`.
    #[must_use]
    pub fn new(url: String) -> Self {
        Self { client: reqwest::Client::new(), url, next_id: std::sync::atomic::AtomicU64::new(1) }
    }

    async fn call(&self, name: &str, method: &str, params: Option<Value>) -> McpResult<Value> {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let request = RpcRequest::new(id, method, params);

        let response = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .body(serde_json::to_vec(&request).unwrap_or_default())
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|source| McpError::Http { name: name.to_owned(), source })?;

        let body = response.text().await.map_err(|source| McpError::Http { name: name.to_owned(), source })?;
        parse_response(name, &body)
    }
}

fn parse_response(name: &str, body: &str) -> McpResult<Value> {
    let response: RpcResponse =
        serde_json::from_str(body.trim()).map_err(|e| McpError::MalformedResponse(format!("{name}: {e}")))?;

    if let Some(error) = response.error {
        return Err(McpError::Rpc { name: name.to_owned(), message: error.message });
    }

    response.result.ok_or_else(|| McpError::MalformedResponse(format!("{name}: response had neither result nor error")))
}
