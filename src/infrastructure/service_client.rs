/// Tree Service Client
///
/// Talks to a parsing service over TCP with newline-delimited JSON, one
/// request per connection:
///
/// ```text
/// -> {"command":"PARSE","params":{"path":"...","language":"java","content":"..."}}
/// <- {"status":"success","data":{...tree...}}
/// <- {"status":"error","message":"..."}
/// ```
///
/// Connection and protocol failures are retried with exponential backoff;
/// a parse error reported by the service is returned immediately.
///
/// bblfshd speaks gRPC, so it needs a bridge that answers `PARSE` requests.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::uast::{decode_json, Node};
use crate::error::TreeSourceError;
use crate::ports::TreeSource;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    command: &'static str,
    params: ParseParams<'a>,
}

#[derive(Debug, Serialize)]
struct ParseParams<'a> {
    path: &'a str,
    language: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    status: String,
    data: Option<Node>,
    message: Option<String>,
}

pub struct ServiceTreeSource {
    endpoint: String,
    language: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ServiceTreeSource {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            language: "java".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, path: &Path, content: &str) -> Result<Node, TreeSourceError> {
        let connect_error = |source| TreeSourceError::Connect {
            endpoint: self.endpoint.clone(),
            source,
        };

        let mut stream = TcpStream::connect(&self.endpoint).map_err(connect_error)?;
        stream.set_read_timeout(Some(self.timeout)).map_err(connect_error)?;
        stream.set_write_timeout(Some(self.timeout)).map_err(connect_error)?;

        let path_str = path.to_string_lossy();
        let request = ParseRequest {
            command: "PARSE",
            params: ParseParams {
                path: &path_str,
                language: &self.language,
                content,
            },
        };
        let mut line = serde_json::to_vec(&request)
            .map_err(|e| TreeSourceError::Protocol(format!("cannot encode request: {}", e)))?;
        line.push(b'\n');
        stream.write_all(&line).map_err(connect_error)?;
        stream.flush().map_err(connect_error)?;

        let mut reader = BufReader::new(stream);
        let mut response_line = String::new();
        let bytes_read = reader.read_line(&mut response_line).map_err(connect_error)?;
        if bytes_read == 0 {
            return Err(TreeSourceError::Protocol(
                "connection closed before response".to_string(),
            ));
        }

        let response: ParseResponse = decode_json(response_line.trim().as_bytes())
            .map_err(|e| TreeSourceError::Protocol(format!("invalid response: {}", e)))?;

        match (response.status.as_str(), response.data) {
            ("success", Some(mut tree)) => {
                tree.normalize();
                Ok(tree)
            }
            ("success", None) => Err(TreeSourceError::Protocol(
                "success response without data".to_string(),
            )),
            _ => Err(TreeSourceError::Rejected {
                path: path.to_path_buf(),
                message: response
                    .message
                    .unwrap_or_else(|| format!("status {}", response.status)),
            }),
        }
    }
}

impl TreeSource for ServiceTreeSource {
    fn acquire(&self, path: &Path) -> Result<Node, TreeSourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| TreeSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut attempt = 0;
        loop {
            match self.request(path, &content) {
                Ok(tree) => {
                    debug!(path = %path.display(), nodes = tree.size(), "received tree");
                    return Ok(tree);
                }
                Err(error) if error.is_transient() && attempt < self.retry.retries => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        path = %path.display(),
                        %error,
                        attempt = attempt + 1,
                        "tree request failed; retrying in {:?}",
                        delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
