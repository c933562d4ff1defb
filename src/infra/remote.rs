//! # Remote Run Client / 远程运行客户端
//!
//! The four remote operations a synchronization pass needs, behind the
//! [`RunApi`] trait, and a [`TestRailClient`] that performs them over HTTP with
//! Basic authentication and JSON bodies.
//!
//! 同步过程所需的四个远程操作（位于 [`RunApi`] trait 之后），
//! 以及通过 HTTP 基本认证和 JSON 请求体执行这些操作的 [`TestRailClient`]。

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;
use ureq::Agent;

use crate::core::config::RemoteConfig;
use crate::core::models::{CaseId, RemoteRun, RemoteTest, ResultRecord, RunId};

/// A failed remote call. Calls are never retried.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{operation} failed with HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} returned an unexpected body: {message}")]
    Decode {
        operation: &'static str,
        body: String,
        message: String,
    },
}

impl RemoteError {
    /// HTTP status of the response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, if one was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            RemoteError::Status { body, .. } | RemoteError::Decode { body, .. } => Some(body),
            RemoteError::Transport { .. } => None,
        }
    }
}

/// Request body for creating a run scoped to an explicit set of cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRun {
    pub suite_id: u64,
    pub name: String,
    pub assignedto_id: u64,
    pub include_all: bool,
    #[serde(serialize_with = "serialize_case_ids")]
    pub case_ids: Vec<CaseId>,
}

// Case ids that are plain integers go out as JSON numbers, anything else as strings.
fn serialize_case_ids<S: Serializer>(ids: &[CaseId], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(ids.len()))?;
    for id in ids {
        match id.as_str().parse::<u64>() {
            Ok(n) if n.to_string() == id.as_str() => seq.serialize_element(&n)?,
            _ => seq.serialize_element(id.as_str())?,
        }
    }
    seq.end()
}

#[derive(Serialize)]
struct ResultsBatch<'a> {
    results: &'a [ResultRecord],
}

/// `get_tests` answers either with a bare array or, on newer servers, with a
/// paginated envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum TestsPage {
    Bare(Vec<RemoteTest>),
    Paged {
        tests: Vec<RemoteTest>,
        #[serde(rename = "_links", default)]
        links: PageLinks,
    },
}

#[derive(Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

/// The remote operations of one synchronization pass.
#[allow(async_fn_in_trait)]
pub trait RunApi {
    /// Creates a run in `project_id` containing exactly `run.case_ids`.
    async fn create_run(&self, project_id: u64, run: &NewRun) -> Result<RemoteRun, RemoteError>;

    /// Lists the tests of a run, in the order the service returns them.
    async fn list_tests(&self, run_id: RunId) -> Result<Vec<RemoteTest>, RemoteError>;

    async fn submit_results(&self, run_id: RunId, results: &[ResultRecord]) -> Result<(), RemoteError>;

    async fn close_run(&self, run_id: RunId) -> Result<(), RemoteError>;
}

#[derive(Debug, Clone, Copy)]
enum Method {
    Get,
    Post,
}

/// HTTP implementation of [`RunApi`]. Each call is a single blocking round trip
/// run on tokio's blocking pool, bounded by the configured timeout.
#[derive(Clone)]
pub struct TestRailClient {
    agent: Agent,
    base_url: String,
    authorization: String,
}

impl TestRailClient {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .http_status_as_error(false)
            .build();
        let credentials = STANDARD.encode(format!("{}:{}", config.login, config.password));
        Self {
            agent: Agent::new_with_config(agent_config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("Basic {credentials}"),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        operation: &'static str,
        method: Method,
        path: String,
        body: Option<Vec<u8>>,
    ) -> Result<String, RemoteError> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.execute_blocking(operation, method, &path, body))
            .await
            .map_err(|e| RemoteError::Transport {
                operation,
                message: e.to_string(),
            })?
    }

    fn execute_blocking(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<String, RemoteError> {
        let url = self.url(path);
        debug!(operation, %url, "sending request");

        let response = match (method, body) {
            (Method::Get, _) => self
                .agent
                .get(&url)
                .header("Authorization", &self.authorization)
                .call(),
            (Method::Post, Some(body)) => self
                .agent
                .post(&url)
                .header("Authorization", &self.authorization)
                .header("Content-Type", "application/json")
                .send(&body[..]),
            (Method::Post, None) => self
                .agent
                .post(&url)
                .header("Authorization", &self.authorization)
                .header("Content-Type", "application/json")
                .send_empty(),
        };

        let transport = |e: ureq::Error| RemoteError::Transport {
            operation,
            message: e.to_string(),
        };
        let mut response = response.map_err(transport)?;
        let status = response.status();
        let text = response.body_mut().read_to_string().map_err(transport)?;
        debug!(operation, status = status.as_u16(), "received response");

        if !status.is_success() {
            return Err(RemoteError::Status {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

fn encode<T: Serialize>(operation: &'static str, value: &T) -> Result<Vec<u8>, RemoteError> {
    serde_json::to_vec(value).map_err(|e| RemoteError::Decode {
        operation,
        body: String::new(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: String) -> Result<T, RemoteError> {
    serde_json::from_str(&body).map_err(|e| RemoteError::Decode {
        operation,
        message: e.to_string(),
        body,
    })
}

impl RunApi for TestRailClient {
    async fn create_run(&self, project_id: u64, run: &NewRun) -> Result<RemoteRun, RemoteError> {
        const OP: &str = "add_run";
        let body = encode(OP, run)?;
        let text = self
            .execute(OP, Method::Post, format!("/add_run/{project_id}"), Some(body))
            .await?;
        decode(OP, text)
    }

    async fn list_tests(&self, run_id: RunId) -> Result<Vec<RemoteTest>, RemoteError> {
        const OP: &str = "get_tests";
        let mut tests = Vec::new();
        loop {
            let path = if tests.is_empty() {
                format!("/get_tests/{}", run_id.0)
            } else {
                format!("/get_tests/{}&offset={}", run_id.0, tests.len())
            };
            let text = self.execute(OP, Method::Get, path, None).await?;
            match decode::<TestsPage>(OP, text)? {
                TestsPage::Bare(page) => {
                    tests.extend(page);
                    break;
                }
                TestsPage::Paged { tests: page, links } => {
                    let fetched = page.len();
                    tests.extend(page);
                    if links.next.is_none() || fetched == 0 {
                        break;
                    }
                }
            }
        }
        Ok(tests)
    }

    async fn submit_results(&self, run_id: RunId, results: &[ResultRecord]) -> Result<(), RemoteError> {
        const OP: &str = "add_results";
        let body = encode(OP, &ResultsBatch { results })?;
        self.execute(OP, Method::Post, format!("/add_results/{}", run_id.0), Some(body))
            .await?;
        Ok(())
    }

    async fn close_run(&self, run_id: RunId) -> Result<(), RemoteError> {
        self.execute("close_run", Method::Post, format!("/close_run/{}", run_id.0), None)
            .await?;
        Ok(())
    }
}
