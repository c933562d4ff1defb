// Shared test helpers for integration tests
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use tempfile::{tempdir, TempDir};

use testrail_sync::config::{RawConfig, SyncConfig};
use testrail_sync::infra::remote::{NewRun, RemoteError, RunApi};
use testrail_sync::models::{BuildContext, CaseId, RemoteRun, RemoteTest, ResultRecord, RunId, TestId};

pub const CONFIG_TOML: &str = r#"
url = "https://qa.example.com/index.php?/api/v2"
login = "ci@example.com"
password = "secret"
project_id = 3
ci_host = "https://ci.example.com"
artifact_domain = "builds.example.com"
"#;

pub fn sync_config() -> SyncConfig {
    RawConfig::from_toml(CONFIG_TOML).unwrap().validate().unwrap()
}

pub fn build_context(build_root: &Path) -> BuildContext {
    BuildContext {
        branch: "feature/checkout".to_string(),
        build_id: "512".to_string(),
        build_root: build_root.to_path_buf(),
        started_at: DateTime::parse_from_rfc3339("2024-03-02T10:15:00Z")
            .unwrap()
            .with_timezone(&Utc),
    }
}

/// Creates a build root with the given reports under `tests/_output/`.
pub fn build_root_with_reports(tap: Option<&str>, html: Option<&str>) -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let output = temp_dir.path().join("tests/_output");
    fs::create_dir_all(&output).expect("Failed to create output directory");
    if let Some(tap) = tap {
        fs::write(output.join("report.tap.log"), tap).expect("Failed to write TAP report");
    }
    if let Some(html) = html {
        fs::write(output.join("report.html"), html).expect("Failed to write HTML report");
    }
    temp_dir
}

/// An HTML report in the shape the pipeline produces, with one block per case.
pub fn html_report(cases: &[(&str, &[&str])]) -> String {
    let mut body = String::new();
    for (name, steps) in cases {
        body.push_str(&format!(
            "<tr><td class=\"scenarioSuccess\">\n  <p class=\"scenarioSuccess\" onclick=\"showHide('1', this)\">&nbsp;[+] {name} <span>(0.52s)</span></p>\n</td></tr>\n"
        ));
        body.push_str("<tr><td><table border=\"0\" width=\"100%\" class=\"scenarioStepsTable\">\n");
        for step in *steps {
            body.push_str(&format!("<tr><td class=\"stepName\">{step}</td></tr>\n"));
        }
        body.push_str("</table></td></tr>\n");
    }
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Test results</title>
<script type="text/javascript">
function showHide(nodeId, linkObj) {{
    var subObj = document.getElementById('stepContainer' + nodeId);
    if (linkObj.innerHTML.indexOf('+') > -1 && subObj.rows.length < 100) {{ subObj.style.display = 'block'; }}
}}
</script>
<style>p {{ margin: 0; }}</style>
</head>
<body>
<table border="0" style="width: 100%;">
<tr><td><h1>Codeception Results</h1></td></tr>
{body}<tr><td><h2>Summary</h2></td></tr>
<tr><td><p>[+] [ZZ] summary noise</p></td></tr>
</table>
</body>
</html>
"#
    )
}

/// A call made against [`FakeRunApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateRun { project_id: u64, run: NewRun },
    ListTests(RunId),
    SubmitResults(RunId, Vec<ResultRecord>),
    CloseRun(RunId),
}

/// Which remote operation should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    CreateRun,
    ListTests,
    SubmitResults,
    CloseRun,
}

/// In-memory [`RunApi`] that records every call.
pub struct FakeRunApi {
    pub run_id: RunId,
    pub tests: Vec<RemoteTest>,
    pub fail_at: FailAt,
    calls: Mutex<Vec<Call>>,
}

impl FakeRunApi {
    pub fn new(tests: &[(u64, &str)]) -> Self {
        Self {
            run_id: RunId(900),
            tests: tests
                .iter()
                .map(|(id, case_id)| RemoteTest {
                    id: TestId(*id),
                    case_id: CaseId::from(*case_id),
                    title: None,
                })
                .collect(),
            fail_at: FailAt::Nothing,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at(mut self, fail_at: FailAt) -> Self {
        self.fail_at = fail_at;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, at: FailAt, operation: &'static str) -> Result<(), RemoteError> {
        if self.fail_at == at {
            Err(RemoteError::Status {
                operation,
                status: 500,
                body: "{\"error\":\"boom\"}".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl RunApi for FakeRunApi {
    async fn create_run(&self, project_id: u64, run: &NewRun) -> Result<RemoteRun, RemoteError> {
        self.record(Call::CreateRun {
            project_id,
            run: run.clone(),
        });
        self.check(FailAt::CreateRun, "add_run")?;
        Ok(RemoteRun {
            id: self.run_id,
            url: Some(format!("https://qa.example.com/index.php?/runs/view/{}", self.run_id.0)),
        })
    }

    async fn list_tests(&self, run_id: RunId) -> Result<Vec<RemoteTest>, RemoteError> {
        self.record(Call::ListTests(run_id));
        self.check(FailAt::ListTests, "get_tests")?;
        Ok(self.tests.clone())
    }

    async fn submit_results(&self, run_id: RunId, results: &[ResultRecord]) -> Result<(), RemoteError> {
        self.record(Call::SubmitResults(run_id, results.to_vec()));
        self.check(FailAt::SubmitResults, "add_results")
    }

    async fn close_run(&self, run_id: RunId) -> Result<(), RemoteError> {
        self.record(Call::CloseRun(run_id));
        self.check(FailAt::CloseRun, "close_run")
    }
}

/// A request captured by [`CannedServer`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A one-connection-per-response HTTP server answering with canned responses
/// in order, then shutting down.
pub struct CannedServer {
    pub base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl CannedServer {
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
        let base_url = format!("http://{}/index.php?/api/v2", listener.local_addr().unwrap());
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let handle = thread::spawn(move || {
            let mut recorded = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("Failed to accept connection");
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();

                let mut headers = Vec::new();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((k, v)) = line.split_once(':') {
                        headers.push((k.trim().to_string(), v.trim().to_string()));
                    }
                }
                let length = headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.parse::<usize>().ok())
                    .unwrap_or(0);
                let mut body_bytes = vec![0; length];
                reader.read_exact(&mut body_bytes).unwrap();

                let mut stream = stream;
                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    if status < 300 { "OK" } else { "Error" },
                    body.len()
                );
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();

                recorded.push(RecordedRequest {
                    method,
                    path,
                    headers,
                    body: String::from_utf8_lossy(&body_bytes).into_owned(),
                });
            }
            recorded
        });

        Self { base_url, handle }
    }

    /// Waits for all canned responses to be served and returns the requests.
    pub fn finish(self) -> Vec<RecordedRequest> {
        self.handle.join().expect("test server panicked")
    }
}
