#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use autosuggest::error::{Result, SuggestError};
use autosuggest::option::SuggestOption;
use autosuggest::source::OptionSource;
use autosuggest::widget::{Effect, WidgetAction};
use autosuggest::AutocompleteWidget;
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Runs the autosuggest binary in an isolated temp directory
pub struct AutosuggestTest {
    pub temp_dir: TempDir,
}

impl AutosuggestTest {
    pub fn new() -> Self {
        AutosuggestTest {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_autosuggest"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "Command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed",
            args
        );
        String::from_utf8_lossy(&output.stderr).into_owned()
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }
}

/// Fixed result sets per term, counting calls
pub struct StubSource {
    results: HashMap<String, Vec<SuggestOption>>,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn new(results: &[(&str, Vec<SuggestOption>)]) -> Self {
        StubSource {
            results: results
                .iter()
                .map(|(term, options)| (term.to_string(), options.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OptionSource for StubSource {
    async fn search(&self, term: &str) -> Result<Vec<SuggestOption>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.get(term).cloned().unwrap_or_default())
    }
}

/// Each term answers after its own delay with one option labelled after the term
pub struct SlowSource {
    delays: HashMap<String, Duration>,
}

impl SlowSource {
    pub fn new(delays: &[(&str, u64)]) -> Self {
        SlowSource {
            delays: delays
                .iter()
                .map(|(term, ms)| (term.to_string(), Duration::from_millis(*ms)))
                .collect(),
        }
    }
}

impl OptionSource for SlowSource {
    async fn search(&self, term: &str) -> Result<Vec<SuggestOption>> {
        let delay = self.delays.get(term).copied().unwrap_or_default();
        tokio::time::sleep(delay).await;
        Ok(vec![SuggestOption::new(term, term.to_uppercase())])
    }
}

/// Each term waits until the test answers it by hand
pub struct ManualSource {
    replies: Mutex<HashMap<String, oneshot::Receiver<Vec<SuggestOption>>>>,
}

impl ManualSource {
    pub fn new(terms: &[&str]) -> (Self, HashMap<String, oneshot::Sender<Vec<SuggestOption>>>) {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for term in terms {
            let (tx, rx) = oneshot::channel();
            senders.insert(term.to_string(), tx);
            receivers.insert(term.to_string(), rx);
        }
        (
            ManualSource {
                replies: Mutex::new(receivers),
            },
            senders,
        )
    }
}

impl OptionSource for ManualSource {
    async fn search(&self, term: &str) -> Result<Vec<SuggestOption>> {
        let reply = self.replies.lock().remove(term);
        match reply {
            Some(rx) => rx
                .await
                .map_err(|_| SuggestError::Other("reply dropped".to_string())),
            None => Ok(vec![]),
        }
    }
}

/// Dispatch an action and run its effects inline: fetches are awaited and
/// fed back, close timers are returned for the test to fire.
pub async fn drive<S: OptionSource>(
    widget: &mut AutocompleteWidget<S>,
    action: WidgetAction,
) -> Vec<Effect> {
    let mut rest = vec![];
    for effect in widget.dispatch(action) {
        match effect {
            Effect::Fetch(pending) => {
                let fetched = pending.settle().await;
                widget.dispatch(WidgetAction::FetchSettled(fetched));
            }
            other => rest.push(other),
        }
    }
    rest
}

pub fn people() -> Vec<SuggestOption> {
    vec![
        SuggestOption::new("1", "Smith"),
        SuggestOption::new("2", "Smythe"),
        SuggestOption::new("3", "Smart"),
    ]
}

/// A request as seen by `TestServer`
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Path and query, e.g. `/search?term=sm`
    pub target: String,
    /// Header names are lowercased
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == &name.to_lowercase())
            .map(|(_, v)| v.as_str())
    }
}

type Responder = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 responder on a random local port
pub struct TestServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = Arc::clone(&recorded);
                let respond = Arc::clone(&respond);
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&buf).into_owned();
                    let mut lines = head.lines();
                    let target = lines
                        .next()
                        .and_then(|l| l.split_whitespace().nth(1))
                        .unwrap_or("/")
                        .to_string();
                    let headers = lines
                        .take_while(|l| !l.is_empty())
                        .filter_map(|l| l.split_once(':'))
                        .map(|(n, v)| (n.trim().to_lowercase(), v.trim().to_string()))
                        .collect();
                    let request = RecordedRequest { target, headers };

                    let (status, body) = respond(&request);
                    recorded.lock().push(request);

                    let response = format!(
                        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        TestServer {
            addr,
            requests,
            task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
