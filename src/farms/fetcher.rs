use crate::auth::AccessToken;
use crate::config::Config;
use crate::farms::error::FarmError;
use crate::farms::identifiers::FarmId;
use crate::layout::DataLayout;
use crate::urls::Subdomain;
use crate::utils::{ensure_dir_exists, progress_bar, to_pretty_json, write_atomically};
use futures_util::stream::{self, StreamExt};
use indicatif::ProgressBar;
use log::{debug, error, info};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use std::path::PathBuf;

/// Per-identifier outcomes of one batch, in completion order.
#[derive(Debug, Default)]
pub struct FarmFetchReport {
    pub written: Vec<(FarmId, PathBuf)>,
    pub failed: Vec<(FarmId, FarmError)>,
    /// Indices of layer features skipped because they carry no id.
    pub unidentified: Vec<usize>,
}

impl FarmFetchReport {
    /// Number of identifiers a request was issued for.
    pub fn attempted(&self) -> usize {
        self.written.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unidentified.is_empty()
    }
}

/// Fetches farm records from the cabinet API with bounded concurrency.
///
/// The HTTP client and the token are shared read-only by every in-flight
/// request; each request writes to its own file.
pub struct FarmFetcher<'a> {
    http: &'a Client,
    config: &'a Config,
    token: Option<&'a AccessToken>,
    layout: DataLayout,
    progress: ProgressBar,
}

impl<'a> FarmFetcher<'a> {
    /// Without a token the requests go out unauthenticated and are expected
    /// to fail one by one.
    pub fn new(http: &'a Client, config: &'a Config, token: Option<&'a AccessToken>) -> Self {
        Self {
            http,
            config,
            token,
            layout: DataLayout::new(config.base_dir()),
            progress: progress_bar(config.show_progress()),
        }
    }

    /// Reports completed requests on `progress` instead of the default bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Issues exactly one request per identifier, at most
    /// `config.concurrency()` at a time.
    ///
    /// A failing identifier is logged and recorded in the report; it never
    /// cancels or delays the others. The only error returned is failing to
    /// create the farms directory, in which case no request is made.
    pub async fn fetch_all(&self, identifiers: Vec<FarmId>) -> Result<FarmFetchReport, FarmError> {
        let directory = self.layout.farms_dir();
        ensure_dir_exists(&directory)
            .await
            .map_err(|e| FarmError::DirCreation(directory.clone(), e))?;

        let total = identifiers.len();
        info!(
            "Fetching {} farm records, {} at a time",
            total,
            self.config.concurrency()
        );
        self.progress.set_length(total as u64);

        let mut outcomes = stream::iter(identifiers)
            .map(|id| async move {
                let outcome = self.fetch(&id).await;
                (id, outcome)
            })
            .buffer_unordered(self.config.concurrency());

        let mut report = FarmFetchReport::default();
        while let Some((id, outcome)) = outcomes.next().await {
            match outcome {
                Ok(path) => {
                    debug!("Saved farm {} to {:?}", id, path);
                    report.written.push((id, path));
                }
                Err(e) => {
                    error!("Failed to fetch farm {}: {}", id, e);
                    report.failed.push((id, e));
                }
            }
            self.progress.inc(1);
        }
        self.progress.finish_with_message("farm records done");

        info!(
            "Fetched {}/{} farm records ({} failed)",
            report.written.len(),
            total,
            report.failed.len()
        );
        Ok(report)
    }

    /// Fetches one farm record and writes it, pretty-printed, to `<id>.json`.
    pub async fn fetch(&self, id: &FarmId) -> Result<PathBuf, FarmError> {
        let url = self.farm_url(id)?;
        let mut request = self.http.get(url.clone());
        let url = url.to_string();
        if let Some(token) = self.token {
            request = request.header(AUTHORIZATION, token.header_value());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FarmError::NetworkRequest(url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(if let Some(status) = e.status() {
                    FarmError::HttpStatus {
                        url,
                        status,
                        source: e,
                    }
                } else {
                    FarmError::NetworkRequest(url, e)
                });
            }
        };

        let record: serde_json::Value = response.json().await.map_err(|e| FarmError::Decode {
            url: url.clone(),
            source: e,
        })?;

        let path = self.layout.farm_file(id);
        let contents = to_pretty_json(&record).map_err(|e| FarmError::Encode(path.clone(), e))?;
        write_atomically(path.clone(), contents)
            .await
            .map_err(|e| FarmError::Write(path.clone(), e))?;
        Ok(path)
    }

    /// `api/v1/agrogis/farm/<id>/full-info/`, with the id percent-encoded as
    /// a single path segment.
    fn farm_url(&self, id: &FarmId) -> Result<Url, FarmError> {
        let base = self.config.url(Subdomain::Cabinet, "api/v1/agrogis/farm/");
        let mut url = Url::parse(&base).map_err(|_| FarmError::InvalidUrl(id.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FarmError::InvalidUrl(id.to_string()))?
            .pop_if_empty()
            .push(id.as_str())
            .push("full-info")
            .push("");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use serde_json::{json, Value};
    use std::collections::BTreeSet;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path, path_regex};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const FARM_PATH: &str = r"^/api/v1/agrogis/farm/[^/]+/full-info/$";
    const SLOW_DELAY: Duration = Duration::from_millis(1500);

    /// Answers every farm request with a record naming the requested farm.
    struct EchoFarm;

    impl Respond for EchoFarm {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let id = request
                .url
                .path()
                .trim_start_matches("/api/v1/agrogis/farm/")
                .trim_end_matches("/full-info/")
                .to_string();
            ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": format!("Хозяйство {}", id),
                "occupation": "grain",
            }))
        }
    }

    /// Records when each request arrives and answers after a fixed delay.
    struct Timed {
        delay: Duration,
        arrivals: Arc<Mutex<Vec<Instant>>>,
    }

    impl Respond for Timed {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            self.arrivals.lock().unwrap().push(Instant::now());
            EchoFarm.respond(request).set_delay(self.delay)
        }
    }

    fn config_for(server: &MockServer, dir: &TempDir) -> Config {
        Config::builder()
            .credentials(Credentials::new("alice", "s3cret"))
            .origin(server.uri())
            .base_dir(dir.path())
            .build()
    }

    fn config_with_concurrency(server: &MockServer, dir: &TempDir, concurrency: usize) -> Config {
        Config::builder()
            .credentials(Credentials::new("alice", "s3cret"))
            .origin(server.uri())
            .base_dir(dir.path())
            .concurrency(concurrency)
            .build()
    }

    fn ids(raw: &[&str]) -> Vec<FarmId> {
        raw.iter().map(|id| FarmId::new(*id)).collect()
    }

    fn read_json(path: &std::path::Path) -> Value {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    fn files_in(dir: &std::path::Path) -> BTreeSet<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_every_identifier_gets_a_file() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let requested: Vec<String> = (0..25).map(|i| format!("farm{i}")).collect();
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .and(header("authorization", "Token good"))
            .respond_with(EchoFarm)
            .expect(25)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let token = AccessToken::new("good");
        let report = FarmFetcher::new(&http, &config, Some(&token))
            .fetch_all(requested.iter().map(FarmId::new).collect())
            .await?;

        assert_eq!(report.written.len(), 25);
        assert!(report.is_complete());
        let layout = DataLayout::new(dir.path());
        let expected: BTreeSet<String> = requested.iter().map(|id| format!("{id}.json")).collect();
        assert_eq!(files_in(&layout.farms_dir()), expected);
        for id in &requested {
            let record = read_json(&layout.farm_file(&FarmId::new(id.as_str())));
            assert_eq!(record["id"], json!(id));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_failures_are_isolated() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        // Specific failures are mounted first so they take precedence.
        Mock::given(method("GET"))
            .and(path("/api/v1/agrogis/farm/B/full-info/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/agrogis/farm/D/full-info/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(EchoFarm)
            .expect(3)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let token = AccessToken::new("good");
        let report = FarmFetcher::new(&http, &config, Some(&token))
            .fetch_all(ids(&["A", "B", "C", "D", "E"]))
            .await?;

        assert_eq!(report.attempted(), 5);
        assert_eq!(report.written.len(), 3);
        let failed: BTreeSet<&str> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, BTreeSet::from(["B", "D"]));
        for (id, err) in &report.failed {
            match id.as_str() {
                "B" => assert_eq!(err.status().map(|s| s.as_u16()), Some(500)),
                _ => assert!(matches!(err, FarmError::Decode { .. })),
            }
        }

        let layout = DataLayout::new(dir.path());
        assert_eq!(
            files_in(&layout.farms_dir()),
            BTreeSet::from(["A.json".to_string(), "C.json".to_string(), "E.json".to_string()])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_token_fails_every_request_without_short_circuit() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .and(header("authorization", "Token good"))
            .respond_with(EchoFarm)
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Unauthorized"})))
            .expect(12)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let requested: Vec<FarmId> = (0..12).map(|i| FarmId::new(i.to_string())).collect();
        let report = FarmFetcher::new(&http, &config, None)
            .fetch_all(requested)
            .await?;

        assert!(report.written.is_empty());
        assert_eq!(report.failed.len(), 12);
        assert!(report
            .failed
            .iter()
            .all(|(_, e)| e.status().map(|s| s.as_u16()) == Some(401)));
        assert!(files_in(&DataLayout::new(dir.path()).farms_dir()).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_token_fails_uniformly() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(3)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let token = AccessToken::new("expired");
        let report = FarmFetcher::new(&http, &config, Some(&token))
            .fetch_all(ids(&["A", "B", "C"]))
            .await?;
        assert_eq!(report.failed.len(), 3);
        assert!(report.written.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_identifiers_write_one_intact_file() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(EchoFarm)
            .expect(6)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let report = FarmFetcher::new(&http, &config, None)
            .fetch_all(ids(&["A", "A", "A", "A", "B", "A"]))
            .await?;

        assert_eq!(report.written.len(), 6);
        let layout = DataLayout::new(dir.path());
        assert_eq!(
            files_in(&layout.farms_dir()),
            BTreeSet::from(["A.json".to_string(), "B.json".to_string()])
        );
        let record = read_json(&layout.farm_file(&FarmId::new("A")));
        assert_eq!(record["id"], json!("A"));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_is_pretty_printed() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/api/v1/agrogis/farm/42/full-info/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{\"name\":\"Ақмола\",\"cultures\":[\"wheat\"]}"),
            )
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let path = FarmFetcher::new(&http, &config, None)
            .fetch_all(ids(&["42"]))
            .await?
            .written
            .remove(0)
            .1;
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "{\n    \"name\": \"Ақмола\",\n    \"cultures\": [\n        \"wheat\"\n    ]\n}"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_batch() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let config = config_for(&server, &dir);
        let http = Client::new();
        let report = FarmFetcher::new(&http, &config, None).fetch_all(Vec::new()).await?;
        assert_eq!(report.attempted(), 0);
        assert!(DataLayout::new(dir.path()).farms_dir().is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_in_flight_requests_never_exceed_concurrency() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let delay = Duration::from_millis(300);
        let arrivals = Arc::new(Mutex::new(Vec::new()));
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(Timed {
                delay,
                arrivals: Arc::clone(&arrivals),
            })
            .expect(12)
            .mount(&server)
            .await;

        let config = config_with_concurrency(&server, &dir, 4);
        let http = Client::new();
        let requested: Vec<FarmId> = (0..12).map(|i| FarmId::new(format!("f{i}"))).collect();
        let report = FarmFetcher::new(&http, &config, None)
            .fetch_all(requested)
            .await?;
        assert_eq!(report.written.len(), 12);

        // A request is in flight for at least `delay` after it arrives, and the
        // next one is only sent once an earlier one has completed.
        let arrivals = arrivals.lock().unwrap().clone();
        let peak = arrivals
            .iter()
            .map(|at| {
                arrivals
                    .iter()
                    .filter(|other| **other <= *at && *at < **other + delay)
                    .count()
            })
            .max()
            .unwrap_or(0);
        assert_eq!(peak, config.concurrency());
        Ok(())
    }

    #[tokio::test]
    async fn test_slow_request_holds_only_its_own_slot() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/api/v1/agrogis/farm/slow/full-info/"))
            .respond_with(Timed {
                delay: SLOW_DELAY,
                arrivals: Arc::default(),
            })
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(Timed {
                delay: Duration::from_millis(50),
                arrivals: Arc::default(),
            })
            .expect(9)
            .mount(&server)
            .await;

        let config = config_with_concurrency(&server, &dir, 3);
        let http = Client::new();
        let mut requested = vec![FarmId::new("slow")];
        requested.extend((0..9).map(|i| FarmId::new(format!("fast{i}"))));
        let started = Instant::now();
        let report = FarmFetcher::new(&http, &config, None)
            .fetch_all(requested)
            .await?;

        assert!(started.elapsed() >= SLOW_DELAY);
        let order: Vec<&str> = report.written.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order.len(), 10);
        assert_eq!(order.last(), Some(&"slow"));
        Ok(())
    }

    #[tokio::test]
    async fn test_identifier_is_encoded_as_one_path_segment() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/api/v1/agrogis/farm/a%2Fb%3Fc%23d%20e/full-info/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"occupation": "grain"})))
            .expect(1)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let report = FarmFetcher::new(&http, &config, None)
            .fetch_all(ids(&["a/b?c#d e"]))
            .await?;

        assert!(report.is_complete());
        let layout = DataLayout::new(dir.path());
        assert_eq!(
            files_in(&layout.farms_dir()),
            BTreeSet::from(["a_b?c#d e.json".to_string()])
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_progress_advances_once_per_identifier() -> Result<(), FarmError> {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/api/v1/agrogis/farm/B/full-info/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(FARM_PATH))
            .respond_with(EchoFarm)
            .mount(&server)
            .await;

        let config = config_for(&server, &dir);
        let http = Client::new();
        let progress = ProgressBar::hidden();
        FarmFetcher::new(&http, &config, None)
            .with_progress(progress.clone())
            .fetch_all(ids(&["A", "B", "C", "D"]))
            .await?;

        assert_eq!(progress.length(), Some(4));
        assert_eq!(progress.position(), 4);
        assert!(progress.is_finished());
        Ok(())
    }
}
