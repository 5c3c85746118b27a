//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use bytes::Bytes;
use futures::channel::oneshot;
use netjob::base::completion::{Completion, Pending};
use netjob::base::neterror::NetError;
use netjob::base::priority::RequestPriority;
use netjob::cookies::canonicalcookie::CanonicalCookie;
use netjob::cookies::inclusion::{CookieAccessResultList, CookieInclusionStatus, ExclusionReasons};
use netjob::cookies::monster::CookieMonster;
use netjob::cookies::options::CookieOptions;
use netjob::cookies::store::{CookieList, CookieStore};
use netjob::http::auth::AuthCredentials;
use netjob::http::requestheaders::HttpRequestHeaders;
use netjob::http::responseheaders::HttpResponseHeaders;
use netjob::http::responseinfo::HttpResponseInfo;
use netjob::http::transaction::{
    HttpRequestInfo, HttpTransaction, HttpTransactionFactory, LoadTimingInfo, TransactionResult,
    WebSocketHandshakeStreamCreateHelper,
};
use netjob::tls::sslinfo::ClientCertificate;
use netjob::urlrequest::context::{URLRequestContext, URLRequestContextBuilder};
use netjob::urlrequest::delegate::{
    BeforeStartResult, HeadersReceivedDecision, HeadersReceivedResult, NetworkDelegate,
};
use netjob::urlrequest::job::{JobEvent, URLRequestHttpJob};
use netjob::urlrequest::observer::{JobCompletion, JobObserver};
use netjob::urlrequest::request::URLRequest;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use time::OffsetDateTime;
use url::Url;

/// Whether mocks answer synchronously or from a later poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sync,
    Async,
}

pub fn complete<T: Send + 'static>(mode: Mode, value: T) -> Completion<T> {
    match mode {
        Mode::Sync => Completion::Ready(value),
        Mode::Async => Completion::pending(async move {
            tokio::task::yield_now().await;
            value
        }),
    }
}

pub fn headers(raw: &str) -> HttpResponseHeaders {
    HttpResponseHeaders::parse(raw).unwrap()
}

/// One scripted answer to a `start` or restart.
#[derive(Clone)]
pub struct MockResponse {
    pub start: Result<(), NetError>,
    pub info: HttpResponseInfo,
    pub body: Vec<Result<Bytes, NetError>>,
    pub ready_to_restart_for_auth: bool,
}

impl MockResponse {
    pub fn ok(raw_headers: &str) -> Self {
        Self {
            start: Ok(()),
            info: HttpResponseInfo::with_headers(headers(raw_headers)),
            body: Vec::new(),
            ready_to_restart_for_auth: false,
        }
    }

    pub fn error(error: NetError) -> Self {
        Self {
            start: Err(error),
            info: HttpResponseInfo::default(),
            body: Vec::new(),
            ready_to_restart_for_auth: false,
        }
    }

    pub fn with_info(mut self, edit: impl FnOnce(&mut HttpResponseInfo)) -> Self {
        edit(&mut self.info);
        self
    }

    pub fn with_chunk(mut self, chunk: impl Into<Bytes>) -> Self {
        self.body.push(Ok(chunk.into()));
        self
    }

    pub fn with_body_error(mut self, error: NetError) -> Self {
        self.body.push(Err(error));
        self
    }

    pub fn ready_to_restart_for_auth(mut self) -> Self {
        self.ready_to_restart_for_auth = true;
        self
    }
}

/// Everything the job asked of its transactions.
#[derive(Default)]
pub struct TransactionLog {
    pub created: usize,
    pub started: Vec<HttpRequestInfo>,
    pub auth_restarts: Vec<(HttpRequestHeaders, AuthCredentials)>,
    pub cert_restarts: usize,
    pub ignored_errors: usize,
    pub done_reading: usize,
    pub stop_caching: usize,
    pub priorities: Vec<RequestPriority>,
    pub websocket_helper_set: bool,
    pub closed_on_destruction: bool,
}

pub const SENT_PER_RESPONSE: u64 = 50;
pub const RECEIVED_PER_RESPONSE: u64 = 100;

pub struct MockTransactionFactory {
    mode: Mode,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    log: Arc<Mutex<TransactionLog>>,
}

impl MockTransactionFactory {
    pub fn new(mode: Mode, responses: Vec<MockResponse>) -> Arc<Self> {
        Arc::new(Self {
            mode,
            responses: Arc::new(Mutex::new(responses.into())),
            log: Arc::new(Mutex::new(TransactionLog::default())),
        })
    }

    pub fn log(&self) -> MutexGuard<'_, TransactionLog> {
        self.log.lock().unwrap()
    }

    pub fn push_response(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }
}

impl HttpTransactionFactory for MockTransactionFactory {
    fn create_transaction(
        &self,
        _priority: RequestPriority,
    ) -> Result<Box<dyn HttpTransaction>, NetError> {
        self.log.lock().unwrap().created += 1;
        Ok(Box::new(MockTransaction {
            mode: self.mode,
            responses: Arc::clone(&self.responses),
            log: Arc::clone(&self.log),
            current: None,
            body: VecDeque::new(),
            sent: 0,
            received: 0,
        }))
    }
}

struct MockTransaction {
    mode: Mode,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    log: Arc<Mutex<TransactionLog>>,
    current: Option<MockResponse>,
    body: VecDeque<Result<Bytes, NetError>>,
    sent: u64,
    received: u64,
}

impl MockTransaction {
    fn next_response(&mut self) -> TransactionResult {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::error(NetError::ConnectionFailed));
        let result = response.start;
        self.body = response.body.iter().cloned().collect();
        self.sent += SENT_PER_RESPONSE;
        self.received += RECEIVED_PER_RESPONSE;
        self.current = Some(response);
        complete(self.mode, result)
    }
}

impl HttpTransaction for MockTransaction {
    fn start(&mut self, request_info: &HttpRequestInfo) -> TransactionResult {
        self.log.lock().unwrap().started.push(request_info.clone());
        self.next_response()
    }

    fn restart_with_auth(
        &mut self,
        request_info: &HttpRequestInfo,
        credentials: &AuthCredentials,
    ) -> TransactionResult {
        self.log
            .lock()
            .unwrap()
            .auth_restarts
            .push((request_info.extra_headers.clone(), credentials.clone()));
        self.next_response()
    }

    fn restart_with_certificate(
        &mut self,
        _client_cert: Option<Arc<ClientCertificate>>,
    ) -> TransactionResult {
        self.log.lock().unwrap().cert_restarts += 1;
        self.next_response()
    }

    fn restart_ignoring_last_error(&mut self) -> TransactionResult {
        self.log.lock().unwrap().ignored_errors += 1;
        self.next_response()
    }

    fn read(&mut self, _buf_size: usize) -> Completion<Result<Bytes, NetError>> {
        let chunk = self.body.pop_front().unwrap_or_else(|| Ok(Bytes::new()));
        if let Ok(bytes) = &chunk {
            self.received += bytes.len() as u64;
        }
        complete(self.mode, chunk)
    }

    fn response_info(&self) -> Option<HttpResponseInfo> {
        self.current.as_ref().map(|r| r.info.clone())
    }

    fn total_sent_bytes(&self) -> u64 {
        self.sent
    }

    fn total_received_bytes(&self) -> u64 {
        self.received
    }

    fn is_ready_to_restart_for_auth(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|r| r.ready_to_restart_for_auth)
    }

    fn set_priority(&mut self, priority: RequestPriority) {
        self.log.lock().unwrap().priorities.push(priority);
    }

    fn load_timing_info(&self) -> Option<LoadTimingInfo> {
        self.current.as_ref().map(|_| LoadTimingInfo {
            socket_reused: true,
            request_start: Some(Instant::now()),
            ..Default::default()
        })
    }

    fn remote_endpoint(&self) -> Option<SocketAddr> {
        self.current.as_ref().map(|_| SocketAddr::from(([127, 0, 0, 1], 443)))
    }

    fn close_connection_on_destruction(&mut self) {
        self.log.lock().unwrap().closed_on_destruction = true;
    }

    fn done_reading(&mut self) {
        self.log.lock().unwrap().done_reading += 1;
    }

    fn stop_caching(&mut self) {
        self.log.lock().unwrap().stop_caching += 1;
    }

    fn set_websocket_handshake_helper(
        &mut self,
        _helper: Arc<dyn WebSocketHandshakeStreamCreateHelper>,
    ) {
        self.log.lock().unwrap().websocket_helper_set = true;
    }
}

pub struct ChatHelper;

impl WebSocketHandshakeStreamCreateHelper for ChatHelper {
    fn requested_subprotocols(&self) -> Vec<String> {
        vec!["chat".into()]
    }
}

/// A [`CookieMonster`] whose answers arrive after scripted delays.
///
/// Store writes happen when their delay elapses, so completion order is
/// whatever the delays make it.
pub struct DelayedCookieStore {
    pub jar: Arc<CookieMonster>,
    read_delay: Duration,
    write_delays: Mutex<VecDeque<Duration>>,
    pub reads: AtomicUsize,
    pub completed_writes: Arc<Mutex<Vec<String>>>,
}

impl DelayedCookieStore {
    pub fn new(read_delay: Duration, write_delays: Vec<Duration>) -> Arc<Self> {
        Arc::new(Self {
            jar: Arc::new(CookieMonster::new()),
            read_delay,
            write_delays: Mutex::new(write_delays.into()),
            reads: AtomicUsize::new(0),
            completed_writes: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

impl CookieStore for DelayedCookieStore {
    fn get_cookie_list_with_options(&self, url: &Url, options: &CookieOptions) -> Pending<CookieList> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let list = self.jar.get_cookie_list(url, options);
        let delay = self.read_delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            list
        })
    }

    fn set_canonical_cookie(
        &self,
        cookie: CanonicalCookie,
        source_url: &Url,
        options: &CookieOptions,
    ) -> Pending<CookieInclusionStatus> {
        let delay = self
            .write_delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();
        let jar = Arc::clone(&self.jar);
        let completed = Arc::clone(&self.completed_writes);
        let url = source_url.clone();
        let options = options.clone();
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            let name = cookie.name.clone();
            let status = jar.set_cookie_with_options(cookie, &url, &options);
            completed.lock().unwrap().push(name);
            status
        })
    }
}

/// Delegate with scripted answers that records what it saw.
#[derive(Default)]
pub struct TestDelegate {
    pub mode: Option<Mode>,
    pub before_start_error: Option<NetError>,
    pub added_header: Option<(String, String)>,
    pub headers_received_error: Option<NetError>,
    pub override_headers: Option<Arc<HttpResponseHeaders>>,
    pub preserve_fragment_url: Option<Url>,
    pub blocked_cookie_names: Vec<String>,
    pub refuse_set_cookie: bool,
    /// Holds the headers-received answer until the sender fires.
    pub headers_gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub before_start_calls: AtomicUsize,
    pub headers_received_calls: AtomicUsize,
    pub seen_endpoints: Mutex<Vec<Option<SocketAddr>>>,
}

impl TestDelegate {
    fn mode(&self) -> Mode {
        self.mode.unwrap_or(Mode::Sync)
    }
}

impl NetworkDelegate for TestDelegate {
    fn before_start_transaction(
        &self,
        _request: &URLRequest,
        mut headers: HttpRequestHeaders,
    ) -> BeforeStartResult {
        self.before_start_calls.fetch_add(1, Ordering::SeqCst);
        let result = match self.before_start_error {
            Some(error) => Err(error),
            None => {
                if let Some((name, value)) = &self.added_header {
                    headers.set_header(name, value).unwrap();
                }
                Ok(headers)
            }
        };
        complete(self.mode(), result)
    }

    fn on_headers_received(
        &self,
        _request: &URLRequest,
        _original_headers: &Arc<HttpResponseHeaders>,
        remote_endpoint: Option<SocketAddr>,
    ) -> HeadersReceivedResult {
        self.headers_received_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_endpoints.lock().unwrap().push(remote_endpoint);
        let result = match self.headers_received_error {
            Some(error) => Err(error),
            None => Ok(HeadersReceivedDecision {
                override_response_headers: self.override_headers.clone(),
                preserve_fragment_on_redirect_url: self.preserve_fragment_url.clone(),
            }),
        };
        match self.headers_gate.lock().unwrap().take() {
            Some(gate) => Completion::pending(async move {
                let _ = gate.await;
                result
            }),
            None => complete(self.mode(), result),
        }
    }

    fn can_set_cookie(
        &self,
        _request: &URLRequest,
        _cookie: &CanonicalCookie,
        _options: &CookieOptions,
    ) -> bool {
        !self.refuse_set_cookie
    }

    fn annotate_and_move_user_blocked_cookies(
        &self,
        _request: &URLRequest,
        included: &mut CookieAccessResultList,
        excluded: &mut CookieAccessResultList,
    ) -> bool {
        let (blocked, kept): (Vec<_>, Vec<_>) = included
            .drain(..)
            .partition(|c| self.blocked_cookie_names.contains(&c.cookie.name));
        *included = kept;
        for mut cookie in blocked {
            cookie
                .status
                .add_exclusion_reason(ExclusionReasons::USER_PREFERENCES);
            excluded.push(cookie);
        }
        true
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub starts: AtomicUsize,
    pub first_bytes: AtomicUsize,
    pub headers: Mutex<Vec<(u16, bool)>>,
    pub completions: Mutex<Vec<JobCompletion>>,
}

impl RecordingObserver {
    pub fn completions(&self) -> Vec<JobCompletion> {
        self.completions.lock().unwrap().clone()
    }
}

impl JobObserver for RecordingObserver {
    fn on_start_transaction(&self, _url: &Url) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_time_to_first_byte(&self, _elapsed: Duration) {
        self.first_bytes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_headers_received(&self, _url: &Url, response_code: u16, was_cached: bool) {
        self.headers.lock().unwrap().push((response_code, was_cached));
    }

    fn on_completed(&self, completion: &JobCompletion) {
        self.completions.lock().unwrap().push(completion.clone());
    }
}

pub fn context(
    factory: &Arc<MockTransactionFactory>,
    configure: impl FnOnce(URLRequestContextBuilder) -> URLRequestContextBuilder,
) -> Arc<URLRequestContext> {
    let builder = URLRequestContext::builder().transaction_factory(factory.clone());
    Arc::new(configure(builder).build().unwrap())
}

pub fn job(url: &str, context: &Arc<URLRequestContext>) -> URLRequestHttpJob {
    URLRequestHttpJob::new(URLRequest::new(url).unwrap(), Arc::clone(context))
}

pub async fn next(job: &mut URLRequestHttpJob) -> JobEvent {
    job.next_event().await.expect("job stalled")
}

/// Reads the decoded body to the end, driving pending reads.
pub async fn read_to_end(job: &mut URLRequestHttpJob) -> Result<Vec<u8>, NetError> {
    let mut body = Vec::new();
    loop {
        let chunk = match job.read(4096) {
            Some(result) => result?,
            None => match next(job).await {
                JobEvent::ReadCompleted(result) => result?,
                other => panic!("unexpected event {other:?}"),
            },
        };
        if chunk.is_empty() {
            return Ok(body);
        }
        body.extend_from_slice(&chunk);
    }
}

/// Stores `line` as if `url` had set it.
pub fn seed_cookie(jar: &CookieMonster, url: &str, line: &str) {
    let url = Url::parse(url).unwrap();
    let cookie = CanonicalCookie::create(&url, line, OffsetDateTime::now_utc(), None).unwrap();
    let mut options = CookieOptions::new();
    options.set_include_httponly();
    assert!(jar.set_cookie_with_options(cookie, &url, &options).is_include());
}
