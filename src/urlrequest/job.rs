//! URL Request HTTP Job.
//!
//! Based on Chromium's net::URLRequestHttpJob. The job wraps one logical
//! request and drives at most one [`HttpTransaction`] at a time through
//! cookie lookup, delegate gates, cookie storage, auth restarts,
//! certificate decisions and body decoding.
//!
//! Every collaborator call that may finish later is kept as a future
//! owned by the job. Nothing advances until the caller awaits
//! [`URLRequestHttpJob::next_event`], and synchronous results of
//! asynchronous steps are queued the same way so they are never handled
//! re-entrantly. [`URLRequestHttpJob::kill`] drops every queued future,
//! so a completion that was in flight can never reach the job.

use crate::base::completion::{Completion, Pending};
use crate::base::isolation::{is_localhost, scheme_is_cryptographic};
use crate::base::loadflags::LoadFlags;
use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::base::priority::RequestPriority;
use crate::cookies::inclusion::CookieAndLineAccessResultList;
use crate::cookies::negotiator::{complete_read, read_options, save_cookies};
use crate::cookies::store::CookieList;
use crate::filter::chain::DecodeChain;
use crate::filter::sourcetype::SourceType;
use crate::http::auth::{AuthChallengeInfo, AuthCredentials};
use crate::http::requestheaders::HttpRequestHeaders;
use crate::http::responseheaders::{is_redirect_status, HttpResponseHeaders};
use crate::http::responseinfo::HttpResponseInfo;
use crate::http::transaction::{
    HttpRequestInfo, HttpTransaction, LoadTimingInfo, TransactionResult,
};
use crate::http::upload::UploadDataStream;
use crate::tls::securityheaders::process_security_headers;
use crate::tls::sslinfo::{ClientCertificate, SslCertRequestInfo, SslInfo};
use crate::urlrequest::auth::AuthCoordinator;
use crate::urlrequest::context::URLRequestContext;
use crate::urlrequest::delegate::HeadersReceivedDecision;
use crate::urlrequest::observer::{CompletionCause, JobCompletion};
use crate::urlrequest::request::URLRequest;
use crate::urlrequest::throttle::ThrottlingEntry;
use bytes::Bytes;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use url::Url;

/// Where the headers of a [`ResponseSnapshot`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseHeadersSource {
    /// As received by the transaction.
    Original,
    /// Replaced by the network delegate.
    Overridden,
}

/// The response as the job reports it once headers are final.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub info: HttpResponseInfo,
    pub source: ResponseHeadersSource,
}

impl ResponseSnapshot {
    fn new(mut info: HttpResponseInfo, override_headers: Option<Arc<HttpResponseHeaders>>) -> Self {
        let source = match override_headers {
            Some(headers) => {
                info.headers = Some(headers);
                ResponseHeadersSource::Overridden
            }
            None => ResponseHeadersSource::Original,
        };
        Self { info, source }
    }

    pub fn headers(&self) -> Option<&Arc<HttpResponseHeaders>> {
        self.info.headers.as_ref()
    }
}

/// Coarse progress of a job, for logging and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    CookieRead,
    BeforeStartTransaction,
    TransactionPending,
    HeadersReceivedGate,
    CookieWrite,
    HeadersComplete,
    AuthPending,
    CertificatePending,
    Reading,
    Error,
    Done,
}

/// What the caller learns from [`URLRequestHttpJob::next_event`].
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// Final headers are available; the body can be read.
    HeadersComplete,
    /// Answer with `set_auth` or `cancel_auth`.
    AuthRequired(Option<AuthChallengeInfo>),
    /// Answer with `continue_despite_last_error` (unless fatal) or `kill`.
    CertificateError {
        error: NetError,
        ssl_info: SslInfo,
        fatal: bool,
    },
    /// Answer with `continue_with_certificate`.
    CertificateRequested(Option<SslCertRequestInfo>),
    /// The request failed before headers were complete. Terminal.
    StartError(NetError),
    /// Result of a read that returned `None`. Empty bytes mean end of body.
    ReadCompleted(Result<Bytes, NetError>),
}

enum JobStep {
    CookiesLoaded(CookieList),
    BeforeStartTransaction(Result<HttpRequestHeaders, NetError>),
    StartCompleted(Result<(), NetError>),
    HeadersReceived(Result<HeadersReceivedDecision, NetError>),
    CookiesSaved(CookieAndLineAccessResultList),
    ReadCompleted(Result<Bytes, NetError>),
    NotifyStartError(NetError),
    NotifyFinalHeaders,
}

#[derive(Debug, Clone, Copy)]
enum PendingRead {
    Raw,
    Decoded { buf_size: usize },
}

pub struct URLRequestHttpJob {
    request: URLRequest,
    context: Arc<URLRequestContext>,
    request_info: HttpRequestInfo,
    priority: RequestPriority,
    phase: JobPhase,

    transaction: Option<Box<dyn HttpTransaction>>,
    response: Option<ResponseSnapshot>,
    override_response_headers: Option<Arc<HttpResponseHeaders>>,
    preserve_fragment_on_redirect_url: Option<Url>,
    set_cookie_results: CookieAndLineAccessResultList,
    auth: AuthCoordinator,
    throttling_entry: Option<Arc<dyn ThrottlingEntry>>,
    awaiting_callback: bool,

    decode_chain: Option<DecodeChain>,
    decoded_eof: bool,
    pending_read: Option<PendingRead>,

    started: bool,
    done: bool,
    steps: FuturesUnordered<Pending<JobStep>>,

    request_creation_time: Option<Instant>,
    start_time: Option<Instant>,
    receive_headers_end: Option<Instant>,
    total_sent_bytes_from_previous_transactions: u64,
    total_received_bytes_from_previous_transactions: u64,
    prefilter_bytes_read: u64,
    postfilter_bytes_read: u64,
}

impl URLRequestHttpJob {
    pub fn new(request: URLRequest, context: Arc<URLRequestContext>) -> Self {
        let mut request_info = HttpRequestInfo::new(request.url().clone(), request.method().clone());
        request_info.extra_headers = request.extra_request_headers().clone();
        request_info.load_flags = request.load_flags();
        request_info.privacy_mode = request.privacy_mode();
        request_info.network_isolation_key = request.isolation_info().network_isolation_key.clone();
        request_info.upload_data_stream = request.upload().cloned();

        let throttling_entry = context
            .throttler()
            .map(|throttler| throttler.register_request_url(request.url()));

        let mut job = Self {
            priority: request.priority(),
            request,
            context,
            request_info,
            phase: JobPhase::Idle,
            transaction: None,
            response: None,
            override_response_headers: None,
            preserve_fragment_on_redirect_url: None,
            set_cookie_results: Vec::new(),
            auth: AuthCoordinator::new(),
            throttling_entry,
            awaiting_callback: false,
            decode_chain: None,
            decoded_eof: false,
            pending_read: None,
            started: false,
            done: false,
            steps: FuturesUnordered::new(),
            request_creation_time: None,
            start_time: None,
            receive_headers_end: None,
            total_sent_bytes_from_previous_transactions: 0,
            total_received_bytes_from_previous_transactions: 0,
            prefilter_bytes_read: 0,
            postfilter_bytes_read: 0,
        };
        job.reset_timer();
        job
    }

    pub fn request(&self) -> &URLRequest {
        &self.request
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Starts the job. Progress is reported through [`Self::next_event`].
    pub fn start(&mut self) {
        if self.started {
            tracing::warn!(url = %self.request.url(), "job started twice");
            return;
        }
        if self.done {
            return;
        }
        self.started = true;
        tracing::debug!(url = %self.request.url(), method = %self.request.method(), "job starting");

        let headers = &mut self.request_info.extra_headers;
        // Only the validated referrer may be sent.
        headers.remove_header("Referer");
        if let Some(referrer) = self.request.referrer() {
            set_header_or_warn(headers, "Referer", referrer.as_str());
        }
        let user_agent = self
            .context
            .user_agent_settings()
            .map(|settings| settings.user_agent.as_str())
            .unwrap_or("");
        if let Err(e) = headers.set_header_if_missing("User-Agent", user_agent) {
            tracing::warn!(error = %e, "invalid user agent");
        }

        self.add_extra_headers();
        self.add_cookie_header_and_start();
    }

    /// Drives the job until something needs the caller's attention.
    ///
    /// Returns `None` once nothing is in flight: the job is waiting on a
    /// caller action, or it is done.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        while let Some(step) = self.steps.next().await {
            if let Some(event) = self.handle_step(step) {
                return Some(event);
            }
        }
        None
    }

    /// Cancels the job. Safe in any state and idempotent.
    pub fn kill(&mut self) {
        self.steps = FuturesUnordered::new();
        self.pending_read = None;
        self.awaiting_callback = false;
        if self.transaction.is_some() {
            self.destroy_transaction();
        }
        self.done_with_request(CompletionCause::Aborted);
    }

    pub fn priority(&self) -> RequestPriority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: RequestPriority) {
        self.priority = priority;
        self.request.set_priority(priority);
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.set_priority(priority);
        }
    }

    pub fn set_upload(&mut self, upload: Option<UploadDataStream>) {
        if self.transaction.is_some() {
            tracing::warn!("upload cannot change once the transaction exists");
            return;
        }
        self.request_info.upload_data_stream = upload.clone();
        self.request.set_upload(upload);
    }

    pub fn set_extra_request_headers(&mut self, headers: HttpRequestHeaders) {
        if self.transaction.is_some() {
            tracing::warn!("extra headers cannot change once the transaction exists");
            return;
        }
        self.request_info.extra_headers = headers.clone();
        self.request.set_extra_request_headers(headers);
    }

    /// Headers the transaction is (or will be) started with.
    pub fn request_headers(&self) -> &HttpRequestHeaders {
        &self.request_info.extra_headers
    }

    pub fn load_state(&self) -> LoadState {
        match &self.transaction {
            None => LoadState::Idle,
            Some(_) if self.awaiting_callback => LoadState::WaitingForDelegate,
            Some(transaction) => transaction.load_state(),
        }
    }

    pub fn response_info(&self) -> Option<&HttpResponseInfo> {
        self.response.as_ref().map(|r| &r.info)
    }

    pub fn response_snapshot(&self) -> Option<&ResponseSnapshot> {
        self.response.as_ref()
    }

    fn snapshot_headers(&self) -> Option<&Arc<HttpResponseHeaders>> {
        self.response.as_ref()?.headers()
    }

    pub fn mime_type(&self) -> Option<String> {
        self.snapshot_headers()?.mime_type()
    }

    pub fn charset(&self) -> Option<String> {
        self.snapshot_headers()?.charset()
    }

    pub fn response_code(&self) -> Option<u16> {
        self.snapshot_headers().map(|h| h.response_code())
    }

    /// Whether the current response is a 407 or 401 the caller should
    /// answer. A canceled side never asks again.
    pub fn needs_auth(&mut self) -> bool {
        let code = self.response_code();
        self.auth.needs_auth(code)
    }

    pub fn auth_challenge_info(&self) -> Option<AuthChallengeInfo> {
        self.response.as_ref()?.info.auth_challenge.clone()
    }

    /// Answers the pending challenge; proxy challenges are answered first.
    pub fn set_auth(&mut self, credentials: AuthCredentials) {
        if self.transaction.is_none() {
            tracing::warn!("set_auth without a transaction");
            return;
        }
        let Some(target) = self.auth.set_auth(credentials) else {
            return;
        };
        tracing::debug!(?target, "restarting with credentials");
        self.restart_transaction_with_auth();
    }

    /// Gives up on the pending challenge. The error page is reported as
    /// the final headers from the next poll.
    pub fn cancel_auth(&mut self) {
        if self.done {
            return;
        }
        let target = self.auth.cancel_auth();
        tracing::debug!(?target, "auth canceled");
        self.push_ready(JobStep::NotifyFinalHeaders);
    }

    pub fn continue_with_certificate(&mut self, client_cert: Option<Arc<ClientCertificate>>) {
        let Some(transaction) = self.transaction.as_mut() else {
            tracing::warn!("continue_with_certificate without a transaction");
            return;
        };
        let result = transaction.restart_with_certificate(client_cert);
        self.restart_after_certificate(result);
    }

    pub fn continue_despite_last_error(&mut self) {
        // Killed jobs have no transaction.
        let Some(transaction) = self.transaction.as_mut() else {
            return;
        };
        let result = transaction.restart_ignoring_last_error();
        self.restart_after_certificate(result);
    }

    fn restart_after_certificate(&mut self, result: TransactionResult) {
        self.receive_headers_end = None;
        self.reset_timer();
        self.phase = JobPhase::TransactionPending;
        self.push_step(result.into_future().map(JobStep::StartCompleted));
    }

    /// Reads undecoded body bytes. `None` means the result arrives later as
    /// [`JobEvent::ReadCompleted`].
    pub fn read_raw_data(&mut self, buf_size: usize) -> Option<Result<Bytes, NetError>> {
        if let Err(e) = self.check_can_read() {
            return Some(Err(e));
        }
        let transaction = self.transaction.as_mut()?;
        match transaction.read(buf_size) {
            Completion::Ready(result) => Some(self.on_raw_read(result)),
            Completion::Pending(read) => {
                self.pending_read = Some(PendingRead::Raw);
                self.push_step(read.map(JobStep::ReadCompleted));
                None
            }
        }
    }

    /// Reads decoded body bytes. `buf_size` bounds each raw read; a decoded
    /// chunk may be larger. `None` means the result arrives later as
    /// [`JobEvent::ReadCompleted`].
    pub fn read(&mut self, buf_size: usize) -> Option<Result<Bytes, NetError>> {
        if let Err(e) = self.check_can_read() {
            return Some(Err(e));
        }
        if self.decoded_eof {
            return Some(Ok(Bytes::new()));
        }
        if self.decode_chain.is_none() {
            match self.build_decode_chain() {
                Ok(chain) => self.decode_chain = Some(chain),
                Err(e) => {
                    self.phase = JobPhase::Error;
                    self.done_with_request(CompletionCause::Finished);
                    return Some(Err(e));
                }
            }
        }
        self.read_decoded(buf_size)
    }

    fn check_can_read(&self) -> Result<(), NetError> {
        if self.transaction.is_none() {
            tracing::warn!("read without a transaction");
            return Err(NetError::Unexpected);
        }
        if self.pending_read.is_some() {
            tracing::warn!("read while another read is pending");
            return Err(NetError::Unexpected);
        }
        Ok(())
    }

    fn build_decode_chain(&self) -> Result<DecodeChain, NetError> {
        match self.current_headers() {
            Some(headers) => DecodeChain::build(
                &headers,
                self.request.accepted_stream_types(),
                self.context.filter_factory().as_ref(),
            ),
            None => Ok(DecodeChain::identity()),
        }
    }

    fn read_decoded(&mut self, buf_size: usize) -> Option<Result<Bytes, NetError>> {
        self.phase = JobPhase::Reading;
        loop {
            let transaction = self.transaction.as_mut()?;
            match transaction.read(buf_size) {
                Completion::Ready(result) => {
                    if let Some(output) = self.on_raw_for_decode(result) {
                        return Some(output);
                    }
                }
                Completion::Pending(read) => {
                    self.pending_read = Some(PendingRead::Decoded { buf_size });
                    self.push_step(read.map(JobStep::ReadCompleted));
                    return None;
                }
            }
        }
    }

    /// Some servers send a compressed body whose `Content-Length` is the
    /// decoded size. Only an exact match clears the error.
    fn should_fix_mismatched_content_length(&self, error: NetError) -> bool {
        if !error.is_length_mismatch() {
            return false;
        }
        let expected = self.current_headers().and_then(|h| h.content_length());
        tracing::debug!(
            ?expected,
            prefilter = self.prefilter_bytes_read,
            postfilter = self.postfilter_bytes_read,
            "length mismatch"
        );
        expected == Some(self.postfilter_bytes_read)
    }

    fn mask_length_mismatch(&self, result: Result<Bytes, NetError>) -> Result<Bytes, NetError> {
        match result {
            Err(e) if self.should_fix_mismatched_content_length(e) => Ok(Bytes::new()),
            other => other,
        }
    }

    fn on_raw_read(&mut self, result: Result<Bytes, NetError>) -> Result<Bytes, NetError> {
        self.phase = JobPhase::Reading;
        let result = self.mask_length_mismatch(result);
        match &result {
            Ok(bytes) if !bytes.is_empty() => {
                self.prefilter_bytes_read += bytes.len() as u64;
                self.postfilter_bytes_read += bytes.len() as u64;
            }
            Ok(_) => {
                self.phase = JobPhase::Done;
                self.done_with_request(CompletionCause::Finished);
            }
            Err(e) => {
                tracing::debug!(error = %e, "raw read failed");
                self.phase = JobPhase::Error;
                self.done_with_request(CompletionCause::Finished);
            }
        }
        result
    }

    /// Pushes raw bytes through the chain. `None` means the chain produced
    /// nothing yet and another raw read is needed.
    fn on_raw_for_decode(
        &mut self,
        result: Result<Bytes, NetError>,
    ) -> Option<Result<Bytes, NetError>> {
        let raw = match self.mask_length_mismatch(result) {
            Ok(raw) => raw,
            Err(e) => return Some(self.fail_read(e)),
        };
        let Some(chain) = self.decode_chain.as_mut() else {
            return Some(self.fail_read(NetError::Unexpected));
        };

        if raw.is_empty() {
            let tail = match chain.finish() {
                Ok(tail) => tail,
                Err(e) => return Some(self.fail_read(e)),
            };
            self.postfilter_bytes_read += tail.len() as u64;
            self.decoded_eof = true;
            self.phase = JobPhase::Done;
            self.done_with_request(CompletionCause::Finished);
            return Some(Ok(tail));
        }

        self.prefilter_bytes_read += raw.len() as u64;
        match chain.filter(&raw) {
            Ok(output) if output.is_empty() => None,
            Ok(output) => {
                self.postfilter_bytes_read += output.len() as u64;
                Some(Ok(output))
            }
            Err(e) => Some(self.fail_read(e)),
        }
    }

    fn fail_read(&mut self, error: NetError) -> Result<Bytes, NetError> {
        tracing::debug!(error = %error, "decoded read failed");
        self.phase = JobPhase::Error;
        self.done_with_request(CompletionCause::Finished);
        Err(error)
    }

    fn on_read_completed(&mut self, result: Result<Bytes, NetError>) -> Option<JobEvent> {
        match self.pending_read.take()? {
            PendingRead::Raw => Some(JobEvent::ReadCompleted(self.on_raw_read(result))),
            PendingRead::Decoded { buf_size } => match self.on_raw_for_decode(result) {
                Some(output) => Some(JobEvent::ReadCompleted(output)),
                None => self.read_decoded(buf_size).map(JobEvent::ReadCompleted),
            },
        }
    }

    /// Lets the transaction know the body was fully consumed.
    pub fn done_reading(&mut self) {
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.done_reading();
        }
        self.done_with_request(CompletionCause::Finished);
    }

    /// Finishes a redirect response without reading its body. A redirect
    /// that only exists in override headers is kept out of the cache.
    pub fn done_reading_redirect_response(&mut self) {
        if let Some(transaction) = self.transaction.as_mut() {
            let original_is_redirect = transaction
                .response_info()
                .and_then(|info| info.headers)
                .is_some_and(|headers| is_redirect_status(headers.response_code()));
            if original_is_redirect {
                transaction.done_reading();
            } else {
                transaction.stop_caching();
            }
        }
        self.done_with_request(CompletionCause::Finished);
    }

    pub fn is_safe_redirect(&self, location: &Url) -> bool {
        if matches!(location.scheme(), "http" | "https") {
            return true;
        }
        self.context.is_safe_redirect_target(location)
    }

    pub fn copy_fragment_on_redirect(&self, location: &Url) -> bool {
        self.preserve_fragment_on_redirect_url.as_ref() != Some(location)
    }

    pub fn close_connection_on_destruction(&mut self) {
        if let Some(transaction) = self.transaction.as_mut() {
            transaction.close_connection_on_destruction();
        }
    }

    pub fn total_sent_bytes(&self) -> u64 {
        self.total_sent_bytes_from_previous_transactions
            + self.transaction.as_ref().map_or(0, |t| t.total_sent_bytes())
    }

    pub fn total_received_bytes(&self) -> u64 {
        self.total_received_bytes_from_previous_transactions
            + self.transaction.as_ref().map_or(0, |t| t.total_received_bytes())
    }

    /// `None` until headers were received.
    pub fn load_timing_info(&self) -> Option<LoadTimingInfo> {
        let receive_headers_end = self.receive_headers_end?;
        let mut info = self.transaction.as_ref()?.load_timing_info()?;
        info.receive_headers_end = Some(receive_headers_end);
        Some(info)
    }

    pub fn remote_endpoint(&self) -> Option<SocketAddr> {
        self.transaction.as_ref()?.remote_endpoint()
    }

    pub fn prefilter_bytes_read(&self) -> u64 {
        self.prefilter_bytes_read
    }

    pub fn postfilter_bytes_read(&self) -> u64 {
        self.postfilter_bytes_read
    }

    fn handle_step(&mut self, step: JobStep) -> Option<JobEvent> {
        match step {
            JobStep::CookiesLoaded(list) => {
                self.on_cookies_loaded(list);
                None
            }
            JobStep::BeforeStartTransaction(result) => {
                self.awaiting_callback = false;
                self.maybe_start_transaction_internal(result);
                None
            }
            JobStep::StartCompleted(result) => self.on_start_completed(result),
            JobStep::HeadersReceived(result) => {
                self.awaiting_callback = false;
                self.on_headers_received_callback(result)
            }
            JobStep::CookiesSaved(results) => self.on_cookies_saved(results),
            JobStep::ReadCompleted(result) => self.on_read_completed(result),
            JobStep::NotifyStartError(error) => self.notify_start_error(error),
            JobStep::NotifyFinalHeaders if self.done => None,
            JobStep::NotifyFinalHeaders => {
                self.phase = JobPhase::HeadersComplete;
                Some(JobEvent::HeadersComplete)
            }
        }
    }

    fn push_step<F>(&mut self, step: F)
    where
        F: Future<Output = JobStep> + Send + 'static,
    {
        self.steps.push(Box::pin(step));
    }

    fn push_ready(&mut self, step: JobStep) {
        self.push_step(std::future::ready(step));
    }

    fn reset_timer(&mut self) {
        if self.request_creation_time.is_none() {
            self.request_creation_time = Some(Instant::now());
        }
    }

    fn current_headers(&self) -> Option<Arc<HttpResponseHeaders>> {
        if let Some(headers) = &self.override_response_headers {
            return Some(Arc::clone(headers));
        }
        self.transaction.as_ref()?.response_info()?.headers
    }

    fn add_extra_headers(&mut self) {
        let url = &self.request_info.url;
        let headers = &mut self.request_info.extra_headers;

        if !headers.has_header("Accept-Encoding") {
            if headers.has_header("Range") {
                // Byte ranges of an encoded body are useless to decode.
                set_header_or_warn(headers, "Accept-Encoding", "identity");
            } else {
                let accepted = self.request.accepted_stream_types();
                let mut encodings = Vec::with_capacity(3);
                if accepted.contains_source(SourceType::Gzip) {
                    encodings.push(SourceType::Gzip.as_str());
                }
                if accepted.contains_source(SourceType::Deflate) {
                    encodings.push(SourceType::Deflate.as_str());
                }
                if self.context.enable_brotli()
                    && accepted.contains_source(SourceType::Brotli)
                    && (scheme_is_cryptographic(url) || is_localhost(url))
                {
                    encodings.push(SourceType::Brotli.as_str());
                }
                if !encodings.is_empty() {
                    set_header_or_warn(headers, "Accept-Encoding", &encodings.join(", "));
                }
            }
        }

        if let Some(settings) = self.context.user_agent_settings() {
            if !settings.accept_language.is_empty() {
                if let Err(e) = headers.set_header_if_missing("Accept-Language", &settings.accept_language)
                {
                    tracing::warn!(error = %e, "invalid accept-language");
                }
            }
        }
    }

    fn add_cookie_header_and_start(&mut self) {
        let store = match self.context.cookie_store() {
            Some(store) if self.request.allow_credentials() => Arc::clone(store),
            _ => {
                self.start_transaction();
                return;
            }
        };
        self.phase = JobPhase::CookieRead;
        let options = read_options(&self.request);
        let lookup = store.get_cookie_list_with_options(self.request.url(), &options);
        self.push_step(lookup.map(JobStep::CookiesLoaded));
    }

    fn on_cookies_loaded(&mut self, list: CookieList) {
        let delegate = self.context.network_delegate().cloned();
        let outcome = complete_read(&self.request, list, delegate.as_deref());
        if let Some(line) = outcome.cookie_line {
            set_header_or_warn(&mut self.request_info.extra_headers, "Cookie", &line);
        }
        self.request.set_maybe_sent_cookies(outcome.maybe_sent_cookies);
        self.start_transaction();
    }

    fn start_transaction(&mut self) {
        let Some(delegate) = self.context.network_delegate().cloned() else {
            self.start_transaction_internal();
            return;
        };
        self.phase = JobPhase::BeforeStartTransaction;
        let headers = self.request_info.extra_headers.clone();
        match delegate.before_start_transaction(&self.request, headers) {
            Completion::Ready(result) => self.maybe_start_transaction_internal(result),
            Completion::Pending(gate) => {
                self.awaiting_callback = true;
                self.push_step(gate.map(JobStep::BeforeStartTransaction));
            }
        }
    }

    fn maybe_start_transaction_internal(&mut self, result: Result<HttpRequestHeaders, NetError>) {
        match result {
            Ok(headers) => {
                self.request_info.extra_headers = headers;
                self.start_transaction_internal();
            }
            Err(e) => {
                tracing::debug!(error = %e, "request canceled by delegate");
                // Never report back to the caller from inside its own call.
                self.push_ready(JobStep::NotifyStartError(e));
            }
        }
    }

    fn start_transaction_internal(&mut self) {
        if let Some(observer) = self.context.observer() {
            observer.on_start_transaction(self.request.url());
        }
        self.phase = JobPhase::TransactionPending;

        let result = match self.transaction.as_mut() {
            Some(transaction) => {
                let credentials = self.auth.take_credentials();
                transaction.restart_with_auth(&self.request_info, &credentials)
            }
            None => self.create_and_start_transaction(),
        };
        // Synchronous results are handled from the next poll.
        self.push_step(result.into_future().map(JobStep::StartCompleted));
    }

    fn create_and_start_transaction(&mut self) -> TransactionResult {
        let mut transaction = match self
            .context
            .transaction_factory()
            .create_transaction(self.priority)
        {
            Ok(transaction) => transaction,
            Err(e) => {
                tracing::warn!(error = %e, "failed to create transaction");
                return Completion::Ready(Err(e));
            }
        };

        let url = &self.request_info.url;
        let result = if matches!(url.scheme(), "ws" | "wss")
            && self.request.websocket_helper().is_none()
        {
            tracing::warn!(%url, "websocket request without a handshake helper");
            Completion::Ready(Err(NetError::DisallowedUrlScheme))
        } else {
            if let Some(helper) = self.request.websocket_helper() {
                transaction.set_websocket_handshake_helper(Arc::clone(helper));
            }
            let rejected = self
                .throttling_entry
                .as_ref()
                .is_some_and(|entry| entry.should_reject_request(self.request_info.load_flags));
            if rejected {
                Completion::Ready(Err(NetError::TemporarilyThrottled))
            } else {
                let result = transaction.start(&self.request_info);
                self.start_time = Some(Instant::now());
                result
            }
        };
        self.transaction = Some(transaction);
        result
    }

    fn on_start_completed(&mut self, result: Result<(), NetError>) -> Option<JobEvent> {
        if let Some(created) = self.request_creation_time.take() {
            if let Some(observer) = self.context.observer() {
                observer.on_time_to_first_byte(created.elapsed());
            }
        }
        if self.done {
            return None;
        }
        self.receive_headers_end = Some(Instant::now());

        let response_info = self.transaction.as_ref().and_then(|t| t.response_info());
        match result {
            Ok(()) => {
                self.preserve_fragment_on_redirect_url = None;
                let delegate = self.context.network_delegate().cloned();
                let headers = response_info.and_then(|info| info.headers);
                let (Some(delegate), Some(headers)) = (delegate, headers) else {
                    return self.save_cookies_and_notify_headers_complete();
                };
                self.phase = JobPhase::HeadersReceivedGate;
                let endpoint = self.transaction.as_ref().and_then(|t| t.remote_endpoint());
                match delegate.on_headers_received(&self.request, &headers, endpoint) {
                    Completion::Ready(result) => self.on_headers_received_callback(result),
                    Completion::Pending(gate) => {
                        self.awaiting_callback = true;
                        self.push_step(gate.map(JobStep::HeadersReceived));
                        None
                    }
                }
            }
            Err(error) if error.is_certificate_error() => {
                let fatal = error != NetError::CertKnownInterceptionBlocked
                    && match (self.context.transport_security_state(), self.request.url().host_str()) {
                        (Some(state), Some(host)) => state.should_ssl_errors_be_fatal(host),
                        _ => false,
                    };
                tracing::debug!(error = %error, fatal, "certificate error");
                self.phase = JobPhase::CertificatePending;
                Some(JobEvent::CertificateError {
                    error,
                    ssl_info: response_info.map(|info| info.ssl_info).unwrap_or_default(),
                    fatal,
                })
            }
            Err(NetError::SslClientAuthCertNeeded) => {
                self.phase = JobPhase::CertificatePending;
                Some(JobEvent::CertificateRequested(
                    response_info.and_then(|info| info.cert_request_info),
                ))
            }
            Err(error) => {
                if let Some(info) = response_info {
                    self.response = Some(ResponseSnapshot::new(info, None));
                }
                self.notify_start_error(error)
            }
        }
    }

    fn on_headers_received_callback(
        &mut self,
        result: Result<HeadersReceivedDecision, NetError>,
    ) -> Option<JobEvent> {
        match result {
            Ok(decision) => {
                if decision.override_response_headers.is_some() {
                    tracing::debug!("response headers overridden by delegate");
                }
                self.override_response_headers = decision.override_response_headers;
                self.preserve_fragment_on_redirect_url = decision.preserve_fragment_on_redirect_url;
                self.save_cookies_and_notify_headers_complete()
            }
            Err(e) => {
                tracing::debug!(error = %e, "response canceled by delegate");
                self.notify_start_error(e)
            }
        }
    }

    fn save_cookies_and_notify_headers_complete(&mut self) -> Option<JobEvent> {
        let store = match self.context.cookie_store() {
            Some(store) if !self.request_info.load_flags.contains(LoadFlags::DO_NOT_SAVE_COOKIES) => {
                Arc::clone(store)
            }
            _ => return self.notify_headers_complete(),
        };
        let Some(headers) = self.current_headers() else {
            return self.notify_headers_complete();
        };

        self.phase = JobPhase::CookieWrite;
        let delegate = self.context.network_delegate().cloned();
        let writes = save_cookies(
            &self.request,
            &headers,
            store.as_ref(),
            delegate.as_deref(),
            OffsetDateTime::now_utc(),
        );
        match writes.into_completion() {
            Completion::Ready(results) => self.on_cookies_saved(results),
            Completion::Pending(join) => {
                self.push_step(join.map(JobStep::CookiesSaved));
                None
            }
        }
    }

    fn on_cookies_saved(&mut self, results: CookieAndLineAccessResultList) -> Option<JobEvent> {
        self.set_cookie_results = results;
        self.notify_headers_complete()
    }

    fn notify_headers_complete(&mut self) -> Option<JobEvent> {
        let transaction = self.transaction.as_ref()?;
        let info = transaction.response_info().unwrap_or_default();
        let snapshot = ResponseSnapshot::new(info, self.override_response_headers.clone());
        let was_cached = snapshot.info.was_cached;
        let response_code = snapshot.info.response_code();
        let ready_to_restart = transaction.is_ready_to_restart_for_auth();

        if let Some(code) = response_code {
            if !was_cached {
                if let Some(entry) = &self.throttling_entry {
                    entry.update_with_response(code);
                }
            }
            if let Some(observer) = self.context.observer() {
                observer.on_headers_received(self.request.url(), code, was_cached);
            }
        }
        if let Some(headers) = snapshot.headers() {
            process_security_headers(
                self.context.transport_security_state().map(|s| s.as_ref()),
                self.request.url(),
                headers,
                &snapshot.info.ssl_info,
                &self.request_info.network_isolation_key,
            );
        }
        self.response = Some(snapshot);
        self.request
            .set_maybe_stored_cookies(std::mem::take(&mut self.set_cookie_results));

        if ready_to_restart {
            tracing::debug!("transaction retrying auth on its own");
            self.auth.set_restart_credentials(AuthCredentials::default());
            self.restart_transaction_with_auth();
            return None;
        }

        if self.needs_auth() {
            self.phase = JobPhase::AuthPending;
            return Some(JobEvent::AuthRequired(self.auth_challenge_info()));
        }
        self.phase = JobPhase::HeadersComplete;
        tracing::debug!(code = ?response_code, "headers complete");
        Some(JobEvent::HeadersComplete)
    }

    fn notify_start_error(&mut self, error: NetError) -> Option<JobEvent> {
        tracing::debug!(url = %self.request.url(), error = %error, "job failed to start");
        self.phase = JobPhase::Error;
        self.done_with_request(CompletionCause::Finished);
        Some(JobEvent::StartError(error))
    }

    fn restart_transaction_with_auth(&mut self) {
        self.response = None;
        self.override_response_headers = None;
        self.receive_headers_end = None;
        self.decode_chain = None;
        self.decoded_eof = false;
        self.reset_timer();

        // The store may have changed while handling the challenge.
        self.request_info.extra_headers.remove_header("Cookie");
        self.request.set_maybe_sent_cookies(Vec::new());
        self.request.set_maybe_stored_cookies(Vec::new());
        self.add_cookie_header_and_start();
    }

    fn destroy_transaction(&mut self) {
        self.done_with_request(CompletionCause::Aborted);
        if let Some(transaction) = self.transaction.take() {
            self.total_sent_bytes_from_previous_transactions += transaction.total_sent_bytes();
            self.total_received_bytes_from_previous_transactions +=
                transaction.total_received_bytes();
        }
        self.response = None;
        self.override_response_headers = None;
        self.receive_headers_end = None;
    }

    fn done_with_request(&mut self, cause: CompletionCause) {
        if self.done {
            return;
        }
        self.done = true;
        if cause == CompletionCause::Aborted {
            self.phase = JobPhase::Done;
        }

        let completion = JobCompletion {
            cause,
            total_time: self.start_time.map(|start| start.elapsed()),
            priority: self.priority,
            was_cached: self.response.as_ref().is_some_and(|r| r.info.was_cached),
            prefilter_bytes_read: self.prefilter_bytes_read,
            postfilter_bytes_read: self.postfilter_bytes_read,
        };
        tracing::debug!(url = %self.request.url(), ?cause, "job done");
        if let Some(observer) = self.context.observer() {
            observer.on_completed(&completion);
        }
        self.request
            .set_received_response_content_length(self.prefilter_bytes_read);
    }
}

impl Drop for URLRequestHttpJob {
    fn drop(&mut self) {
        if !self.done {
            self.kill();
        }
    }
}

impl std::fmt::Debug for URLRequestHttpJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("URLRequestHttpJob")
            .field("url", &self.request.url().as_str())
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .field("has_transaction", &self.transaction.is_some())
            .field("done", &self.done)
            .finish()
    }
}

fn set_header_or_warn(headers: &mut HttpRequestHeaders, name: &str, value: &str) {
    if let Err(e) = headers.set_header(name, value) {
        tracing::warn!(header = name, error = %e, "dropping invalid request header");
    }
}
