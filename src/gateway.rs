//! Search gateway: cache-first option lookup with cancel-and-replace.
//!
//! Resolution policy for a term:
//! - empty term: `[]`, cached under `""`
//! - cached term: the cached list, no network call
//! - otherwise: abort the in-flight request (if any) and issue a new one
//!
//! Requests are numbered at issuance. Only the latest issued request may
//! write to the cache or be rendered; anything older settles as superseded.
//! Failures never propagate: the caller receives an empty list.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture};
use parking_lot::Mutex;

use crate::error::Result;
use crate::option::SuggestOption;
use crate::source::OptionSource;

/// Identity of an issued request, increasing per gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the cache (or the empty term) without a request
    Cached,
    /// The current request succeeded and its result was cached
    Loaded,
    /// The request failed; nothing was cached
    Failed,
    /// The request was aborted before it completed
    Cancelled,
    /// The request completed, but a newer one had been issued meanwhile
    Superseded,
}

/// Result of a fetch, as delivered to the widget
#[derive(Debug, Clone)]
pub struct Fetched {
    /// `None` when no request was issued
    pub request: Option<RequestId>,
    pub term: String,
    pub options: Vec<SuggestOption>,
    pub outcome: FetchOutcome,
}

/// Cache check performed synchronously when the term changes
pub enum Lookup {
    Ready(Vec<SuggestOption>),
    Pending(PendingFetch),
}

struct InFlight {
    request: RequestId,
    abort: AbortHandle,
}

#[derive(Default)]
struct GatewayState {
    cache: HashMap<String, Vec<SuggestOption>>,
    latest: u64,
    in_flight: Option<InFlight>,
    requests_issued: u64,
}

impl GatewayState {
    /// Abort the in-flight request and invalidate every issued id
    fn supersede(&mut self) {
        if let Some(prev) = self.in_flight.take() {
            tracing::debug!("aborting superseded search request {}", prev.request);
            prev.abort.abort();
        }
        self.latest += 1;
    }
}

/// A request that has been issued but not yet awaited
pub struct PendingFetch {
    request: RequestId,
    term: String,
    future: Abortable<BoxFuture<'static, Result<Vec<SuggestOption>>>>,
    state: Arc<Mutex<GatewayState>>,
}

impl fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingFetch")
            .field("request", &self.request)
            .field("term", &self.term)
            .finish()
    }
}

impl PendingFetch {
    pub fn request(&self) -> RequestId {
        self.request
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Await the request and record its settlement
    pub async fn settle(self) -> Fetched {
        let PendingFetch {
            request,
            term,
            future,
            state,
        } = self;

        let result: std::result::Result<Result<Vec<SuggestOption>>, Aborted> = future.await;

        let mut state = state.lock();
        let current = state.latest == request.0;
        if state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.request == request)
        {
            state.in_flight = None;
        }

        let (options, outcome) = match result {
            Ok(Ok(options)) if current => {
                state.cache.insert(term.clone(), options.clone());
                (options, FetchOutcome::Loaded)
            }
            Ok(Ok(_)) => {
                tracing::debug!("dropping result of superseded request {request} for '{term}'");
                (vec![], FetchOutcome::Superseded)
            }
            Ok(Err(e)) => {
                tracing::warn!("search for '{term}' failed: {e}");
                (vec![], FetchOutcome::Failed)
            }
            Err(Aborted) => (vec![], FetchOutcome::Cancelled),
        };

        Fetched {
            request: Some(request),
            term,
            options,
            outcome,
        }
    }
}

/// Cache-first, cancel-and-replace access to an `OptionSource`.
///
/// Cloning shares the cache and the in-flight handle; one gateway (and its
/// clones) belongs to exactly one widget.
pub struct SearchGateway<S> {
    source: Arc<S>,
    state: Arc<Mutex<GatewayState>>,
}

impl<S> Clone for SearchGateway<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: OptionSource> SearchGateway<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(GatewayState::default())),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve from cache or issue a request.
    ///
    /// Any resolution supersedes the in-flight request, so an older response
    /// can never overwrite what this lookup renders.
    pub fn begin(&self, term: &str) -> Lookup {
        let mut state = self.state.lock();

        if term.is_empty() {
            state.supersede();
            let empty = state.cache.entry(String::new()).or_default().clone();
            return Lookup::Ready(empty);
        }

        if let Some(cached) = state.cache.get(term).cloned() {
            tracing::debug!("search cache hit for '{term}'");
            state.supersede();
            return Lookup::Ready(cached);
        }

        state.supersede();
        state.requests_issued += 1;
        let request = RequestId(state.latest);

        let source = Arc::clone(&self.source);
        let owned_term = term.to_string();
        let search: BoxFuture<'static, Result<Vec<SuggestOption>>> =
            async move { source.search(&owned_term).await }.boxed();

        let (abort, registration) = AbortHandle::new_pair();
        state.in_flight = Some(InFlight { request, abort });
        tracing::debug!("issuing search request {request} for '{term}'");

        Lookup::Pending(PendingFetch {
            request,
            term: term.to_string(),
            future: Abortable::new(search, registration),
            state: Arc::clone(&self.state),
        })
    }

    /// Resolve a term end to end
    pub async fn fetch(&self, term: &str) -> Fetched {
        match self.begin(term) {
            Lookup::Ready(options) => Fetched {
                request: None,
                term: term.to_string(),
                options,
                outcome: FetchOutcome::Cached,
            },
            Lookup::Pending(pending) => pending.settle().await,
        }
    }

    /// Whether `request` is still the one allowed to update state
    pub fn is_current(&self, request: RequestId) -> bool {
        self.state.lock().latest == request.0
    }

    /// True from issuance until the current request settles
    pub fn in_flight(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Abort and invalidate whatever is outstanding
    pub fn cancel(&self) {
        self.state.lock().supersede();
    }

    pub fn cached(&self, term: &str) -> Option<Vec<SuggestOption>> {
        self.state.lock().cache.get(term).cloned()
    }

    /// Number of network requests issued so far
    pub fn requests_issued(&self) -> u64 {
        self.state.lock().requests_issued
    }
}
