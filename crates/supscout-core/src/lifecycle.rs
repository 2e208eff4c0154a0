// Request lifecycle shared by the search and detail coordinators
use serde::{Deserialize, Serialize};

/// Where a fetch currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

/// Things that move a fetch from one state to another
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent<T> {
    /// Key went away (empty query, no id)
    Cleared,
    Started,
    Succeeded(T),
    Failed(String),
}

/// The one transition function
///
/// Every event fully determines the next state, the previous state only
/// matters for logging. A `Started` event drops previously loaded data.
pub fn transition<T>(_state: FetchState<T>, event: FetchEvent<T>) -> FetchState<T> {
    match event {
        FetchEvent::Cleared => FetchState::Idle,
        FetchEvent::Started => FetchState::Loading,
        FetchEvent::Succeeded(data) => FetchState::Success(data),
        FetchEvent::Failed(message) => FetchState::Error(message),
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        FetchState::Idle
    }
}

impl<T> FetchState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, FetchState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Short name for logs
    pub fn label(&self) -> &'static str {
        match self {
            FetchState::Idle => "idle",
            FetchState::Loading => "loading",
            FetchState::Success(_) => "success",
            FetchState::Error(_) => "error",
        }
    }

    pub fn view(&self) -> FetchView<'_, T> {
        FetchView {
            data: self.data(),
            loading: self.is_loading(),
            error: self.error(),
        }
    }
}

/// What a view renders: `{ data, loading, error }`
#[derive(Debug, PartialEq)]
pub struct FetchView<'a, T> {
    pub data: Option<&'a T>,
    pub loading: bool,
    pub error: Option<&'a str>,
}

// Manual impls so `T` does not need to be Clone/Copy
impl<T> Clone for FetchView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FetchView<'_, T> {}

/// Sequence number stamped on every dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(pub u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to do with a response that arrives after a newer request went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Only the latest dispatch may update the state
    #[default]
    DiscardStale,
    /// Whatever settles last wins, even if it answers an older key
    LastWriteWins,
}

impl StalePolicy {
    pub fn from_discard_flag(discard_stale: bool) -> Self {
        if discard_stale {
            StalePolicy::DiscardStale
        } else {
            StalePolicy::LastWriteWins
        }
    }
}

/// Hands out tokens and decides whether a settled response may be applied
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    latest: u64,
    policy: StalePolicy,
}

impl TokenCounter {
    pub fn new(policy: StalePolicy) -> Self {
        Self { latest: 0, policy }
    }

    pub fn next(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// Invalidate everything in flight without dispatching anything new
    pub fn bump(&mut self) {
        self.latest += 1;
    }

    pub fn latest(&self) -> RequestToken {
        RequestToken(self.latest)
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    pub fn accepts(&self, token: RequestToken) -> bool {
        match self.policy {
            StalePolicy::DiscardStale => token.0 == self.latest,
            StalePolicy::LastWriteWins => true,
        }
    }
}

/// Outcome of one dispatched request, ready to be applied
#[derive(Debug, Clone, PartialEq)]
pub struct Settled<T> {
    pub token: RequestToken,
    pub outcome: std::result::Result<T, String>,
}

impl<T> Settled<T> {
    pub fn into_event(self) -> FetchEvent<T> {
        match self.outcome {
            Ok(data) => FetchEvent::Succeeded(data),
            Err(message) => FetchEvent::Failed(message),
        }
    }
}
