//! Boundary: the runtime environment a property hook runs in.
//!
//! Server-side hooks see the parsed request (`ServerContext`). Client-side
//! hooks and setters see an `Environment`, which is either the server (no
//! browser facilities) or a `Browser` with storage, cookies, and the user's
//! language preferences.

use std::fmt;
use std::sync::Arc;

use appstate_utils::{CookieJar, Cookies, MemoryStorage, StorageKind, WebStorage, parse_cookies};

use crate::errors::StateError;

/// The parts of an incoming request that properties read.
#[derive(Debug, Clone, Default)]
pub struct ServerRequest {
    cookie_header: Option<String>,
    accept_language: Option<String>,
}

impl ServerRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    #[must_use]
    pub fn with_accept_language(mut self, header: impl Into<String>) -> Self {
        self.accept_language = Some(header.into());
        self
    }

    #[must_use]
    pub fn cookie_header(&self) -> Option<&str> {
        self.cookie_header.as_deref()
    }

    #[must_use]
    pub fn accept_language(&self) -> Option<&str> {
        self.accept_language.as_deref()
    }
}

/// A request with its cookies parsed once, shared by every server-side hook.
#[derive(Debug, Clone)]
pub struct ServerContext {
    cookies: Cookies,
    request: ServerRequest,
}

impl ServerContext {
    #[must_use]
    pub fn from_request(request: ServerRequest) -> Self {
        let cookies = request.cookie_header().map(parse_cookies).unwrap_or_default();
        Self { cookies, request }
    }

    #[must_use]
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn accept_language(&self) -> Option<&str> {
        self.request.accept_language()
    }
}

/// Browser facilities available to client-side hooks and setters.
#[derive(Clone)]
pub struct Browser {
    local_storage: Arc<dyn WebStorage>,
    session_storage: Arc<dyn WebStorage>,
    cookies: Arc<CookieJar>,
    languages: Vec<String>,
}

impl fmt::Debug for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Browser")
            .field("local_storage", &self.local_storage.kind())
            .field("session_storage", &self.session_storage.kind())
            .field("cookies", &self.cookies)
            .field("languages", &self.languages)
            .finish()
    }
}

impl Browser {
    #[must_use]
    pub fn new(
        local_storage: Arc<dyn WebStorage>,
        session_storage: Arc<dyn WebStorage>,
        cookies: Arc<CookieJar>,
        languages: Vec<String>,
    ) -> Self {
        Self {
            local_storage,
            session_storage,
            cookies,
            languages,
        }
    }

    /// Empty in-memory storages and an empty cookie jar.
    #[must_use]
    pub fn in_memory(languages: Vec<String>, cookie_max_age: u64) -> Self {
        Self::new(
            Arc::new(MemoryStorage::new(StorageKind::Local)),
            Arc::new(MemoryStorage::new(StorageKind::Session)),
            Arc::new(CookieJar::new(cookie_max_age)),
            languages,
        )
    }

    #[must_use]
    pub fn local_storage(&self) -> &dyn WebStorage {
        self.local_storage.as_ref()
    }

    #[must_use]
    pub fn session_storage(&self) -> &dyn WebStorage {
        self.session_storage.as_ref()
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// The user's preferred languages (`navigator.languages`), most preferred first.
    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }
}

#[derive(Debug, Clone)]
pub enum Environment {
    Server,
    Browser(Browser),
}

impl Environment {
    /// The browser facilities, or `EnvironmentMismatch` naming `operation`.
    pub fn browser(&self, operation: &'static str) -> Result<&Browser, StateError> {
        match self {
            Self::Browser(browser) => Ok(browser),
            Self::Server => Err(StateError::EnvironmentMismatch { operation }),
        }
    }
}

impl From<Browser> for Environment {
    fn from(browser: Browser) -> Self {
        Self::Browser(browser)
    }
}
