//! Shared infrastructure utilities for appstate.
//!
//! This crate provides the browser/request plumbing that property hooks need
//! but that doesn't belong in the domain-pure `appstate-types` crate:
//!
//! - **`cookies`**: Cookie header parsing and the client-side cookie jar
//! - **`accept_language`**: `Accept-Language` header parsing and ordering
//! - **`storage`**: Local/session storage abstraction with an in-memory backend

pub mod accept_language;
pub mod cookies;
pub mod storage;

pub use accept_language::{LanguageRange, parse_accept_language, preferred_languages};
pub use cookies::{
    CookieJar, Cookies, DEFAULT_COOKIE_MAX_AGE, expire_cookie_directive, parse_cookies,
    set_cookie_directive,
};
pub use storage::{MemoryStorage, StorageKind, WebStorage};
