//! RSS Proxy - fetch a feed on behalf of a browser and render it
//!
//! The server side relays remote feed XML through `/api/rss` with fixed
//! limits and normalized errors. The client side (`viewer`, `render`,
//! `storage`) turns that XML into a sanitized view and keeps the user's
//! saved feeds and theme.

pub mod config;
pub mod error;
pub mod proxy;
pub mod render;
pub mod routes;
pub mod storage;
pub mod viewer;
