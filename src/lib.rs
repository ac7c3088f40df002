//! medium-sync: pull an author's Medium posts through public relays and keep
//! a local cache of their per-platform sync state.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ templates ┌──────────────┐  Post  ┌───────────┐
//! │ relay.rs │ ◄──────── │  acquire.rs  │ ─────► │  cache/   │
//! │ (pool)   │           │ (orchestrate)│        │ (merge,   │
//! └──────────┘           └──────────────┘        │  store)   │
//!                          │    │     │          └───────────┘
//!                          ▼    ▼     ▼
//!                    source/rss  source/archive  extract/
//! ```
//!
//! * **`relay`**: rotating relay templates and the retry-by-rotation fetch.
//! * **`source/`**: the `DataSource` trait, the `Post` record, and the feed
//!   and archive strategies.
//! * **`extract/`**: rebuilds a story page as Markdown.
//! * **`acquire`**: runs the strategies in order with fallback.
//! * **`fingerprint`**: stable post ids derived from title and URL.
//! * **`cache/`**: merge rules, validity, and the persisted cache document.
//! * **`publish`** / **`bulk`**: downstream platform contract and the
//!   rate-limited loops that drive it.

pub mod acquire;
pub mod bulk;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod publish;
pub mod relay;
pub mod source;

pub use acquire::{posts_to_fetch, Scraper};
pub use config::Config;
pub use error::{Error, Result};
pub use extract::Article;
pub use source::Post;
