//! Shlok Core
//!
//! Loads the verse corpus and picks "today's verse" so that every process
//! computing it for the same UTC date lands on the same record.
//!
//! # Architecture
//!
//! ```text
//! CorpusSource → loader → Corpus ─┬─ selector (date, len) → index ─┐
//!                    ↑            └──────────────────────────── lookup → VerseRecord
//!              CorpusCache (optional, keyed by source revision)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use shlok_core::{FileSource, ShlokService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = FileSource::new("data/gita-shloks.csv")
//!     .with_fallback("public/data/gita-shloks.csv");
//! let service = ShlokService::new(source);
//!
//! let today = service.daily_verse().await?;
//! println!("{} {}", today.reference(), today.english_meaning);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod loader;
pub mod lookup;
pub mod record;
pub mod selector;
pub mod service;

pub use cache::{CacheStats, CorpusCache};
pub use error::{ShlokError, ShlokResult};
pub use loader::{load_corpus, parse_corpus, CorpusSource, FileSource, HttpSource, StaticSource};
pub use lookup::{by_chapter_verse, by_index};
pub use record::{Corpus, SourceFingerprint, VerseRecord};
pub use selector::{
    canonical_date_string, date_hash, select_daily_index, select_daily_index_for,
    select_random_index, today_utc,
};
pub use service::ShlokService;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the verse core
    pub use crate::error::{ShlokError, ShlokResult};
    pub use crate::loader::{CorpusSource, FileSource, HttpSource, StaticSource};
    pub use crate::record::{Corpus, VerseRecord};
    pub use crate::service::ShlokService;
}
