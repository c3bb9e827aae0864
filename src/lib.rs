//! # file_cache_server — bounded LRU cache behind a concurrent file server
//!
//! The heart of this crate is [`BoundedLruCache`], a fixed-capacity,
//! thread-safe LRU cache from file paths to file contents:
//!
//! - **O(1)** `get` and `put`
//! - Strict recency order; the least recently used key is evicted first
//! - One `Mutex` over the whole structure, so every operation is atomic
//! - Values are immutable `Arc<[u8]>`, shared out on a hit and never aliased
//!   mutably
//!
//! Around it sit the pieces that exercise it: a [`ContentSource`] that reads
//! files on a miss, a [`FileServer`] that hands each TCP connection to a
//! worker pool, and [`generate`], which writes the sample files.
//!
//! ## Example
//!
//! ```rust
//! use file_cache_server::BoundedLruCache;
//!
//! let cache = BoundedLruCache::new(2)?;
//!
//! cache.put("files/file_1.txt", b"one".to_vec());
//! cache.put("files/file_2.txt", b"two".to_vec());
//! assert_eq!(cache.get("files/file_1.txt").as_deref(), Some(&b"one"[..]));
//!
//! // file_2 is now least recently used.
//! cache.put("files/file_3.txt", b"three".to_vec());
//! assert!(!cache.contains("files/file_2.txt"));
//! assert_eq!(cache.len(), 2);
//! # Ok::<(), file_cache_server::CacheError>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod server;
pub mod source;

pub use cache::{BoundedLruCache, CacheSnapshot, CacheStats};
pub use error::{CacheError, GeneratorError, ServerError};
pub use generator::{GeneratorConfig, generate, sample_file_name};
pub use server::{FileServer, Lookup, ServerConfig, serve_key};
pub use source::{ContentSource, FsSource};
