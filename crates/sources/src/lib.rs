//! Where skill content physically lives.
//!
//! - [`SourceCache`]: content-addressed directories under an explicit root.
//! - [`SourceFetcher`]: resolves local paths and downloads remote archives,
//!   reusing the cache unless a refresh is forced.
//! - [`fetch_marketplace`]: bounded, validated marketplace manifest loading.
//! - [`load_skills_from_all_sources`]: tags every matrix skill with its
//!   available sources and picks the active one.

#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod marketplace;
pub mod registry;
pub mod search;
pub mod source;
pub mod tagger;

pub use cache::{cache_key_for, SourceCache};
pub use error::FetchError;
pub use fetcher::{extract_tarball, FetchOptions, FetchResult, SourceFetcher};
pub use marketplace::{
    fetch_marketplace, plugin_name_warnings, plugin_version_warnings, LoadedMarketplace,
    Marketplace, MarketplacePlugin,
};
pub use registry::{FsPluginRegistry, PluginRegistry};
pub use search::{search_extra_sources, SearchCandidate};
pub use source::{is_remote, parse_source, Provider, ProviderHosts, RemoteSource, SourceSpec};
pub use tagger::{load_skills_from_all_sources, SkippedSource, TaggedMatrix, TaggingContext};

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, FetchError>;
