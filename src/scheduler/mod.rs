//! Periodic cache resynchronization
//!
//! # Overview
//!
//! A product whose configuration names a server and sets both `clean_cache`
//! and a positive `cache_expiry_secs` gets one background task that re-runs
//! the manager's fallback chain every expiry period. The first run happens one
//! full period after start.
//!
//! The task holds only a weak reference to its manager and exits once the
//! manager is dropped. There is no stop operation.
//!
//! # Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `server_url` | none | Required for the synchronizer to run |
//! | `clean_cache` | false | Enables periodic resync |
//! | `cache_expiry_secs` | 0 | Resync period; 0 disables resync |

pub mod synchronizer;

pub use synchronizer::DataSynchronizer;
