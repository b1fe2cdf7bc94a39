//! # Waystone
//!
//! Endpoint failover and retry engine for clients that must reach one of
//! several interchangeable backends over an unreliable network.
//!
//! Each call goes through the same three layers:
//!
//! 1. the **sticky route** remembers which endpoint last succeeded and is
//!    tried alone first;
//! 2. if that fails (or nothing is remembered yet) the **fan-out racer**
//!    runs the operation against every endpoint in parallel, each under its
//!    own timeout, and takes the first success;
//! 3. the **retry coordinator** repeats whole rounds with exponential
//!    backoff until one succeeds or the attempt budget runs out.
//!
//! ```rust,no_run
//! use waystone::{operation_fn, AttemptError, Endpoint, EndpointPool, RetryCoordinator, RetryPolicy};
//!
//! # async fn run() -> waystone::Result<()> {
//! let pool = EndpointPool::new(["https://10.0.0.2:8443", "https://10.0.0.3:8443"])?;
//! let coordinator = RetryCoordinator::new(pool, RetryPolicy::default())?;
//!
//! let status = coordinator
//!     .execute(operation_fn("ping", |ep: Endpoint| async move {
//!         if ep.index() == 0 {
//!             Ok(200)
//!         } else {
//!             Err(AttemptError::Status(503))
//!         }
//!     }))
//!     .await?;
//! assert_eq!(status, 200);
//! # Ok(())
//! # }
//! ```
//!
//! Only [`WaystoneError`] ever reaches the caller; per-attempt and per-round
//! failures stay inside the engine.

pub mod config;
pub mod error;
pub mod notify;
pub mod operation;
pub mod racer;
pub mod retry;
pub mod route;
pub mod types;

pub use config::ClientConfig;
pub use error::{AggregateError, AttemptError, Result, WaystoneError};
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use operation::{operation_fn, AttemptFuture, FnOperation, Operation};
pub use racer::FanoutRacer;
pub use retry::{retry_always, RetryClassifier, RetryCoordinator, RetryPolicy};
pub use route::StickyRoute;
pub use types::{AttemptResult, Endpoint, EndpointPool};
