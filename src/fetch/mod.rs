//! Refreshing a group's job artifacts from its build server.
//!
//! The evaluator triggers one fetch per poll cycle and only cares whether it
//! finished. The artifacts themselves are read back by
//! [`crate::status::extract`].

pub mod curl;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::GroupConfig;

pub use curl::CurlFetcher;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to start fetch command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("failed waiting for fetch command: {0}")]
    Wait(#[source] std::io::Error),

    #[error("fetch exceeded {0:?}")]
    Timeout(Duration),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("fetch exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
}

/// Something that can bring a group's artifacts up to date.
///
/// Implementations must return within a bounded time and must give up
/// promptly once `cancel` fires.
pub trait StatusFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        group: &GroupConfig,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<(), FetchError>> + Send;
}
