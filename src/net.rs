//! The completion-notifiable network capability. The engine never owns an
//! HTTP client; it decorates whatever fetch capability the host hands it,
//! forwarding every result unchanged while signalling a settle feed so the
//! prompt dismisser can re-scan after network activity. That channel catches
//! prompts appearing without a detectable DOM mutation.

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self { url }
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
}

pub trait Fetch {
    fn fetch(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, FetchError>>;
}

/// Receiver side of the settle channel: one signal per resolved response.
pub struct SettleFeed {
    rx: mpsc::UnboundedReceiver<()>,
}

impl SettleFeed {
    /// Returns `false` once the decorated fetcher is gone.
    pub async fn settled(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// Decorates a fetch capability so that every successfully resolved response
/// also signals the settle feed. Failed fetches stay silent, matching the
/// behavior this replaces, but the error is still forwarded to the caller
/// untouched.
pub struct ObservedFetch<F> {
    inner: F,
    settle_tx: mpsc::UnboundedSender<()>,
}

impl<F: Fetch> ObservedFetch<F> {
    pub fn wrap(inner: F) -> (Self, SettleFeed) {
        let (settle_tx, rx) = mpsc::unbounded_channel();
        (Self { inner, settle_tx }, SettleFeed { rx })
    }
}

impl<F: Fetch> Fetch for ObservedFetch<F> {
    fn fetch(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, FetchError>> {
        let inner = self.inner.fetch(request);
        let settle_tx = self.settle_tx.clone();
        async move {
            let outcome = inner.await;
            if outcome.is_ok() {
                let _ = settle_tx.send(());
            }
            outcome
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetch {
        fail: bool,
    }

    impl Fetch for StaticFetch {
        fn fetch(&self, request: Request) -> LocalBoxFuture<'static, Result<Response, FetchError>> {
            let fail = self.fail;
            async move {
                if fail {
                    Err(FetchError::Network(format!("unreachable: {}", request.url)))
                } else {
                    Ok(Response {
                        status: 200,
                        body: b"ok".to_vec(),
                    })
                }
            }
            .boxed_local()
        }
    }

    fn request() -> Request {
        Request::get(Url::parse("https://example.com/ads").expect("url"))
    }

    #[tokio::test]
    async fn forwards_response_and_signals_settle() {
        let (fetch, mut feed) = ObservedFetch::wrap(StaticFetch { fail: false });
        let response = fetch.fetch(request()).await.expect("response");
        assert_eq!(response.status, 200);
        assert!(feed.settled().await);
    }

    #[tokio::test]
    async fn forwards_error_without_settling() {
        let (fetch, mut feed) = ObservedFetch::wrap(StaticFetch { fail: true });
        let err = fetch.fetch(request()).await.expect_err("error");
        assert!(matches!(err, FetchError::Network(_)));
        drop(fetch);
        // Channel closes without ever signalling.
        assert!(!feed.settled().await);
    }
}
