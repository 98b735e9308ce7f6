use pipe_trait::Pipe;
use reqwest::Client;
use std::future::IntoFuture;
use tokio::sync::Semaphore;

/// Wrapper around [`Client`] that caps the number of requests in flight.
#[derive(Debug)]
pub struct ThrottledClient {
    semaphore: Semaphore,
    client: Client,
}

impl ThrottledClient {
    /// Lower bound of [`ThrottledClient::new_from_cpu_count`].
    pub const MIN_PERMITS: usize = 16;

    /// Acquire a permit and run `proc` with the underlying [`Client`].
    pub async fn run_with_permit<Proc, ProcFuture>(&self, proc: Proc) -> ProcFuture::Output
    where
        Proc: FnOnce(&Client) -> ProcFuture,
        ProcFuture: IntoFuture,
    {
        // the semaphore is owned by `self` and never closed
        let permit = self.semaphore.acquire().await.ok();
        let result = proc(&self.client).await;
        drop(permit);
        result
    }

    /// Construct a throttled client that allows at most `permits` concurrent requests.
    pub fn new_with_permits(permits: usize) -> Self {
        let semaphore = permits.max(1).pipe(Semaphore::new);
        let client = Client::builder()
            .user_agent(concat!("podvend/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        ThrottledClient { semaphore, client }
    }

    /// Construct a throttled client with one permit per CPU, but no fewer than
    /// [`MIN_PERMITS`](Self::MIN_PERMITS).
    pub fn new_from_cpu_count() -> Self {
        num_cpus::get().max(Self::MIN_PERMITS).pipe(ThrottledClient::new_with_permits)
    }

    /// Number of requests that could start right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for ThrottledClient {
    fn default() -> Self {
        ThrottledClient::new_from_cpu_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn permits() {
        assert_eq!(ThrottledClient::new_with_permits(3).available_permits(), 3);
        assert_eq!(ThrottledClient::new_with_permits(0).available_permits(), 1);
        assert!(ThrottledClient::default().available_permits() >= ThrottledClient::MIN_PERMITS);
    }

    #[tokio::test]
    async fn permit_is_held_while_running() {
        let client = ThrottledClient::new_with_permits(2);
        let inside = client.run_with_permit(|_| async { client.available_permits() }).await;
        assert_eq!(inside, 1);
        assert_eq!(client.available_permits(), 2);
    }
}
