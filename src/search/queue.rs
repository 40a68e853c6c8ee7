use std::future::Future;
use std::time::Duration;

/// Runs async tasks one at a time with a fixed pause between them.
///
/// Keeps a sequence of API calls under the endpoint's rate limit. There is
/// never more than one task in flight, and no pause after the last task.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitedQueue {
    delay: Duration,
}

impl RateLimitedQueue {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Apply `task` to each item in order and collect the outputs.
    pub async fn run<I, T, O, F, Fut>(&self, items: I, mut task: F) -> Vec<O>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = O>,
    {
        let mut outputs = Vec::new();
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            outputs.push(task(item).await);
        }
        outputs
    }
}
