// ── Sequential submission queue ──
//
// Bulk issuance and import both push many records at the backend. The
// queue runs them strictly one after another, in order, and keeps every
// outcome; one failure never stops the rest.

use std::future::Future;

use tracing::warn;

use crate::error::CoreError;

/// Outcome of one submitted item.
#[derive(Debug)]
pub struct Submission<T, R> {
    /// Zero-based position in the queue.
    pub index: usize,
    pub item: T,
    pub result: Result<R, CoreError>,
}

#[derive(Debug)]
pub struct SubmissionQueue<T> {
    items: Vec<T>,
}

impl<T> Default for SubmissionQueue<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Clone> SubmissionQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Submit every item in order, awaiting each before the next.
    pub async fn run<R, F, Fut>(self, mut submit: F) -> Vec<Submission<T, R>>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<R, CoreError>>,
    {
        let mut outcomes = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.into_iter().enumerate() {
            let result = submit(item.clone()).await;
            if let Err(err) = &result {
                warn!(index, error = %err, "submission failed");
            }
            outcomes.push(Submission {
                index,
                item,
                result,
            });
        }
        outcomes
    }
}

impl<T> FromIterator<T> for SubmissionQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn runs_in_order_and_keeps_failures() {
        let seen = Mutex::new(Vec::new());
        let queue: SubmissionQueue<u32> = [1, 2, 3, 4].into_iter().collect();

        let outcomes = queue
            .run(|n| {
                seen.lock().unwrap().push(n);
                async move {
                    if n % 2 == 0 {
                        Err(CoreError::Rejected {
                            message: format!("even {n}"),
                        })
                    } else {
                        Ok(n * 10)
                    }
                }
            })
            .await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].result.as_ref().unwrap(), &10);
        assert!(outcomes[1].result.is_err());
        assert_eq!(outcomes[2].index, 2);
        assert_eq!(outcomes[3].item, 4);
    }
}
