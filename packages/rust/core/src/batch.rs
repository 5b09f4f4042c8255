//! Fan-out/fan-in over independent fallible operations.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Run `op` on every input concurrently and split the outcomes by tag.
///
/// One task is spawned per input. With `max_in_flight` set, at most that many
/// operations run at once; otherwise fan-out is unbounded. Both output
/// vectors are in completion order, not input order. Returns only after every
/// task has finished.
pub async fn partition_concurrent<I, F, Fut, S, E>(
    inputs: I,
    max_in_flight: Option<usize>,
    op: F,
) -> (Vec<S>, Vec<E>)
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<S, E>> + Send + 'static,
    S: Send + 'static,
    E: Send + 'static,
{
    let permits = max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1))));
    let mut tasks = JoinSet::new();

    for input in inputs {
        let work = op(input);
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = match permits {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            work.await
        });
    }

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(success)) => successes.push(success),
            Ok(Err(failure)) => failures.push(failure),
            Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
        }
    }

    (successes, failures)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn splits_by_outcome() {
        let (mut evens, mut odds) = partition_concurrent(0..10u32, None, |n| async move {
            if n % 2 == 0 { Ok(n) } else { Err(n) }
        })
        .await;
        evens.sort();
        odds.sort();
        assert_eq!(evens, [0, 2, 4, 6, 8]);
        assert_eq!(odds, [1, 3, 5, 7, 9]);
    }

    #[tokio::test]
    async fn empty_input_yields_nothing() {
        let (ok, err): (Vec<u8>, Vec<u8>) =
            partition_concurrent(Vec::<u8>::new(), None, |n| async move { Ok(n) }).await;
        assert!(ok.is_empty() && err.is_empty());
    }

    #[tokio::test]
    async fn results_arrive_in_completion_order() {
        let (done, _): (Vec<u64>, Vec<()>) =
            partition_concurrent([60u64, 0, 30], None, |ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(ms)
            })
            .await;
        assert_eq!(done, [0, 30, 60]);
    }

    #[tokio::test]
    async fn bound_limits_tasks_in_flight() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (ok, _): (Vec<()>, Vec<()>) = partition_concurrent(0..12, Some(3), |_| {
            let running = running.clone();
            let peak = peak.clone();
            async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(ok.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }
}
