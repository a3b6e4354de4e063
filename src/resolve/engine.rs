use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{Level, event};

use crate::core::common::{ResolutionMap, ResolveOptions};
use crate::core::konst::APP_NAME;
use crate::resolve::lookup::Lookup;

/// Single-pass queue of hostnames awaiting resolution.
///
/// Populated once up front and drained by the workers one entry at a time.
/// An entry handed to a worker is never re-enqueued.
#[derive(Clone)]
pub struct WorkQueue {
    items: Arc<Mutex<VecDeque<String>>>,
}

impl WorkQueue {
    pub fn new(hostnames: impl IntoIterator<Item = String>) -> WorkQueue {
        WorkQueue {
            items: Arc::new(Mutex::new(hostnames.into_iter().collect())),
        }
    }

    /// Claim the next hostname, or None when the queue is drained.
    pub fn try_take(&self) -> Option<String> {
        // This only fails if a holder of the lock panicked
        self.items.lock().unwrap().pop_front()
    }
}

/// Resolve a batch of hostnames with a fixed pool of concurrent workers.
///
/// Every submitted hostname appears exactly once as a key in the returned
/// map (duplicate submissions collapse), with an empty address list for
/// hosts that failed to resolve. The call returns once the queue is drained
/// and every worker has deposited its last result. When `cancel` is set,
/// workers stop claiming hostnames and the partial map is returned.
pub async fn run_batch<L>(
    hostnames: Vec<String>,
    lookup: Arc<L>,
    options: &ResolveOptions,
    cancel: Arc<AtomicBool>,
) -> ResolutionMap
where
    L: Lookup + Send + Sync + 'static,
{
    let mut resolution_map = ResolutionMap::new();
    if hostnames.is_empty() {
        return resolution_map;
    }

    let queue = WorkQueue::new(hostnames);
    let (results_tx, mut results_rx) = mpsc::unbounded_channel();

    let pool_size = options.pool_size.max(1);
    let mut workers = Vec::with_capacity(pool_size as usize);
    for worker_id in 0..pool_size {
        let queue = queue.clone();
        let results_tx = results_tx.clone();
        let lookup = lookup.clone();
        let cancel = cancel.clone();

        workers.push(tokio::spawn(async move {
            while !cancel.load(Ordering::SeqCst) {
                let hostname = match queue.try_take() {
                    Some(hostname) => hostname,
                    None => break,
                };
                let addrs = lookup.lookup(&hostname).await;
                // The receiver outlives every worker.
                let _ = results_tx.send((hostname, addrs));
            }
            event!(target: APP_NAME, Level::DEBUG, "resolution worker {worker_id} finished");
        }));
    }
    // The workers hold the only remaining senders. Dropping ours lets the
    // drain below terminate once they are all gone.
    drop(results_tx);

    // Barrier: no result is visible to the caller until every worker has
    // deposited its last outcome and terminated.
    for joined in join_all(workers).await {
        if let Err(e) = joined {
            event!(target: APP_NAME, Level::WARN, "resolution worker panicked: {e}");
        }
    }

    while let Some((hostname, addrs)) = results_rx.recv().await {
        resolution_map.insert(hostname, addrs);
    }
    resolution_map
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use crate::core::common::ResolveOptions;
    use crate::resolve::engine::{WorkQueue, run_batch};
    use crate::resolve::lookup::mock::StaticLookup;

    fn options_with_pool(pool_size: u16) -> ResolveOptions {
        ResolveOptions {
            pool_size,
            ..ResolveOptions::default()
        }
    }

    fn no_cancel() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    fn hostnames(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn work_queue_drains_in_order_then_yields_none() {
        let queue = WorkQueue::new(hostnames(&["a.example", "b.example"]));
        assert_eq!(queue.try_take(), Some("a.example".to_owned()));
        assert_eq!(queue.try_take(), Some("b.example".to_owned()));
        assert_eq!(queue.try_take(), None);
    }

    #[tokio::test]
    async fn run_batch_keys_equal_input_set() {
        let lookup = Arc::new(StaticLookup::new(&[
            ("a.example", &["10.0.0.1"]),
            ("b.example", &["10.0.0.2", "fd00::2"]),
            ("c.example", &["10.0.0.3"]),
        ]));
        let input = hostnames(&["a.example", "b.example", "c.example"]);

        let map = run_batch(input.clone(), lookup, &options_with_pool(4), no_cancel()).await;

        let keys: HashSet<&String> = map.keys().collect();
        let expected: HashSet<&String> = input.iter().collect();
        assert_eq!(keys, expected);
        assert_eq!(map["b.example"].len(), 2);
    }

    #[tokio::test]
    async fn run_batch_with_pool_of_one_matches_larger_pools() {
        let entries: &[(&str, &[&str])] = &[
            ("a.example", &["10.0.0.1"]),
            ("b.example", &["10.0.0.2"]),
            ("c.example", &[]),
        ];
        let input = hostnames(&["a.example", "b.example", "c.example"]);

        let serial = run_batch(
            input.clone(),
            Arc::new(StaticLookup::new(entries)),
            &options_with_pool(1),
            no_cancel(),
        )
        .await;
        let pooled = run_batch(
            input,
            Arc::new(StaticLookup::new(entries)),
            &options_with_pool(8),
            no_cancel(),
        )
        .await;

        assert_eq!(serial, pooled);
    }

    #[tokio::test]
    async fn unresolvable_hostname_yields_empty_list_not_missing_key() {
        let lookup = Arc::new(StaticLookup::new(&[("a.example", &["10.0.0.1"])]));

        let map = run_batch(
            hostnames(&["a.example", "b.example"]),
            lookup,
            &options_with_pool(2),
            no_cancel(),
        )
        .await;

        assert_eq!(
            map["a.example"],
            vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))]
        );
        assert!(map["b.example"].is_empty());
    }

    #[tokio::test]
    async fn empty_input_returns_empty_map_without_lookups() {
        let lookup = Arc::new(StaticLookup::new(&[]));

        let map = run_batch(Vec::new(), lookup.clone(), &options_with_pool(4), no_cancel()).await;

        assert!(map.is_empty());
        assert!(lookup.calls().is_empty());
    }

    #[tokio::test]
    async fn pool_larger_than_input_is_not_an_error() {
        let lookup = Arc::new(StaticLookup::new(&[("a.example", &["10.0.0.1"])]));

        let map = run_batch(
            hostnames(&["a.example"]),
            lookup,
            &options_with_pool(16),
            no_cancel(),
        )
        .await;

        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_hostnames_collapse_to_one_key() {
        let lookup = Arc::new(StaticLookup::new(&[("a.example", &["10.0.0.1"])]));

        let map = run_batch(
            hostnames(&["a.example", "a.example"]),
            lookup.clone(),
            &options_with_pool(1),
            no_cancel(),
        )
        .await;

        // Each queue occurrence is processed; the map holds one key.
        assert_eq!(lookup.calls().len(), 2);
        assert_eq!(map.len(), 1);
    }

    #[tokio::test]
    async fn run_batch_is_idempotent_against_a_stable_source() {
        let entries: &[(&str, &[&str])] = &[
            ("a.example", &["10.0.0.1", "10.0.0.2"]),
            ("b.example", &[]),
        ];
        let input = hostnames(&["a.example", "b.example"]);

        let first = run_batch(
            input.clone(),
            Arc::new(StaticLookup::new(entries)),
            &options_with_pool(4),
            no_cancel(),
        )
        .await;
        let second = run_batch(
            input,
            Arc::new(StaticLookup::new(entries)),
            &options_with_pool(4),
            no_cancel(),
        )
        .await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn cancelled_batch_claims_no_hostnames() {
        let lookup = Arc::new(StaticLookup::new(&[("a.example", &["10.0.0.1"])]));
        let cancel = Arc::new(AtomicBool::new(true));

        let map = run_batch(
            hostnames(&["a.example", "b.example"]),
            lookup.clone(),
            &options_with_pool(2),
            cancel,
        )
        .await;

        assert!(map.is_empty());
        assert!(lookup.calls().is_empty());
    }
}
