// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
//! Randomized multi-producer/multi-consumer stress test. Exercises P1
//! (FIFO per-producer ordering) and P4 (conservation: everything offered is
//! eventually taken exactly once, nothing duplicated or lost).

use std::collections::HashSet;
use std::sync::Arc;

use qcore::Queue;
use rand::Rng;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_producers_many_consumers_conserve_every_value() {
    const PRODUCERS: u64 = 6;
    const PER_PRODUCER: u64 = 500;
    const CONSUMERS: u64 = 4;
    const TOTAL: u64 = PRODUCERS * PER_PRODUCER;
    const PER_CONSUMER: u64 = TOTAL / CONSUMERS;

    let q = Arc::new(Queue::<u64, ()>::bounded(16));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let q = q.clone();
            tokio::spawn(async move {
                for i in 0..PER_PRODUCER {
                    // Tag each value with its producer so we can check
                    // per-producer FIFO ordering (P1) after the fact.
                    let tagged = p << 32 | i;
                    if rand::rng().random_bool(0.3) {
                        q.offer_all(vec![tagged]).await.unwrap();
                    } else {
                        q.offer(tagged).await.unwrap();
                    }
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let q = q.clone();
            tokio::spawn(async move {
                let mut seen = Vec::with_capacity(PER_CONSUMER as usize);
                for _ in 0..PER_CONSUMER {
                    seen.push(q.take().await.unwrap());
                }
                seen
            })
        })
        .collect();

    for p in producers {
        p.await.unwrap();
    }

    let mut all = Vec::with_capacity(TOTAL as usize);
    for c in consumers {
        all.extend(c.await.unwrap());
    }

    assert_eq!(all.len() as u64, TOTAL);

    let mut unique = HashSet::new();
    for v in &all {
        assert!(unique.insert(*v), "value {v} observed more than once");
    }

    for p in 0..PRODUCERS {
        let observed: Vec<u64> = all.iter().copied().filter(|v| (v >> 32) == p).collect();
        let expected: Vec<u64> = (0..PER_PRODUCER).map(|i| p << 32 | i).collect();
        assert_eq!(observed, expected, "producer {p} was not observed in FIFO order");
    }
}
