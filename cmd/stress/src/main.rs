//! Stress test - many producers, scheduled jobs, revocations
//!
//! Floods the pool from several producer threads, schedules a batch of
//! delayed jobs and revokes half of them, then prints the counters.

use jobpool::{Dispatch, Job, PoolConfig, WorkerPool};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Tick(Arc<AtomicU64>);

impl Dispatch for Tick {
    fn dispatch(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() {
    println!("=== jobpool Stress Test ===\n");

    let num_jobs: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100_000);
    let num_producers: usize = 4;

    let mut config = PoolConfig::from_env();
    if config.threads < 3 {
        // Need at least one minion to drain the flood.
        config.threads = 3;
    }
    println!(
        "Pool: {} slots ({} minions), {} jobs from {} producers",
        config.threads,
        config.threads - 2,
        num_jobs,
        num_producers
    );

    let pool = WorkerPool::new(config).expect("pool construction failed");
    pool.run().expect("pool start failed");

    let executed = Arc::new(AtomicU64::new(0));
    let start = Instant::now();

    // Flood from several producers.
    let producers: Vec<_> = (0..num_producers)
        .map(|_| {
            let pool = pool.clone();
            let executed = executed.clone();
            let batch = num_jobs / num_producers;
            std::thread::spawn(move || {
                for _ in 0..batch {
                    pool.submit(Job::new(Arc::new(Tick(executed.clone()))));
                }
            })
        })
        .collect();

    // A batch of delayed jobs; revoke every second one before it fires.
    let scheduled: Vec<_> = (0..100)
        .map(|i| {
            let job = Job::new(Arc::new(Tick(executed.clone())));
            pool.schedule(Instant::now() + Duration::from_millis(50 + i), job.clone());
            job
        })
        .collect();
    let mut revoked = 0;
    for job in scheduled.iter().step_by(2) {
        if pool.revoke(job, Some(Duration::ZERO)).is_ok() {
            revoked += 1;
        }
    }

    for producer in producers {
        producer.join().unwrap();
    }
    let submit_time = start.elapsed();

    // Wait for quiescence.
    let deadline = Instant::now() + Duration::from_secs(30);
    loop {
        let snapshot = pool.snapshot();
        if snapshot.pending == 0 && snapshot.occupation == 0 {
            break;
        }
        if Instant::now() > deadline {
            println!("Timeout! snapshot: {:?}", snapshot);
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    // Let in-flight dispatches land before reading the counters.
    std::thread::sleep(Duration::from_millis(50));

    let total_time = start.elapsed();
    let snapshot = pool.snapshot();
    let timer = pool.timer_stats();

    println!("\n=== Results ===");
    println!("Executed:        {}", executed.load(Ordering::Relaxed));
    println!("Submit time:     {:?}", submit_time);
    println!("Total time:      {:?}", total_time);
    println!(
        "Throughput:      {:.0} jobs/sec",
        num_jobs as f64 / total_time.as_secs_f64()
    );
    println!("Timer:           {:?}", timer);
    println!("Revoked:         {}", revoked);
    for (slot, count) in snapshot.per_slot.iter().enumerate() {
        println!("Slot {:>2}:         {} dispatched", slot, count);
    }

    pool.stop().expect("pool stop failed");
    println!("\n=== Stress Test Complete ===");
}
