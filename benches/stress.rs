use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};

use roombook::clock::{FixedClock, SystemClock};
use roombook::scheduler::{BookingPolicy, Scheduler, SchedulerError};
use roombook::store::RoomStore;

/// Wide enough that every phase fits its one-day stays inside the horizon.
const POLICY: BookingPolicy = BookingPolicy {
    max_stay_nights: 3,
    horizon_days: 1_000_000,
};

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        println!("  {label}: no samples");
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.2}ms, p50={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn day(offset: u64) -> Option<NaiveDate> {
    today().checked_add_days(Days::new(offset))
}

fn bench_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("roombook_bench");
    std::fs::create_dir_all(&dir).expect("create bench dir");
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

async fn scheduler(wal: Option<&str>) -> (Arc<RoomStore>, Arc<Scheduler>) {
    let store = match wal {
        Some(name) => RoomStore::open(&bench_wal_path(name), 1000).expect("open store"),
        None => RoomStore::in_memory(),
    };
    let store = Arc::new(store);
    store.create_room("Room 1", 4).await.expect("create room");
    let scheduler = Scheduler::new(store.clone(), Arc::new(SystemClock)).with_policy(POLICY);
    (store, Arc::new(scheduler))
}

async fn phase1_sequential(wal: Option<&str>) {
    let (_, s) = scheduler(wal).await;

    // Every other day, so consecutive stays never touch.
    let n = 2000u64;
    let mut create = Vec::with_capacity(n as usize);
    let mut cancel = Vec::with_capacity(n as usize);
    let start = Instant::now();

    for i in 0..n {
        let t = Instant::now();
        let r = s
            .create_reservation("Bench", day(i * 2), day(i * 2))
            .await
            .expect("create");
        create.push(t.elapsed());

        if i % 2 == 0 {
            let t = Instant::now();
            s.cancel_reservation(r.number).await.expect("cancel");
            cancel.push(t.elapsed());
        }
    }

    let elapsed = start.elapsed();
    let ops = (create.len() + cancel.len()) as f64 / elapsed.as_secs_f64();
    println!(
        "  {n} creates, {} cancels in {:.2}s = {ops:.0} ops/sec",
        cancel.len(),
        elapsed.as_secs_f64()
    );
    print_latency("create latency", &mut create);
    print_latency("cancel latency", &mut cancel);
}

async fn phase2_contended(wal: Option<&str>) {
    let (store, s) = scheduler(wal).await;
    let n_tasks = 32;
    let rounds = 50u64;
    let winners = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    let start = Instant::now();

    for _ in 0..n_tasks {
        let s = s.clone();
        let winners = winners.clone();
        handles.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(rounds as usize);
            for round in 0..rounds {
                // All tasks fight over the same three days each round.
                let t = Instant::now();
                match s
                    .create_reservation("Bench", day(round * 4), day(round * 4 + 2))
                    .await
                {
                    Ok(_) => {
                        winners.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(SchedulerError::RoomUnavailable) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all = Vec::new();
    for h in handles {
        all.extend(h.await.expect("task panicked"));
    }

    let elapsed = start.elapsed();
    let won = winners.load(Ordering::Relaxed);
    println!(
        "  {n_tasks} tasks x {rounds} rounds in {:.2}s: {won} winners (expected {rounds}), {} stored",
        elapsed.as_secs_f64(),
        store.reservation_count()
    );
    assert_eq!(won as u64, rounds, "double booking detected");
    print_latency("contended create", &mut all);
}

async fn phase3_read_under_load() {
    let (_, s) = scheduler(None).await;
    for i in 0..200u64 {
        s.create_reservation("Seed", day(i * 2), day(i * 2))
            .await
            .expect("seed");
    }

    // Writers churn far-future days; readers probe the seeded range.
    let stop = Arc::new(AtomicBool::new(false));
    let mut writer_handles = Vec::new();
    for w in 0..4u64 {
        let s = s.clone();
        let stop = stop.clone();
        writer_handles.push(tokio::spawn(async move {
            let mut i = 0u64;
            while !stop.load(Ordering::Relaxed) {
                let offset = 10_000 + w * 100_000 + (i % 1000) * 2;
                if let Ok(r) = s.create_reservation("Writer", day(offset), day(offset)).await {
                    let _ = s.cancel_reservation(r.number).await;
                }
                i += 1;
            }
        }));
    }

    let n_readers = 8;
    let reads_per_reader = 500u64;
    let mut reader_handles = Vec::new();
    for _ in 0..n_readers {
        let s = s.clone();
        reader_handles.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(reads_per_reader as usize);
            for i in 0..reads_per_reader {
                let t = Instant::now();
                let offset = (i % 400) + 1;
                let _ = s.check_availability(day(offset), day(offset + 1)).await;
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all = Vec::new();
    for h in reader_handles {
        all.extend(h.await.expect("reader panicked"));
    }
    stop.store(true, Ordering::Relaxed);
    for h in writer_handles {
        let _ = h.await;
    }

    print_latency("availability query", &mut all);
}

async fn phase4_fixed_clock_validation() {
    // Pure rule evaluation: past dates bounce before touching the store.
    let store = Arc::new(RoomStore::in_memory());
    store.create_room("Room 1", 4).await.expect("create room");
    let clock = Arc::new(FixedClock::on(today()));
    let s = Scheduler::new(store, clock);

    let n = 10_000;
    let mut latencies = Vec::with_capacity(n);
    for _ in 0..n {
        let past = today().checked_sub_days(Days::new(5));
        let t = Instant::now();
        let _ = s.create_reservation("Bench", past, past).await;
        latencies.push(t.elapsed());
    }
    print_latency("rejected create", &mut latencies);
}

#[tokio::main]
async fn main() {
    println!("=== roombook stress benchmark ===\n");

    println!("[phase 1a] sequential create/cancel, in memory");
    phase1_sequential(None).await;

    println!("\n[phase 1b] sequential create/cancel, with WAL");
    phase1_sequential(Some("phase1.wal")).await;

    println!("\n[phase 2] contended creates on one range, with WAL");
    phase2_contended(Some("phase2.wal")).await;

    println!("\n[phase 3] read latency under write load");
    phase3_read_under_load().await;

    println!("\n[phase 4] rejected creates");
    phase4_fixed_clock_validation().await;

    println!("\n=== done ===");
}
