use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Weekday};
use ulid::Ulid;

use rota::calendar::{day_start_ms, slot_span};
use rota::clock::SystemClock;
use rota::directory::Directory;
use rota::engine::Scheduler;
use rota::model::{NewAppointment, SessionId, Therapist, WorkingHours};
use rota::persist::MemoryPort;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
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
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

fn all_week() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}

fn build_directory(clinic_id: Ulid, n_therapists: usize) -> (Arc<Directory>, Vec<Ulid>) {
    let mut therapists = Vec::with_capacity(n_therapists);
    let mut ids = Vec::with_capacity(n_therapists);
    for i in 0..n_therapists {
        let id = Ulid::new();
        ids.push(id);
        therapists.push(Therapist {
            id,
            name: format!("T{i}"),
            role: "physio".into(),
            clinic_id,
            working_hours: WorkingHours {
                start_min: 0,
                end_min: 1440,
                active_weekdays: all_week(),
            },
        });
    }
    (Arc::new(Directory::load(therapists, vec![])), ids)
}

async fn fresh_scheduler(directory: Arc<Directory>) -> (Arc<MemoryPort>, Scheduler) {
    let port = Arc::new(MemoryPort::new());
    let scheduler = Scheduler::with_session(
        port.clone(),
        directory,
        Arc::new(SystemClock),
        SessionId::generate(),
    )
    .await
    .unwrap();
    (port, scheduler)
}

fn request(clinic_id: Ulid, therapist_id: Ulid, date: NaiveDate, hour: u32) -> NewAppointment {
    NewAppointment {
        clinic_id,
        therapist_id,
        subject: "Patient".into(),
        span: slot_span(date, hour * 60, (hour + 1) * 60),
        kind: "session".into(),
        mode: "in-person".into(),
    }
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
}

async fn phase1_sequential_creates(clinic_id: Ulid, directory: Arc<Directory>, therapist: Ulid) {
    let (_port, scheduler) = fresh_scheduler(directory).await;

    let n = 2000;
    let mut latencies = Vec::with_capacity(n);
    let started = Instant::now();

    // 24 one-hour bookings per day, day after day, no conflicts
    for i in 0..n {
        let date = start_date() + ChronoDuration::days((i / 24) as i64);
        let hour = (i % 24) as u32;
        let t = Instant::now();
        scheduler
            .create_appointment(request(clinic_id, therapist, date, hour))
            .await
            .unwrap();
        latencies.push(t.elapsed());
    }

    let elapsed = started.elapsed();
    let ops = n as f64 / elapsed.as_secs_f64();
    println!("  {n} creates in {:.2}s = {ops:.0} ops/sec", elapsed.as_secs_f64());
    print_latency("create latency", &mut latencies);
}

async fn phase2_contended_creates(clinic_id: Ulid, directory: Arc<Directory>, therapists: &[Ulid]) {
    // One store, many sessions, each hammering its own therapist timeline
    let port = Arc::new(MemoryPort::new());
    let n_tasks = therapists.len();
    let n_per_task = 200;

    // Seed the blob before the sessions race to connect
    drop(
        Scheduler::with_session(
            port.clone(),
            directory.clone(),
            Arc::new(SystemClock),
            SessionId::generate(),
        )
        .await
        .unwrap(),
    );

    let started = Instant::now();
    let mut handles = Vec::new();
    for &therapist in therapists {
        let port = port.clone();
        let directory = directory.clone();
        handles.push(tokio::spawn(async move {
            let scheduler = Scheduler::with_session(
                port,
                directory,
                Arc::new(SystemClock),
                SessionId::generate(),
            )
            .await
            .unwrap();
            for i in 0..n_per_task {
                let date = start_date() + ChronoDuration::days((i / 24) as i64);
                let hour = (i % 24) as u32;
                scheduler
                    .create_appointment(request(clinic_id, therapist, date, hour))
                    .await
                    .unwrap();
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let elapsed = started.elapsed();
    let total = n_tasks * n_per_task;
    let ops = total as f64 / elapsed.as_secs_f64();
    println!(
        "  {n_tasks} sessions x {n_per_task} creates = {total} total in {:.2}s = {ops:.0} ops/sec",
        elapsed.as_secs_f64()
    );
}

async fn phase3_snapshots_under_write_load(
    clinic_id: Ulid,
    directory: Arc<Directory>,
    therapists: &[Ulid],
) {
    let port = Arc::new(MemoryPort::new());
    let writer_therapist = therapists[0];

    // Pre-fill a week
    let seed = Scheduler::with_session(
        port.clone(),
        directory.clone(),
        Arc::new(SystemClock),
        SessionId::generate(),
    )
    .await
    .unwrap();
    for i in 0..168 {
        let date = start_date() + ChronoDuration::days((i / 24) as i64);
        seed.create_appointment(request(clinic_id, therapists[1], date, (i % 24) as u32))
            .await
            .unwrap();
    }

    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let writer = {
        let port = port.clone();
        let directory = directory.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            let scheduler = Scheduler::with_session(
                port,
                directory,
                Arc::new(SystemClock),
                SessionId::generate(),
            )
            .await
            .unwrap();
            let mut i = 0usize;
            while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                let date = start_date() + ChronoDuration::days((i / 24) as i64 + 30);
                let _ = scheduler
                    .create_appointment(request(clinic_id, writer_therapist, date, (i % 24) as u32))
                    .await;
                i += 1;
            }
        })
    };

    let n_readers = 8;
    let reads_per_reader = 500;
    let week_start = day_start_ms(start_date());
    let week_end = week_start + 7 * 24 * 3_600_000;

    let mut reader_handles = Vec::new();
    for _ in 0..n_readers {
        let port = port.clone();
        let directory = directory.clone();
        reader_handles.push(tokio::spawn(async move {
            let scheduler = Scheduler::with_session(
                port,
                directory,
                Arc::new(SystemClock),
                SessionId::generate(),
            )
            .await
            .unwrap();
            let mut latencies = Vec::with_capacity(reads_per_reader);
            for _ in 0..reads_per_reader {
                let t = Instant::now();
                let snap = scheduler.fetch_snapshot(week_start, week_end).await.unwrap();
                assert!(snap.appointments.len() >= 168);
                latencies.push(t.elapsed());
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for h in reader_handles {
        all_latencies.extend(h.await.unwrap());
    }

    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    let _ = writer.await;

    print_latency("week snapshot", &mut all_latencies);
}

#[tokio::main]
async fn main() {
    let clinic_id = Ulid::new();
    let (directory, therapists) = build_directory(clinic_id, 10);

    println!("=== rota stress benchmark ===");
    println!(
        "{} therapists, week starting {} ({})\n",
        therapists.len(),
        start_date(),
        start_date().weekday()
    );

    println!("[phase 1] sequential create throughput");
    phase1_sequential_creates(clinic_id, directory.clone(), therapists[0]).await;

    println!("\n[phase 2] contended create throughput");
    phase2_contended_creates(clinic_id, directory.clone(), &therapists).await;

    println!("\n[phase 3] snapshot latency under write load");
    phase3_snapshots_under_write_load(clinic_id, directory, &therapists).await;

    println!("\n=== benchmark complete ===");
}
