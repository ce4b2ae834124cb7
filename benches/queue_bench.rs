// Benchmark for queue filtering, view computation and admission
// Run with: cargo bench

use std::sync::Arc;

use chrono::{Duration, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use print_queue::catalog::{InMemoryPartCatalog, Part};
use print_queue::config::QueueConfig;
use print_queue::print_job::PrintJobManager;
use print_queue::query::{self, JobFilter, QueueView};
use print_queue::store::StoreSnapshot;
use queue_shared::{Job, JobId, JobStatus, NewJob};

fn sample_jobs(count: u64) -> Vec<Job> {
    let now = Utc::now();
    (1..=count)
        .map(|i| Job {
            id: JobId(i),
            part_id: format!("PART-{:03}", i % 4 + 1),
            operator_id: format!("OP-{:03}", i % 25),
            status: JobStatus::ALL[(i % 5) as usize],
            start_time: Some(now - Duration::minutes(30)),
            estimated_completion: Some(now + Duration::minutes(30)),
            created_at: now,
            updated_at: now,
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let jobs = sample_jobs(10_000);
    let filter = JobFilter::all().with_status(JobStatus::Printing).with_operator("OP-006");
    c.bench_function("filter 10k jobs by status and operator", |b| {
        b.iter(|| {
            let matched = query::list_jobs(&jobs, &filter);
            assert!(!matched.is_empty());
        });
    });
}

fn bench_view(c: &mut Criterion) {
    let snapshot = StoreSnapshot {
        revision: 1,
        jobs: sample_jobs(10_000),
    };
    let settings = QueueConfig::default();
    let filter = JobFilter::all().with_status(JobStatus::Printing);
    c.bench_function("compute view over 10k jobs", |b| {
        b.iter(|| {
            let view = QueueView::compute(&snapshot, &filter, &settings, Utc::now());
            assert_eq!(view.jobs.len(), 2_000);
        });
    });
}

fn bench_admission(c: &mut Criterion) {
    let catalog = Arc::new(InMemoryPartCatalog::new([Part::new("PART-001", "Frame")]));
    let rt = tokio::runtime::Runtime::new().unwrap();
    c.bench_function("admit 1000 jobs", |b| {
        b.iter(|| {
            rt.block_on(async {
                let manager = PrintJobManager::new(catalog.clone(), QueueConfig::with_capacity(1_000));
                for _ in 0..1_000 {
                    manager.create_job(NewJob::new("PART-001", "OP-001")).await.unwrap();
                }
                assert_eq!(manager.active_count().await, 1_000);
            });
        });
    });
}

criterion_group!(benches, bench_filter, bench_view, bench_admission);
criterion_main!(benches);
