//! # Chat Engine Benchmarks
//!
//! | Path | Work per iteration |
//! |------|--------------------|
//! | fan-out | one `recv` waking N parked subscribers |
//! | replay | one `attach_poller` replaying a full history |
//! | standard pipeline | one `recv` through every standard plugin |

use chat_engine::{ChatApi, ChatConfig, ChatService, DeliverySink, SinkError};
use chat_plugins::{standard_set, NoAuth};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_bus::Dispatcher;
use shared_types::{Args, ManualTimeSource, Message, UserIdentity};
use std::sync::Arc;
use std::time::Duration;

const START: u64 = 50_000_000;

fn open_chat(capacity: usize, standard: bool) -> ChatService {
    let clock = Arc::new(ManualTimeSource::new(START));
    let dispatcher = Arc::new(Dispatcher::new());
    if standard {
        for plugin in standard_set(clock.clone()) {
            dispatcher.attach_plugin(plugin);
        }
    } else {
        dispatcher.attach_plugin(Arc::new(NoAuth));
    }
    let config = ChatConfig {
        history_capacity: capacity,
        ..ChatConfig::default()
    };
    let service = ChatService::with_time_source(config, dispatcher, clock).unwrap();
    service.init().unwrap();
    service
}

fn discard() -> Arc<dyn DeliverySink> {
    Arc::new(|batch: Vec<Message>| {
        black_box(batch);
        Ok::<(), SinkError>(())
    })
}

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan-out");
    group.measurement_time(Duration::from_secs(5));

    for subscribers in [10, 100, 1_000] {
        let service = open_chat(20, false);
        group.throughput(Throughput::Elements(subscribers as u64));
        group.bench_with_input(
            BenchmarkId::new("recv_wakes_all", subscribers),
            &subscribers,
            |b, &n| {
                b.iter(|| {
                    // Cursor at the newest message: nothing to replay.
                    let cursor = service.history_snapshot().last().map(|m| m.id);
                    for i in 0..n {
                        let reader = Some(UserIdentity::guest(format!("reader-{i}")));
                        service.attach_poller(reader, discard(), cursor).unwrap();
                    }
                    black_box(service.recv("ping", None, Args::new()).unwrap())
                })
            },
        );
    }
    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");

    for capacity in [20, 200, 2_000] {
        let service = open_chat(capacity, false);
        for n in 0..capacity {
            service
                .recv(&format!("message {n}"), None, Args::new())
                .unwrap();
        }
        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("initial_sync", capacity),
            &capacity,
            |b, _| {
                b.iter(|| {
                    black_box(
                        service
                            .attach_poller(Some(UserIdentity::guest("bob")), discard(), None)
                            .unwrap(),
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_standard_pipeline(c: &mut Criterion) {
    let service = open_chat(20, true);
    let mut rng = rand::thread_rng();
    let texts = ["hello", "/me waves", ">bob: psst", "<b>bold</b>", "/whoami"];

    c.bench_function("standard_pipeline_recv", |b| {
        b.iter(|| {
            // Rotate senders so flood control stays out of the way.
            let sender = format!("user-{}", rng.gen_range(0..10_000));
            let text = texts[rng.gen_range(0..texts.len())];
            black_box(
                service
                    .recv(text, Some(UserIdentity::guest(sender)), Args::new())
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_fan_out,
    bench_replay,
    bench_standard_pipeline,
);

criterion_main!(benches);
