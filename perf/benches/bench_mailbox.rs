use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lattice_events::PeerUpdate;
use lattice_mailbox::{Inbox, Outbox, PeerId};
use lattice_perf::{make_test_update, temp_region_path};

fn bench_publish(c: &mut Criterion) {
    let path = temp_region_path("crit_pub");
    let mut outbox = Outbox::<PeerUpdate>::create(&path).expect("failed to create outbox");
    let update = make_test_update();

    let mut group = c.benchmark_group("mailbox");
    group.throughput(Throughput::Elements(1));

    group.bench_function("publish", |b| {
        b.iter(|| outbox.publish(black_box(update)).unwrap());
    });

    drop(group);
    drop(outbox);
    let _ = std::fs::remove_file(&path);
}

fn bench_lock_unlock(c: &mut Criterion) {
    let path = temp_region_path("crit_lock");
    let mut outbox = Outbox::<PeerUpdate>::create(&path).expect("failed to create outbox");
    outbox.publish(make_test_update()).unwrap();

    let mut inbox =
        Inbox::<PeerUpdate>::try_attach(&path, PeerId::new(1).unwrap(), PeerId::new(0).unwrap())
            .expect("failed to attach inbox");

    let mut group = c.benchmark_group("mailbox");
    group.throughput(Throughput::Elements(1));

    group.bench_function("lock_unlock", |b| {
        b.iter(|| {
            black_box(inbox.lock().unwrap().val);
            inbox.unlock().unwrap();
        });
    });

    drop(group);
    drop(outbox);
    let _ = std::fs::remove_file(&path);
}

fn bench_round_trip(c: &mut Criterion) {
    let path = temp_region_path("crit_rt");
    let mut outbox = Outbox::<PeerUpdate>::create(&path).expect("failed to create outbox");
    let mut inbox =
        Inbox::<PeerUpdate>::try_attach(&path, PeerId::new(1).unwrap(), PeerId::new(0).unwrap())
            .expect("failed to attach inbox");
    let update = make_test_update();

    let mut group = c.benchmark_group("mailbox");
    group.throughput(Throughput::Elements(1));

    group.bench_function("round_trip", |b| {
        b.iter(|| {
            outbox.publish(black_box(update)).unwrap();
            black_box(inbox.lock().unwrap().val);
            inbox.unlock().unwrap();
        });
    });

    drop(group);
    drop(outbox);
    let _ = std::fs::remove_file(&path);
}

fn bench_has_message(c: &mut Criterion) {
    let path = temp_region_path("crit_empty");
    let mut outbox = Outbox::<PeerUpdate>::create(&path).expect("failed to create outbox");
    let inbox =
        Inbox::<PeerUpdate>::try_attach(&path, PeerId::new(1).unwrap(), PeerId::new(0).unwrap())
            .expect("failed to attach inbox");

    let mut group = c.benchmark_group("mailbox");
    group.throughput(Throughput::Elements(1));

    group.bench_function("has_message (empty)", |b| {
        b.iter(|| black_box(inbox.has_message()));
    });

    outbox.publish(make_test_update()).unwrap();
    group.bench_function("has_message (published)", |b| {
        b.iter(|| black_box(inbox.has_message()));
    });

    drop(group);
    drop(outbox);
    drop(inbox);
    let _ = std::fs::remove_file(&path);
}

criterion_group!(
    benches,
    bench_publish,
    bench_lock_unlock,
    bench_round_trip,
    bench_has_message,
);
criterion_main!(benches);
