use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mtg_assist::card::{ManaColor, ManaCost};
use mtg_assist::game::mana::{build_default_payment, build_payment_from_detail, PaymentDetail};
use mtg_assist::game::{GameSnapshot, ManaPool};
use mtg_assist::replacement::detect_conflicts;
use mtg_assist::targeting::Fingerprint;

fn benchmark_default_payment(c: &mut Criterion) {
    let cost = ManaCost {
        generic: 3,
        colored: [(ManaColor::Red, 2), (ManaColor::Green, 1)].into_iter().collect(),
        ..Default::default()
    };
    let mut pool = ManaPool::new();
    pool.add(ManaColor::Red, 3);
    pool.add(ManaColor::Green, 2);
    pool.add(ManaColor::Colorless, 2);

    c.bench_function("default_payment", |b| {
        b.iter(|| build_default_payment(black_box(&cost), black_box(&pool)))
    });
}

fn benchmark_payment_from_detail(c: &mut Criterion) {
    let cost = ManaCost {
        generic: 1,
        hybrids: vec![(ManaColor::White, ManaColor::Blue); 3],
        two_brids: vec![(2, ManaColor::Black)],
        phyrexian: vec![ManaColor::Green],
        ..Default::default()
    };
    let mut pool = ManaPool::new();
    pool.add(ManaColor::White, 2);
    pool.add(ManaColor::Blue, 2);
    pool.add(ManaColor::Colorless, 3);
    let detail = PaymentDetail {
        hybrid: vec![ManaColor::White, ManaColor::Blue, ManaColor::White],
        two_brid_pay_color: vec![false],
        phyrexian_pay_life: vec![true],
    };

    c.bench_function("payment_from_detail", |b| {
        b.iter(|| build_payment_from_detail(black_box(&cost), black_box(&pool), black_box(&detail)))
    });
}

fn benchmark_conflict_detection(c: &mut Criterion) {
    let combat = GameSnapshot::from_file("fixtures/combat_trample.json").expect("Failed to load snapshot");
    let stack = GameSnapshot::from_file("fixtures/stack_bolt.json").expect("Failed to load snapshot");

    c.bench_function("detect_conflicts_combat", |b| {
        b.iter(|| detect_conflicts(black_box(&combat)))
    });
    c.bench_function("detect_conflicts_stack", |b| {
        b.iter(|| detect_conflicts(black_box(&stack)))
    });
}

fn benchmark_fingerprint(c: &mut Criterion) {
    let snapshot = GameSnapshot::from_file("fixtures/stack_bolt.json").expect("Failed to load snapshot");

    c.bench_function("fingerprint_snapshot", |b| {
        b.iter(|| Fingerprint::of(black_box(&snapshot)))
    });
}

criterion_group!(
    benches,
    benchmark_default_payment,
    benchmark_payment_from_detail,
    benchmark_conflict_detection,
    benchmark_fingerprint
);
criterion_main!(benches);
