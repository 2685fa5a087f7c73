//! Routing agent benchmarks
//!
//! Measures the choose/learn hot path against a populated Q-table.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use qrouter_rl::{encode_state, RoutingAgent};

fn populated_agent(worker_count: usize, states: usize) -> RoutingAgent {
    let agent = RoutingAgent::new(0.5, 0.5, 0.1, worker_count);
    for i in 0..states {
        let lengths: Vec<usize> = (0..worker_count).map(|w| (i + w) % 11).collect();
        let key = encode_state(&lengths, 10, "bench");
        for w in 0..worker_count {
            agent.set_q(&key, w, (i * w) as f64 * 0.01);
        }
    }
    agent
}

fn benchmark_choose(c: &mut Criterion) {
    let agent = populated_agent(4, 256);
    let state = encode_state(&[1, 2, 3, 4], 10, "bench");
    let mask = vec![true; 4];

    c.bench_function("agent_choose", |b| {
        b.iter(|| black_box(agent.choose(black_box(&state), black_box(&mask))))
    });
}

fn benchmark_learn(c: &mut Criterion) {
    let agent = populated_agent(4, 256);
    let state = encode_state(&[1, 2, 3, 4], 10, "bench");
    let next_state = encode_state(&[2, 2, 3, 4], 10, "bench");

    c.bench_function("agent_learn", |b| {
        b.iter(|| agent.learn(black_box(&state), black_box(&next_state), 2, black_box(1.25)))
    });
}

fn benchmark_encode_state(c: &mut Criterion) {
    let lengths = [3usize, 0, 9, 10];

    c.bench_function("encode_state", |b| {
        b.iter(|| black_box(encode_state(black_box(&lengths), 10, black_box("bench"))))
    });
}

criterion_group!(benches, benchmark_choose, benchmark_learn, benchmark_encode_state);
criterion_main!(benches);
