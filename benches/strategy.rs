use criterion::{black_box, criterion_group, criterion_main, Criterion};
use poseidon_guard::core::{
    EngineError, Face, ForwardingEngine, ManualClock, Name, PoseidonStrategy, Reply, Request, RequestReport,
};
use poseidon_guard::models::StrategyConfig;

/// Engine that accepts everything and keeps no table
struct NullEngine {
    upstream: Face,
}

impl ForwardingEngine for NullEngine {
    fn add_face(&mut self, _face: &Face) {}

    fn max_table_size(&self) -> u32 {
        1_000
    }

    fn table_size(&self) -> u32 {
        0
    }

    fn process_request(&mut self, _in_face: &Face, _request: &Request) -> RequestReport {
        RequestReport {
            pending_created: true,
            forwarded_to: vec![self.upstream.clone()],
        }
    }

    fn pending_faces(&self, _name: &Name) -> Vec<Face> {
        Vec::new()
    }

    fn process_reply(&mut self, _in_face: &Face, _reply: &Reply) {}

    fn send_reply(&mut self, _face: &Face, _reply: Reply) -> Result<(), EngineError> {
        Ok(())
    }
}

fn strategy_benchmark(c: &mut Criterion) {
    let upstream = Face::network("upstream");
    let consumer = Face::network("consumer");
    let config = StrategyConfig { distributed: true, ..Default::default() };
    let mut strategy = PoseidonStrategy::new(NullEngine { upstream: upstream.clone() }, ManualClock::new(), config)
        .expect("valid configuration");
    strategy.on_face_added(&upstream).expect("fresh face");
    strategy.on_face_added(&consumer).expect("fresh face");

    let request = Request::new("/wiki/Main_Page", 1);
    c.bench_function("request_received_normal", |b| {
        // no replies ever arrive, so the satisfaction ratio stays at zero
        b.iter(|| strategy.on_request_received(black_box(&consumer), black_box(&request)))
    });

    let reply = Reply::new("/wiki/Main_Page", vec![0; 1024]);
    c.bench_function("reply_received_ordinary", |b| {
        b.iter(|| strategy.on_reply_received(black_box(&upstream), black_box(&reply)))
    });
}

criterion_group!(benches, strategy_benchmark);
criterion_main!(benches);
