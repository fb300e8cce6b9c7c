//! Benchmarks for snapshot capture, restore and a full injected request.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use futures::executor::block_on;
use recourier::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn options() -> Arc<RecourierOptions> {
    Arc::new(
        RecourierOptions::new()
            .with_properties([RequestField::Params, RequestField::Query, RequestField::Payload]),
    )
}

fn request() -> Request {
    let mut request =
        Request::new("POST", "/items/42?sort=asc&tag=a&tag=b").with_payload(json!({"name": "x"}));
    request.params = json!({"id": "42"});
    request
}

fn snapshot_benchmark(c: &mut Criterion) {
    let sink: Arc<dyn EventSink> = Arc::new(NoOpEventSink);
    let capture = CaptureStage::new(options(), sink.clone());
    let restore = RestoreStage::new(options(), sink);

    c.bench_function("capture", |b| {
        b.iter_batched(
            request,
            |mut request| black_box(capture.capture(&mut request)),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("capture_and_restore", |b| {
        b.iter_batched(
            request,
            |mut request| {
                let _ = capture.capture(&mut request);
                request.params = json!({"id": "43"});
                black_box(restore.restore(&mut request))
            },
            BatchSize::SmallInput,
        );
    });
}

fn inject_benchmark(c: &mut Criterion) {
    let mut server = Server::new().with_event_sink(Arc::new(NoOpEventSink));
    let _ = server.register(
        &Recourier::new().with_event_sink(Arc::new(NoOpEventSink)),
        json!({"properties": ["params", "query", "payload"]}),
    );
    let _ = server.route("*", "/items/{id}", recourier::testing::echo_handler());

    c.bench_function("inject", |b| {
        b.iter(|| {
            black_box(block_on(server.inject(InjectOptions::post(
                "/items/42?sort=asc",
                json!({"name": "x"}),
            ))))
        });
    });
}

criterion_group!(benches, snapshot_benchmark, inject_benchmark);
criterion_main!(benches);
