//! Benchmarks for branch execution.

use branchline::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::sync::Arc;

fn build_runner() -> Runner {
    let pipeline = Pipeline::builder("bench")
        .stage(Arc::new(FnStage::new("seed", |item: &Item| {
            let urls: Vec<String> = (0..16).map(|i| format!("item-{i}")).collect();
            Ok(vec![item.derive(json!(urls), "seed")])
        })))
        .stage(Arc::new(SplitStage::new("split")))
        .stage(Arc::new(FnStage::new("upper", |item: &Item| {
            let value = item.payload().as_str().unwrap_or_default().to_uppercase();
            Ok(vec![item.derive(json!(value), "upper")])
        })))
        .build()
        .expect("valid pipeline");

    Runner::builder()
        .pipeline(pipeline)
        .expect("register")
        .build()
}

fn pipeline_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("runtime");

    c.bench_function("split_16_branches", |b| {
        b.iter(|| {
            rt.block_on(async {
                let runner = build_runner();
                runner.submit("bench", json!(null)).expect("submit");
                runner.await_all().await.len()
            })
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
