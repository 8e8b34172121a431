//! Benchmarks for marionette core operations.
//!
//! Run with: cargo bench
//!
//! Results include 95% confidence intervals via Criterion.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use marionette::core::catalog::Catalog;
use marionette::core::config::{canonicalize, deep_merge, Configuration};
use marionette::core::definition::ManifestDefinition;
use marionette::core::manifest::Manifest;
use marionette::core::manifest_file::parse_manifest;
use marionette::core::types::params;
use marionette::realizer::Plan;
use serde_yaml_ng::Value;

fn filled_catalog(size: usize) -> Catalog {
    let mut catalog = Catalog::new();
    for i in 0..size {
        catalog.upsert("file", &format!("/etc/app/{i}.conf"), params([("mode", "0644")]));
    }
    catalog
}

fn bench_catalog_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_upsert");
    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| black_box(filled_catalog(size)));
        });
    }
    group.finish();
}

fn bench_config_deep_merge(c: &mut Criterion) {
    let nested: Value = serde_yaml_ng::from_str(
        "{server: {port: 80, tls: {enabled: true, protocols: [tlsv1.2, tlsv1.3]}}, workers: 4}",
    )
    .unwrap();
    let overlay: Value =
        serde_yaml_ng::from_str("{server: {tls: {enabled: false}}, workers: 8}").unwrap();

    let mut group = c.benchmark_group("config_deep_merge");
    for width in [1, 16, 128] {
        let base: Configuration = canonicalize((0..width).map(|i| (format!("svc{i}"), nested.clone())));
        let over: Configuration = canonicalize((0..width).map(|i| (format!(":svc{i}"), overlay.clone())));
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let mut merged = base.clone();
                deep_merge(&mut merged, black_box(over.clone()));
                black_box(merged)
            });
        });
    }
    group.finish();
}

fn bench_plan_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_fingerprint");
    for size in [10, 100, 1000] {
        let catalog = filled_catalog(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, catalog| {
            b.iter(|| black_box(Plan::from_catalog("bench", black_box(catalog))));
        });
    }
    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let def = ManifestDefinition::builder("bench")
        .handler("files", |m, _| {
            for i in 0..100 {
                m.declare("file", format!("/srv/{i}"), params([("ensure", "present")]))?;
            }
            Ok(())
        })
        .recipe("files")
        .build();

    c.bench_function("execute_100_resources", |b| {
        b.iter(|| {
            let mut m = Manifest::new(def.clone());
            black_box(m.execute(false))
        });
    });
}

fn bench_parse_manifest(c: &mut Criterion) {
    let yaml = r#"
name: web
configuration:
  nginx: {port: 8080}
recipes: [nginx]
definitions:
  nginx:
    - kind: package
      identity: nginx
      params: {ensure: installed}
    - kind: file
      identity: /etc/nginx/conf.d/port
      params: {content: "listen {{options.port}};"}
    - kind: service
      identity: nginx
      params: {ensure: running, require: Package[nginx]}
"#;
    c.bench_function("parse_manifest", |b| {
        b.iter(|| black_box(parse_manifest(black_box(yaml)).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_catalog_upsert,
    bench_config_deep_merge,
    bench_plan_fingerprint,
    bench_execute,
    bench_parse_manifest
);
criterion_main!(benches);
