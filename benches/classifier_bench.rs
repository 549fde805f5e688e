use criterion::{black_box, criterion_group, criterion_main, Criterion};
use splitsync::config::SyncConfig;
use splitsync::cookies::memory::MemoryCookieStore;
use splitsync::cookies::record::CookieRecord;
use splitsync::sync::classifier::CookieClassifier;
use splitsync::sync::domains::DomainSet;
use splitsync::sync::patterns::default_important_patterns;
use splitsync::sync::SyncOrchestrator;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

fn mixed_cookies(n: usize) -> Vec<CookieRecord> {
    let now = OffsetDateTime::now_utc();
    (0..n)
        .map(|i| {
            let name = match i % 4 {
                0 => format!("sessionid{}", i),
                1 => format!("_pref{}", i),
                2 => format!("ui_theme{}", i),
                _ => format!("lang{}", i),
            };
            CookieRecord::new(name, "value", "example.com")
                .with_expiration(now + Duration::days((i % 60) as i64))
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let classifier = CookieClassifier::new(default_important_patterns(), Duration::hours(24));
    let cookies = mixed_cookies(200);
    let now = OffsetDateTime::now_utc();

    c.bench_function("classify_200_cookies", |b| {
        b.iter(|| black_box(classifier.classify_at(black_box(&cookies), now)))
    });
}

fn bench_domain_set(c: &mut Criterion) {
    let subs = SyncConfig::default().common_subdomains;

    c.bench_function("derive_domain_set", |b| {
        b.iter(|| {
            black_box(DomainSet::derive(
                black_box("www.shop.example.co.uk"),
                black_box("news.example.org"),
                &subs,
            ))
        })
    });
}

fn bench_advanced_sync(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let store = Arc::new(MemoryCookieStore::new());
    for cookie in mixed_cookies(100) {
        store.set_record(cookie);
    }
    let orchestrator = SyncOrchestrator::new(store, &SyncConfig::default());

    c.bench_function("advanced_sync_100_cookies", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(
                orchestrator
                    .advanced_sync("example.com", "https://app.example.com/", "example.com")
                    .await,
            )
        })
    });
}

criterion_group!(benches, bench_classify, bench_domain_set, bench_advanced_sync);
criterion_main!(benches);
