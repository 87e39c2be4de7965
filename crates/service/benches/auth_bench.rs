use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

use serde_json::json;
use service::auth::{AuthenticatedUser, IdentityClaim, OwnershipPolicy, TokenConfig, TokenService};
use service::services::BookingService;
use service::store::InMemoryDocumentStore;

fn bench_token(c: &mut Criterion) {
    let svc = TokenService::new(TokenConfig::new("bench-secret", 3600)).unwrap();
    let claim = IdentityClaim::new("bench@example.com").unwrap();
    let token = svc.issue(&claim).unwrap().token;

    c.bench_function("token_issue", |b| b.iter(|| svc.issue(&claim).unwrap()));
    c.bench_function("token_verify", |b| b.iter(|| svc.verify(&token).unwrap()));
}

fn bench_owned_listing(c: &mut Criterion) {
    let bookings = BookingService::new(Arc::new(InMemoryDocumentStore::new()));
    tokio_test::block_on(async {
        for i in 0..500 {
            let email = format!("user{}@example.com", i % 20);
            bookings.create(json!({"email": email, "service": "Oil"})).await.unwrap();
        }
    });
    let user = AuthenticatedUser { email: "user3@example.com".into(), expires_at: i64::MAX };
    let policy = OwnershipPolicy::new(true);

    c.bench_function("bookings_list_owned", |b| {
        b.iter(|| {
            let scope = policy.scope_bookings(Some("user3@example.com"), &user).unwrap();
            tokio_test::block_on(bookings.list(&scope)).unwrap()
        })
    });
}

criterion_group!(benches, bench_token, bench_owned_listing);
criterion_main!(benches);
