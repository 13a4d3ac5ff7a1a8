//! Dispatch benchmark suite.
//!
//! Measures host + connection selection and delegation at different pool
//! sizes:
//! - Host counts: 1, 8, 64
//! - Connections per host: 4
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::time::Duration;

use async_trait::async_trait;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use hostpool::{
    AuthenticationMethod, Connection, ConnectionFactory, ConnectionPool, HostDescription,
    PoolConfig, Request, RequestType, Response, Result,
};
use tokio::runtime::Runtime;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const HOST_COUNTS: &[usize] = &[1, 8, 64];
const CONNECTIONS_PER_HOST: usize = 4;

// ============================================================================
// In-Memory Collaborators
// ============================================================================

struct EchoConnection;

#[async_trait]
impl Connection for EchoConnection {
    async fn execute(&self, _request: Request) -> Result<Response> {
        Ok(Response::new(200))
    }

    async fn is_connected(&self) -> bool {
        true
    }

    async fn close(&self) {}
}

struct EchoFactory;

#[async_trait]
impl ConnectionFactory for EchoFactory {
    type Connection = EchoConnection;

    async fn create(
        &self,
        _host: &HostDescription,
        _authentication: &AuthenticationMethod,
    ) -> Result<EchoConnection> {
        Ok(EchoConnection)
    }
}

async fn build_pool(host_count: usize) -> ConnectionPool<EchoFactory> {
    let pool = ConnectionPool::new(
        PoolConfig::new()
            .with_connections_per_host(CONNECTIONS_PER_HOST)
            .with_timeout(Duration::from_secs(5)),
        AuthenticationMethod::basic("root", ""),
        EchoFactory,
    )
    .expect("valid config");

    let hosts: Vec<HostDescription> = (0..host_count)
        .map(|i| HostDescription::new(format!("db{i}"), 8529))
        .collect();

    pool.update_connections(&hosts)
        .await
        .expect("pool populated");
    pool
}

// ============================================================================
// Benchmark: Dispatch
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("dispatch");

    for &host_count in HOST_COUNTS {
        let pool = rt.block_on(build_pool(host_count));

        group.bench_with_input(
            BenchmarkId::new("hosts", host_count),
            &pool,
            |b, pool| {
                b.to_async(&rt).iter(|| async move {
                    let request = Request::new("_system", RequestType::Get, "/_api/version");
                    pool.dispatch(request).await.expect("dispatch")
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Criterion Setup
// ============================================================================

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
