//! Criterion benchmarks for the packet builder and the send/dispatch path.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use enet_tokio::{Client, Event, EventKind, HostConfig, LoopbackNetwork, PacketBuilder, Server};

fn builder_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_builder");

    for &payload_size in &[64usize, 512, 4096] {
        group.throughput(Throughput::Bytes(payload_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(payload_size),
            &payload_size,
            |b, &size| {
                let payload = vec![0x61u8; size];
                let mut builder = PacketBuilder::new(size + 16);
                b.iter(|| {
                    builder
                        .reset()
                        .write_u8(2)
                        .write_u32(size as u32)
                        .write_bytes(&payload);
                    builder.packet_data().len()
                });
            },
        );
    }

    group.finish();
}

/// Full layer round trip: client send, server classify + echo, client drain.
fn echo_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("echo_dispatch");

    for &payload_size in &[64usize, 1024] {
        group.throughput(Throughput::Bytes(payload_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(payload_size),
            &payload_size,
            |b, &size| {
                let network = LoopbackNetwork::new();
                let mut server =
                    Server::create(network.engine(), HostConfig::new().port(17191)).unwrap();
                server.on(EventKind::Receive, |ctx, event| {
                    if let Event::Receive {
                        peer,
                        channel,
                        data,
                    } = event
                    {
                        ctx.send(*peer, *channel, data, true);
                    }
                    Ok(())
                });

                let mut client =
                    Client::create(network.engine(), HostConfig::new().port(17191)).unwrap();
                client.connect().unwrap();
                // drain handshake events on both sides
                while server.service(0).unwrap().is_some() {}
                while client.service(0).unwrap().is_some() {}

                let payload = vec![0x61u8; size];
                b.iter(|| {
                    client.send_to_server(0, &payload, true);
                    while server.service(0).unwrap().is_some() {}
                    while client.service(0).unwrap().is_some() {}
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, builder_throughput, echo_dispatch);
criterion_main!(benches);
