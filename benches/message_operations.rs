use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rs_pfcp::ie::primitives::{Fseid, NodeId, RecoveryTimeStamp};
use rs_pfcp::ie::{Ie, IeType};
use rs_pfcp::message::{Message, MsgType};
use std::net::Ipv4Addr;

fn heartbeat_request() -> Message {
    Message::new(
        MsgType::HeartbeatRequest,
        1,
        vec![Ie::new(IeType::RecoveryTimeStamp, RecoveryTimeStamp::now().marshal().to_vec())],
    )
}

fn session_establishment_request() -> Message {
    let create_pdr = Ie::new_grouped(
        IeType::CreatePdr,
        vec![
            Ie::new(IeType::PdrId, 1u16.to_be_bytes().to_vec()),
            Ie::new(IeType::Precedence, 100u32.to_be_bytes().to_vec()),
            Ie::new_grouped(IeType::Pdi, vec![Ie::new(IeType::SourceInterface, vec![0])]),
        ],
    );
    let create_far = Ie::new_grouped(
        IeType::CreateFar,
        vec![
            Ie::new(IeType::FarId, 1u32.to_be_bytes().to_vec()),
            Ie::new(IeType::ApplyAction, vec![0x02]),
        ],
    );

    Message::new(
        MsgType::SessionEstablishmentRequest,
        1,
        vec![
            Ie::new(IeType::NodeId, NodeId::V4(Ipv4Addr::new(10, 0, 0, 1)).marshal()),
            Ie::new(IeType::Fseid, Fseid::new(0x1111_1111, Ipv4Addr::new(10, 0, 0, 1)).marshal()),
            create_pdr,
            create_far,
        ],
    )
}

fn bench_heartbeat_marshal(c: &mut Criterion) {
    let msg = heartbeat_request();
    c.bench_function("message/heartbeat/marshal", |b| b.iter(|| black_box(&msg).marshal().unwrap()));
}

fn bench_heartbeat_unmarshal(c: &mut Criterion) {
    let bytes = heartbeat_request().marshal().unwrap();
    c.bench_function("message/heartbeat/unmarshal", |b| b.iter(|| Message::unmarshal(black_box(&bytes)).unwrap()));
}

fn bench_session_establishment_marshal(c: &mut Criterion) {
    let msg = session_establishment_request();
    c.bench_function("message/session_establishment/marshal", |b| {
        b.iter(|| black_box(&msg).marshal().unwrap())
    });
}

fn bench_session_establishment_unmarshal(c: &mut Criterion) {
    let bytes = session_establishment_request().marshal().unwrap();
    c.bench_function("message/session_establishment/unmarshal", |b| {
        b.iter(|| Message::unmarshal(black_box(&bytes)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_heartbeat_marshal,
    bench_heartbeat_unmarshal,
    bench_session_establishment_marshal,
    bench_session_establishment_unmarshal,
);
criterion_main!(benches);
