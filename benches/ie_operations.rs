use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rs_pfcp::ie::primitives::{Fseid, Fteid, NodeId};
use rs_pfcp::ie::{Ie, IeType};
use std::net::Ipv4Addr;

fn bench_leaf_marshal(c: &mut Criterion) {
    let ie = Ie::new(IeType::PdrId, 42u16.to_be_bytes().to_vec());
    c.bench_function("ie/leaf/marshal", |b| b.iter(|| black_box(&ie).marshal()));
}

fn bench_leaf_roundtrip(c: &mut Criterion) {
    let ie = Ie::new(IeType::PdrId, 42u16.to_be_bytes().to_vec());
    let bytes = ie.marshal();

    c.bench_function("ie/leaf/unmarshal", |b| {
        b.iter(|| {
            let (parsed, _consumed) = Ie::read_one(black_box(&bytes)).unwrap();
            black_box(parsed)
        })
    });
}

fn bench_group_marshal(c: &mut Criterion) {
    let group = Ie::new_grouped(
        IeType::CreatePdr,
        vec![
            Ie::new(IeType::PdrId, 1u16.to_be_bytes().to_vec()),
            Ie::new(IeType::Precedence, 100u32.to_be_bytes().to_vec()),
            Ie::new_grouped(IeType::Pdi, vec![Ie::new(IeType::SourceInterface, vec![0])]),
        ],
    );

    c.bench_function("ie/group/marshal", |b| b.iter(|| black_box(&group).marshal()));
}

fn bench_fteid_marshal(c: &mut Criterion) {
    let fteid = Fteid::assigned(0x1234_5678, Ipv4Addr::new(10, 0, 0, 1));
    c.bench_function("ie/fteid/marshal", |b| b.iter(|| black_box(&fteid).marshal()));
}

fn bench_fseid_roundtrip(c: &mut Criterion) {
    let fseid = Fseid::new(0x1111_1111_2222_2222, Ipv4Addr::new(10, 0, 0, 2));
    let bytes = fseid.marshal();
    c.bench_function("ie/fseid/unmarshal", |b| b.iter(|| Fseid::unmarshal(black_box(&bytes)).unwrap()));
}

fn bench_node_id_marshal(c: &mut Criterion) {
    let node_id = NodeId::V4(Ipv4Addr::new(192, 0, 2, 1));
    c.bench_function("ie/node_id/marshal", |b| b.iter(|| black_box(&node_id).marshal()));
}

criterion_group!(
    benches,
    bench_leaf_marshal,
    bench_leaf_roundtrip,
    bench_group_marshal,
    bench_fteid_marshal,
    bench_fseid_roundtrip,
    bench_node_id_marshal,
);
criterion_main!(benches);
