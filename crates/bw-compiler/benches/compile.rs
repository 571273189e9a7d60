use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use bw_compiler::{compile_hosts, RuleListWriter};

fn synthetic_hosts(lines: usize) -> String {
    let mut text = String::from("# synthetic hosts file\n127.0.0.1 localhost\n");
    for i in 0..lines {
        if i % 10 == 0 {
            text.push_str(&format!("0.0.0.0 ads{}.example.com trk{}.example.net # tracker\n", i, i));
        } else {
            text.push_str(&format!("0.0.0.0 host{}.example.com\n", i));
        }
    }
    text
}

fn bench_compile(c: &mut Criterion) {
    let hosts = synthetic_hosts(50_000);

    let mut group = c.benchmark_group("compile_hosts");
    group.throughput(Throughput::Bytes(hosts.len() as u64));
    group.bench_function("50k_lines", |b| {
        b.iter(|| {
            let mut exact = RuleListWriter::exact(Vec::with_capacity(hosts.len())).unwrap();
            let mut wildcard = RuleListWriter::wildcard(Vec::with_capacity(hosts.len())).unwrap();
            let count = compile_hosts(Cursor::new(hosts.as_bytes()), &mut exact, &mut wildcard).unwrap();
            black_box((count, exact.finish().unwrap(), wildcard.finish().unwrap()))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
