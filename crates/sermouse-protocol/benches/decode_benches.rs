use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use sermouse_protocol::{Buttons, Decoder, LineState, ProtocolKind, encode_packet};

const PACKETS: usize = 1024;

fn stream(kind: ProtocolKind) -> Vec<u8> {
    let mut bytes = Vec::new();
    for i in 0..PACKETS {
        let buttons = if i % 3 == 0 { Buttons::LEFT } else { Buttons::empty() };
        let delta = (i % 64) as i32 - 32;
        let wheel = if kind.has_wheel() { (i % 5) as i16 - 2 } else { 0 };
        if let Ok(packet) = encode_packet(kind, buttons, delta, -delta, wheel) {
            bytes.extend_from_slice(packet.as_slice());
        }
    }
    bytes
}

fn benchmark_decoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for kind in ProtocolKind::ALL {
        let bytes = stream(kind);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(kind.name(), |b| {
            let mut decoder = Decoder::new(kind);
            b.iter(|| {
                let mut events = 0usize;
                for &byte in &bytes {
                    if decoder.feed(std::hint::black_box(byte), LineState::empty()).is_some() {
                        events += 1;
                    }
                }
                std::hint::black_box(events)
            });
        });
    }
    group.finish();
}

fn benchmark_resync(c: &mut Criterion) {
    // Every other byte is noise, so the decoder spends its time resyncing.
    let noisy: Vec<u8> = stream(ProtocolKind::Mm)
        .into_iter()
        .flat_map(|byte| [byte, 0x01])
        .collect();

    c.bench_function("decode mm noisy", |b| {
        let mut decoder = Decoder::new(ProtocolKind::Mm);
        b.iter(|| {
            decoder.feed_all(std::hint::black_box(&noisy), |event| {
                std::hint::black_box(event);
            });
        });
    });
}

criterion_group!(benches, benchmark_decoders, benchmark_resync);
criterion_main!(benches);
