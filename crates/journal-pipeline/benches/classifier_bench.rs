//! 이벤트 분류기 벤치마크
//!
//! 엄격 해석 경로, 부분 추출 경로, 라인 조립기의 처리량을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use edacc_journal_pipeline::{EventClassifier, LineAssembler};

/// 정상 JSON 채굴 이벤트
const MINING_STRICT: &str = r#"{ "timestamp":"2025-03-01T10:00:00Z", "event":"ProspectedAsteroid", "Materials":[ { "Name":"Platinum", "Proportion":41.7 }, { "Name":"Gold", "Proportion":12.3 }, { "Name":"Silver", "Proportion":8.1 } ], "MotherlodeMaterial":"Painite", "Content":"$AsteroidMaterialContent_High;", "Content_Localised":"Material Content: High", "Remaining":100.000000 }"#;

/// 닫는 괄호가 빠진 채굴 이벤트 (부분 추출 경로)
const MINING_BROKEN: &str = r#"{ "timestamp":"2025-03-01T10:00:00Z", "event":"ProspectedAsteroid", "Materials":[ { "Name":"Platinum", "Proportion":41.7 }, { "Name":"Gold", "Proportion":12.3 } ], "Content_Localised":"Material Content: High", "Remaining":100.0"#;

/// 정상 JSON 통신 이벤트
const CHAT_STRICT: &str = r#"{ "timestamp":"2025-03-01T10:00:05Z", "event":"ReceiveText", "From":"$npc_name_decorate:#name=Pirate;", "From_Localised":"Pirate", "Message":"$Pirate_OnStartScanCargo07;", "Message_Localised":"I'll be taking that cargo.", "Channel":"npc" }"#;

/// 처리 대상이 아닌 이벤트
const OTHER_EVENT: &str = r#"{ "timestamp":"2025-03-01T10:00:10Z", "event":"Music", "MusicTrack":"Exploration" }"#;

fn bench_classifier(c: &mut Criterion) {
    let classifier = EventClassifier::new().unwrap();

    let mut group = c.benchmark_group("classifier");
    group.throughput(Throughput::Elements(1));

    group.bench_function("mining_strict", |b| {
        b.iter(|| classifier.classify(black_box(MINING_STRICT)))
    });
    group.bench_function("mining_fallback", |b| {
        b.iter(|| classifier.classify(black_box(MINING_BROKEN)))
    });
    group.bench_function("chat_strict", |b| {
        b.iter(|| classifier.classify(black_box(CHAT_STRICT)))
    });
    group.bench_function("other_event", |b| {
        b.iter(|| classifier.classify(black_box(OTHER_EVENT)))
    });

    group.finish();
}

fn bench_assembler(c: &mut Criterion) {
    let mut journal = String::new();
    for _ in 0..100 {
        journal.push_str(MINING_STRICT);
        journal.push('\n');
        journal.push_str(CHAT_STRICT);
        journal.push('\n');
    }
    let bytes = journal.as_bytes();

    let mut group = c.benchmark_group("line_assembler");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("single_chunk", |b| {
        b.iter(|| {
            let mut assembler = LineAssembler::new(65536);
            assembler.absorb(black_box(bytes))
        })
    });
    group.bench_function("4k_chunks", |b| {
        b.iter(|| {
            let mut assembler = LineAssembler::new(65536);
            let mut lines = 0;
            for chunk in bytes.chunks(4096) {
                lines += assembler.absorb(black_box(chunk)).len();
            }
            lines
        })
    });

    group.finish();
}

criterion_group!(benches, bench_classifier, bench_assembler);
criterion_main!(benches);
