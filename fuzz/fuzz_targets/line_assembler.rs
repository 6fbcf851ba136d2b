#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use edacc_journal_pipeline::LineAssembler;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 저널에 덧붙은 바이트
    journal: Vec<u8>,
    /// 읽기 경계 (journal 길이로 나눈 나머지를 사용)
    cuts: Vec<u16>,
}

const MAX_LINE: usize = 1024;

fuzz_target!(|input: FuzzInput| {
    let mut whole = LineAssembler::new(MAX_LINE);
    let expected = whole.absorb(&input.journal);

    let len = input.journal.len();
    let mut points: Vec<usize> = input
        .cuts
        .iter()
        .take(16)
        .map(|c| if len == 0 { 0 } else { usize::from(*c) % len })
        .collect();
    points.sort_unstable();
    points.dedup();

    let mut split = LineAssembler::new(MAX_LINE);
    let mut actual = Vec::new();
    let mut start = 0;
    for point in points {
        actual.extend(split.absorb(&input.journal[start..point]));
        start = point;
    }
    actual.extend(split.absorb(&input.journal[start..]));

    // 끝의 `\r` 한 바이트까지 보관 가능
    assert!(split.pending_len() <= MAX_LINE + 1);
    assert_eq!(actual, expected);
});
