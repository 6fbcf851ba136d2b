#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

use edacc_core::event::ClassifiedEvent;
use edacc_journal_pipeline::classifier::FallbackExtractor;

fn extractor() -> &'static FallbackExtractor {
    static EXTRACTOR: OnceLock<FallbackExtractor> = OnceLock::new();
    EXTRACTOR.get_or_init(|| FallbackExtractor::new().expect("fallback patterns compile"))
}

fuzz_target!(|line: &str| {
    // 깨진 라인 뒤에 채굴 이벤트 조각을 붙여 부분 복구 경로를 자주 타게 함
    let input = format!(r#"{line}"event":"ProspectedAsteroid","Materials":[{{"Name":"#);
    for candidate in [line, input.as_str()] {
        if let Some(ClassifiedEvent::Mining(asteroid)) = extractor().extract(candidate) {
            for material in &asteroid.materials {
                assert!(material.display_percent() <= 100);
            }
        }
    }
});
