#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

use edacc_journal_pipeline::{AlertEvaluator, EventClassifier, PipelineConfig};

fn pipeline() -> &'static (EventClassifier, AlertEvaluator) {
    static PIPELINE: OnceLock<(EventClassifier, AlertEvaluator)> = OnceLock::new();
    PIPELINE.get_or_init(|| {
        let classifier = EventClassifier::new().expect("classifier patterns compile");
        let evaluator = AlertEvaluator::from_config(&PipelineConfig::default());
        (classifier, evaluator)
    })
}

fuzz_target!(|data: &[u8]| {
    let (classifier, evaluator) = pipeline();
    let line = String::from_utf8_lossy(data);
    let event = classifier.classify(&line);
    let _ = evaluator.evaluate(&event);
});
