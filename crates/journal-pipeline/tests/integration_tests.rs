//! 통합 테스트 -- 저널 수집부터 음성 안내/기록까지 전체 흐름 검증
//!
//! 임시 디렉토리에 저널 파일을 만들고 실제 파이프라인을 돌려
//! 안내 문장과 저장 레코드를 확인합니다.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use edacc_core::error::{SpeechError, StorageError};
use edacc_core::pipeline::{HealthStatus, ObservationSink, Pipeline, Speaker};
use edacc_core::types::MiningObservation;
use edacc_journal_pipeline::pipeline::PipelineCounters;
use edacc_journal_pipeline::{
    CsvObservationSink, EventClassifier, IngestionLoop, JournalPipeline, JournalPipelineBuilder,
    LineAssembler, PipelineConfig, PipelineConfigBuilder, TailState, announcement_channel,
};

const PLATINUM_55: &str = r#"{"event":"ProspectedAsteroid","timestamp":"T1","Remaining":100.0,"Materials":[{"Name":"Platinum","Proportion":55.0}]}"#;
const DEPLETED_PLATINUM: &str = r#"{"event":"ProspectedAsteroid","timestamp":"T2","Remaining":80.0,"Materials":[{"Name":"Platinum","Proportion":55.0}]}"#;
const NPC_CARGO: &str = r#"{"event":"ReceiveText","timestamp":"T3","From":"Pirate","Channel":"npc","Message":"hand over your cargo"}"#;

/// 마지막에 넣어 앞선 안내가 모두 끝났는지 확인하는 라인
const SENTINEL: &str = r#"{"event":"ReceiveText","From":"Sentinel","Channel":"player","Message":"done"}"#;
const SENTINEL_TEXT: &str = "player message from Sentinel saying: done";

/// 받은 문장을 기록하는 음성 합성기
#[derive(Clone, Default)]
struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl Speaker for RecordingSpeaker {
    fn name(&self) -> &str {
        "recording"
    }

    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

/// 추가된 레코드를 기록하는 저장소
#[derive(Clone, Default)]
struct RecordingSink {
    records: Arc<Mutex<Vec<MiningObservation>>>,
}

impl ObservationSink for RecordingSink {
    fn append(&mut self, record: &MiningObservation) -> Result<(), StorageError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

fn config(dir: &Path, require_full_remaining: bool) -> PipelineConfig {
    PipelineConfigBuilder::new()
        .journal_dir(dir)
        .poll_interval_ms(10)
        .idle_interval_ms(20)
        .target("Platinum", 50.0)
        .require_full_remaining(require_full_remaining)
        .ready_message(None)
        .build()
        .unwrap()
}

fn append(path: &Path, lines: &[&str]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

async fn wait_until(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// 파이프라인이 저널 파일을 잡을 때까지 기다립니다.
async fn wait_for_tailing(pipeline: &JournalPipeline) {
    wait_until("journal file", || pipeline.counters().rotations >= 1).await;
}

/// 라인들을 흘려 보내고 안내 문장과 저장 레코드를 돌려줍니다.
async fn run_lines(
    require_full_remaining: bool,
    lines: &[&str],
) -> (Vec<String>, Vec<MiningObservation>) {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("Journal.2025-03-01T100000.01.log");
    std::fs::write(&journal, b"").unwrap();

    let speaker = RecordingSpeaker::default();
    let spoken = Arc::clone(&speaker.spoken);
    let sink = RecordingSink::default();
    let records = Arc::clone(&sink.records);

    let mut pipeline = JournalPipelineBuilder::new()
        .config(config(dir.path(), require_full_remaining))
        .speaker(speaker)
        .sink(sink)
        .build()
        .unwrap();
    pipeline.start().await.unwrap();
    wait_for_tailing(&pipeline).await;

    let mut all: Vec<&str> = lines.to_vec();
    all.push(SENTINEL);
    append(&journal, &all);

    wait_until("sentinel announcement", || {
        spoken.lock().unwrap().iter().any(|s| s == SENTINEL_TEXT)
    })
    .await;
    pipeline.stop().await.unwrap();

    let mut spoken = spoken.lock().unwrap().clone();
    spoken.retain(|s| s != SENTINEL_TEXT);
    let records = records.lock().unwrap().clone();
    (spoken, records)
}

#[tokio::test]
async fn platinum_over_threshold_is_announced_and_recorded() {
    let (spoken, records) = run_lines(true, &[PLATINUM_55]).await;

    assert_eq!(spoken, vec!["Platinum asteroid found with 55 percent content"]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].material, "Platinum");
    assert_eq!(records[0].proportion, 55.0);
    assert_eq!(records[0].timestamp, "T1");
    assert_eq!(records[0].content_type, "Unknown");
}

#[tokio::test]
async fn npc_cargo_demand_is_pirate_alert() {
    let (spoken, records) = run_lines(true, &[NPC_CARGO]).await;

    assert_eq!(spoken, vec!["NPC pirate alert: hand over your cargo"]);
    assert!(records.is_empty());
}

#[tokio::test]
async fn depleted_asteroid_is_recorded_but_not_announced() {
    let (spoken, records) = run_lines(true, &[DEPLETED_PLATINUM]).await;

    assert!(spoken.is_empty());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].remaining, 80.0);
}

#[tokio::test]
async fn depleted_asteroid_is_announced_without_gate() {
    let (spoken, _records) = run_lines(false, &[DEPLETED_PLATINUM]).await;

    assert_eq!(spoken, vec!["Platinum asteroid found with 55 percent content"]);
}

#[tokio::test]
async fn announcements_keep_journal_order() {
    let (spoken, _records) = run_lines(
        true,
        &[
            NPC_CARGO,
            r#"{"event":"Music","MusicTrack":"Combat"}"#,
            "not json at all",
            PLATINUM_55,
            r#"{"event":"ReceiveText","From":"Cmdr Jameson","Channel":"squadron","Message":"o7"}"#,
        ],
    )
    .await;

    assert_eq!(
        spoken,
        vec![
            "NPC pirate alert: hand over your cargo",
            "Platinum asteroid found with 55 percent content",
            "message from squadron member Cmdr Jameson saying: o7",
        ]
    );
}

#[tokio::test]
async fn truncated_json_is_recovered_by_fallback() {
    let broken = r#"{"timestamp":"T9","event":"ProspectedAsteroid","Materials":[{"Name":"Platinum","Proportion":61.2}],"Remaining":100.0"#;
    let (spoken, records) = run_lines(true, &[broken]).await;

    assert_eq!(spoken, vec!["Platinum asteroid found with 61 percent content"]);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].proportion, 61.2);
}

#[tokio::test]
async fn line_written_in_two_parts_is_processed_once() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("Journal.1.log");
    std::fs::write(&journal, b"").unwrap();

    let speaker = RecordingSpeaker::default();
    let spoken = Arc::clone(&speaker.spoken);
    let mut pipeline = JournalPipelineBuilder::new()
        .config(config(dir.path(), true))
        .speaker(speaker)
        .build()
        .unwrap();
    pipeline.start().await.unwrap();
    wait_for_tailing(&pipeline).await;

    let (head, tail) = PLATINUM_55.split_at(40);
    {
        let mut file = OpenOptions::new().append(true).open(&journal).unwrap();
        file.write_all(head.as_bytes()).unwrap();
    }
    // 여러 주기 동안 조각만 있는 상태
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pipeline.counters().lines, 0);

    append(&journal, &[tail]);
    wait_until("announcement", || !spoken.lock().unwrap().is_empty()).await;
    pipeline.stop().await.unwrap();

    assert_eq!(pipeline.counters().lines, 1);
    assert_eq!(
        *spoken.lock().unwrap(),
        vec!["Platinum asteroid found with 55 percent content"]
    );
}

#[tokio::test]
async fn csv_sink_receives_one_row_per_material() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("Journal.1.log");
    let csv = dir.path().join("out/mining_statistics.csv");
    std::fs::write(&journal, b"").unwrap();

    let mut pipeline = JournalPipelineBuilder::new()
        .config(config(dir.path(), true))
        .speaker(RecordingSpeaker::default())
        .sink(CsvObservationSink::new(&csv))
        .build()
        .unwrap();
    pipeline.start().await.unwrap();
    wait_for_tailing(&pipeline).await;

    append(
        &journal,
        &[
            r#"{"event":"ProspectedAsteroid","timestamp":"T1","Remaining":100.0,"MotherlodeMaterial":"Painite","Content_Localised":"Material Content: High","Materials":[{"Name":"Painite","Proportion":20.5},{"Name":"Gold","Proportion":9.0}]}"#,
        ],
    );
    wait_until("observations", || pipeline.counters().observations == 2).await;
    // 정지 시 마지막 플러시
    pipeline.stop().await.unwrap();

    let content = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "timestamp,material,proportion,motherlode,content_type,remaining",
            "T1,Painite,20.5,true,Material Content: High,100",
            "T1,Gold,9,false,Material Content: High,100",
        ]
    );

    let stats = pipeline.session_stats().unwrap();
    assert_eq!(stats.asteroids(), 1);
    assert_eq!(stats.material("Painite").unwrap().motherlodes, 1);
}

#[tokio::test]
async fn ready_message_is_spoken_first() {
    let dir = tempfile::tempdir().unwrap();
    let speaker = RecordingSpeaker::default();
    let spoken = Arc::clone(&speaker.spoken);

    let config = PipelineConfigBuilder::new()
        .journal_dir(dir.path())
        .ready_message(Some("assistant ready".to_owned()))
        .build()
        .unwrap();
    let mut pipeline = JournalPipelineBuilder::new()
        .config(config)
        .speaker(speaker)
        .build()
        .unwrap();

    pipeline.start().await.unwrap();
    wait_until("ready message", || !spoken.lock().unwrap().is_empty()).await;
    pipeline.stop().await.unwrap();

    assert_eq!(*spoken.lock().unwrap(), vec!["assistant ready"]);
}

#[tokio::test]
async fn pipeline_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut pipeline = JournalPipelineBuilder::new()
        .config(config(dir.path(), true))
        .speaker(RecordingSpeaker::default())
        .build()
        .unwrap();

    assert_eq!(pipeline.state_name(), "initialized");
    assert!(pipeline.health_check().await.is_unhealthy());

    pipeline.start().await.unwrap();
    assert_eq!(pipeline.state_name(), "running");
    assert!(pipeline.start().await.is_err());
    // 디렉토리에 저널이 없어도 정상 (대기 상태)
    assert_eq!(pipeline.health_check().await, HealthStatus::Healthy);
    assert!(pipeline.announcement_queue().is_some());

    pipeline.stop().await.unwrap();
    assert_eq!(pipeline.state_name(), "stopped");
    assert!(pipeline.health_check().await.is_unhealthy());
    assert!(pipeline.stop().await.is_err());
    // 정지 후 재시작 불가
    assert!(pipeline.start().await.is_err());
}

/// 수집 루프를 직접 돌리기 위한 구성
struct Harness {
    ingestion: IngestionLoop,
    queue: edacc_journal_pipeline::AnnouncementQueue,
    _inbox: edacc_journal_pipeline::announce::AnnouncementInbox,
    records: Arc<Mutex<Vec<MiningObservation>>>,
}

fn harness(dir: &Path) -> Harness {
    let (queue, inbox) = announcement_channel();
    let sink = RecordingSink::default();
    let records = Arc::clone(&sink.records);
    let ingestion = IngestionLoop::new(
        &config(dir, true),
        EventClassifier::new().unwrap(),
        queue.clone(),
        Some(Box::new(sink)),
        Arc::new(PipelineCounters::default()),
    )
    .unwrap();
    Harness {
        ingestion,
        queue,
        _inbox: inbox,
        records,
    }
}

#[tokio::test]
async fn rotation_starts_at_end_of_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("Journal.2025-03-01T100000.01.log");
    std::fs::write(&first, format!("{PLATINUM_55}\n")).unwrap();

    let mut h = harness(dir.path());
    h.ingestion.tick().await;
    assert_eq!(h.ingestion.state(), TailState::Tailing);
    assert_eq!(h.ingestion.cursor().path(), Some(first.as_path()));

    // 게임이 새 세션 파일로 전환, 감지 전에 이미 내용이 기록됨
    let second = dir.path().join("Journal.2025-03-01T120000.01.log");
    let pre_existing = format!("{PLATINUM_55}\n{NPC_CARGO}\n");
    std::fs::write(&second, &pre_existing).unwrap();
    let later = SystemTime::now() + Duration::from_secs(10);
    std::fs::File::options()
        .write(true)
        .open(&second)
        .unwrap()
        .set_modified(later)
        .unwrap();

    h.ingestion.tick().await;
    assert_eq!(h.ingestion.cursor().path(), Some(second.as_path()));
    assert_eq!(h.ingestion.cursor().offset(), pre_existing.len() as u64);
    assert!(h.queue.is_empty());
    assert!(h.records.lock().unwrap().is_empty());

    append(&second, &[NPC_CARGO]);
    std::fs::File::options()
        .write(true)
        .open(&second)
        .unwrap()
        .set_modified(later + Duration::from_secs(1))
        .unwrap();
    h.ingestion.tick().await;
    assert_eq!(h.queue.len(), 1);
}

#[tokio::test]
async fn truncated_file_is_read_from_start() {
    let dir = tempfile::tempdir().unwrap();
    let journal = dir.path().join("Journal.1.log");
    std::fs::write(&journal, format!("{NPC_CARGO}\n{NPC_CARGO}\n")).unwrap();

    let mut h = harness(dir.path());
    h.ingestion.tick().await;
    assert!(h.ingestion.cursor().offset() > 0);

    // copy-truncate 방식의 교체
    std::fs::write(&journal, b"").unwrap();
    h.ingestion.tick().await;
    assert_eq!(h.ingestion.cursor().offset(), 0);

    append(&journal, &[PLATINUM_55]);
    h.ingestion.tick().await;
    assert_eq!(h.queue.len(), 1);
    assert_eq!(h.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_directory_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("not-yet-created");

    let mut h = harness(&missing);
    assert_eq!(h.ingestion.tick().await, Duration::from_millis(20));
    assert_eq!(h.ingestion.state(), TailState::Idle);

    std::fs::create_dir(&missing).unwrap();
    std::fs::write(missing.join("Journal.1.log"), b"").unwrap();
    assert_eq!(h.ingestion.tick().await, Duration::from_millis(10));
    assert_eq!(h.ingestion.state(), TailState::Tailing);
}

#[test]
fn split_at_any_byte_yields_same_materials() {
    let line = r#"{"event":"ProspectedAsteroid","timestamp":"T1","Remaining":100.0,"Materials":[{"Name":"Ürankristall","Proportion":33.3},{"Name":"Painite","Proportion":12.0}]}"#;
    let classifier = EventClassifier::new().unwrap();

    let mut whole = LineAssembler::new(64 * 1024);
    let expected = whole.absorb(format!("{line}\n").as_bytes());
    assert_eq!(expected.len(), 1);
    let expected = classifier.classify(&expected[0]);

    let bytes = format!("{line}\n").into_bytes();
    for cut in 1..bytes.len() {
        let mut asm = LineAssembler::new(64 * 1024);
        let mut lines = asm.absorb(&bytes[..cut]);
        lines.extend(asm.absorb(&bytes[cut..]));
        assert_eq!(lines.len(), 1, "cut at {cut}");
        assert_eq!(classifier.classify(&lines[0]), expected, "cut at {cut}");
    }
}
