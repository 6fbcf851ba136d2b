//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()` 매크로를 호출합니다.
//! 익스포터는 설치하지 않으므로, 레코더를 설치한 애플리케이션에서만 값이 수집됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `edacc_`
//! - 모듈명: `journal_`, `announce_`, `storage_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 이벤트 종류 레이블 키 (mining, chat, unrecognized)
pub const LABEL_KIND: &str = "kind";

/// 분류 경로 레이블 키 (strict, fallback)
pub const LABEL_PATH: &str = "path";

// ─── Journal 메트릭 ────────────────────────────────────────────────

/// Journal: 읽은 전체 바이트 수 (counter)
pub const JOURNAL_BYTES_READ_TOTAL: &str = "edacc_journal_bytes_read_total";

/// Journal: 조립된 전체 라인 수 (counter)
pub const JOURNAL_LINES_TOTAL: &str = "edacc_journal_lines_total";

/// Journal: 분류된 이벤트 수 (counter, label: kind, path)
pub const JOURNAL_EVENTS_TOTAL: &str = "edacc_journal_events_total";

/// Journal: 두 경로 모두 실패한 라인 수 (counter)
pub const JOURNAL_DECODE_FAILURES_TOTAL: &str = "edacc_journal_decode_failures_total";

/// Journal: 저널 파일 전환 횟수 (counter)
pub const JOURNAL_ROTATIONS_TOTAL: &str = "edacc_journal_rotations_total";

// ─── Announce 메트릭 ───────────────────────────────────────────────

/// Announce: 큐에 넣은 안내 수 (counter)
pub const ANNOUNCE_QUEUED_TOTAL: &str = "edacc_announce_queued_total";

/// Announce: 읽어준 안내 수 (counter)
pub const ANNOUNCE_SPOKEN_TOTAL: &str = "edacc_announce_spoken_total";

/// Announce: 음성 합성 실패 수 (counter)
pub const ANNOUNCE_FAILURES_TOTAL: &str = "edacc_announce_failures_total";

/// Announce: 대기 중인 안내 수 (gauge)
pub const ANNOUNCE_QUEUE_DEPTH: &str = "edacc_announce_queue_depth";

// ─── Storage 메트릭 ────────────────────────────────────────────────

/// Storage: 기록한 관측 레코드 수 (counter)
pub const STORAGE_RECORDS_TOTAL: &str = "edacc_storage_records_total";

/// Storage: 추가/플러시 실패 수 (counter)
pub const STORAGE_FAILURES_TOTAL: &str = "edacc_storage_failures_total";

// ─── Daemon 메트릭 ─────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "edacc_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, label: version, 항상 1)
pub const DAEMON_BUILD_INFO: &str = "edacc_daemon_build_info";

/// 모든 메트릭의 설명을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`을
/// 레코더 설치 직후 한 번 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(JOURNAL_BYTES_READ_TOTAL, "Bytes read from the tailed journal");
    describe_counter!(JOURNAL_LINES_TOTAL, "Complete journal lines assembled");
    describe_counter!(
        JOURNAL_EVENTS_TOTAL,
        "Journal lines classified, by event kind and decode path"
    );
    describe_counter!(
        JOURNAL_DECODE_FAILURES_TOTAL,
        "Lines that failed both strict and fallback decoding"
    );
    describe_counter!(JOURNAL_ROTATIONS_TOTAL, "Switches to a newer journal file");

    describe_counter!(ANNOUNCE_QUEUED_TOTAL, "Announcements enqueued");
    describe_counter!(ANNOUNCE_SPOKEN_TOTAL, "Announcements handed to the speaker");
    describe_counter!(ANNOUNCE_FAILURES_TOTAL, "Speaker calls that failed");
    describe_gauge!(ANNOUNCE_QUEUE_DEPTH, "Announcements waiting in the queue");

    describe_counter!(STORAGE_RECORDS_TOTAL, "Mining observations appended to storage");
    describe_counter!(STORAGE_FAILURES_TOTAL, "Storage append or flush failures");

    describe_gauge!(DAEMON_UPTIME_SECONDS, "Seconds since the daemon started");
    describe_gauge!(DAEMON_BUILD_INFO, "Build information, labelled by version");
}
