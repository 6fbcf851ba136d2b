//! 채굴 관측 기록 저장소
//!
//! [`CsvObservationSink`]는 추가된 레코드를 메모리에 모아 두었다가
//! `flush()` 때 CSV 파일 끝에 한꺼번에 이어 씁니다.
//! 헤더는 파일이 없거나 비어 있을 때만 씁니다.
//! 플러시에 실패한 레코드는 다시 시도하지 않고 버립니다.
//!
//! `flush()`는 블로킹 파일 I/O입니다. 수집 루프는 `spawn_blocking`으로 호출합니다.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use edacc_core::error::StorageError;
use edacc_core::metrics as m;
use edacc_core::pipeline::ObservationSink;
use edacc_core::types::MiningObservation;

/// CSV 헤더
pub const CSV_HEADER: &str = "timestamp,material,proportion,motherlode,content_type,remaining";

/// CSV 파일 기반 관측 기록 저장소
#[derive(Debug)]
pub struct CsvObservationSink {
    path: PathBuf,
    pending: Vec<MiningObservation>,
}

impl CsvObservationSink {
    /// 새 저장소를 생성합니다. 파일은 첫 플러시 때 만들어집니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Vec::new(),
        }
    }

    /// CSV 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 아직 플러시하지 않은 레코드 수
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl ObservationSink for CsvObservationSink {
    fn append(&mut self, record: &MiningObservation) -> Result<(), StorageError> {
        self.pending.push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        // 실패해도 재시도하지 않음
        let records = std::mem::take(&mut self.pending);

        let flush_err = |e: std::io::Error| {
            StorageError::Flush(format!("{}: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(flush_err)?;
        }

        let needs_header = match std::fs::metadata(&self.path) {
            Ok(md) => md.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(flush_err(e)),
        };

        let mut out = String::new();
        if needs_header {
            out.push_str(CSV_HEADER);
            out.push('\n');
        }
        for record in &records {
            out.push_str(&csv_row(record));
            out.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(flush_err)?;
        file.write_all(out.as_bytes()).map_err(flush_err)?;
        file.flush().map_err(flush_err)?;

        let count = records.len();
        metrics::counter!(m::STORAGE_RECORDS_TOTAL).increment(count as u64);
        info!(path = %self.path.display(), records = count, "mining observations saved");
        Ok(())
    }
}

impl Drop for CsvObservationSink {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            debug!(
                records = self.pending.len(),
                "csv sink dropped with unflushed records"
            );
        }
    }
}

/// 레코드 하나를 CSV 행으로 직렬화합니다.
fn csv_row(record: &MiningObservation) -> String {
    format!(
        "{},{},{},{},{},{}",
        csv_field(&record.timestamp),
        csv_field(&record.material),
        record.proportion,
        record.motherlode,
        csv_field(&record.content_type),
        record.remaining
    )
}

/// 구분자/따옴표/줄바꿈이 있는 필드를 따옴표로 감쌉니다.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}
