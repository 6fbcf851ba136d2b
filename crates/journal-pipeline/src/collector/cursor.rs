//! 저널 파일 커서
//!
//! 저널 디렉토리에서 가장 최근 파일을 찾고, 그 파일의 읽기 위치(바이트 오프셋)를 추적합니다.
//! `tail -f`와 유사하게 동작하되, 새 파일로 전환할 때는 처음부터가 아니라
//! 전환 시점의 파일 끝에서부터 읽기 시작합니다.
//!
//! # 로테이션 감지
//! - 더 최근의 저널 파일이 나타나면 새 세션으로 보고 전환
//! - 파일 크기 축소 감지 (truncation) 시 오프셋을 0으로 되돌림

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;
use glob::Pattern;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use edacc_core::metrics as m;

use crate::error::JournalPipelineError;

/// 한 번의 폴링에서 읽는 최대 바이트 수
const MAX_READ_CHUNK: u64 = 8 * 1024 * 1024; // 8MB

/// 디렉토리에서 패턴에 맞는 가장 최근 파일을 찾습니다.
///
/// 수정 시각이 가장 늦은 파일을 고르며, 수정 시각이 같으면 파일 이름이
/// 사전순으로 가장 뒤인 파일을 고릅니다.
/// 디렉토리가 없거나 읽을 수 없으면 로그만 남기고 `None`을 반환합니다.
pub async fn resolve_latest(dir: &Path, pattern: &Pattern) -> Option<PathBuf> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "journal directory not found");
            return None;
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "failed to list journal directory");
            return None;
        }
    };

    let mut latest: Option<(SystemTime, String, PathBuf)> = None;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read journal directory entry");
                break;
            }
        };

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !pattern.matches(name) {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(md) if md.is_file() => md,
            Ok(_) => continue,
            Err(e) => {
                debug!(file = name, error = %e, "failed to stat journal candidate");
                continue;
            }
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        let newer = match &latest {
            None => true,
            Some((best_time, best_name, _)) => {
                (modified, name) > (*best_time, best_name.as_str())
            }
        };
        if newer {
            latest = Some((modified, name.to_owned(), entry.path()));
        }
    }

    latest.map(|(_, _, path)| path)
}

/// [`FileCursor::on_resolved`] 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorChange {
    /// 같은 파일을 계속 추적
    Unchanged,
    /// 새 파일로 전환 (기존 내용은 건너뜀)
    Switched {
        /// 건너뛴 바이트 수 (전환 시점의 파일 크기)
        skipped_bytes: u64,
    },
}

/// [`FileCursor::read_new`] 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailRead {
    /// 새 데이터 없음
    Empty,
    /// 새로 추가된 바이트
    Appended(Bytes),
    /// 파일이 오프셋보다 작아짐 (오프셋을 0으로 되돌림)
    Truncated,
}

/// 저널 파일 커서
///
/// 추적 중인 파일 경로와 이미 소비한 바이트 수를 관리합니다.
/// 수집 루프만 소유하며 다른 태스크와 공유되지 않습니다.
#[derive(Debug, Default)]
pub struct FileCursor {
    path: Option<PathBuf>,
    offset: u64,
}

impl FileCursor {
    /// 빈 커서를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 추적 중인 파일 경로
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 이미 소비한 바이트 수
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// 새로 찾은 최신 파일을 커서에 반영합니다.
    ///
    /// 경로가 바뀌면 새 세션으로 보고 오프셋을 현재 파일 크기로 맞춥니다.
    /// 이전 실행에서 기록된 내용은 다시 읽지 않습니다.
    ///
    /// 읽기 실패로 잠시 놓쳤던 같은 파일이 다시 잡히면 기존 오프셋에서 이어 읽습니다.
    pub async fn on_resolved(&mut self, path: &Path) -> Result<CursorChange, JournalPipelineError> {
        if self.path.as_deref() == Some(path) {
            return Ok(CursorChange::Unchanged);
        }

        let size = tokio::fs::metadata(path).await?.len();
        let previous = self.path.replace(path.to_path_buf());
        self.offset = size;

        metrics::counter!(m::JOURNAL_ROTATIONS_TOTAL).increment(1);
        info!(
            path = %path.display(),
            previous = ?previous.as_deref().map(Path::display),
            offset = size,
            "tailing journal file"
        );

        Ok(CursorChange::Switched {
            skipped_bytes: size,
        })
    }

    /// 현재 오프셋부터 파일 끝까지 새로 추가된 바이트를 읽습니다.
    ///
    /// 파일 크기가 오프셋보다 작아졌다면 오프셋을 0으로 되돌리고
    /// [`TailRead::Truncated`]를 반환합니다. 다음 호출부터 처음부터 읽습니다.
    pub async fn read_new(&mut self) -> Result<TailRead, JournalPipelineError> {
        let Some(path) = self.path.as_deref() else {
            return Err(JournalPipelineError::Collector {
                source_type: "journal_file".to_owned(),
                reason: "no journal file resolved".to_owned(),
            });
        };

        let mut file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();

        if size < self.offset {
            warn!(
                path = %path.display(),
                offset = self.offset,
                size,
                "journal file truncated, rewinding"
            );
            self.offset = 0;
            return Ok(TailRead::Truncated);
        }
        if size == self.offset {
            return Ok(TailRead::Empty);
        }

        let want = (size - self.offset).min(MAX_READ_CHUNK);
        file.seek(SeekFrom::Start(self.offset)).await?;

        let mut buf = Vec::with_capacity(want as usize);
        let read = file.take(want).read_to_end(&mut buf).await?;
        if read == 0 {
            return Ok(TailRead::Empty);
        }

        self.offset += read as u64;
        metrics::counter!(m::JOURNAL_BYTES_READ_TOTAL).increment(read as u64);
        debug!(path = %path.display(), bytes = read, offset = self.offset, "read journal bytes");

        Ok(TailRead::Appended(Bytes::from(buf)))
    }
}
