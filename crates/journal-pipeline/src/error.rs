//! 저널 파이프라인 에러 타입
//!
//! [`JournalPipelineError`]는 저널 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<JournalPipelineError> for EdaccError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use edacc_core::error::{EdaccError, PipelineError};

/// 저널 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum JournalPipelineError {
    /// 수집기 에러 (파일 I/O 등)
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 수집 소스 유형 (journal_dir, journal_file 등)
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// 저널 라인 해석 실패
    #[error("decode error: {reason}")]
    Decode {
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 안내 워커 스레드 생성 실패
    #[error("failed to spawn announcement worker: {0}")]
    WorkerSpawn(String),

    /// glob 패턴 에러
    #[error("pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<JournalPipelineError> for EdaccError {
    fn from(err: JournalPipelineError) -> Self {
        // 파이프라인 밖으로 전파되는 에러는 모두 빌드/시작 단계에서 발생
        EdaccError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collector_error_display() {
        let err = JournalPipelineError::Collector {
            source_type: "journal_dir".to_owned(),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("journal_dir"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn converts_to_edacc_error() {
        let err = JournalPipelineError::WorkerSpawn("resource limit".to_owned());
        let edacc_err: EdaccError = err.into();
        assert!(matches!(
            edacc_err,
            EdaccError::Pipeline(PipelineError::InitFailed(_))
        ));
    }

    #[test]
    fn pattern_error_converts() {
        let err: JournalPipelineError = glob::Pattern::new("Journal.[").unwrap_err().into();
        assert!(err.to_string().starts_with("pattern error"));
    }
}
