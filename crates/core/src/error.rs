//! 에러 타입 -- 도메인별 에러 정의

/// EDACC 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum EdaccError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 관측 기록 저장소 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 음성 안내 에러
    #[error("speech error: {0}")]
    Speech(#[from] SpeechError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 이미 실행 중
    #[error("pipeline already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline not running")]
    NotRunning,
}

/// 관측 기록 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 기록 추가 실패
    #[error("append failed: {0}")]
    Append(String),

    /// 플러시 실패
    #[error("flush failed: {0}")]
    Flush(String),
}

/// 음성 안내 에러
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// 음성 합성 프로그램 실행 실패
    #[error("failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// 음성 합성 프로그램이 실패 상태로 종료
    #[error("'{program}' exited with {status}")]
    Exit { program: String, status: String },
}
