//! 파이프라인 trait -- 외부 협력자와 생명주기 확장 포인트 정의

use std::future::Future;

use crate::error::{EdaccError, SpeechError, StorageError};
use crate::types::MiningObservation;

/// 음성 합성기 trait
///
/// 호출이 끝날 때까지 블로킹되며 수백 밀리초에서 수 초가 걸릴 수 있습니다.
/// 안내 워커 스레드에서만 호출됩니다.
pub trait Speaker: Send + Sync {
    /// 음성 합성기 이름 (로그용)
    fn name(&self) -> &str;

    /// 문장을 읽어줍니다.
    fn announce(&mut self, text: &str) -> Result<(), SpeechError>;
}

/// 채굴 관측 기록 저장소 trait
pub trait ObservationSink: Send + Sync {
    /// 레코드 하나를 추가합니다.
    fn append(&mut self, record: &MiningObservation) -> Result<(), StorageError>;

    /// 버퍼에 쌓인 레코드를 영구 저장소로 내보냅니다.
    fn flush(&mut self) -> Result<(), StorageError>;
}

/// 모듈 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 일부 기능 저하
    Degraded(String),
    /// 동작 불가
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 동작 불가 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 파이프라인 생명주기 trait
///
/// `edacc-daemon`은 이 trait으로 파이프라인을 시작하고 정지합니다.
pub trait Pipeline: Send {
    /// 파이프라인을 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), EdaccError>> + Send;

    /// 파이프라인을 정지합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), EdaccError>> + Send;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
