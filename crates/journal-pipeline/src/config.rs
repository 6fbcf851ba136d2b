//! 저널 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`EdaccConfig`](edacc_core::config::EdaccConfig)에서
//! 저널 파이프라인이 사용하는 값만 평탄화하여 가져옵니다.
//!
//! # 사용 예시
//! ```ignore
//! use edacc_core::config::EdaccConfig;
//! use edacc_journal_pipeline::config::PipelineConfig;
//!
//! let core_config = EdaccConfig::default();
//! let config = PipelineConfig::from_core(&core_config);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use edacc_core::config::EdaccConfig;
use serde::{Deserialize, Serialize};

use crate::error::JournalPipelineError;

/// 저널 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 저널 디렉토리
    pub journal_dir: PathBuf,
    /// 저널 파일 이름 glob 패턴
    pub file_pattern: String,
    /// 저널을 따라 읽는 동안의 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 저널 파일이 없을 때의 대기 주기 (밀리초)
    pub idle_interval_ms: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 광물별 알림 임계값 (퍼센트)
    pub target_materials: BTreeMap<String, f64>,
    /// 남은 양 100% 소행성만 알림 대상
    pub require_full_remaining: bool,
    /// NPC 해적 경고 키워드
    pub hostile_keywords: Vec<String>,
    /// 미처리 이벤트 로그 제외 목록
    pub quiet_events: Vec<String>,
    /// 관측 기록 플러시 간격 (초)
    pub flush_interval_secs: u64,
    /// 시작 안내 문장
    pub ready_message: Option<String>,
    /// 안내 워커 종료 대기 시간 (밀리초)
    pub shutdown_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_core(&EdaccConfig::default())
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &EdaccConfig) -> Self {
        Self {
            journal_dir: PathBuf::from(&core.journal.dir),
            file_pattern: core.journal.file_pattern.clone(),
            poll_interval_ms: core.journal.poll_interval_ms,
            idle_interval_ms: core.journal.idle_interval_ms,
            max_line_length: core.journal.max_line_length,
            target_materials: core.mining.target_materials.clone(),
            require_full_remaining: core.mining.require_full_remaining,
            hostile_keywords: core.alerts.hostile_keywords.clone(),
            quiet_events: core.alerts.quiet_events.clone(),
            flush_interval_secs: core.storage.flush_interval_secs,
            ready_message: core.speech.ready_message.clone(),
            shutdown_timeout_ms: core.speech.shutdown_timeout_ms,
        }
    }

    /// 폴링 주기
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 대기 주기
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    /// 플러시 간격
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// 워커 종료 대기 시간
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), JournalPipelineError> {
        const MAX_INTERVAL_MS: u64 = 60_000;

        if self.journal_dir.as_os_str().is_empty() {
            return Err(JournalPipelineError::Config {
                field: "journal_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        glob::Pattern::new(&self.file_pattern)?;

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_INTERVAL_MS {
            return Err(JournalPipelineError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_INTERVAL_MS),
            });
        }

        if self.idle_interval_ms == 0 || self.idle_interval_ms > MAX_INTERVAL_MS {
            return Err(JournalPipelineError::Config {
                field: "idle_interval_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_INTERVAL_MS),
            });
        }

        if self.max_line_length == 0 {
            return Err(JournalPipelineError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.flush_interval_secs == 0 {
            return Err(JournalPipelineError::Config {
                field: "flush_interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        for (material, threshold) in &self.target_materials {
            if !threshold.is_finite() {
                return Err(JournalPipelineError::Config {
                    field: "target_materials".to_owned(),
                    reason: format!("threshold for '{}' must be finite", material),
                });
            }
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
///
/// 테스트와 데몬 조립 코드에서 필요한 값만 덮어쓸 때 사용합니다.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 저널 디렉토리를 설정합니다.
    pub fn journal_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.journal_dir = dir.into();
        self
    }

    /// 저널 파일 패턴을 설정합니다.
    pub fn file_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.file_pattern = pattern.into();
        self
    }

    /// 폴링 주기(밀리초)를 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 대기 주기(밀리초)를 설정합니다.
    pub fn idle_interval_ms(mut self, ms: u64) -> Self {
        self.config.idle_interval_ms = ms;
        self
    }

    /// 최대 라인 길이를 설정합니다.
    pub fn max_line_length(mut self, len: usize) -> Self {
        self.config.max_line_length = len;
        self
    }

    /// 광물 임계값 하나를 추가하거나 덮어씁니다.
    pub fn target(mut self, material: impl Into<String>, threshold: f64) -> Self {
        self.config
            .target_materials
            .insert(material.into(), threshold);
        self
    }

    /// 광물 임계값 전체를 교체합니다.
    pub fn target_materials(mut self, targets: BTreeMap<String, f64>) -> Self {
        self.config.target_materials = targets;
        self
    }

    /// 남은 양 100% 조건을 설정합니다.
    pub fn require_full_remaining(mut self, required: bool) -> Self {
        self.config.require_full_remaining = required;
        self
    }

    /// 해적 경고 키워드를 설정합니다.
    pub fn hostile_keywords(mut self, keywords: Vec<String>) -> Self {
        self.config.hostile_keywords = keywords;
        self
    }

    /// 플러시 간격(초)을 설정합니다.
    pub fn flush_interval_secs(mut self, secs: u64) -> Self {
        self.config.flush_interval_secs = secs;
        self
    }

    /// 시작 안내 문장을 설정합니다.
    pub fn ready_message(mut self, message: Option<String>) -> Self {
        self.config.ready_message = message;
        self
    }

    /// 워커 종료 대기 시간(밀리초)을 설정합니다.
    pub fn shutdown_timeout_ms(mut self, ms: u64) -> Self {
        self.config.shutdown_timeout_ms = ms;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, JournalPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
