//! 설정 관리 -- edacc.toml 파싱 및 런타임 설정
//!
//! [`EdaccConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`EDACC_JOURNAL_DIR=/path` 형식)
//! 3. 설정 파일 (`edacc.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), edacc_core::error::EdaccError> {
//! use edacc_core::config::EdaccConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = EdaccConfig::load("edacc.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = EdaccConfig::parse("[mining]\nrequire_full_remaining = false")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, EdaccError};

/// 폴링 주기 허용 범위 (밀리초)
const POLL_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=60_000;

/// EDACC 통합 설정
///
/// `edacc.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdaccConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 저널 감시 설정
    #[serde(default)]
    pub journal: JournalConfig,
    /// 채굴 알림 설정
    #[serde(default)]
    pub mining: MiningConfig,
    /// 통신 알림 설정
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// 음성 안내 설정
    #[serde(default)]
    pub speech: SpeechConfig,
    /// 관측 기록 저장 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

impl EdaccConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, EdaccError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본 설정 파일을 만든 뒤 로드합니다.
    ///
    /// 파일이 이미 있으면 [`EdaccConfig::load`]와 동일합니다.
    pub async fn load_or_create(path: impl AsRef<Path>) -> Result<Self, EdaccError> {
        let path = path.as_ref();
        match Self::from_file(path).await {
            Ok(mut config) => {
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(EdaccError::Config(ConfigError::FileNotFound { .. })) => {
                let mut config = Self::default();
                config.write_to(path).await?;
                info!(path = %path.display(), "default configuration created");
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            Err(e) => Err(e),
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, EdaccError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EdaccError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                EdaccError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, EdaccError> {
        toml::from_str(toml_str).map_err(|e| {
            EdaccError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 현재 설정을 TOML 파일로 저장합니다.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), EdaccError> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            EdaccError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `EDACC_{SECTION}_{FIELD}`
    /// 예: `EDACC_JOURNAL_DIR=/mnt/journal`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "EDACC_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "EDACC_GENERAL_LOG_FORMAT");

        // Journal
        override_string(&mut self.journal.dir, "EDACC_JOURNAL_DIR");
        override_string(&mut self.journal.file_pattern, "EDACC_JOURNAL_FILE_PATTERN");
        override_u64(
            &mut self.journal.poll_interval_ms,
            "EDACC_JOURNAL_POLL_INTERVAL_MS",
        );
        override_u64(
            &mut self.journal.idle_interval_ms,
            "EDACC_JOURNAL_IDLE_INTERVAL_MS",
        );

        // Mining
        override_thresholds(
            &mut self.mining.target_materials,
            "EDACC_MINING_TARGET_MATERIALS",
        );
        override_bool(
            &mut self.mining.require_full_remaining,
            "EDACC_MINING_REQUIRE_FULL_REMAINING",
        );

        // Alerts
        override_csv(
            &mut self.alerts.hostile_keywords,
            "EDACC_ALERTS_HOSTILE_KEYWORDS",
        );

        // Speech
        override_string(&mut self.speech.backend, "EDACC_SPEECH_BACKEND");
        override_string(&mut self.speech.command, "EDACC_SPEECH_COMMAND");

        // Storage
        override_bool(&mut self.storage.enabled, "EDACC_STORAGE_ENABLED");
        override_string(&mut self.storage.path, "EDACC_STORAGE_PATH");
        override_u64(
            &mut self.storage.flush_interval_secs,
            "EDACC_STORAGE_FLUSH_INTERVAL_SECS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), EdaccError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.journal.dir.trim().is_empty() {
            return Err(invalid("journal.dir", "must not be empty"));
        }

        if let Err(e) = glob::Pattern::new(&self.journal.file_pattern) {
            return Err(invalid(
                "journal.file_pattern",
                format!("invalid glob '{}': {}", self.journal.file_pattern, e),
            ));
        }

        if !POLL_INTERVAL_RANGE_MS.contains(&self.journal.poll_interval_ms) {
            return Err(invalid(
                "journal.poll_interval_ms",
                format!(
                    "must be {}-{}",
                    POLL_INTERVAL_RANGE_MS.start(),
                    POLL_INTERVAL_RANGE_MS.end()
                ),
            ));
        }

        if !POLL_INTERVAL_RANGE_MS.contains(&self.journal.idle_interval_ms) {
            return Err(invalid(
                "journal.idle_interval_ms",
                format!(
                    "must be {}-{}",
                    POLL_INTERVAL_RANGE_MS.start(),
                    POLL_INTERVAL_RANGE_MS.end()
                ),
            ));
        }

        if self.journal.max_line_length == 0 {
            return Err(invalid("journal.max_line_length", "must be greater than 0"));
        }

        for (material, threshold) in &self.mining.target_materials {
            if material.is_empty() {
                return Err(invalid(
                    "mining.target_materials",
                    "material name must not be empty",
                ));
            }
            if !threshold.is_finite() || !(0.0..=100.0).contains(threshold) {
                return Err(invalid(
                    "mining.target_materials",
                    format!("threshold for '{}' must be 0-100, got {}", material, threshold),
                ));
            }
        }

        let valid_backends = ["command", "log"];
        if !valid_backends.contains(&self.speech.backend.as_str()) {
            return Err(invalid(
                "speech.backend",
                format!("must be one of: {}", valid_backends.join(", ")),
            ));
        }

        if self.speech.backend == "command" && self.speech.command.trim().is_empty() {
            return Err(invalid(
                "speech.command",
                "command must not be empty when backend is 'command'",
            ));
        }

        if self.storage.enabled {
            if self.storage.path.trim().is_empty() {
                return Err(invalid(
                    "storage.path",
                    "path must not be empty when storage is enabled",
                ));
            }
            if self.storage.flush_interval_secs == 0 {
                return Err(invalid(
                    "storage.flush_interval_secs",
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> EdaccError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 저널 감시 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// 저널 디렉토리
    pub dir: String,
    /// 저널 파일 이름 glob 패턴
    pub file_pattern: String,
    /// 저널을 따라 읽는 동안의 폴링 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 저널 파일이 없을 때의 대기 주기 (밀리초)
    pub idle_interval_ms: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            dir: default_journal_dir().display().to_string(),
            file_pattern: "Journal.*.log".to_owned(),
            poll_interval_ms: 100,
            idle_interval_ms: 1000,
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 게임이 저널을 기록하는 기본 위치
fn default_journal_dir() -> PathBuf {
    let relative = Path::new("Saved Games")
        .join("Frontier Developments")
        .join("Elite Dangerous");
    match dirs::home_dir() {
        Some(home) => home.join(relative),
        None => relative,
    }
}

/// 채굴 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// 광물별 알림 임계값 (퍼센트, 이상이면 알림)
    pub target_materials: BTreeMap<String, f64>,
    /// 남은 양이 100%인 소행성만 알림 대상으로 삼을지 여부
    pub require_full_remaining: bool,
}

impl Default for MiningConfig {
    fn default() -> Self {
        let target_materials = [("Platinum", 50.0), ("Gold", 50.0), ("Painite", 50.0)]
            .into_iter()
            .map(|(name, pct)| (name.to_owned(), pct))
            .collect();
        Self {
            target_materials,
            require_full_remaining: true,
        }
    }
}

/// 통신 알림 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// NPC 메시지를 해적 경고로 바꾸는 키워드 (대소문자 무시 부분 문자열)
    pub hostile_keywords: Vec<String>,
    /// 미처리 이벤트 디버그 로그에서 제외할 이벤트 이름
    pub quiet_events: Vec<String>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            hostile_keywords: ["cargo", "surrender", "let me see", "hand over", "pirate"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            quiet_events: ["Music", "Status", "NavRoute"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// 음성 안내 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// 음성 백엔드 (command, log)
    pub backend: String,
    /// 음성 합성 프로그램
    pub command: String,
    /// 음성 합성 프로그램 인자 (안내 문장은 마지막 인자로 추가됨)
    pub args: Vec<String>,
    /// 시작 시 안내 문장 (없으면 생략)
    pub ready_message: Option<String>,
    /// 종료 시 워커 대기 시간 (밀리초)
    pub shutdown_timeout_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: "command".to_owned(),
            command: "espeak".to_owned(),
            args: vec!["-s".to_owned(), "150".to_owned()],
            ready_message: Some("Elite Dangerous assistant ready".to_owned()),
            shutdown_timeout_ms: 2000,
        }
    }
}

/// 관측 기록 저장 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// CSV 파일 경로
    pub path: String,
    /// 주기적 플러시 간격 (초)
    pub flush_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "mining_statistics.csv".to_owned(),
            flush_interval_secs: 600,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split(',').map(|s| s.trim().to_owned()).collect();
    }
}

/// `Platinum=45,Painite=60` 형식의 임계값 목록으로 덮어씁니다.
///
/// 항목 하나라도 잘못되면 전체를 무시합니다.
fn override_thresholds(target: &mut BTreeMap<String, f64>, env_key: &str) {
    let Ok(val) = std::env::var(env_key) else {
        return;
    };

    let mut parsed = BTreeMap::new();
    for item in val.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((name, pct)) = item.split_once('=') else {
            warn!(env_key, item, "expected Material=percent, ignoring env var");
            return;
        };
        match pct.trim().parse::<f64>() {
            Ok(pct) => {
                parsed.insert(name.trim().to_owned(), pct);
            }
            Err(_) => {
                warn!(env_key, item, "failed to parse threshold, ignoring env var");
                return;
            }
        }
    }
    *target = parsed;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = EdaccConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.journal.file_pattern, "Journal.*.log");
        assert_eq!(config.journal.poll_interval_ms, 100);
        assert_eq!(config.journal.idle_interval_ms, 1000);
        assert_eq!(config.mining.target_materials.get("Platinum"), Some(&50.0));
        assert!(config.mining.require_full_remaining);
        assert_eq!(config.storage.flush_interval_secs, 600);
        assert!(config.journal.dir.ends_with("Elite Dangerous"));
    }

    #[test]
    fn default_config_passes_validation() {
        EdaccConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = EdaccConfig::parse("").unwrap();
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.speech.command, "espeak");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[journal]
dir = "/games/journal"

[mining]
require_full_remaining = false

[mining.target_materials]
Platinum = 30.0
"#;
        let config = EdaccConfig::parse(toml).unwrap();
        assert_eq!(config.journal.dir, "/games/journal");
        // file_pattern은 기본값 유지
        assert_eq!(config.journal.file_pattern, "Journal.*.log");
        assert!(!config.mining.require_full_remaining);
        assert_eq!(config.mining.target_materials.len(), 1);
        assert_eq!(config.mining.target_materials["Platinum"], 30.0);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = EdaccConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            EdaccError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = EdaccConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_bad_glob() {
        let mut config = EdaccConfig::default();
        config.journal.file_pattern = "Journal.[.log".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("file_pattern"));
    }

    #[test]
    fn validate_rejects_poll_interval_out_of_range() {
        let mut config = EdaccConfig::default();
        config.journal.poll_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn validate_rejects_threshold_above_hundred() {
        let mut config = EdaccConfig::default();
        config
            .mining
            .target_materials
            .insert("Painite".to_owned(), 120.0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Painite"));
    }

    #[test]
    fn validate_rejects_nan_threshold() {
        let mut config = EdaccConfig::default();
        config
            .mining
            .target_materials
            .insert("Gold".to_owned(), f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_command_for_command_backend() {
        let mut config = EdaccConfig::default();
        config.speech.command = " ".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("speech.command"));

        // log 백엔드에서는 명령이 필요 없음
        config.speech.backend = "log".to_owned();
        config.validate().unwrap();
    }

    #[test]
    fn validate_skips_storage_checks_when_disabled() {
        let mut config = EdaccConfig::default();
        config.storage.enabled = false;
        config.storage.flush_interval_secs = 0;
        config.validate().unwrap();
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_EDACC_STR", "overridden") };
        override_string(&mut val, "TEST_EDACC_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_EDACC_STR") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_EDACC_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_EDACC_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_EDACC_BOOL_BAD") };
    }

    #[test]
    fn env_override_thresholds() {
        let mut val = BTreeMap::new();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_EDACC_THRESHOLDS", "Platinum=45, Painite = 60.5") };
        override_thresholds(&mut val, "TEST_EDACC_THRESHOLDS");
        assert_eq!(val.len(), 2);
        assert_eq!(val["Painite"], 60.5);
        unsafe { std::env::remove_var("TEST_EDACC_THRESHOLDS") };
    }

    #[test]
    fn env_override_thresholds_malformed_keeps_original() {
        let mut val = BTreeMap::from([("Gold".to_owned(), 50.0)]);
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_EDACC_THRESHOLDS_BAD", "Platinum=abc") };
        override_thresholds(&mut val, "TEST_EDACC_THRESHOLDS_BAD");
        assert_eq!(val.len(), 1);
        assert_eq!(val["Gold"], 50.0);
        unsafe { std::env::remove_var("TEST_EDACC_THRESHOLDS_BAD") };
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = EdaccConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = EdaccConfig::parse(&toml_str).unwrap();
        assert_eq!(config.journal.dir, parsed.journal.dir);
        assert_eq!(
            config.mining.target_materials,
            parsed.mining.target_materials
        );
        assert_eq!(config.speech.ready_message, parsed.speech.ready_message);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = EdaccConfig::from_file("/nonexistent/path/edacc.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EdaccError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edacc.toml");

        let config = EdaccConfig::load_or_create(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.journal.file_pattern, "Journal.*.log");

        // 두 번째 로드는 생성된 파일을 그대로 읽음
        let again = EdaccConfig::load_or_create(&path).await.unwrap();
        assert_eq!(again.mining.target_materials, config.mining.target_materials);
    }
}
