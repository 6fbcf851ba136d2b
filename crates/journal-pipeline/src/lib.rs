#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 최신 저널 파일 탐색, 바이트 오프셋 추적, 라인 조립
//! - [`classifier`]: 엄격 JSON 해석과 정규식 기반 부분 추출의 2단계 이벤트 분류
//! - [`alert`]: 목표 광물 임계값과 통신 채널 규칙으로 안내 문장 생성
//! - [`announce`]: 안내 큐와 전용 음성 워커 스레드
//! - [`speech`]: 외부 TTS 프로그램/로그 음성 합성기
//! - [`sink`]: 채굴 관측 CSV 저장소
//! - [`stats`]: 세션 채굴 통계
//! - [`pipeline`]: 전체 파이프라인 오케스트레이션 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! Journal.*.log -> FileCursor -> LineAssembler -> EventClassifier -> AlertEvaluator
//!                                                       |                 |
//!                                              CsvObservationSink  AnnouncementQueue -> Speaker
//! ```

pub mod alert;
pub mod announce;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod speech;
pub mod stats;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{CounterSnapshot, IngestionLoop, JournalPipeline, JournalPipelineBuilder, TailState};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::JournalPipelineError;

// 분류
pub use classifier::{Classification, DecodePath, EventClassifier};

// 수집기
pub use collector::{FileCursor, LineAssembler};

// 안내
pub use alert::AlertEvaluator;
pub use announce::{AnnouncementQueue, AnnouncementWorker, WorkerReport, announcement_channel};
pub use speech::{CommandSpeaker, LogSpeaker, speaker_from_config};

// 저장/통계
pub use sink::CsvObservationSink;
pub use stats::MiningStats;
