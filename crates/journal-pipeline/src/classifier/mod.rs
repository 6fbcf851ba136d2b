//! 이벤트 분류 모듈 -- 저널 라인을 구조화된 이벤트로 분류합니다.
//!
//! # 분류 순서
//! 1. [`strict`]: 완전한 JSON 레코드로 디코딩 (필수 필드 모두 필요)
//! 2. [`fallback`]: 실패하면 정규식으로 필요한 조각을 추출
//! 3. 둘 다 실패하면 `Unrecognized { event: None }`
//!
//! 비율 값은 원래 정밀도를 그대로 유지하며, 안내용 반올림은
//! [`MaterialShare::display_percent`](edacc_core::types::MaterialShare::display_percent)가 담당합니다.

pub mod fallback;
pub(crate) mod strict;

pub use fallback::FallbackExtractor;

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use edacc_core::event::ClassifiedEvent;
use edacc_core::metrics as m;

use crate::error::JournalPipelineError;

/// `Content_Localised`가 없을 때의 함량 등급
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "Unknown";

/// 타임스탬프가 없는 이벤트에 쓰는 현재 시각 (RFC 3339, UTC)
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 이벤트를 해석한 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    /// 엄격 디코더
    Strict,
    /// 대체 추출기
    Fallback,
    /// 두 경로 모두 실패
    Failed,
}

impl DecodePath {
    /// 메트릭 레이블 값
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Fallback => "fallback",
            Self::Failed => "failed",
        }
    }
}

/// 분류 결과와 해석 경로
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// 분류된 이벤트
    pub event: ClassifiedEvent,
    /// 해석 경로
    pub path: DecodePath,
}

/// 이벤트 분류기
#[derive(Debug)]
pub struct EventClassifier {
    fallback: FallbackExtractor,
}

impl EventClassifier {
    /// 새 분류기를 생성합니다.
    pub fn new() -> Result<Self, JournalPipelineError> {
        Ok(Self {
            fallback: FallbackExtractor::new()?,
        })
    }

    /// 라인을 분류합니다.
    pub fn classify(&self, line: &str) -> ClassifiedEvent {
        self.classify_detailed(line).event
    }

    /// 라인을 분류하고 어떤 경로로 해석했는지 함께 반환합니다.
    pub fn classify_detailed(&self, line: &str) -> Classification {
        let classification = match strict::decode(line) {
            Ok(event) => Classification {
                event,
                path: DecodePath::Strict,
            },
            Err(strict_err) => match self.fallback.extract(line) {
                Some(event) => {
                    debug!(error = %strict_err, kind = event.kind(), "recovered event with fallback extractor");
                    Classification {
                        event,
                        path: DecodePath::Fallback,
                    }
                }
                None => {
                    debug!(error = %strict_err, line_len = line.len(), "dropping undecodable journal line");
                    metrics::counter!(m::JOURNAL_DECODE_FAILURES_TOTAL).increment(1);
                    Classification {
                        event: ClassifiedEvent::Unrecognized { event: None },
                        path: DecodePath::Failed,
                    }
                }
            },
        };

        metrics::counter!(
            m::JOURNAL_EVENTS_TOTAL,
            m::LABEL_KIND => classification.event.kind(),
            m::LABEL_PATH => classification.path.as_str()
        )
        .increment(1);

        classification
    }
}
