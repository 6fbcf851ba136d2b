//! 이벤트 -- 분류기와 알림 평가기 사이의 메시지 단위
//!
//! [`ClassifiedEvent`]는 저널 한 줄을 분류한 결과이며,
//! [`Announcement`]는 음성 안내 큐로 전달되는 안내 요청입니다.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, ProspectedAsteroid};

// --- 저널 이벤트 이름 상수 ---

/// 소행성 탐사 이벤트 이름
pub const EVENT_PROSPECTED_ASTEROID: &str = "ProspectedAsteroid";
/// 통신 수신 이벤트 이름
pub const EVENT_RECEIVE_TEXT: &str = "ReceiveText";

/// 저널 한 줄의 분류 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifiedEvent {
    /// 탐사한 소행성
    Mining(ProspectedAsteroid),
    /// 수신한 통신 메시지
    Chat(ChatMessage),
    /// 처리 대상이 아닌 이벤트 (진단 카운트 전용)
    Unrecognized {
        /// 확인된 이벤트 이름 (추출하지 못했으면 None)
        event: Option<String>,
    },
}

impl ClassifiedEvent {
    /// 로그와 메트릭 레이블에 쓰는 이벤트 종류 이름
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mining(_) => "mining",
            Self::Chat(_) => "chat",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// 음성 안내 요청
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// 읽어줄 문장
    pub text: String,
}

impl Announcement {
    /// 새 안내 요청을 생성합니다.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
