//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 저널에서 추출한 채굴 관측 정보와 통신 메시지를 표현합니다.
//! 분류기, 알림 평가기, 저장소가 이 타입들로 데이터를 교환합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 소행성 하나에 포함된 광물과 그 비율
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialShare {
    /// 광물 이름 (저널의 `Name` 필드 그대로, 대소문자 유지)
    pub name: String,
    /// 함유 비율 (퍼센트, 원본 정밀도 유지)
    pub proportion: f64,
}

impl MaterialShare {
    /// 새 광물 비율 항목을 생성합니다.
    pub fn new(name: impl Into<String>, proportion: f64) -> Self {
        Self {
            name: name.into(),
            proportion,
        }
    }

    /// 안내 문구용 정수 퍼센트 (반올림, 0..=100으로 제한)
    pub fn display_percent(&self) -> u8 {
        display_percent(self.proportion)
    }
}

/// 비율 값을 안내용 정수 퍼센트로 변환합니다.
///
/// 소수/정수 표기 모두 가장 가까운 정수로 반올림한 뒤 0..=100으로 제한합니다.
/// NaN은 0으로 취급합니다.
pub fn display_percent(proportion: f64) -> u8 {
    if proportion.is_nan() {
        return 0;
    }
    proportion.round().clamp(0.0, 100.0) as u8
}

/// `ProspectedAsteroid` 이벤트 -- 탐사 리미펫으로 스캔한 소행성 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectedAsteroid {
    /// 이벤트 타임스탬프 (ISO-8601)
    pub timestamp: String,
    /// 광물 목록 (저널에 기록된 순서 유지)
    pub materials: Vec<MaterialShare>,
    /// 모선광(motherlode)으로 표시된 광물 이름
    pub motherlode_material: Option<String>,
    /// 함량 등급 설명 (`Content_Localised`)
    pub content_type: String,
    /// 남은 양 (퍼센트, 100이면 아직 채굴하지 않은 소행성)
    pub remaining: f64,
}

impl ProspectedAsteroid {
    /// 아직 한 번도 채굴되지 않은 소행성인지 확인합니다.
    pub fn is_pristine(&self) -> bool {
        self.remaining >= 100.0
    }

    /// 광물별 저장 레코드로 펼칩니다.
    ///
    /// 광물 하나당 [`MiningObservation`] 하나가 만들어집니다.
    pub fn observations(&self) -> Vec<MiningObservation> {
        self.materials
            .iter()
            .map(|material| MiningObservation {
                timestamp: self.timestamp.clone(),
                material: material.name.clone(),
                proportion: material.proportion,
                motherlode: self.motherlode_material.as_deref() == Some(material.name.as_str()),
                content_type: self.content_type.clone(),
                remaining: self.remaining,
            })
            .collect()
    }
}

/// 저장소에 기록되는 광물 단위 관측 레코드
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningObservation {
    /// 이벤트 타임스탬프 (ISO-8601)
    pub timestamp: String,
    /// 광물 이름
    pub material: String,
    /// 함유 비율 (퍼센트, 원본 정밀도)
    pub proportion: f64,
    /// 모선광 여부
    pub motherlode: bool,
    /// 함량 등급 설명
    pub content_type: String,
    /// 남은 양 (퍼센트)
    pub remaining: f64,
}

/// 통신 채널
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    /// 스쿼드론 채널
    Squadron,
    /// NPC 통신
    Npc,
    /// 플레이어 다이렉트 메시지
    Player,
    /// 그 외 모든 채널 (local, wing, starsystem 등)
    Other,
}

impl ChatChannel {
    /// 저널의 `Channel` 문자열을 채널로 변환합니다 (대소문자 무시).
    ///
    /// 알 수 없는 채널은 [`ChatChannel::Other`]가 됩니다.
    pub fn from_journal(channel: &str) -> Self {
        match channel.trim().to_lowercase().as_str() {
            "squadron" => Self::Squadron,
            "npc" => Self::Npc,
            "player" => Self::Player,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Squadron => write!(f, "squadron"),
            Self::Npc => write!(f, "npc"),
            Self::Player => write!(f, "player"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// `ReceiveText` 이벤트 -- 수신한 통신 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 이벤트 타임스탬프 (ISO-8601)
    pub timestamp: String,
    /// 발신자
    pub sender: String,
    /// 채널
    pub channel: ChatChannel,
    /// 메시지 본문
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asteroid() -> ProspectedAsteroid {
        ProspectedAsteroid {
            timestamp: "2025-03-01T10:00:00Z".to_owned(),
            materials: vec![
                MaterialShare::new("Platinum", 41.7),
                MaterialShare::new("Osmium", 12.2),
            ],
            motherlode_material: Some("Platinum".to_owned()),
            content_type: "High".to_owned(),
            remaining: 100.0,
        }
    }

    #[test]
    fn display_percent_rounds_to_nearest() {
        assert_eq!(display_percent(55.0), 55);
        assert_eq!(display_percent(41.5), 42);
        assert_eq!(display_percent(41.49), 41);
    }

    #[test]
    fn display_percent_clamps_out_of_range() {
        assert_eq!(display_percent(-3.0), 0);
        assert_eq!(display_percent(140.2), 100);
        assert_eq!(display_percent(f64::NAN), 0);
    }

    #[test]
    fn observations_one_per_material() {
        let records = asteroid().observations();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].material, "Platinum");
        assert!(records[0].motherlode);
        assert!(!records[1].motherlode);
        assert_eq!(records[1].proportion, 12.2);
        assert_eq!(records[1].content_type, "High");
    }

    #[test]
    fn pristine_requires_full_remaining() {
        let mut a = asteroid();
        assert!(a.is_pristine());
        a.remaining = 99.9;
        assert!(!a.is_pristine());
    }

    #[test]
    fn channel_mapping_is_case_insensitive() {
        assert_eq!(ChatChannel::from_journal("NPC"), ChatChannel::Npc);
        assert_eq!(ChatChannel::from_journal("Squadron"), ChatChannel::Squadron);
        assert_eq!(ChatChannel::from_journal("player"), ChatChannel::Player);
        assert_eq!(ChatChannel::from_journal("starsystem"), ChatChannel::Other);
        assert_eq!(ChatChannel::from_journal(""), ChatChannel::Other);
    }
}
