//! 알림 평가 -- 분류된 이벤트를 음성 안내 문장으로 변환합니다.
//!
//! [`AlertEvaluator`]는 광물 임계값과 해적 키워드 규칙을 적용하여
//! 안내가 필요한 경우에만 [`Announcement`]를 생성합니다.
//! 이벤트 하나당 안내는 최대 하나입니다.

use std::collections::BTreeMap;

use tracing::{debug, info};

use edacc_core::event::{Announcement, ClassifiedEvent};
use edacc_core::types::{ChatChannel, ChatMessage, ProspectedAsteroid};

use crate::config::PipelineConfig;

/// 알림 평가기
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    /// 광물별 임계값 (퍼센트, 이상이면 알림)
    thresholds: BTreeMap<String, f64>,
    /// 남은 양 100% 조건 사용 여부
    require_full_remaining: bool,
    /// 소문자로 정규화한 해적 키워드
    hostile_keywords: Vec<String>,
}

impl AlertEvaluator {
    /// 새 평가기를 생성합니다.
    pub fn new(
        thresholds: BTreeMap<String, f64>,
        require_full_remaining: bool,
        hostile_keywords: &[String],
    ) -> Self {
        Self {
            thresholds,
            require_full_remaining,
            hostile_keywords: hostile_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// 파이프라인 설정에서 평가기를 생성합니다.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.target_materials.clone(),
            config.require_full_remaining,
            &config.hostile_keywords,
        )
    }

    /// 이벤트를 평가하고 필요하면 안내를 반환합니다.
    pub fn evaluate(&self, event: &ClassifiedEvent) -> Option<Announcement> {
        match event {
            ClassifiedEvent::Mining(asteroid) => self.evaluate_mining(asteroid),
            ClassifiedEvent::Chat(message) => self.evaluate_chat(message),
            ClassifiedEvent::Unrecognized { .. } => None,
        }
    }

    /// 채굴 이벤트 평가
    ///
    /// 광물 목록 순서대로 검사하여 임계값 이상인 첫 광물만 안내합니다.
    fn evaluate_mining(&self, asteroid: &ProspectedAsteroid) -> Option<Announcement> {
        if self.require_full_remaining && !asteroid.is_pristine() {
            debug!(
                remaining = asteroid.remaining,
                "asteroid already mined, skipping alert"
            );
            return None;
        }

        let hit = asteroid.materials.iter().find(|material| {
            self.thresholds
                .get(&material.name)
                .is_some_and(|threshold| material.proportion >= *threshold)
        })?;

        info!(
            material = %hit.name,
            proportion = hit.proportion,
            remaining = asteroid.remaining,
            "target material found"
        );
        Some(Announcement::new(format!(
            "{} asteroid found with {} percent content",
            hit.name,
            hit.display_percent()
        )))
    }

    /// 통신 이벤트 평가
    fn evaluate_chat(&self, message: &ChatMessage) -> Option<Announcement> {
        let text = match message.channel {
            ChatChannel::Squadron => format!(
                "message from squadron member {} saying: {}",
                message.sender, message.text
            ),
            ChatChannel::Npc if self.is_hostile(&message.text) => {
                format!("NPC pirate alert: {}", message.text)
            }
            ChatChannel::Npc => format!("NPC message: {}", message.text),
            ChatChannel::Player => format!(
                "player message from {} saying: {}",
                message.sender, message.text
            ),
            ChatChannel::Other => {
                info!(
                    sender = %message.sender,
                    text = %message.text,
                    "chat message on unannounced channel"
                );
                return None;
            }
        };
        Some(Announcement::new(text))
    }

    /// 해적 키워드 포함 여부 (대소문자 무시)
    fn is_hostile(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.hostile_keywords.iter().any(|k| lower.contains(k))
    }
}
