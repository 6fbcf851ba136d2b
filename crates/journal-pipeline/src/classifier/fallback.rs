//! 대체 추출기 -- 엄격 디코딩에 실패한 라인에서 패턴으로 필드를 찾아냅니다.
//!
//! 게임이 라인을 기록하는 도중에 읽혀 JSON이 깨진 경우에도
//! 필요한 조각이 남아 있으면 같은 타입의 이벤트를 만들어냅니다.

use regex::Regex;

use edacc_core::event::{ClassifiedEvent, EVENT_PROSPECTED_ASTEROID, EVENT_RECEIVE_TEXT};
use edacc_core::types::{ChatChannel, ChatMessage, MaterialShare, ProspectedAsteroid};

use super::strict::{MaterialRecord, into_shares};
use super::{DEFAULT_CONTENT_TYPE, now_timestamp};
use crate::error::JournalPipelineError;

/// 숫자 리터럴 패턴 (JSON number)
const NUMBER: &str = r"-?[0-9]+(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?";

/// 문자열 필드 하나를 찾는 패턴을 만듭니다.
///
/// 이스케이프된 따옴표(`\"`)는 리터럴의 일부로 봅니다.
fn string_field(name: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r#""{name}"\s*:\s*"((?:[^"\\]|\\.)+)""#))
}

/// 패턴 기반 필드 추출기
///
/// 정규식은 생성 시 한 번만 컴파일됩니다.
#[derive(Debug)]
pub struct FallbackExtractor {
    event: Regex,
    materials_array: Regex,
    materials_start: Regex,
    material_item: Regex,
    timestamp: Regex,
    remaining: Regex,
    motherlode: Regex,
    content: Regex,
    from: Regex,
    from_localised: Regex,
    message: Regex,
    message_localised: Regex,
    channel: Regex,
}

impl FallbackExtractor {
    /// 추출기를 생성합니다.
    pub fn new() -> Result<Self, JournalPipelineError> {
        Ok(Self {
            event: Regex::new(r#""event"\s*:\s*"(\w+)""#)?,
            materials_array: Regex::new(r#""Materials"\s*:\s*(\[.*?\])"#)?,
            materials_start: Regex::new(r#""Materials"\s*:\s*\["#)?,
            material_item: Regex::new(&format!(
                r#"\{{\s*"Name"\s*:\s*"([^"]+)"(?:\s*,\s*"Name_Localised"\s*:\s*"[^"]*")?\s*,\s*"Proportion"\s*:\s*({NUMBER})"#
            ))?,
            timestamp: string_field("timestamp")?,
            remaining: Regex::new(&format!(r#""Remaining"\s*:\s*({NUMBER})"#))?,
            motherlode: string_field("MotherlodeMaterial")?,
            content: string_field("Content_Localised")?,
            from: string_field("From")?,
            from_localised: string_field("From_Localised")?,
            message: string_field("Message")?,
            message_localised: string_field("Message_Localised")?,
            channel: string_field("Channel")?,
        })
    }

    /// 라인에서 이벤트를 추출합니다.
    ///
    /// 처리 대상 이벤트인데 필요한 조각이 부족하면 `None`을 반환합니다.
    /// 처리 대상이 아닌 이벤트 이름만 확인되면 `Unrecognized`를 반환합니다.
    pub fn extract(&self, line: &str) -> Option<ClassifiedEvent> {
        let event = self.capture(&self.event, line);
        let wants_mining = matches!(event.as_deref(), None | Some(EVENT_PROSPECTED_ASTEROID));
        let wants_chat = matches!(event.as_deref(), None | Some(EVENT_RECEIVE_TEXT));

        if wants_mining && let Some(asteroid) = self.mining(line) {
            return Some(ClassifiedEvent::Mining(asteroid));
        }
        if wants_chat && let Some(message) = self.chat(line) {
            return Some(ClassifiedEvent::Chat(message));
        }

        match event {
            Some(name) if !wants_mining && !wants_chat => {
                Some(ClassifiedEvent::Unrecognized { event: Some(name) })
            }
            _ => None,
        }
    }

    /// 채굴 이벤트 조각을 추출합니다. `Materials` 조각은 필수입니다.
    fn mining(&self, line: &str) -> Option<ProspectedAsteroid> {
        let materials = self.materials(line)?;

        let remaining = self
            .capture(&self.remaining, line)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);

        Some(ProspectedAsteroid {
            timestamp: self
                .capture(&self.timestamp, line)
                .unwrap_or_else(now_timestamp),
            materials,
            motherlode_material: self.capture(&self.motherlode, line),
            content_type: self
                .capture(&self.content, line)
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
            remaining,
        })
    }

    /// `Materials` 배열을 해석합니다.
    ///
    /// 배열 전체가 남아 있으면 JSON으로 디코딩하고, 잘려 있으면
    /// 항목 단위로 건져냅니다.
    fn materials(&self, line: &str) -> Option<Vec<MaterialShare>> {
        if let Some(caps) = self.materials_array.captures(line)
            && let Ok(records) = serde_json::from_str::<Vec<MaterialRecord>>(&caps[1])
        {
            return Some(into_shares(records));
        }

        let start = self.materials_start.find(line)?.end();
        let salvaged: Vec<MaterialShare> = self
            .material_item
            .captures_iter(&line[start..])
            .filter_map(|caps| {
                let proportion = caps[2].parse::<f64>().ok()?;
                Some(MaterialShare::new(unescape(&caps[1]), proportion))
            })
            .collect();

        if salvaged.is_empty() {
            None
        } else {
            Some(salvaged)
        }
    }

    /// 통신 이벤트 조각을 추출합니다. `From`, `Message`, `Channel` 모두 필수입니다.
    fn chat(&self, line: &str) -> Option<ChatMessage> {
        let from = self.capture(&self.from, line)?;
        let message = self.capture(&self.message, line)?;
        let channel = self.capture(&self.channel, line)?;

        Some(ChatMessage {
            timestamp: self
                .capture(&self.timestamp, line)
                .unwrap_or_else(now_timestamp),
            sender: self.capture(&self.from_localised, line).unwrap_or(from),
            channel: ChatChannel::from_journal(&channel),
            text: self
                .capture(&self.message_localised, line)
                .unwrap_or(message),
        })
    }

    fn capture(&self, re: &Regex, line: &str) -> Option<String> {
        re.captures(line).map(|caps| unescape(&caps[1]))
    }
}

/// JSON 문자열 이스케이프를 풀어봅니다. 실패하면 원문을 그대로 씁니다.
fn unescape(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_owned();
    }
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_owned())
}
