//! 엄격 디코더 -- 저널 라인을 완전한 JSON 레코드로 해석합니다.
//!
//! 필수 필드가 하나라도 없거나 타입이 맞지 않으면 [`JournalPipelineError::Decode`]를
//! 반환하며, 호출자는 대체 추출기로 넘어갑니다.

use serde::Deserialize;
use serde_json::Value;

use edacc_core::event::{ClassifiedEvent, EVENT_PROSPECTED_ASTEROID, EVENT_RECEIVE_TEXT};
use edacc_core::types::{ChatChannel, ChatMessage, MaterialShare, ProspectedAsteroid};

use super::{DEFAULT_CONTENT_TYPE, now_timestamp};
use crate::error::JournalPipelineError;

/// `Materials` 배열의 항목
#[derive(Debug, Deserialize)]
pub(crate) struct MaterialRecord {
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(rename = "Proportion")]
    pub(crate) proportion: f64,
}

/// 이름이 비어 있는 항목을 제외하고 광물 비율 목록으로 변환합니다.
pub(crate) fn into_shares(records: Vec<MaterialRecord>) -> Vec<MaterialShare> {
    records
        .into_iter()
        .filter(|r| !r.name.is_empty())
        .map(|r| MaterialShare::new(r.name, r.proportion))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ProspectedAsteroidRecord {
    timestamp: String,
    #[serde(rename = "Remaining")]
    remaining: f64,
    #[serde(rename = "Materials")]
    materials: Vec<MaterialRecord>,
    #[serde(rename = "MotherlodeMaterial", default)]
    motherlode_material: Option<String>,
    #[serde(rename = "Content_Localised", default)]
    content_localised: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReceiveTextRecord {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(rename = "From")]
    from: String,
    #[serde(rename = "From_Localised", default)]
    from_localised: Option<String>,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Message_Localised", default)]
    message_localised: Option<String>,
    #[serde(rename = "Channel")]
    channel: String,
}

fn decode_error(reason: impl std::fmt::Display) -> JournalPipelineError {
    JournalPipelineError::Decode {
        reason: reason.to_string(),
    }
}

/// 라인을 엄격하게 디코딩합니다.
pub(crate) fn decode(line: &str) -> Result<ClassifiedEvent, JournalPipelineError> {
    let value: Value = serde_json::from_str(line).map_err(decode_error)?;

    let event = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or_else(|| decode_error("missing 'event' discriminator"))?
        .to_owned();

    match event.as_str() {
        EVENT_PROSPECTED_ASTEROID => {
            let record: ProspectedAsteroidRecord =
                serde_json::from_value(value).map_err(decode_error)?;
            Ok(ClassifiedEvent::Mining(ProspectedAsteroid {
                timestamp: record.timestamp,
                materials: into_shares(record.materials),
                motherlode_material: record.motherlode_material,
                content_type: record
                    .content_localised
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
                remaining: record.remaining,
            }))
        }
        EVENT_RECEIVE_TEXT => {
            let record: ReceiveTextRecord = serde_json::from_value(value).map_err(decode_error)?;
            Ok(ClassifiedEvent::Chat(ChatMessage {
                timestamp: record.timestamp.unwrap_or_else(now_timestamp),
                sender: record.from_localised.unwrap_or(record.from),
                channel: ChatChannel::from_journal(&record.channel),
                text: record.message_localised.unwrap_or(record.message),
            }))
        }
        _ => Ok(ClassifiedEvent::Unrecognized { event: Some(event) }),
    }
}
