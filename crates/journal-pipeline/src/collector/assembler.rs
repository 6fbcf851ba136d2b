//! 라인 조립기
//!
//! 폴링마다 읽은 바이트 조각을 완성된 텍스트 라인으로 바꿉니다.
//! 줄바꿈으로 끝나지 않은 마지막 조각은 다음 호출까지 보관합니다.
//!
//! 보관은 바이트 단위로 이루어지므로, 멀티바이트 문자 중간에서 잘린 조각도
//! 다음 호출에서 온전한 문자로 복원됩니다.
//!
//! 최대 길이를 넘은 조각은 버리고, 그 라인의 나머지는 다음 `\n`까지
//! 건너뜁니다. 잘린 꼬리가 독립된 라인으로 해석되지 않습니다.

use bytes::BytesMut;
use tracing::warn;

use edacc_core::metrics as m;

/// 라인 조립기
#[derive(Debug)]
pub struct LineAssembler {
    /// 줄바꿈을 아직 만나지 못한 조각
    pending: BytesMut,
    /// 최대 라인 길이 (바이트)
    max_line_length: usize,
    /// 너무 긴 라인의 나머지를 버리는 중
    discarding: bool,
}

impl LineAssembler {
    /// 새 조립기를 생성합니다.
    pub fn new(max_line_length: usize) -> Self {
        Self {
            pending: BytesMut::new(),
            max_line_length,
            discarding: false,
        }
    }

    /// 보관 중인 조각의 길이
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 너무 긴 라인의 나머지를 건너뛰는 중인지 여부
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// 보관 중인 조각을 버립니다 (파일 전환/절단 시).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }

    /// 새로 읽은 바이트를 흡수하고 완성된 라인을 반환합니다.
    ///
    /// - 빈 입력은 상태를 바꾸지 않고 빈 목록을 반환
    /// - `\n`으로 분리하고 끝의 `\r`은 제거
    /// - 잘못된 UTF-8 시퀀스는 대체 문자로 치환
    /// - 비어 있거나 공백뿐인 라인은 제외
    pub fn absorb(&mut self, chunk: &[u8]) -> Vec<String> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let mut chunk = chunk;
        if self.discarding {
            let Some(pos) = chunk.iter().position(|&b| b == b'\n') else {
                return Vec::new();
            };
            self.discarding = false;
            chunk = &chunk[pos + 1..];
        }

        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw = self.pending.split_to(pos + 1);
            let raw = &raw[..pos];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

            if raw.len() > self.max_line_length {
                warn!(
                    length = raw.len(),
                    max = self.max_line_length,
                    "journal line exceeds max length, dropping"
                );
                continue;
            }

            let line = String::from_utf8_lossy(raw);
            if line.trim().is_empty() {
                continue;
            }
            lines.push(line.into_owned());
        }

        // 끝의 `\r` 한 바이트는 아직 줄바꿈 전일 수 있음
        if self.pending.len() > self.max_line_length + 1 {
            warn!(
                length = self.pending.len(),
                max = self.max_line_length,
                "unterminated journal fragment exceeds max length, skipping to next line"
            );
            self.pending.clear();
            self.discarding = true;
        }

        metrics::counter!(m::JOURNAL_LINES_TOTAL).increment(lines.len() as u64);
        lines
    }
}
