//! 음성 합성 백엔드
//!
//! - [`CommandSpeaker`]: 외부 TTS 프로그램(기본 `espeak`)을 실행하고 종료까지 대기
//! - [`LogSpeaker`]: 음성 없이 로그로만 안내 (TTS가 없는 환경/테스트용)

use std::process::{Command, Stdio};

use tracing::{debug, info};

use edacc_core::config::SpeechConfig;
use edacc_core::error::SpeechError;
use edacc_core::pipeline::Speaker;

/// 외부 프로그램 기반 음성 합성기
///
/// 안내 문장은 설정된 인자 뒤에 마지막 인자로 전달됩니다.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// 새 음성 합성기를 생성합니다.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Speaker for CommandSpeaker {
    fn name(&self) -> &str {
        &self.program
    }

    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        debug!(program = %self.program, text, "invoking speech command");

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| SpeechError::Launch {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(SpeechError::Exit {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// 로그 전용 음성 합성기
#[derive(Debug, Clone, Default)]
pub struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn name(&self) -> &str {
        "log"
    }

    fn announce(&mut self, text: &str) -> Result<(), SpeechError> {
        info!("ANNOUNCEMENT: {}", text);
        Ok(())
    }
}

/// 설정에 맞는 음성 합성기를 생성합니다.
///
/// 알 수 없는 백엔드 이름은 설정 검증 단계에서 걸러지므로,
/// 여기서는 `command`가 아니면 로그 백엔드를 사용합니다.
pub fn speaker_from_config(config: &SpeechConfig) -> Box<dyn Speaker> {
    match config.backend.as_str() {
        "command" => Box::new(CommandSpeaker::new(
            config.command.clone(),
            config.args.clone(),
        )),
        _ => Box::new(LogSpeaker),
    }
}
