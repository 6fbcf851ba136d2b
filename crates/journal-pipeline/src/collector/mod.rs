//! 저널 수집 모듈 -- 저널 파일을 찾아 새로 추가된 라인을 수집합니다.
//!
//! # 구성
//! - [`FileCursor`]: 최신 저널 파일 탐색과 읽기 오프셋 추적
//! - [`LineAssembler`]: 바이트 조각을 완성된 라인으로 조립
//!
//! 두 구성 요소 모두 수집 루프가 단독으로 소유합니다.

pub mod assembler;
pub mod cursor;

pub use assembler::LineAssembler;
pub use cursor::{CursorChange, FileCursor, TailRead, resolve_latest};
