//! 음성 안내 큐와 워커
//!
//! 수집 루프는 [`AnnouncementQueue::enqueue`]로 안내를 넣고 즉시 다음 라인으로 넘어갑니다.
//! 전용 스레드에서 도는 [`AnnouncementWorker`]가 큐의 앞에서부터 하나씩 꺼내
//! 블로킹 음성 합성기를 호출합니다.
//!
//! # 순서 보장
//! 큐는 무제한 FIFO 채널이며 소비자는 워커 하나뿐이므로,
//! 안내는 넣은 순서 그대로 읽힙니다.
//!
//! # 종료 정책
//! 정지 신호를 받으면 진행 중인 호출은 끝까지 마치고,
//! 큐에 남은 안내는 버립니다 (버린 개수를 로그로 남김).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use edacc_core::event::Announcement;
use edacc_core::metrics as m;
use edacc_core::pipeline::Speaker;

use crate::error::JournalPipelineError;

/// 워커 스레드 이름
const WORKER_THREAD_NAME: &str = "edacc-announcer";

/// 큐 메시지
#[derive(Debug)]
enum QueueMessage {
    /// 안내 요청
    Speak(Announcement),
    /// 대기 중인 워커를 깨워 종료시킴
    Stop,
}

/// 안내 큐 (생산자 측)
///
/// 복제하여 여러 곳에서 사용할 수 있습니다.
#[derive(Debug, Clone)]
pub struct AnnouncementQueue {
    tx: mpsc::UnboundedSender<QueueMessage>,
    depth: Arc<AtomicUsize>,
}

impl AnnouncementQueue {
    /// 안내를 큐 끝에 넣습니다. 호출자를 블로킹하지 않습니다.
    pub fn enqueue(&self, announcement: Announcement) {
        let text = announcement.text.clone();
        // 워커가 먼저 꺼내가도 음수가 되지 않도록 전송 전에 증가
        let depth = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        match self.tx.send(QueueMessage::Speak(announcement)) {
            Ok(()) => {
                metrics::counter!(m::ANNOUNCE_QUEUED_TOTAL).increment(1);
                metrics::gauge!(m::ANNOUNCE_QUEUE_DEPTH).set(depth as f64);
                info!(text = %text, depth, "announcement queued");
            }
            Err(_) => {
                self.depth.fetch_sub(1, Ordering::AcqRel);
                warn!(text = %text, "announcement worker is gone, dropping announcement");
            }
        }
    }

    /// 대기 중인 안내 수
    pub fn len(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// 대기 중인 안내가 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 안내 큐 (소비자 측)
///
/// [`AnnouncementWorker::spawn`]에 넘겨 워커가 소유합니다.
#[derive(Debug)]
pub struct AnnouncementInbox {
    rx: mpsc::UnboundedReceiver<QueueMessage>,
    tx: mpsc::UnboundedSender<QueueMessage>,
    depth: Arc<AtomicUsize>,
}

impl AnnouncementInbox {
    fn dequeued(&self) {
        let depth = self.depth.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        metrics::gauge!(m::ANNOUNCE_QUEUE_DEPTH).set(depth as f64);
    }
}

/// 안내 큐 채널을 생성합니다.
pub fn announcement_channel() -> (AnnouncementQueue, AnnouncementInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));
    (
        AnnouncementQueue {
            tx: tx.clone(),
            depth: Arc::clone(&depth),
        },
        AnnouncementInbox { rx, tx, depth },
    )
}

/// 워커 종료 시 보고
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// 음성 합성기에 전달한 안내 수
    pub spoken: u64,
    /// 음성 합성기가 실패한 안내 수
    pub failed: u64,
    /// 종료 시 버린 안내 수
    pub abandoned: u64,
}

/// 음성 안내 워커
pub struct AnnouncementWorker {
    handle: Option<JoinHandle<WorkerReport>>,
    stop: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<QueueMessage>,
}

impl AnnouncementWorker {
    /// 전용 스레드에서 워커를 시작합니다.
    ///
    /// 스레드를 만들지 못하면 [`JournalPipelineError::WorkerSpawn`]을 반환합니다.
    pub fn spawn(
        inbox: AnnouncementInbox,
        speaker: Box<dyn Speaker>,
    ) -> Result<Self, JournalPipelineError> {
        let stop = Arc::new(AtomicBool::new(false));
        let tx = inbox.tx.clone();
        let worker_stop = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || run_worker(inbox, speaker, worker_stop))
            .map_err(|e| JournalPipelineError::WorkerSpawn(e.to_string()))?;

        Ok(Self {
            handle: Some(handle),
            stop,
            tx,
        })
    }

    /// 워커 스레드가 살아 있는지 확인합니다.
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 워커를 정지하고 종료를 기다립니다.
    ///
    /// `timeout` 안에 끝나지 않으면 스레드를 분리(detach)하고 `None`을 반환합니다.
    pub async fn stop(&mut self, timeout: Duration) -> Option<WorkerReport> {
        self.stop.store(true, Ordering::Release);
        // 수신 대기 중인 워커를 깨움 (이미 종료했다면 실패해도 무방)
        let _ = self.tx.send(QueueMessage::Stop);

        let handle = self.handle.take()?;
        let join = tokio::task::spawn_blocking(move || handle.join());

        match tokio::time::timeout(timeout, join).await {
            Ok(Ok(Ok(report))) => {
                info!(
                    spoken = report.spoken,
                    failed = report.failed,
                    abandoned = report.abandoned,
                    "announcement worker stopped"
                );
                Some(report)
            }
            Ok(Ok(Err(_))) => {
                error!("announcement worker panicked");
                None
            }
            Ok(Err(e)) => {
                error!(error = %e, "failed to join announcement worker");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "announcement worker did not stop in time, detaching"
                );
                None
            }
        }
    }
}

/// 워커 스레드 본체
fn run_worker(
    mut inbox: AnnouncementInbox,
    mut speaker: Box<dyn Speaker>,
    stop: Arc<AtomicBool>,
) -> WorkerReport {
    let mut report = WorkerReport::default();
    debug!(speaker = speaker.name(), "announcement worker started");

    while let Some(message) = inbox.rx.blocking_recv() {
        let announcement = match message {
            QueueMessage::Stop => break,
            QueueMessage::Speak(announcement) => announcement,
        };
        inbox.dequeued();

        if stop.load(Ordering::Acquire) {
            report.abandoned += 1;
            continue;
        }

        match speaker.announce(&announcement.text) {
            Ok(()) => {
                report.spoken += 1;
                metrics::counter!(m::ANNOUNCE_SPOKEN_TOTAL).increment(1);
            }
            Err(e) => {
                report.failed += 1;
                metrics::counter!(m::ANNOUNCE_FAILURES_TOTAL).increment(1);
                error!(
                    speaker = speaker.name(),
                    text = %announcement.text,
                    error = %e,
                    "announcement failed"
                );
            }
        }
    }

    // Stop 이후 남은 안내는 버림
    while let Ok(message) = inbox.rx.try_recv() {
        if matches!(message, QueueMessage::Speak(_)) {
            inbox.dequeued();
            report.abandoned += 1;
        }
    }
    if report.abandoned > 0 {
        warn!(
            abandoned = report.abandoned,
            "discarded pending announcements on shutdown"
        );
    }

    report
}
