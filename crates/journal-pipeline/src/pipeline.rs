//! 파이프라인 오케스트레이션 -- 수집/분류/평가/안내의 전체 흐름을 관리합니다.
//!
//! [`JournalPipeline`]은 core의 [`Pipeline`](edacc_core::pipeline::Pipeline) trait을 구현하여
//! `edacc-daemon`에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! IngestionLoop (tokio task)                        AnnouncementWorker (thread)
//!   FileCursor -> LineAssembler -> EventClassifier
//!     -> AlertEvaluator -> AnnouncementQueue  ---->  Speaker
//!     -> ObservationSink (CSV)
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use glob::Pattern;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use edacc_core::error::{EdaccError, PipelineError};
use edacc_core::event::{Announcement, ClassifiedEvent};
use edacc_core::metrics as m;
use edacc_core::pipeline::{HealthStatus, ObservationSink, Pipeline, Speaker};
use edacc_core::types::ProspectedAsteroid;

use crate::alert::AlertEvaluator;
use crate::announce::{AnnouncementQueue, AnnouncementWorker, announcement_channel};
use crate::classifier::{DecodePath, EventClassifier};
use crate::collector::{CursorChange, FileCursor, LineAssembler, TailRead, resolve_latest};
use crate::config::PipelineConfig;
use crate::error::JournalPipelineError;
use crate::speech::LogSpeaker;
use crate::stats::MiningStats;

/// 파이프라인 처리 카운터
///
/// 수집 태스크와 파이프라인 핸들이 공유합니다.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    /// 조립된 라인 수
    pub lines: AtomicU64,
    /// 채굴 이벤트 수
    pub mining_events: AtomicU64,
    /// 통신 이벤트 수
    pub chat_events: AtomicU64,
    /// 처리 대상이 아닌 이벤트 수
    pub unrecognized: AtomicU64,
    /// 두 경로 모두 해석 실패한 라인 수
    pub decode_failures: AtomicU64,
    /// 큐에 넣은 안내 수
    pub announcements: AtomicU64,
    /// 저장소에 추가한 관측 레코드 수
    pub observations: AtomicU64,
    /// 저장소 추가/플러시 실패 수
    pub storage_failures: AtomicU64,
    /// 저널 파일 전환 수
    pub rotations: AtomicU64,
}

impl PipelineCounters {
    /// 현재 값을 복사합니다.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            lines: self.lines.load(Ordering::Relaxed),
            mining_events: self.mining_events.load(Ordering::Relaxed),
            chat_events: self.chat_events.load(Ordering::Relaxed),
            unrecognized: self.unrecognized.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            announcements: self.announcements.load(Ordering::Relaxed),
            observations: self.observations.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            rotations: self.rotations.load(Ordering::Relaxed),
        }
    }
}

/// [`PipelineCounters`]의 특정 시점 값
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub lines: u64,
    pub mining_events: u64,
    pub chat_events: u64,
    pub unrecognized: u64,
    pub decode_failures: u64,
    pub announcements: u64,
    pub observations: u64,
    pub storage_failures: u64,
    pub rotations: u64,
}

/// 수집 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailState {
    /// 추적할 저널 파일이 없음
    Idle,
    /// 저널 파일을 따라 읽는 중
    Tailing,
}

/// 수집 루프
///
/// 타이머마다 깨어나 새 바이트를 읽고, 라인을 조립하고, 분류/평가/안내/저장을 수행합니다.
/// 커서와 조립기 상태는 이 루프만 소유합니다.
pub struct IngestionLoop {
    journal_dir: PathBuf,
    pattern: Pattern,
    poll_interval: Duration,
    idle_interval: Duration,
    flush_interval: Duration,
    cursor: FileCursor,
    assembler: LineAssembler,
    classifier: EventClassifier,
    evaluator: AlertEvaluator,
    queue: AnnouncementQueue,
    sink: Option<Box<dyn ObservationSink>>,
    quiet_events: HashSet<String>,
    stats: MiningStats,
    counters: Arc<PipelineCounters>,
    state: TailState,
}

impl IngestionLoop {
    /// 새 수집 루프를 생성합니다.
    pub fn new(
        config: &PipelineConfig,
        classifier: EventClassifier,
        queue: AnnouncementQueue,
        sink: Option<Box<dyn ObservationSink>>,
        counters: Arc<PipelineCounters>,
    ) -> Result<Self, JournalPipelineError> {
        Ok(Self {
            journal_dir: config.journal_dir.clone(),
            pattern: Pattern::new(&config.file_pattern)?,
            poll_interval: config.poll_interval(),
            idle_interval: config.idle_interval(),
            flush_interval: config.flush_interval(),
            cursor: FileCursor::new(),
            assembler: LineAssembler::new(config.max_line_length),
            classifier,
            evaluator: AlertEvaluator::from_config(config),
            queue,
            sink,
            quiet_events: config.quiet_events.iter().cloned().collect(),
            stats: MiningStats::new(),
            counters,
            state: TailState::Idle,
        })
    }

    /// 현재 상태
    pub fn state(&self) -> TailState {
        self.state
    }

    /// 파일 커서
    pub fn cursor(&self) -> &FileCursor {
        &self.cursor
    }

    /// 세션 통계
    pub fn stats(&self) -> &MiningStats {
        &self.stats
    }

    /// 한 주기를 수행하고 다음 주기까지 기다릴 시간을 반환합니다.
    pub async fn tick(&mut self) -> Duration {
        let Some(latest) = resolve_latest(&self.journal_dir, &self.pattern).await else {
            self.go_idle();
            return self.idle_interval;
        };

        match self.cursor.on_resolved(&latest).await {
            Ok(CursorChange::Unchanged) => {}
            Ok(CursorChange::Switched { .. }) => {
                self.assembler.clear();
                self.counters.rotations.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                warn!(path = %latest.display(), error = %e, "failed to open journal file");
                self.go_idle();
                return self.idle_interval;
            }
        }
        self.state = TailState::Tailing;

        match self.cursor.read_new().await {
            Ok(TailRead::Appended(bytes)) => {
                for line in self.assembler.absorb(&bytes) {
                    self.process_line(&line);
                }
            }
            Ok(TailRead::Empty) => {}
            Ok(TailRead::Truncated) => self.assembler.clear(),
            Err(e) => {
                warn!(path = %latest.display(), error = %e, "failed to read journal file");
                self.go_idle();
                return self.idle_interval;
            }
        }

        self.poll_interval
    }

    /// 파일을 잃으면 `Idle`로 돌아갑니다.
    ///
    /// 커서와 조립 중인 조각은 그대로 둡니다. 같은 파일이 다시 잡히면 이어 읽고,
    /// 다른 파일이 잡히면 `on_resolved`가 새 세션으로 처리합니다.
    fn go_idle(&mut self) {
        if self.state == TailState::Tailing {
            info!(
                path = ?self.cursor.path().map(Path::display),
                offset = self.cursor.offset(),
                "journal file unavailable, waiting"
            );
            self.state = TailState::Idle;
        }
    }

    /// 완성된 라인 하나를 처리합니다.
    pub fn process_line(&mut self, line: &str) {
        self.counters.lines.fetch_add(1, Ordering::Relaxed);
        let classification = self.classifier.classify_detailed(line);

        match &classification.event {
            ClassifiedEvent::Mining(asteroid) => {
                self.counters.mining_events.fetch_add(1, Ordering::Relaxed);
                info!(
                    timestamp = %asteroid.timestamp,
                    materials = asteroid.materials.len(),
                    remaining = asteroid.remaining,
                    motherlode = ?asteroid.motherlode_material,
                    "prospected asteroid"
                );
                self.stats.record(asteroid);
                self.persist(asteroid);
            }
            ClassifiedEvent::Chat(message) => {
                self.counters.chat_events.fetch_add(1, Ordering::Relaxed);
                debug!(channel = %message.channel, sender = %message.sender, "chat message received");
            }
            ClassifiedEvent::Unrecognized { event } => {
                self.counters.unrecognized.fetch_add(1, Ordering::Relaxed);
                if classification.path == DecodePath::Failed {
                    self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
                }
                if let Some(name) = event
                    && !self.quiet_events.contains(name)
                {
                    debug!(event = %name, "unhandled journal event");
                }
            }
        }

        if let Some(announcement) = self.evaluator.evaluate(&classification.event) {
            self.counters.announcements.fetch_add(1, Ordering::Relaxed);
            self.queue.enqueue(announcement);
        }
    }

    /// 광물별 관측 레코드를 저장소에 추가합니다.
    fn persist(&mut self, asteroid: &ProspectedAsteroid) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        for record in asteroid.observations() {
            match sink.append(&record) {
                Ok(()) => {
                    self.counters.observations.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    // record_storage_failure()와 동일 — sink의 가변 차용과 겹치지 않도록 필드 단위로 접근
                    self.counters.storage_failures.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!(m::STORAGE_FAILURES_TOTAL).increment(1);
                    warn!(material = %record.material, error = %e, "failed to store observation");
                }
            }
        }
    }

    /// 저장소를 플러시합니다. 실패는 로그만 남기고 다시 시도하지 않습니다.
    ///
    /// 파일 I/O는 블로킹 스레드 풀에서 수행합니다.
    pub async fn flush(&mut self) {
        let Some(mut sink) = self.sink.take() else {
            return;
        };
        let joined = tokio::task::spawn_blocking(move || {
            let result = sink.flush();
            (sink, result)
        })
        .await;

        match joined {
            Ok((sink, result)) => {
                self.sink = Some(sink);
                if let Err(e) = result {
                    self.record_storage_failure();
                    warn!(error = %e, "failed to flush mining observations");
                }
            }
            Err(e) => {
                self.record_storage_failure();
                error!(error = %e, "observation flush task failed, storage disabled");
            }
        }
    }

    fn record_storage_failure(&self) {
        self.counters.storage_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::STORAGE_FAILURES_TOTAL).increment(1);
    }

    /// 취소될 때까지 루프를 실행합니다.
    ///
    /// 종료 시 저장소를 마지막으로 플러시하고 세션 통계를 반환합니다.
    pub async fn run(mut self, cancel: CancellationToken) -> MiningStats {
        info!(
            dir = %self.journal_dir.display(),
            pattern = %self.pattern,
            "journal ingestion started"
        );
        let mut last_flush = Instant::now();

        loop {
            let delay = self.tick().await;

            if last_flush.elapsed() >= self.flush_interval {
                self.flush().await;
                last_flush = Instant::now();
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.flush().await;
        info!("journal ingestion stopped");
        self.stats
    }
}

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 저널 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use edacc_journal_pipeline::{JournalPipelineBuilder, PipelineConfig};
///
/// let mut pipeline = JournalPipelineBuilder::new()
///     .config(config)
///     .speaker(CommandSpeaker::new("espeak", vec![]))
///     .sink(CsvObservationSink::new("mining_statistics.csv"))
///     .build()?;
///
/// pipeline.start().await?;
/// // ...
/// pipeline.stop().await?;
/// ```
pub struct JournalPipeline {
    config: PipelineConfig,
    state: PipelineState,
    /// 시작 전까지 보관하는 협력자
    speaker: Option<Box<dyn Speaker>>,
    sink: Option<Box<dyn ObservationSink>>,
    classifier: Option<EventClassifier>,
    queue: Option<AnnouncementQueue>,
    worker: Option<AnnouncementWorker>,
    cancel: CancellationToken,
    task: Option<tokio::task::JoinHandle<MiningStats>>,
    counters: Arc<PipelineCounters>,
    session_stats: Option<MiningStats>,
}

impl JournalPipeline {
    /// 현재 상태 이름
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 처리 카운터
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// 안내 큐 (실행 중일 때만)
    pub fn announcement_queue(&self) -> Option<&AnnouncementQueue> {
        self.queue.as_ref()
    }

    /// 정지 후 세션 통계
    pub fn session_stats(&self) -> Option<&MiningStats> {
        self.session_stats.as_ref()
    }
}

impl Pipeline for JournalPipeline {
    async fn start(&mut self) -> Result<(), EdaccError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let (Some(speaker), Some(classifier)) = (self.speaker.take(), self.classifier.take()) else {
            return Err(PipelineError::InitFailed("journal pipeline cannot be restarted".to_owned()).into());
        };

        info!("starting journal pipeline");

        // 1. 안내 워커 (스레드 생성 실패는 치명적)
        let (queue, inbox) = announcement_channel();
        let worker = AnnouncementWorker::spawn(inbox, speaker)?;

        // 2. 수집 루프
        let ingestion = IngestionLoop::new(
            &self.config,
            classifier,
            queue.clone(),
            self.sink.take(),
            Arc::clone(&self.counters),
        )?;

        if let Some(message) = &self.config.ready_message {
            queue.enqueue(Announcement::new(message.clone()));
        }

        self.cancel = CancellationToken::new();
        self.task = Some(tokio::spawn(ingestion.run(self.cancel.clone())));
        self.worker = Some(worker);
        self.queue = Some(queue);
        self.state = PipelineState::Running;

        info!(
            dir = %self.config.journal_dir.display(),
            targets = self.config.target_materials.len(),
            require_full_remaining = self.config.require_full_remaining,
            "journal pipeline started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EdaccError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping journal pipeline");

        // 1. 수집 루프 정지 (마지막 플러시 포함)
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(stats) => {
                    stats.log_summary();
                    self.session_stats = Some(stats);
                }
                Err(e) => error!(error = %e, "ingestion task failed"),
            }
        }

        // 2. 안내 워커 정지
        self.queue = None;
        if let Some(mut worker) = self.worker.take() {
            worker.stop(self.config.shutdown_timeout()).await;
        }

        self.state = PipelineState::Stopped;
        info!("journal pipeline stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if self.task.as_ref().is_none_or(|t| t.is_finished()) {
                    HealthStatus::Unhealthy("ingestion task exited".to_owned())
                } else if !self.worker.as_ref().is_some_and(|w| w.is_alive()) {
                    HealthStatus::Degraded("announcement worker stopped".to_owned())
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 저널 파이프라인 빌더
pub struct JournalPipelineBuilder {
    config: PipelineConfig,
    speaker: Option<Box<dyn Speaker>>,
    sink: Option<Box<dyn ObservationSink>>,
}

impl JournalPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            speaker: None,
            sink: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 음성 합성기를 지정합니다. 지정하지 않으면 로그 전용 합성기를 사용합니다.
    pub fn speaker(self, speaker: impl Speaker + 'static) -> Self {
        self.boxed_speaker(Box::new(speaker))
    }

    /// 박싱된 음성 합성기를 지정합니다.
    pub fn boxed_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = Some(speaker);
        self
    }

    /// 관측 기록 저장소를 지정합니다. 지정하지 않으면 기록하지 않습니다.
    pub fn sink(self, sink: impl ObservationSink + 'static) -> Self {
        self.boxed_sink(Box::new(sink))
    }

    /// 박싱된 관측 기록 저장소를 지정합니다.
    pub fn boxed_sink(mut self, sink: Box<dyn ObservationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 파이프라인을 빌드합니다.
    pub fn build(self) -> Result<JournalPipeline, JournalPipelineError> {
        self.config.validate()?;
        let classifier = EventClassifier::new()?;

        Ok(JournalPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            speaker: Some(self.speaker.unwrap_or_else(|| Box::new(LogSpeaker))),
            sink: self.sink,
            classifier: Some(classifier),
            queue: None,
            worker: None,
            cancel: CancellationToken::new(),
            task: None,
            counters: Arc::new(PipelineCounters::default()),
            session_stats: None,
        })
    }
}

impl Default for JournalPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
