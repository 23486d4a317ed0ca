//! Single-stream playback engine.
//!
//! ```text
//! control / consumer thread               decode thread
//! ┌──────────────────────────┐            ┌──────────────────────────┐
//! │ play / pause / speed ... │── atomics ─│ wait for next-due time   │
//! │ seek (blocks ≤ timeout)  │── condvar ─│ service seek             │
//! │ has_new_frame / frame()  │◄── swap ───│ read + LZ4 → staging     │
//! └──────────────────────────┘            └──────────────────────────┘
//! ```
//!
//! Scalar playback state lives in atomics; a control call and the decode
//! loop may interleave one step apart.  The only blocking rendezvous is the
//! seek handshake, guarded by a mutex + condition variable.  The consumer
//! reads the decoded frame through a [`FrameView`], which holds the buffer
//! lock, so the decode thread never swaps a frame out from under an upload.

pub mod reader;
pub mod schedule;
pub mod stats;

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::codec::{default_decompressor, FrameDecompressor};
use crate::config::EngineOptions;
use crate::error::{EngineError, Result, StateError};
use crate::event::{Event, EventKind, EventSink, SlotId};
use crate::header::{CompressionType, Header};

pub use reader::FrameReader;
pub use schedule::{Direction, LoopMode, PlaybackState};
pub use stats::{DecodeStats, StatsCell};

// ── Shared state ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SeekSlot {
    target:    i64,
    requested: u64,
    completed: u64,
    ok:        bool,
}

/// State shared between the engine handle and its decode thread.
struct Shared {
    id:             SlotId,
    options:        EngineOptions,
    epoch:          Instant,

    running:        AtomicBool,
    state:          AtomicU8,
    direction:      AtomicU8,
    loop_mode:      AtomicU8,
    cursor:         AtomicI64,
    buffered:       AtomicI64,
    loop_in:        AtomicI64,
    loop_out:       AtomicI64,
    nominal_ns:     AtomicU64,
    effective_ns:   AtomicU64,
    /// |speed| as f64 bits; the sign lives in `direction`.
    speed_bits:     AtomicU64,
    next_due_ns:    AtomicU64,
    new_frame:      AtomicBool,
    gather_stats:   AtomicBool,
    stats:          StatsCell,

    frame:          Mutex<Vec<u8>>,

    seek_requested: AtomicBool,
    seek:           Mutex<SeekSlot>,
    seek_done:      Condvar,

    doorbell:       Mutex<bool>,
    wake:           Condvar,

    sink:           Mutex<Option<EventSink>>,
}

impl Shared {
    fn new(id: SlotId, options: EngineOptions) -> Self {
        let gather = options.gather_stats;
        Self {
            id,
            options,
            epoch:          Instant::now(),
            running:        AtomicBool::new(false),
            state:          AtomicU8::new(PlaybackState::None as u8),
            direction:      AtomicU8::new(Direction::Forward as u8),
            loop_mode:      AtomicU8::new(LoopMode::Loop as u8),
            cursor:         AtomicI64::new(0),
            buffered:       AtomicI64::new(0),
            loop_in:        AtomicI64::new(0),
            loop_out:       AtomicI64::new(0),
            nominal_ns:     AtomicU64::new(0),
            effective_ns:   AtomicU64::new(0),
            speed_bits:     AtomicU64::new(1.0f64.to_bits()),
            next_due_ns:    AtomicU64::new(0),
            new_frame:      AtomicBool::new(false),
            gather_stats:   AtomicBool::new(gather),
            stats:          StatsCell::default(),
            frame:          Mutex::new(Vec::new()),
            seek_requested: AtomicBool::new(false),
            seek:           Mutex::new(SeekSlot::default()),
            seek_done:      Condvar::new(),
            doorbell:       Mutex::new(false),
            wake:           Condvar::new(),
            sink:           Mutex::new(None),
        }
    }

    fn now_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn direction(&self) -> Direction {
        Direction::from_u8(self.direction.load(Ordering::Acquire))
    }

    fn loop_mode(&self) -> LoopMode {
        LoopMode::from_u8(self.loop_mode.load(Ordering::Acquire))
    }

    fn bounds(&self) -> (i64, i64) {
        (self.loop_in.load(Ordering::Acquire), self.loop_out.load(Ordering::Acquire))
    }

    fn schedule_next_from_now(&self) {
        let due = self.now_ns() + self.effective_ns.load(Ordering::Acquire);
        self.next_due_ns.store(due, Ordering::Release);
    }

    fn emit(&self, kind: EventKind) {
        if let Some(sink) = self.sink.lock().as_ref() {
            sink.push(Event::new(kind, self.id));
        }
    }

    /// Defaults for a freshly opened file.
    fn reset_for(&self, header: &Header) {
        let nominal = schedule::frame_duration_ns(header.frame_rate);
        self.state.store(PlaybackState::Stopped as u8, Ordering::Release);
        self.direction.store(Direction::Forward as u8, Ordering::Release);
        self.cursor.store(0, Ordering::Release);
        self.buffered.store(0, Ordering::Release);
        self.loop_in.store(0, Ordering::Release);
        self.loop_out.store(header.frame_count as i64 - 1, Ordering::Release);
        self.nominal_ns.store(nominal, Ordering::Release);
        self.effective_ns.store(nominal, Ordering::Release);
        self.speed_bits.store(1.0f64.to_bits(), Ordering::Release);
        self.next_due_ns.store(0, Ordering::Release);
        self.new_frame.store(false, Ordering::Release);
        self.seek_requested.store(false, Ordering::Release);
        self.stats.reset();
        *self.doorbell.lock() = false;
        let mut frame = self.frame.lock();
        frame.clear();
        frame.resize(header.bytes_per_frame(), 0);
    }

    /// Back to the unopened state; frees the frame buffer.
    fn clear(&self) {
        self.running.store(false, Ordering::Release);
        self.set_state(PlaybackState::None);
        self.cursor.store(0, Ordering::Release);
        self.buffered.store(0, Ordering::Release);
        self.loop_in.store(0, Ordering::Release);
        self.loop_out.store(0, Ordering::Release);
        self.nominal_ns.store(0, Ordering::Release);
        self.effective_ns.store(0, Ordering::Release);
        self.next_due_ns.store(0, Ordering::Release);
        self.new_frame.store(false, Ordering::Release);
        self.seek_requested.store(false, Ordering::Release);
        *self.frame.lock() = Vec::new();
    }

    // ── Decode-thread helpers ────────────────────────────────────────────────

    /// Wake a napping decode thread.
    fn ring(&self) {
        let mut rung = self.doorbell.lock();
        *rung = true;
        self.wake.notify_all();
    }

    /// Sleep up to `dur` unless rung first.
    fn nap(&self, dur: Duration) {
        let mut rung = self.doorbell.lock();
        if !*rung {
            self.wake.wait_while_for(&mut rung, |r| !*r, dur);
        }
        *rung = false;
    }

    /// Decode `frame` and make it the visible frame.  On failure the visible
    /// frame is left untouched.
    fn decode_and_publish<R>(&self, reader: &mut FrameReader<R>, frame: i64) -> Result<()>
    where
        R: std::io::Read + std::io::Seek,
    {
        let stats = self.gather_stats.load(Ordering::Relaxed).then_some(&self.stats);
        reader.read_frame(frame as usize, stats)?;
        {
            let mut visible = self.frame.lock();
            std::mem::swap(&mut *visible, reader.staging_mut());
            self.buffered.store(frame, Ordering::Release);
        }
        self.new_frame.store(true, Ordering::Release);
        Ok(())
    }

    fn service_seek(&self, reader: &mut FrameReader<File>) {
        let (ticket, target) = {
            let slot = self.seek.lock();
            (slot.requested, slot.target)
        };
        self.cursor.store(target, Ordering::Release);
        let ok = match self.decode_and_publish(reader, target) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(stream = self.id, frame = target, "seek read failed: {e}");
                false
            }
        };
        {
            let mut slot = self.seek.lock();
            if ticket > slot.completed {
                slot.completed = ticket;
                slot.ok = ok;
            }
        }
        self.seek_done.notify_all();
    }

    fn decode_loop(self: Arc<Self>, mut reader: FrameReader<File>) {
        tracing::debug!(stream = self.id, "decode thread started");
        let idle = self.options.idle_interval();
        let poll = self.options.poll_interval();
        let margin = self.options.wake_margin().as_nanos() as u64;

        while self.running.load(Ordering::Acquire) {
            if self.seek_requested.swap(false, Ordering::AcqRel) {
                self.service_seek(&mut reader);
                continue;
            }
            if self.state() != PlaybackState::Playing {
                self.nap(idle);
                continue;
            }

            let due = self.next_due_ns.load(Ordering::Acquire);
            let now = self.now_ns();
            if now < due {
                self.nap(Duration::from_nanos(due - now).min(poll));
                continue;
            }

            let (loop_in, loop_out) = self.bounds();
            let step = schedule::advance(
                self.cursor.load(Ordering::Acquire),
                self.direction(),
                loop_in,
                loop_out,
                self.loop_mode(),
            );
            if step.looped {
                self.emit(EventKind::Loop);
            }
            if step.finished {
                self.set_state(PlaybackState::Stopped);
                self.cursor.store(step.frame, Ordering::Release);
                tracing::debug!(stream = self.id, "reached loop out, stopping");
                self.emit(EventKind::Stop);
                continue;
            }
            self.direction.store(step.direction as u8, Ordering::Release);
            self.cursor.store(step.frame, Ordering::Release);

            let next_due = due + self.effective_ns.load(Ordering::Acquire);
            self.next_due_ns.store(next_due, Ordering::Release);

            if let Err(e) = self.decode_and_publish(&mut reader, step.frame) {
                tracing::warn!(stream = self.id, frame = step.frame, "frame decode failed: {e}");
                continue;
            }
            tracing::trace!(stream = self.id, frame = step.frame, "frame decoded");

            let wake_at = next_due.saturating_sub(margin);
            let now = self.now_ns();
            if wake_at > now {
                self.nap(Duration::from_nanos(wake_at - now));
            }
        }
        tracing::debug!(stream = self.id, "decode thread stopped");
    }
}

// ── Frame view ───────────────────────────────────────────────────────────────

/// Read-only view of the most recently decoded frame.  While it is alive
/// the decode thread cannot publish a new frame, so drop it before seeking.
pub struct FrameView<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
    frame: i64,
}

impl FrameView<'_> {
    pub fn frame_number(&self) -> i64 {
        self.frame
    }
}

impl Deref for FrameView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard
    }
}

// ── Media info ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub path:            PathBuf,
    pub file_name:       String,
    pub header:          Header,
    pub bytes_per_frame: usize,
    pub file_len:        u64,
}

// ── PlaybackEngine ───────────────────────────────────────────────────────────

pub struct PlaybackEngine {
    shared: Arc<Shared>,
    media:  Option<MediaInfo>,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackEngine {
    pub fn new(id: SlotId, options: EngineOptions) -> Self {
        Self {
            shared: Arc::new(Shared::new(id, options)),
            media:  None,
            worker: None,
        }
    }

    pub fn id(&self) -> SlotId {
        self.shared.id
    }

    pub fn options(&self) -> &EngineOptions {
        &self.shared.options
    }

    /// Route lifecycle events into `sink`.
    pub fn set_event_sink(&self, sink: EventSink) {
        *self.shared.sink.lock() = Some(sink);
    }

    // ── Open / close ─────────────────────────────────────────────────────────

    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.open_with(path, default_decompressor())
    }

    /// Open `path`, decode its first frame and start the decode thread.
    /// On any failure nothing is retained and no thread is started.
    pub fn open_with<P: AsRef<Path>>(&mut self, path: P, decompressor: Box<dyn FrameDecompressor>) -> Result<()> {
        if self.is_loaded() {
            return Err(StateError::AlreadyOpen.into());
        }
        let path = path.as_ref().to_path_buf();
        let mut reader = FrameReader::open(&path, decompressor)?;
        let header = reader.header().clone();
        let file_len = std::fs::metadata(&path)?.len();

        self.shared.reset_for(&header);
        if let Err(e) = self.shared.decode_and_publish(&mut reader, 0) {
            self.shared.clear();
            return Err(e);
        }

        self.shared.running.store(true, Ordering::Release);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("hpv-decode-{}", self.shared.id))
            .spawn(move || shared.decode_loop(reader));
        let handle = match spawned {
            Ok(h) => h,
            Err(e) => {
                self.shared.clear();
                return Err(EngineError::ThreadSpawn(e));
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.media = Some(MediaInfo {
            bytes_per_frame: header.bytes_per_frame(),
            path,
            file_name,
            header,
            file_len,
        });
        self.worker = Some(handle);
        tracing::info!(stream = self.id(), "opened {}", self.summary());
        Ok(())
    }

    /// Stop and join the decode thread, release file and buffers, reset all
    /// playback state.  Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.shared.running.store(false, Ordering::Release);
            self.shared.ring();
            if handle.join().is_err() {
                tracing::error!(stream = self.id(), "decode thread panicked");
            }
        }
        if let Some(media) = self.media.take() {
            tracing::info!(stream = self.id(), "closed '{}'", media.file_name);
        }
        self.shared.clear();
    }

    // ── Transport ────────────────────────────────────────────────────────────

    fn require_open(&self) -> Result<&MediaInfo> {
        self.media.as_ref().ok_or(EngineError::State(StateError::NotOpen))
    }

    pub fn play(&self) -> Result<()> {
        self.require_open()?;
        let shared = &self.shared;
        match shared.state() {
            PlaybackState::Playing => return Err(StateError::AlreadyPlaying.into()),
            PlaybackState::Stopped | PlaybackState::None => {
                shared.cursor.store(shared.loop_in.load(Ordering::Acquire), Ordering::Release);
            }
            PlaybackState::Paused => {}
        }
        shared.schedule_next_from_now();
        shared.set_state(PlaybackState::Playing);
        shared.ring();
        tracing::debug!(stream = self.id(), "play");
        shared.emit(EventKind::Play);
        Ok(())
    }

    /// Play at `fps` instead of the file's native rate.  The current speed
    /// factor still applies on top.
    pub fn play_at(&self, fps: u32) -> Result<()> {
        self.require_open()?;
        if self.is_playing() {
            return Err(StateError::AlreadyPlaying.into());
        }
        if fps == 0 {
            return Err(EngineError::InvalidFrameRate(fps));
        }
        let nominal = schedule::frame_duration_ns(fps);
        self.shared.nominal_ns.store(nominal, Ordering::Release);
        self.shared.effective_ns.store(
            schedule::effective_duration_ns(nominal, self.speed_magnitude()),
            Ordering::Release,
        );
        self.play()
    }

    pub fn pause(&self) -> Result<()> {
        self.require_open()?;
        if !self.is_playing() {
            return Err(StateError::NotPlaying.into());
        }
        self.shared.set_state(PlaybackState::Paused);
        tracing::debug!(stream = self.id(), "pause");
        self.shared.emit(EventKind::Pause);
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        self.require_open()?;
        if !self.is_paused() {
            return Err(StateError::NotPaused.into());
        }
        self.shared.schedule_next_from_now();
        self.shared.set_state(PlaybackState::Playing);
        self.shared.ring();
        tracing::debug!(stream = self.id(), "resume");
        self.shared.emit(EventKind::Resume);
        Ok(())
    }

    /// Rewind to loop-in and show that frame.
    pub fn stop(&self) -> Result<()> {
        self.require_open()?;
        if !self.is_playing() && !self.is_paused() {
            return Err(StateError::NotActive.into());
        }
        let loop_in = self.loop_in();
        self.shared.set_state(PlaybackState::Stopped);
        self.shared.cursor.store(loop_in, Ordering::Release);
        if let Err(e) = self.seek_sync(loop_in) {
            tracing::warn!(stream = self.id(), "rewind on stop failed: {e}");
        }
        tracing::debug!(stream = self.id(), "stop");
        self.shared.emit(EventKind::Stop);
        Ok(())
    }

    // ── Loop / speed / direction ─────────────────────────────────────────────

    pub fn set_loop_mode(&self, mode: LoopMode) {
        self.shared.loop_mode.store(mode as u8, Ordering::Release);
    }

    pub fn set_direction(&self, direction: Direction) {
        self.shared.direction.store(direction as u8, Ordering::Release);
    }

    fn check_frame(&self, frame: i64) -> Result<u64> {
        let count = self.require_open()?.header.frame_count as u64;
        if frame < 0 || frame as u64 >= count {
            return Err(EngineError::FrameOutOfRange { frame, count });
        }
        Ok(count)
    }

    fn apply_bounds(&self, loop_in: i64, loop_out: i64) -> Result<()> {
        self.shared.loop_in.store(loop_in, Ordering::Release);
        self.shared.loop_out.store(loop_out, Ordering::Release);
        let cursor = self.shared.cursor.load(Ordering::Acquire);
        if cursor < loop_in || cursor > loop_out {
            self.seek_sync(loop_in)?;
        }
        Ok(())
    }

    pub fn set_loop_in(&self, frame: i64) -> Result<()> {
        let count = self.check_frame(frame)?;
        let (lin, lout) = schedule::resolve_loop_in(
            frame,
            self.loop_out(),
            count,
            self.shared.options.loop_margin_fraction,
        );
        self.apply_bounds(lin, lout)
    }

    pub fn set_loop_out(&self, frame: i64) -> Result<()> {
        let count = self.check_frame(frame)?;
        let (lin, lout) = schedule::resolve_loop_out(
            frame,
            self.loop_in(),
            count,
            self.shared.options.loop_margin_fraction,
        );
        self.apply_bounds(lin, lout)
    }

    /// Signed speed factor; negative plays in reverse.  Rejects non-finite
    /// speeds and speeds within `speed_epsilon` of zero without touching any
    /// state.
    pub fn set_speed(&self, speed: f64) -> Result<()> {
        self.require_open()?;
        if !speed.is_finite() || speed.abs() < self.shared.options.speed_epsilon {
            return Err(EngineError::SpeedTooLow(speed));
        }
        let direction = if speed > 0.0 { Direction::Forward } else { Direction::Reverse };
        self.set_direction(direction);
        self.shared.speed_bits.store(speed.abs().to_bits(), Ordering::Release);
        let nominal = self.shared.nominal_ns.load(Ordering::Acquire);
        self.shared
            .effective_ns
            .store(schedule::effective_duration_ns(nominal, speed), Ordering::Release);

        if self.is_paused() && self.shared.options.resume_on_speed_change {
            self.resume()?;
        }
        Ok(())
    }

    // ── Seeking ──────────────────────────────────────────────────────────────

    /// Seek to a normalized position in `[0, 1]`, clamped into the loop range.
    pub fn seek_position(&self, pos: f64) -> Result<()> {
        let count = self.require_open()?.header.frame_count as u64;
        if !(0.0..=1.0).contains(&pos) {
            return Err(EngineError::PositionOutOfRange(pos));
        }
        let (lin, lout) = self.shared.bounds();
        let frame = schedule::clamp_frame(schedule::position_to_frame(pos, count), lin, lout);
        self.seek_sync(frame)
    }

    /// Seek to `frame`, clamped into the loop range.
    pub fn seek_frame(&self, frame: i64) -> Result<()> {
        self.check_frame(frame)?;
        let (lin, lout) = self.shared.bounds();
        self.seek_sync(schedule::clamp_frame(frame, lin, lout))
    }

    pub fn first_frame(&self) -> Result<()> {
        self.seek_frame(self.loop_in())
    }

    pub fn last_frame(&self) -> Result<()> {
        self.seek_frame(self.loop_out())
    }

    /// Step one frame forward, wrapping to loop-in past loop-out.
    pub fn next_frame(&self) -> Result<()> {
        let (lin, lout) = self.shared.bounds();
        let next = self.buffered_frame() + 1;
        self.seek_frame(if next > lout { lin } else { next })
    }

    /// Step one frame back, wrapping to loop-out before loop-in.
    pub fn previous_frame(&self) -> Result<()> {
        let (lin, lout) = self.shared.bounds();
        let prev = self.buffered_frame() - 1;
        self.seek_frame(if prev < lin { lout } else { prev })
    }

    /// Hand `target` to the decode thread and wait for it to be decoded.
    fn seek_sync(&self, target: i64) -> Result<()> {
        self.require_open()?;
        let shared = &self.shared;
        let timeout = shared.options.seek_timeout();

        let mut slot = shared.seek.lock();
        slot.requested += 1;
        slot.target = target;
        let ticket = slot.requested;
        shared.seek_requested.store(true, Ordering::Release);
        shared.ring();

        shared
            .seek_done
            .wait_while_for(&mut slot, |s| s.completed < ticket, timeout);
        if slot.completed < ticket {
            tracing::warn!(stream = self.id(), frame = target, "seek timed out");
            return Err(EngineError::SeekTimeout(timeout));
        }
        if !slot.ok {
            return Err(EngineError::SeekFailed { frame: target });
        }
        tracing::debug!(stream = self.id(), frame = target, "seek");
        Ok(())
    }

    // ── Consumer side ────────────────────────────────────────────────────────

    /// True once per decoded frame; reading clears the flag.
    pub fn has_new_frame(&self) -> bool {
        self.shared.new_frame.swap(false, Ordering::AcqRel)
    }

    /// The last successfully decoded frame.  Empty when nothing is open.
    pub fn frame(&self) -> FrameView<'_> {
        let guard = self.shared.frame.lock();
        let frame = self.shared.buffered.load(Ordering::Acquire);
        FrameView { guard, frame }
    }

    pub fn buffered_frame(&self) -> i64 {
        self.shared.buffered.load(Ordering::Acquire)
    }

    /// Decode cursor; may run one frame ahead of [`buffered_frame`].
    ///
    /// [`buffered_frame`]: PlaybackEngine::buffered_frame
    pub fn current_frame(&self) -> i64 {
        self.shared.cursor.load(Ordering::Acquire)
    }

    pub fn enable_stats(&self, enable: bool) {
        self.shared.gather_stats.store(enable, Ordering::Relaxed);
    }

    pub fn decode_stats(&self) -> DecodeStats {
        self.shared.stats.snapshot()
    }

    /// Reported by the GPU bridge after each upload.
    pub fn set_upload_time(&self, d: Duration) {
        self.shared.stats.record_upload(d);
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    pub fn is_loaded(&self) -> bool {
        self.media.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state() == PlaybackState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == PlaybackState::Stopped
    }

    pub fn media(&self) -> Option<&MediaInfo> {
        self.media.as_ref()
    }

    pub fn header(&self) -> Option<&Header> {
        self.media.as_ref().map(|m| &m.header)
    }

    pub fn width(&self) -> u32 {
        self.header().map_or(0, |h| h.width)
    }

    pub fn height(&self) -> u32 {
        self.header().map_or(0, |h| h.height)
    }

    pub fn frame_rate(&self) -> u32 {
        self.header().map_or(0, |h| h.frame_rate)
    }

    pub fn compression_type(&self) -> Option<CompressionType> {
        self.header().map(|h| h.compression_type)
    }

    pub fn frame_count(&self) -> u64 {
        self.header().map_or(0, |h| h.frame_count as u64)
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.media.as_ref().map_or(0, |m| m.bytes_per_frame)
    }

    pub fn path(&self) -> Option<&Path> {
        self.media.as_ref().map(|m| m.path.as_path())
    }

    pub fn file_name(&self) -> &str {
        self.media.as_ref().map_or("", |m| m.file_name.as_str())
    }

    pub fn loop_in(&self) -> i64 {
        self.shared.loop_in.load(Ordering::Acquire)
    }

    pub fn loop_out(&self) -> i64 {
        self.shared.loop_out.load(Ordering::Acquire)
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.shared.loop_mode()
    }

    pub fn direction(&self) -> Direction {
        self.shared.direction()
    }

    fn speed_magnitude(&self) -> f64 {
        f64::from_bits(self.shared.speed_bits.load(Ordering::Acquire))
    }

    pub fn speed(&self) -> f64 {
        match self.direction() {
            Direction::Forward => self.speed_magnitude(),
            Direction::Reverse => -self.speed_magnitude(),
        }
    }

    pub fn effective_frame_duration(&self) -> Duration {
        Duration::from_nanos(self.shared.effective_ns.load(Ordering::Acquire))
    }

    /// Time from the first to the last frame at the file's native rate.
    pub fn duration(&self) -> Duration {
        match self.header() {
            Some(h) if h.frame_rate > 0 => {
                let frames = (h.frame_count as u64).saturating_sub(1);
                Duration::from_nanos(frames * schedule::NANOS_PER_SEC / h.frame_rate as u64)
            }
            _ => Duration::ZERO,
        }
    }

    /// Cursor as a fraction of the whole file.
    pub fn position(&self) -> f32 {
        let count = self.frame_count();
        if count <= 1 {
            return 0.0;
        }
        self.current_frame() as f32 / (count - 1) as f32
    }

    pub fn summary(&self) -> String {
        match &self.media {
            Some(m) => format!(
                "[ {} | dims: {}x{} | fps: {} | frames: {} | type {} | version: {} ]",
                m.file_name,
                m.header.width,
                m.header.height,
                m.header.frame_rate,
                m.header.frame_count,
                m.header.compression_type,
                m.header.version,
            ),
            None => "No open file".to_string(),
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}
