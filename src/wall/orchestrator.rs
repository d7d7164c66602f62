//! # Wall Orchestrator
//!
//! Turns each `print` event into a new copy on the wall.
//!
//! ```text
//!   Idle --print--> Scanning --sweep done--> Compositing --copy placed--> Idle
//!          emits scan-start                                     emits scan-end
//! ```
//!
//! Stages run strictly in sequence and each may suspend (animation, image
//! fetch, raster work). Prints that arrive while a cycle is running are
//! discarded when the cycle finishes, before the wall reports idle again.
//!
//! A cycle whose source image fails to load ends without a copy and without
//! `scan-end`; the control side's watchdog recovers from that.

use super::layout::{self, CardSize, Placement, RowBounds};
use super::source::ImageSource;
use crate::degrade::{render_generation, Generation};
use crate::protocol::Event;
use anyhow::{Context, Result};
use bytes::Bytes;
use image::{ImageFormat, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::io::Cursor;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Presentational collaborator. Only completion matters to the orchestrator.
pub trait Animator {
    /// Plays the scan bar forward and back.
    fn sweep(&mut self) -> impl Future<Output = ()> + Send;

    /// Plays the arrival of a freshly appended copy.
    fn entrance(&mut self, record: &CopyRecord) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallState {
    Idle,
    Scanning,
    Compositing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new copy of this generation was appended.
    Completed(Generation),
    /// Not a print, or not idle.
    Ignored,
    /// The cycle aborted; nothing was appended.
    Failed,
}

/// One card on the wall. Immutable once created.
#[derive(Debug, Clone)]
pub struct CopyRecord {
    pub generation: Generation,
    pub placement: Placement,
    /// Stacking order: the original is 0, copy N is N.
    pub z_index: u64,
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    /// Rendered card, PNG encoded.
    pub png: Bytes,
}

impl CopyRecord {
    /// `copy no.N` for degraded copies, nothing for the original.
    pub fn label(&self) -> Option<String> {
        (!self.generation.is_original()).then(|| format!("copy no.{}", self.generation))
    }
}

pub struct WallOrchestrator<S, A> {
    source: S,
    animator: A,
    card: CardSize,
    outbox: mpsc::UnboundedSender<Event>,
    state: WallState,
    step: Generation,
    copies: Vec<CopyRecord>,
    bounds: Option<RowBounds>,
    output_dir: Option<PathBuf>,
    rng: StdRng,
}

impl<S, A> WallOrchestrator<S, A>
where
    S: ImageSource + Send + Sync,
    A: Animator + Send,
{
    /// # Arguments
    ///
    /// * `source` - Where each cycle loads the current source image from.
    /// * `animator` - Sweep and entrance animations.
    /// * `card` - Size every copy is rendered at.
    /// * `outbox` - Events for the relay (`scan-start`, `scan-end`).
    pub fn new(source: S, animator: A, card: CardSize, outbox: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            source,
            animator,
            card,
            outbox,
            state: WallState::Idle,
            step: Generation::ORIGINAL,
            copies: Vec::new(),
            bounds: None,
            output_dir: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Also writes every rendered card to `dir` as `copy-NNNN.png`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Fixes the placement randomness, for reproducible layouts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> WallState {
        self.state
    }

    /// Generation of the newest degraded copy; 0 before the first print.
    pub fn step(&self) -> Generation {
        self.step
    }

    pub fn copies(&self) -> &[CopyRecord] {
        &self.copies
    }

    pub fn bounds(&self) -> Option<RowBounds> {
        self.bounds
    }

    /// Places the pristine original, centred, without a scan and without
    /// advancing the generation counter.
    pub async fn place_original(&mut self) -> Result<()> {
        let source = self.source.fetch().await?;
        let (width, height) = self.card.pixels();
        let png = tokio::task::spawn_blocking(move || -> Result<Bytes> {
            let fitted = layout::fit_to_card(&source, width, height, true);
            let rendered = render_generation(&fitted, Generation::ORIGINAL)?;
            encode_png(&rendered)
        })
        .await
        .context("render task panicked")??;

        let record = CopyRecord {
            generation: Generation::ORIGINAL,
            placement: layout::centered(self.card),
            z_index: 0,
            timestamp: timestamp(),
            png,
        };
        self.append(record).await;
        info!("original placed");
        Ok(())
    }

    /// Consumes events until the inbox closes.
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Event>) {
        while let Some(event) = inbox.recv().await {
            match self.handle(event, &mut inbox).await {
                CycleOutcome::Completed(generation) => info!(%generation, "copy printed"),
                CycleOutcome::Failed => {}
                CycleOutcome::Ignored => debug!(%event, "event ignored"),
            }
        }
    }

    /// Runs a full print cycle for a `print` received while idle.
    ///
    /// `pending` is the inbox the event came from; prints queued on it while
    /// the cycle runs are discarded before the wall goes idle again.
    pub async fn handle(
        &mut self,
        event: Event,
        pending: &mut mpsc::UnboundedReceiver<Event>,
    ) -> CycleOutcome {
        if event != Event::Print || self.state != WallState::Idle {
            return CycleOutcome::Ignored;
        }

        self.state = WallState::Scanning;
        self.emit(Event::ScanStart);
        self.animator.sweep().await;

        self.state = WallState::Compositing;
        let outcome = match self.composite().await {
            Ok(generation) => CycleOutcome::Completed(generation),
            Err(e) => {
                error!(error = %format!("{:#}", e), "print cycle failed");
                CycleOutcome::Failed
            }
        };

        self.discard_pending(pending);
        self.state = WallState::Idle;
        if matches!(outcome, CycleOutcome::Completed(_)) {
            self.emit(Event::ScanEnd);
        }
        outcome
    }

    /// Loads, degrades and appends the next generation.
    ///
    /// The counter only advances once the copy exists.
    async fn composite(&mut self) -> Result<Generation> {
        let source = self.source.fetch().await?;
        let generation = self.step.next();
        let (width, height) = self.card.pixels();

        let png = tokio::task::spawn_blocking(move || -> Result<Bytes> {
            let fitted = layout::fit_to_card(&source, width, height, false);
            let rendered = render_generation(&fitted, generation)?;
            encode_png(&rendered)
        })
        .await
        .context("render task panicked")??;

        let placement = if self.step.is_original() {
            layout::centered(self.card)
        } else {
            layout::scattered(self.card, &mut self.rng)
        };

        self.step = generation;
        let record = CopyRecord {
            generation,
            placement,
            z_index: generation.get(),
            timestamp: timestamp(),
            png,
        };
        self.append(record).await;
        Ok(generation)
    }

    async fn append(&mut self, record: CopyRecord) {
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("copy-{:04}.png", record.generation.get()));
            if let Err(e) = tokio::fs::write(&path, &record.png).await {
                warn!(path = %path.display(), error = %e, "failed to write copy");
            }
        }

        self.copies.push(record);
        self.bounds = layout::row_bounds(
            self.copies.iter().map(|c| c.placement.y),
            self.card.height,
        );

        if let Some(record) = self.copies.last() {
            self.animator.entrance(record).await;
        }
    }

    fn discard_pending(&self, pending: &mut mpsc::UnboundedReceiver<Event>) {
        while let Ok(event) = pending.try_recv() {
            debug!(%event, state = ?self.state, "discarding event received mid-cycle");
        }
    }

    fn emit(&self, event: Event) {
        // A closed outbox means the session is gone; the event is lost like
        // any other event sent while offline.
        let _ = self.outbox.send(event);
    }
}

fn encode_png(image: &RgbaImage) -> Result<Bytes> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("failed to encode copy")?;
    Ok(Bytes::from(buf))
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    struct FixedSource {
        image: RgbaImage,
        fail: Arc<AtomicBool>,
        fetches: Arc<AtomicUsize>,
    }

    impl FixedSource {
        fn new() -> Self {
            Self {
                image: RgbaImage::from_fn(60, 40, |x, y| Rgba([(x * 4) as u8, (y * 6) as u8, 128, 255])),
                fail: Arc::new(AtomicBool::new(false)),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ImageSource for FixedSource {
        async fn fetch(&self) -> Result<RgbaImage> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("source offline");
            }
            Ok(self.image.clone())
        }
    }

    #[derive(Default)]
    struct CountingAnimator {
        sweeps: usize,
        entrances: Vec<Generation>,
    }

    impl Animator for CountingAnimator {
        async fn sweep(&mut self) {
            self.sweeps += 1;
        }

        async fn entrance(&mut self, record: &CopyRecord) {
            self.entrances.push(record.generation);
        }
    }

    type Wall = WallOrchestrator<FixedSource, CountingAnimator>;

    fn wall() -> (Wall, FixedSource, mpsc::UnboundedReceiver<Event>) {
        let source = FixedSource::new();
        let (outbox, events) = mpsc::unbounded_channel();
        let card = CardSize { width: 80.0, height: 56.0 };
        let wall = WallOrchestrator::new(source.clone(), CountingAnimator::default(), card, outbox).with_seed(5);
        (wall, source, events)
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        std::iter::from_fn(|| events.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn original_is_placed_silently() {
        let (mut wall, _, mut events) = wall();
        wall.place_original().await.unwrap();

        assert_eq!(wall.step(), Generation::ORIGINAL);
        assert_eq!(wall.copies().len(), 1);
        assert_eq!(wall.copies()[0].z_index, 0);
        assert_eq!(wall.copies()[0].label(), None);
        assert_eq!(wall.animator.sweeps, 0);
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn print_cycle_emits_start_then_end_and_appends_a_copy() {
        let (mut wall, _, mut events) = wall();
        let (_tx, mut pending) = mpsc::unbounded_channel();

        let outcome = wall.handle(Event::Print, &mut pending).await;

        assert_eq!(outcome, CycleOutcome::Completed(Generation::new(1)));
        assert_eq!(drain(&mut events), vec![Event::ScanStart, Event::ScanEnd]);
        assert_eq!(wall.state(), WallState::Idle);
        assert_eq!(wall.step(), Generation::new(1));

        let copy = &wall.copies()[0];
        assert_eq!(copy.label().as_deref(), Some("copy no.1"));
        assert_eq!(copy.placement, layout::centered(wall.card));
        assert_eq!(copy.timestamp.len(), 8);

        let decoded = image::load_from_memory(&copy.png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), wall.card.pixels());
        assert_eq!(wall.animator.entrances, vec![Generation::new(1)]);
    }

    #[tokio::test]
    async fn generations_count_up_and_stack_upwards() {
        let (mut wall, _, _events) = wall();
        let (_tx, mut pending) = mpsc::unbounded_channel();
        wall.place_original().await.unwrap();

        for _ in 0..3 {
            wall.handle(Event::Print, &mut pending).await;
        }

        let generations: Vec<u64> = wall.copies().iter().map(|c| c.generation.get()).collect();
        assert_eq!(generations, vec![0, 1, 2, 3]);
        let z: Vec<u64> = wall.copies().iter().map(|c| c.z_index).collect();
        assert_eq!(z, vec![0, 1, 2, 3]);

        let bounds = wall.bounds().unwrap();
        let max_bottom = wall
            .copies()
            .iter()
            .map(|c| c.placement.y + wall.card.height)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(bounds.min_height >= max_bottom);
    }

    #[tokio::test]
    async fn prints_queued_mid_cycle_are_discarded() {
        let (mut wall, source, mut events) = wall();
        let (tx, mut pending) = mpsc::unbounded_channel();
        tx.send(Event::Print).unwrap();
        tx.send(Event::Print).unwrap();

        wall.handle(Event::Print, &mut pending).await;

        assert_eq!(wall.copies().len(), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(pending.try_recv().is_err());
        assert_eq!(drain(&mut events), vec![Event::ScanStart, Event::ScanEnd]);
    }

    #[tokio::test]
    async fn non_print_events_are_ignored() {
        let (mut wall, _, mut events) = wall();
        let (_tx, mut pending) = mpsc::unbounded_channel();

        assert_eq!(wall.handle(Event::ScanEnd, &mut pending).await, CycleOutcome::Ignored);
        assert_eq!(wall.handle(Event::ScanStart, &mut pending).await, CycleOutcome::Ignored);
        assert!(drain(&mut events).is_empty());
        assert!(wall.copies().is_empty());
    }

    #[tokio::test]
    async fn failed_load_appends_nothing_and_keeps_the_counter() {
        let (mut wall, source, mut events) = wall();
        let (_tx, mut pending) = mpsc::unbounded_channel();
        source.fail.store(true, Ordering::SeqCst);

        assert_eq!(wall.handle(Event::Print, &mut pending).await, CycleOutcome::Failed);
        assert!(wall.copies().is_empty());
        assert_eq!(wall.step(), Generation::ORIGINAL);
        assert_eq!(wall.state(), WallState::Idle);
        assert_eq!(drain(&mut events), vec![Event::ScanStart]);

        // The next print works once the source is back.
        source.fail.store(false, Ordering::SeqCst);
        assert_eq!(
            wall.handle(Event::Print, &mut pending).await,
            CycleOutcome::Completed(Generation::new(1))
        );
    }

    #[tokio::test]
    async fn copies_are_written_to_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (wall, _, _events) = wall();
        let mut wall = wall.with_output_dir(dir.path());
        let (_tx, mut pending) = mpsc::unbounded_channel();

        wall.place_original().await.unwrap();
        wall.handle(Event::Print, &mut pending).await;

        assert!(dir.path().join("copy-0000.png").exists());
        assert!(dir.path().join("copy-0001.png").exists());
    }
}
