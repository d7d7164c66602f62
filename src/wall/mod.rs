//! # Wall
//!
//! The display side of the installation. On every `print` it sweeps a scan
//! bar across the screen, renders the next generation of the source image
//! through the degradation engine and stacks it on top of the earlier copies.
//!
//! - [`orchestrator`]: the print-cycle state machine and copy records.
//! - [`layout`]: card size, placement and container bounds.
//! - [`source`]: where the source image is fetched from.
//! - [`animation`]: timing-only animations for a headless wall.

pub mod animation;
pub mod layout;
pub mod orchestrator;
pub mod source;

pub use orchestrator::{Animator, CopyRecord, CycleOutcome, WallOrchestrator, WallState};
pub use source::{FileImageSource, HttpImageSource, ImageSource};
