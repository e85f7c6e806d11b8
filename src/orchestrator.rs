// src/orchestrator.rs

//! Multi-block orchestration.
//!
//! Sizes one output surface per paragraph, activates each paragraph in input
//! order, and keeps the resulting blocks together so a single frame clock can
//! drive all of them. Blocks are processed strictly one after another: a block
//! is fully activated (probe included) before the next one starts.

use crate::config::FusionConfig;
use crate::engine::{activate, Activation};
use crate::error::FusionError;
use crate::layout::{layout, surface_height};
use crate::platform::{FrameClock, Host, RasterSurface};
use crate::scheduler::FrameRequest;
use log::{info, warn};

/// All activated blocks of one batch, in input order.
#[derive(Debug)]
pub struct Batch<S> {
    blocks: Vec<Activation<S>>,
}

impl<S: RasterSurface> Batch<S> {
    /// One entry per block: `true` if that block is fusing.
    pub fn results(&self) -> Vec<bool> {
        self.blocks.iter().map(Activation::is_fusing).collect()
    }

    /// Whether any block fell back to static rendering. Callers typically
    /// warn the user when this is true.
    pub fn any_static(&self) -> bool {
        self.blocks.iter().any(|b| !b.is_fusing())
    }

    pub fn blocks(&self) -> &[Activation<S>] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Ticks every live block once. Returns `Stopped` when no block wants
    /// further frames.
    pub fn tick(&mut self, now: f64) -> FrameRequest {
        let mut any_live = false;
        for block in &mut self.blocks {
            if block.tick(now) == FrameRequest::Continue {
                any_live = true;
            }
        }
        if any_live {
            FrameRequest::Continue
        } else {
            FrameRequest::Stopped
        }
    }

    /// Drives all blocks from `clock` until every block is stopped or the
    /// clock ends.
    pub fn run<C: FrameClock + ?Sized>(&mut self, clock: &mut C) -> Result<(), FusionError> {
        while self.blocks.iter().any(Activation::is_live) {
            let now = match clock.next_frame() {
                Ok(ts) => ts,
                Err(FusionError::ClockStopped) => return Ok(()),
                Err(e) => return Err(e),
            };
            if self.tick(now) == FrameRequest::Stopped {
                break;
            }
        }
        Ok(())
    }

    pub fn stop_all(&self) {
        for block in &self.blocks {
            block.stop();
        }
    }

    pub fn into_blocks(self) -> Vec<Activation<S>> {
        self.blocks
    }
}

/// Activates each of `texts` on its own `width`-pixel-wide surface, tall
/// enough for its layout.
///
/// An invalid `config` is rejected before any surface is allocated. The first
/// failing block aborts the batch; blocks built before it are dropped, so
/// nothing is left running.
pub fn render_batch<H, C, T>(
    host: &mut H,
    clock: &mut C,
    width: u32,
    texts: &[T],
    config: &FusionConfig,
) -> Result<Batch<H::Surface>, FusionError>
where
    H: Host,
    C: FrameClock + ?Sized,
    T: AsRef<str>,
{
    // Surface sizing reads the spatial fields.
    config.validate()?;

    let mut blocks = Vec::with_capacity(texts.len());
    for (index, text) in texts.iter().enumerate() {
        let block = render_block(host, clock, width, text.as_ref(), config).map_err(|e| {
            FusionError::Block {
                index,
                source: Box::new(e),
            }
        })?;
        blocks.push(block);
    }

    let batch = Batch { blocks };
    let fusing = batch.results().iter().filter(|&&f| f).count();
    info!(
        "render_batch: {} blocks, {} fusing, {} static",
        batch.len(),
        fusing,
        batch.len() - fusing
    );
    if batch.any_static() {
        warn!("render_batch: some blocks fell back to static rendering");
    }
    Ok(batch)
}

fn render_block<H, C>(
    host: &mut H,
    clock: &mut C,
    width: u32,
    text: &str,
    config: &FusionConfig,
) -> Result<Activation<H::Surface>, FusionError>
where
    H: Host,
    C: FrameClock + ?Sized,
{
    // A 1-pixel-high probe surface gives us font measurement for sizing.
    let mut sizing = host.create_surface(width, 1)?;
    sizing.set_font(&config.font)?;
    let glyphs = layout(text, width as f32, config, &sizing);
    let height = surface_height(&glyphs, config);
    drop(sizing);

    let output = host.create_surface(width, height)?;
    activate(host, clock, output, text, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{MockHost, ScriptedClock};
    use test_log::test;

    fn clock_at(hz: f64, frames: usize) -> ScriptedClock {
        ScriptedClock::periodic(0.0, 1000.0 / hz, frames)
    }

    #[test]
    fn it_should_size_each_output_to_its_text() {
        let mut host = MockHost::new(10.0);
        let mut clock = clock_at(60.0, 100);
        let texts = ["AB\nC", "one line", ""];
        let batch =
            render_batch(&mut host, &mut clock, 200, &texts, &FusionConfig::default()).unwrap();

        assert_eq!(batch.results(), vec![true, true, true]);
        let heights: Vec<u32> = batch.blocks().iter().map(|b| b.output().height).collect();
        assert_eq!(heights, vec![60, 40, 40]);
        // Two probe frames per block, taken sequentially.
        assert_eq!(clock.remaining(), 100 - 2 * texts.len());
    }

    #[test]
    fn it_should_report_static_blocks() {
        let mut host = MockHost::new(10.0);
        host.reduced_motion = true;
        let mut clock = clock_at(60.0, 10);
        let batch = render_batch(
            &mut host,
            &mut clock,
            200,
            &["first", "second"],
            &FusionConfig::default(),
        )
        .unwrap();
        assert_eq!(batch.results(), vec![false, false]);
        assert!(batch.any_static());
    }

    #[test]
    fn failure_names_the_block_and_aborts() {
        let mut host = MockHost::new(10.0);
        // Block 0 allocates sizing, output, A, B (0..=3); block 1's sizing is 4.
        host.fail_allocation = Some(5);
        let mut clock = clock_at(60.0, 10);
        let err = render_batch(
            &mut host,
            &mut clock,
            200,
            &["first", "second", "third"],
            &FusionConfig::default(),
        )
        .unwrap_err();
        match err {
            FusionError::Block { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, FusionError::SurfaceUnavailable { .. }));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(host.allocations.len(), 6);
    }

    #[test]
    fn invalid_config_is_rejected_before_any_allocation() {
        let mut host = MockHost::new(10.0);
        let mut clock = clock_at(60.0, 10);
        let config = FusionConfig {
            line_height: -20.0,
            ..FusionConfig::default()
        };
        let err = render_batch(&mut host, &mut clock, 200, &["first"], &config).unwrap_err();
        assert!(matches!(err, FusionError::InvalidConfig(_)));
        assert!(host.allocations.is_empty());
        assert_eq!(clock.remaining(), 10);
    }

    #[test]
    fn batch_run_drives_every_block_until_the_clock_ends() {
        let mut host = MockHost::new(10.0);
        let mut clock = clock_at(125.0, 24);
        let mut batch = render_batch(
            &mut host,
            &mut clock,
            200,
            &["ab", "cd"],
            &FusionConfig::default(),
        )
        .unwrap();
        batch.run(&mut clock).unwrap();
        assert_eq!(clock.remaining(), 0);
        for block in batch.blocks() {
            match block {
                Activation::Fusing(h) => assert_eq!(h.swap_count(), 20),
                Activation::Static(_) => panic!("expected fusing block"),
            }
        }
    }

    #[test]
    fn stop_all_ends_the_run_loop() {
        let mut host = MockHost::new(10.0);
        let mut clock = clock_at(125.0, 40);
        let mut batch = render_batch(
            &mut host,
            &mut clock,
            200,
            &["ab", "cd"],
            &FusionConfig::default(),
        )
        .unwrap();
        assert_eq!(batch.tick(100.0), FrameRequest::Continue);
        batch.stop_all();
        assert_eq!(batch.tick(104.0), FrameRequest::Stopped);
        batch.run(&mut clock).unwrap();
        assert_eq!(clock.remaining(), 36);
    }
}
