//! Values the audio thread publishes for the editor.
//!
//! Single writer, any number of readers. Position scalars are atomics; the
//! waveform columns are arrays of atomic floats, so a reader may see a column
//! from the previous pass but never a torn value.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::atomic::{AtomicF32, AtomicF64};

use super::consts::{HIT_MARKER, MAX_VIEW_WIDTH, MONITOR_SECONDS};

/// Playback position, waveform and transient monitor state.
#[derive(Debug)]
pub struct Display {
    xenv: AtomicF64,
    yenv: AtomicF64,
    draw_seek: AtomicBool,
    monpos: AtomicF64,
    view_width: AtomicUsize,
    monitor_width: AtomicUsize,
    pre: Box<[AtomicF32]>,
    post: Box<[AtomicF32]>,
    monitor: Box<[AtomicF32]>,
}

fn columns() -> Box<[AtomicF32]> {
    (0..MAX_VIEW_WIDTH).map(|_| AtomicF32::default()).collect()
}

fn snapshot(cells: &[AtomicF32], width: usize) -> Vec<f32> {
    cells[..width].iter().map(AtomicF32::load).collect()
}

impl Default for Display {
    fn default() -> Self {
        Self {
            xenv: AtomicF64::default(),
            yenv: AtomicF64::default(),
            draw_seek: AtomicBool::new(false),
            monpos: AtomicF64::default(),
            view_width: AtomicUsize::new(1),
            monitor_width: AtomicUsize::new(1),
            pre: columns(),
            post: columns(),
            monitor: columns(),
        }
    }
}

impl Display {
    /// Envelope position `(x, y)` of the last processed sample.
    pub fn position(&self) -> (f64, f64) {
        (self.xenv.load(), self.yenv.load())
    }

    pub(crate) fn set_position(&self, x: f64, y: f64) {
        self.xenv.store(x);
        self.yenv.store(y);
    }

    /// Whether the editor should draw the playhead.
    pub fn draw_seek(&self) -> bool {
        self.draw_seek.load(Ordering::Relaxed)
    }

    pub(crate) fn set_draw_seek(&self, value: bool) {
        self.draw_seek.store(value, Ordering::Relaxed);
    }

    pub fn view_width(&self) -> usize {
        self.view_width.load(Ordering::Relaxed)
    }

    /// Number of waveform columns, clamped to `1..=MAX_VIEW_WIDTH`.
    pub fn set_view_width(&self, width: usize) {
        self.view_width
            .store(width.clamp(1, MAX_VIEW_WIDTH), Ordering::Relaxed);
    }

    pub fn monitor_width(&self) -> usize {
        self.monitor_width.load(Ordering::Relaxed)
    }

    pub fn set_monitor_width(&self, width: usize) {
        self.monitor_width
            .store(width.clamp(1, MAX_VIEW_WIDTH), Ordering::Relaxed);
    }

    /// Input peaks per column.
    pub fn pre_samples(&self) -> Vec<f32> {
        snapshot(&self.pre, self.view_width())
    }

    /// Output peaks per column.
    pub fn post_samples(&self) -> Vec<f32> {
        snapshot(&self.post, self.view_width())
    }

    /// Monitor peaks per column; hits are encoded by adding [`HIT_MARKER`].
    pub fn monitor_samples(&self) -> Vec<f32> {
        snapshot(&self.monitor, self.monitor_width())
    }

    /// Current write column of the monitor ring.
    pub fn monitor_position(&self) -> f64 {
        self.monpos.load()
    }

    pub(crate) fn clear_waveform(&self) {
        for cell in self.pre.iter().chain(self.post.iter()) {
            cell.store(0.0);
        }
    }

    pub(crate) fn clear_monitor(&self) {
        for cell in self.monitor.iter() {
            cell.store(0.0);
        }
        self.monpos.store(0.0);
    }
}

/// Audio thread side of [`Display`]: remembers which columns it last wrote.
#[derive(Debug, Clone, Default)]
pub(crate) struct DisplayWriter {
    last_column: Option<usize>,
    last_monitor_column: Option<usize>,
}

impl DisplayWriter {
    /// Records input and output peaks at pattern position `pos`.
    pub fn waveform(&mut self, display: &Display, pos: f64, env: f64, left: f64, right: f64) {
        let width = display.view_width();
        let column = ((pos * width as f64).floor().max(0.0) as usize).min(width - 1);
        if self.last_column != Some(column) {
            display.pre[column].store(0.0);
            display.post[column].store(0.0);
        }
        self.last_column = Some(column);

        let pre = left.abs().max(right.abs());
        let post = pre * env;
        let pre_cell = &display.pre[column];
        if (pre_cell.load() as f64) < pre {
            pre_cell.store(pre as f32);
        }
        let post_cell = &display.post[column];
        if (post_cell.load() as f64) < post {
            post_cell.store(post as f32);
        }
    }

    /// Records the detection signal on the monitor ring, which scrolls
    /// through [`MONITOR_SECONDS`] of audio.
    pub fn monitor(&mut self, display: &Display, sample_rate: f64, left: f64, right: f64, hit: Option<f64>) {
        let width = display.monitor_width();
        let step = width as f64 / (sample_rate * MONITOR_SECONDS);
        let mut pos = display.monpos.load() + step;
        if pos >= width as f64 {
            pos -= width as f64;
        }
        let column = (pos.max(0.0) as usize).min(width - 1);
        let cell = &display.monitor[column];
        if self.last_monitor_column != Some(column) {
            cell.store(0.0);
        }
        self.last_monitor_column = Some(column);

        let current = cell.load() as f64;
        let mut amp = left.abs().max(right.abs());
        if let Some(hit_amp) = hit {
            amp = (amp + HIT_MARKER).max(hit_amp + HIT_MARKER);
        } else if current >= HIT_MARKER {
            // keep the column marked
            amp += HIT_MARKER;
        }
        cell.store(current.max(amp) as f32);
        display.monpos.store(pos);
    }

    pub fn reset(&mut self) {
        self.last_column = None;
        self.last_monitor_column = None;
    }
}
