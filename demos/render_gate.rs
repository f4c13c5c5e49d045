//! Renders a gated pad to a WAV file.
//!
//! A detuned saw chord runs through the processor for eight beats at 120 BPM
//! with a quarter note gate pattern, then eight more beats with pattern 2
//! queued on the next bar.
//!
//! Usage: cargo run --example render_gate [output.wav]

use std::sync::Arc;

use anyhow::Result;
use curvegate::processor::{Controller, ParamId, Processor, Shared, Transport};
use curvegate::{MidiEvent, PointType};
use tracing::info;

const SAMPLE_RATE: u32 = 44100;
const BLOCK_SIZE: usize = 512;
const TEMPO: f64 = 120.0;

/// A few detuned sawtooth voices.
struct Pad {
    phases: Vec<f64>,
    freqs: Vec<f64>,
}

impl Pad {
    fn new(freqs: &[f64]) -> Self {
        let freqs: Vec<f64> = freqs
            .iter()
            .flat_map(|&f| [f * 0.997, f * 1.003])
            .collect();
        Self {
            phases: vec![0.0; freqs.len()],
            freqs,
        }
    }

    fn next_sample(&mut self) -> f64 {
        let mut out = 0.0;
        for (phase, freq) in self.phases.iter_mut().zip(&self.freqs) {
            out += *phase * 2.0 - 1.0;
            *phase = (*phase + freq / SAMPLE_RATE as f64).fract();
        }
        out / self.freqs.len() as f64 * 0.5
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "render_gate.wav".to_string());

    let shared = Arc::new(Shared::new());
    let mut controller = Controller::new(Arc::clone(&shared));

    // pattern 1: four hard gates per cycle
    controller.edit_pattern(0, |p| {
        p.clear();
        for step in 0..4 {
            let x = step as f64 / 4.0;
            p.insert_point(x, 0.0, 0.0, PointType::Hold, false);
            p.insert_point(x + 0.125, 1.0, 0.0, PointType::Hold, false);
        }
        p.insert_point(1.0, 0.0, 0.0, PointType::Hold, false);
        p.sort_points();
    })?;
    // pattern 2: a smooth swell
    controller.edit_pattern(1, |p| p.load_sine())?;

    let params = shared.params();
    params.set(ParamId::Sync, 3.0); // 1/4
    params.set(ParamId::PatSync, 3.0); // switch on the beat
    params.set(ParamId::Attack, 0.05);
    params.set(ParamId::Release, 0.1);

    let mut processor = Processor::new(Arc::clone(&shared), SAMPLE_RATE as f64);
    let mut pad = Pad::new(&[220.0, 277.18, 329.63]);
    let mut transport = Transport::playing(TEMPO);

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;

    let total = (SAMPLE_RATE as f64 * 60.0 / TEMPO * 16.0) as usize;
    let halfway = total / 2;
    let mut left = vec![0.0f32; BLOCK_SIZE];
    let mut right = vec![0.0f32; BLOCK_SIZE];
    let mut midi_out: Vec<MidiEvent> = Vec::with_capacity(64);

    let mut rendered = 0;
    let mut switched = false;
    while rendered < total {
        if !switched && rendered >= halfway {
            controller.queue_pattern(2);
            switched = true;
        }

        let n = BLOCK_SIZE.min(total - rendered);
        for i in 0..n {
            let s = pad.next_sample() as f32;
            left[i] = s;
            right[i] = s;
        }
        midi_out.clear();
        processor.process_block(
            &mut [&mut left[..n], &mut right[..n]],
            &[],
            &transport,
            &[],
            &mut midi_out,
        );
        controller.poll();

        for i in 0..n {
            writer.write_sample(left[i])?;
            writer.write_sample(right[i])?;
        }
        transport.advance(n, SAMPLE_RATE as f64);
        rendered += n;
    }

    writer.finalize()?;
    info!(
        path = %path,
        seconds = total as f64 / SAMPLE_RATE as f64,
        pattern = shared.active_pattern() + 1,
        "Rendered"
    );
    Ok(())
}
