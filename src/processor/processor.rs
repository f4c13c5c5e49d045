//! The real-time engine.
//!
//! [`Processor`] runs on the audio thread. Per block it reads parameters and
//! settings once, follows the host transport, then walks the block sample by
//! sample: advancing the playback position, handling MIDI at its exact
//! offset, switching patterns on the quantization grid, detecting
//! transients, and writing the gated output. Nothing in here allocates,
//! locks or returns an error.

use std::sync::Arc;

use crate::delay::DelayLine;
use crate::filters::{Biquad, RcSmoother};
use crate::pattern::Curve;
use crate::sample::Sample;
use crate::transient::{DetectionAlgorithm, TransientDetector};

use super::clock::Clock;
use super::consts::{ANY_CHANNEL, AUDIO_LATENCY_MILLIS, AUDIO_NOTE_LENGTH_MILLIS, PATTERN_COUNT, audio_latency_samples};
use super::display::DisplayWriter;
use super::params::{ParamId, PatSync, Params, Trigger};
use super::settings::Settings;
use super::shared::Shared;
use super::transport::{MidiEvent, MidiMessage, Transport};

const FILTER_Q: f64 = 0.707;
const LOWCUT_OFF: f64 = 20.0;
const HIGHCUT_OFF: f64 = 20000.0;
// fraction of the envelope after which a new hit may restart it
const RETRIGGER_POSITION: f64 = 0.98;
const PENDING_MIDI_CAPACITY: usize = 256;

/// Parameter values read once per block.
#[derive(Debug, Clone, Copy)]
struct BlockParams {
    mix: f64,
    trigger: Trigger,
    sync_qn: Option<f64>,
    rate: f64,
    phase: f64,
    min: f64,
    max: f64,
    pat_sync: PatSync,
    algo: DetectionAlgorithm,
    threshold: f64,
    sense: f64,
    lowcut: f64,
    highcut: f64,
    offset: f64,
}

impl BlockParams {
    fn read(params: &Params) -> Self {
        let sense = 1.0 - params.get_f64(ParamId::Sense);
        Self {
            mix: params.get_f64(ParamId::Mix),
            trigger: params.trigger(),
            sync_qn: params.sync_rate().quarter_notes(),
            rate: params.get_f64(ParamId::Rate),
            phase: params.get_f64(ParamId::Phase),
            min: params.get_f64(ParamId::Min),
            max: params.get_f64(ParamId::Max),
            pat_sync: params.pat_sync(),
            algo: params.algorithm(),
            threshold: params.get_f64(ParamId::Threshold),
            // squared so the upper half of the knob is more responsive
            sense: sense * sense,
            lowcut: params.get_f64(ParamId::LowCut),
            highcut: params.get_f64(ParamId::HighCut),
            offset: params.get_f64(ParamId::Offset),
        }
    }

    /// Position the envelope rests at between one-shot triggers.
    fn rest_position(&self) -> f64 {
        if self.phase != 0.0 { self.phase } else { 1.0 }
    }
}

/// Audio thread side of the plugin.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use curvegate::processor::{Processor, Shared, Transport};
/// use curvegate::Pattern;
///
/// let shared = Arc::new(Shared::new());
/// let mut square = Pattern::new(0);
/// square.load_text("0 0 0 0 0.5 1 0 0 1 0 0 0").unwrap();
/// shared.publish(0, square.curve().clone());
///
/// let mut processor = Processor::new(shared, 48000.0);
/// let mut left = vec![1.0f32; 256];
/// let mut right = vec![1.0f32; 256];
/// let mut midi_out = Vec::new();
/// processor.process_block(
///     &mut [&mut left[..], &mut right[..]],
///     &[],
///     &Transport::playing(120.0),
///     &[],
///     &mut midi_out,
/// );
/// // the first half of the pattern is at the top, so audio passes
/// assert_eq!(left[255], 1.0);
/// ```
pub struct Processor {
    shared: Arc<Shared>,
    sample_rate: f64,
    clock: Clock,
    curve: Arc<Curve>,
    active: usize,
    settings: Arc<Settings>,
    block: BlockParams,
    params_version: Option<u64>,
    trigger: Option<Trigger>,
    playing: bool,

    // envelope
    smoother: RcSmoother,
    xpos: f64,
    ypos: f64,
    trigpos: f64,
    trigpos_since_hit: f64,
    trigphase: f64,
    midi_trigger: bool,
    audio_trigger: bool,
    xfade_len: usize,
    xfade_left: usize,
    xfade_from: f64,

    // pattern queue
    queued_seen: usize,
    queued_countdown: i64,

    // audio trigger
    detectors: [TransientDetector; 2],
    lowpass: [Biquad; 2],
    highpass: [Biquad; 2],
    delays: [DelayLine; 2],
    monitor_delays: [DelayLine; 2],
    latency: usize,
    audio_countdown: i64,
    hitamp: f64,

    pending_midi: Vec<MidiEvent>,
    display: DisplayWriter,
}

impl Processor {
    pub fn new(shared: Arc<Shared>, sample_rate: f64) -> Self {
        let active = shared.active_pattern().min(PATTERN_COUNT - 1);
        let block = BlockParams::read(shared.params());
        let mut processor = Self {
            curve: shared.curve(active),
            settings: shared.settings(),
            active,
            block,
            shared,
            sample_rate,
            clock: Clock::new(sample_rate),
            params_version: None,
            trigger: None,
            playing: false,
            smoother: RcSmoother::default(),
            xpos: 0.0,
            ypos: 0.0,
            trigpos: 0.0,
            trigpos_since_hit: 1.0,
            trigphase: 0.0,
            midi_trigger: false,
            audio_trigger: false,
            xfade_len: 0,
            xfade_left: 0,
            xfade_from: 0.0,
            queued_seen: 0,
            queued_countdown: 0,
            detectors: [
                TransientDetector::new(sample_rate),
                TransientDetector::new(sample_rate),
            ],
            lowpass: Default::default(),
            highpass: Default::default(),
            delays: Default::default(),
            monitor_delays: Default::default(),
            latency: 0,
            audio_countdown: -1,
            hitamp: 0.0,
            pending_midi: Vec::with_capacity(PENDING_MIDI_CAPACITY),
            display: DisplayWriter::default(),
        };
        processor.prepare(sample_rate);
        processor
    }

    /// Sets up every sample rate dependent part. Call before processing and
    /// whenever the host changes the rate; this may allocate.
    pub fn prepare(&mut self, sample_rate: f64) {
        let sample_rate = if sample_rate > 0.0 { sample_rate } else { 44100.0 };
        self.sample_rate = sample_rate;
        self.clock.set_sample_rate(sample_rate);

        for detector in &mut self.detectors {
            detector.prepare(sample_rate);
        }
        for filter in self.lowpass.iter_mut().chain(self.highpass.iter_mut()) {
            filter.clear(0.0);
        }
        // room for the audio mode latency so switching modes never allocates
        let capacity = audio_latency_samples(sample_rate) + 1;
        for delay in self.delays.iter_mut().chain(self.monitor_delays.iter_mut()) {
            delay.reserve(capacity);
        }

        let trigger = self.shared.params().trigger();
        self.update_latency(trigger);
        self.trigger = Some(trigger);
        self.clear_latency_buffers();
        self.shared.display().clear_monitor();
        self.display.reset();
        self.on_params();
        self.params_version = Some(self.shared.params().version());
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Latency in samples currently added to the output.
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// Envelope position of the last processed sample.
    pub fn xpos(&self) -> f64 {
        self.xpos
    }

    /// Envelope value of the last processed sample.
    pub fn ypos(&self) -> f64 {
        self.ypos
    }

    /// Pattern slot being played, 0 based.
    pub fn active_pattern(&self) -> usize {
        self.active
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Processes one block in place.
    ///
    /// `channels` are the planar main inputs, overwritten with the output.
    /// `sidechain` may be empty. `midi_in` offsets are clamped into the
    /// block. Output events are appended to `midi_out`; give it spare
    /// capacity to keep the call allocation free.
    pub fn process_block<T: Sample>(
        &mut self,
        channels: &mut [&mut [T]],
        sidechain: &[&[T]],
        transport: &Transport,
        midi_in: &[MidiEvent],
        midi_out: &mut Vec<MidiEvent>,
    ) {
        self.block = BlockParams::read(self.shared.params());
        let settings = self.shared.settings();
        let settings_changed = !Arc::ptr_eq(&settings, &self.settings);
        self.settings = settings;

        self.update_transport(transport);

        let version = self.shared.params().version();
        if settings_changed || self.params_version != Some(version) {
            self.params_version = Some(version);
            self.on_params();
        }
        self.curve = self.shared.curve(self.active);

        let num_samples = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        if num_samples == 0 {
            return;
        }

        self.flush_pending_midi(num_samples, midi_out);

        // the envelope value of the previous block goes out first
        if self.settings.output_cc > 0 {
            midi_out.push(MidiEvent::new(
                0,
                MidiMessage::ControlChange {
                    channel: self.settings.output_cc_chan.min(15),
                    controller: (self.settings.output_cc - 1).min(127),
                    value: cc_value(self.ypos, self.settings.bipolar_cc),
                },
            ));
        }

        for i in 0..num_samples {
            if self.playing && transport.looping {
                self.clock
                    .wrap_loop(transport.loop_start, transport.loop_end, self.block.rate);
            }

            for event in midi_in {
                if event.offset.min(num_samples - 1) == i {
                    self.handle_midi(&event.message);
                }
            }

            self.process_queue();

            match self.block.trigger {
                Trigger::Sync => self.sync_sample(channels, i),
                Trigger::Midi => self.midi_sample(channels, i),
                Trigger::Audio => self.audio_sample(channels, sidechain, i, num_samples, midi_out),
            }

            self.shared.display().set_position(self.xpos, self.ypos);
            self.clock.tick(self.block.rate, self.playing);
        }

        let seeking = self.playing
            && (self.block.trigger == Trigger::Sync || self.midi_trigger || self.audio_trigger);
        self.shared.display().set_draw_seek(seeking);
    }

    fn always_playing(&self) -> bool {
        self.settings.always_playing && self.block.trigger != Trigger::Sync
    }

    fn update_transport(&mut self, transport: &Transport) {
        self.clock.set_tempo(transport.tempo);
        if !self.playing && transport.playing {
            self.on_play(transport.beat_position);
        } else if self.playing && !transport.playing {
            self.on_stop();
        }
        self.playing = transport.playing;
        if self.playing {
            self.clock.set_time_in_samples(transport.time_in_samples);
        }
    }

    fn on_play(&mut self, beat_position: f64) {
        self.shared.display().clear_waveform();
        self.clear_latency_buffers();
        self.midi_trigger = false;
        self.audio_trigger = false;

        self.clock.locate(beat_position, self.block.rate);
        self.trigpos = 0.0;
        self.trigpos_since_hit = 1.0;
        self.trigphase = self.block.phase;
        self.audio_countdown = -1;
        for detector in &mut self.detectors {
            detector.reset();
        }

        if self.block.trigger == Trigger::Sync || self.always_playing() {
            self.restart_env(false);
        }
    }

    fn on_stop(&mut self) {
        self.shared.set_latency_warning(false);
    }

    // reacts to parameter or settings changes
    fn on_params(&mut self) {
        self.set_smooth();

        let trigger = self.block.trigger;
        if self.trigger != Some(trigger) {
            let previous = self.latency;
            self.update_latency(trigger);
            if self.latency != previous && self.playing {
                self.shared.set_latency_warning(true);
            }
            self.clear_latency_buffers();
            self.trigger = Some(trigger);
        }
        if trigger != Trigger::Midi {
            self.midi_trigger = false;
        }
        if trigger != Trigger::Audio {
            self.audio_trigger = false;
        }

        let pattern = self.shared.params().pattern();
        if pattern != self.active + 1 && pattern != self.shared.queued_pattern() {
            self.shared.queue_pattern(pattern);
        }

        for filter in &mut self.lowpass {
            filter.lp(self.sample_rate, self.block.highcut, FILTER_Q);
        }
        for filter in &mut self.highpass {
            filter.hp(self.sample_rate, self.block.lowcut, FILTER_Q);
        }

        self.xfade_len = self.settings.anti_noise.samples(self.sample_rate);
        if self.xfade_left > self.xfade_len {
            self.xfade_left = self.xfade_len;
        }
    }

    fn set_smooth(&mut self) {
        let params = self.shared.params();
        let (rise, fall) = if self.settings.dual_smooth {
            let attack = params.get_f64(ParamId::Attack);
            let release = params.get_f64(ParamId::Release);
            (attack * attack, release * release)
        } else {
            let smooth = params.get_f64(ParamId::Smooth);
            (smooth * smooth, smooth * smooth)
        };
        self.smoother.setup(rise * 0.25, fall * 0.25, self.sample_rate);
    }

    fn update_latency(&mut self, trigger: Trigger) {
        self.latency = match trigger {
            Trigger::Audio => audio_latency_samples(self.sample_rate),
            _ => 0,
        };
        self.shared.set_latency(self.latency);
    }

    fn clear_latency_buffers(&mut self) {
        let size = self.latency + 1;
        for delay in self.delays.iter_mut().chain(self.monitor_delays.iter_mut()) {
            delay.resize(size, true);
        }
    }

    fn flush_pending_midi(&mut self, num_samples: usize, midi_out: &mut Vec<MidiEvent>) {
        self.pending_midi.retain_mut(|event| {
            if event.offset < num_samples {
                midi_out.push(*event);
                false
            } else {
                event.offset -= num_samples;
                true
            }
        });
    }

    fn handle_midi(&mut self, message: &MidiMessage) {
        let Some((channel, note)) = message.note_on() else {
            return;
        };
        let selector = self.settings.trigger_chn;
        if channel == selector || selector == ANY_CHANNEL {
            self.shared.queue_pattern(note as usize % PATTERN_COUNT + 1);
        } else if self.block.trigger == Trigger::Midi {
            self.shared.display().clear_waveform();
            self.midi_trigger = !self.always_playing();
            self.trigpos = 0.0;
            self.trigphase = self.block.phase;
            self.restart_env(true);
        }
    }

    fn process_queue(&mut self) {
        let queued = self.shared.queued_pattern();
        if queued == 0 {
            self.queued_seen = 0;
            return;
        }
        if queued != self.queued_seen {
            self.queued_seen = queued;
            self.queued_countdown = if self.playing {
                self.block
                    .pat_sync
                    .countdown(self.clock.samples_per_beat(), self.clock.time_in_samples())
            } else {
                0
            };
        }

        if !self.playing || self.queued_countdown == 0 {
            if self.shared.take_queued(queued) {
                self.switch_pattern(queued - 1);
            }
            self.queued_seen = 0;
        }
        if self.queued_countdown > 0 {
            self.queued_countdown -= 1;
        }
    }

    fn switch_pattern(&mut self, index: usize) {
        let index = index.min(PATTERN_COUNT - 1);
        self.active = index;
        self.curve = self.shared.curve(index);
        self.shared.set_active_pattern(index);
    }

    #[inline]
    fn get_y(&self, x: f64) -> f64 {
        let b = &self.block;
        b.min + (b.max - b.min) * (1.0 - self.curve.y_at(x))
    }

    fn restart_env(&mut self, from_zero: bool) {
        let previous = self.ypos;
        self.xpos = if from_zero {
            self.block.phase
        } else {
            self.clock.position(self.block.sync_qn, self.block.phase)
        };
        self.smoother.reset(self.get_y(self.xpos));
        if self.xfade_len > 0 {
            self.xfade_from = previous;
            self.xfade_left = self.xfade_len;
        }
    }

    // evaluates, smooths and crossfades the envelope at xpos
    #[inline]
    fn update_envelope(&mut self) {
        let target = self.get_y(self.xpos);
        let mut y = self.smoother.process(target, target > self.ypos);
        if self.xfade_left > 0 {
            let t = 1.0 - self.xfade_left as f64 / self.xfade_len as f64;
            y = self.xfade_from + (y - self.xfade_from) * t;
            self.xfade_left -= 1;
        }
        self.ypos = y;
    }

    // moves a one-shot envelope forward, parking it when done
    #[inline]
    fn advance_one_shot(&mut self, triggered: bool) -> bool {
        let inc = self.clock.increment(self.block.sync_qn, self.block.rate);
        self.xpos += inc;
        self.trigpos += inc;
        self.trigpos_since_hit += inc;
        self.xpos -= self.xpos.floor();

        let mut triggered = triggered;
        if !self.always_playing() {
            if triggered && self.trigpos >= 1.0 {
                triggered = false;
            }
            if !triggered {
                self.xpos = self.block.rest_position();
            }
        }
        triggered
    }

    fn view_position(&self, triggered: bool) -> f64 {
        if self.always_playing() || triggered {
            self.xpos
        } else {
            let x = self.trigpos + self.trigphase;
            x - x.floor()
        }
    }

    fn sync_sample<T: Sample>(&mut self, channels: &mut [&mut [T]], i: usize) {
        self.xpos = self.clock.position(self.block.sync_qn, self.block.phase);
        self.update_envelope();

        let (left, right) = main_input(channels, i);
        self.apply_gain(channels, i, left, right);
        self.display
            .waveform(self.shared.display(), self.xpos, self.ypos, left, right);
    }

    fn midi_sample<T: Sample>(&mut self, channels: &mut [&mut [T]], i: usize) {
        self.midi_trigger = self.advance_one_shot(self.midi_trigger);
        self.update_envelope();

        let (left, right) = main_input(channels, i);
        self.apply_gain(channels, i, left, right);
        let view = self.view_position(self.midi_trigger);
        self.display
            .waveform(self.shared.display(), view, self.ypos, left, right);
    }

    fn audio_sample<T: Sample>(
        &mut self,
        channels: &mut [&mut [T]],
        sidechain: &[&[T]],
        i: usize,
        num_samples: usize,
        midi_out: &mut Vec<MidiEvent>,
    ) {
        let (left, right) = main_input(channels, i);
        let (mut mon_left, mut mon_right) = if self.settings.use_sidechain && !sidechain.is_empty() {
            let side_right = sidechain.len().min(2) - 1;
            (
                sidechain[0].get(i).map_or(0.0, |s| s.to_f64()),
                sidechain[side_right].get(i).map_or(0.0, |s| s.to_f64()),
            )
        } else {
            (left, right)
        };

        if self.block.lowcut > LOWCUT_OFF {
            mon_left = self.highpass[0].df1(mon_left);
            mon_right = self.highpass[1].df1(mon_right);
        }
        if self.block.highcut < HIGHCUT_OFF {
            mon_left = self.lowpass[0].df1(mon_left);
            mon_right = self.lowpass[1].df1(mon_right);
        }

        // both channels see every sample
        let b = self.block;
        let hit_left = self.detectors[0].detect(b.algo, mon_left, b.threshold, b.sense);
        let hit_right = self.detectors[1].detect(b.algo, mon_right, b.threshold, b.sense);
        if hit_left || hit_right {
            for detector in &mut self.detectors {
                detector.start_cooldown();
            }
            let offset = (b.offset * AUDIO_LATENCY_MILLIS / 1000.0 * self.sample_rate) as i64;
            self.audio_countdown = (self.latency as i64 + offset).max(0);
            self.hitamp = if hit_left { mon_left.abs() } else { mon_right.abs() };
        }

        // hold the dry and monitor signals back by the latency
        let (left, right, mon_left, mon_right) = if self.latency > 0 {
            let delay = self.latency as f64;
            let delayed = (
                self.delays[0].read(delay),
                self.delays[1].read(delay),
                self.monitor_delays[0].read(delay),
                self.monitor_delays[1].read(delay),
            );
            self.delays[0].write(left);
            self.delays[1].write(right);
            self.monitor_delays[0].write(mon_left);
            self.monitor_delays[1].write(mon_right);
            delayed
        } else {
            (left, right, mon_left, mon_right)
        };
        for (c, channel) in channels.iter_mut().enumerate() {
            channel[i] = T::from_f64(if c == 0 { left } else { right });
        }

        let hit = self.audio_countdown == 0;
        self.display.monitor(
            self.shared.display(),
            self.sample_rate,
            mon_left,
            mon_right,
            hit.then_some(self.hitamp),
        );

        let inc = self.clock.increment(b.sync_qn, b.rate);
        self.xpos += inc;
        self.trigpos += inc;
        self.trigpos_since_hit += inc;
        self.xpos -= self.xpos.floor();

        if hit && self.settings.output_at_midi > 0 {
            self.send_hit_note(i, num_samples, midi_out);
        }

        let accept = self.always_playing()
            || !self.settings.audio_ignore_hits_while_playing
            || self.trigpos_since_hit > RETRIGGER_POSITION;
        if hit && accept {
            self.shared.display().clear_waveform();
            self.audio_trigger = !self.always_playing();
            self.trigpos = 0.0;
            self.trigphase = b.phase;
            self.trigpos_since_hit = 0.0;
            self.restart_env(true);
        }

        if !self.always_playing() {
            if self.audio_trigger && self.trigpos >= 1.0 {
                self.audio_trigger = false;
            }
            if !self.audio_trigger {
                self.xpos = b.rest_position();
            }
        }

        self.update_envelope();

        if self.settings.use_monitor {
            for (c, channel) in channels.iter_mut().enumerate() {
                channel[i] = T::from_f64(if c == 0 { mon_left } else { mon_right });
            }
        } else {
            self.apply_gain(channels, i, left, right);
        }

        let view = self.view_position(self.audio_trigger);
        self.display
            .waveform(self.shared.display(), view, self.ypos, left, right);

        if self.audio_countdown > -1 {
            self.audio_countdown -= 1;
        }
    }

    fn send_hit_note(&mut self, i: usize, num_samples: usize, midi_out: &mut Vec<MidiEvent>) {
        let note = (self.settings.output_at_midi - 1).min(127);
        let velocity = ((self.hitamp.clamp(0.0, 1.0) * 127.0).round() as u8).max(1);
        midi_out.push(MidiEvent::new(
            i,
            MidiMessage::NoteOn {
                channel: 0,
                note,
                velocity,
            },
        ));

        let note_off = MidiMessage::NoteOff {
            channel: 0,
            note,
            velocity: 0,
        };
        let length = (self.sample_rate * AUDIO_NOTE_LENGTH_MILLIS / 1000.0) as usize;
        let offset = i + length;
        if offset < num_samples {
            midi_out.push(MidiEvent::new(offset, note_off));
        } else if self.pending_midi.len() < self.pending_midi.capacity() {
            self.pending_midi
                .push(MidiEvent::new(offset - num_samples, note_off));
        }
    }

    // mixes the envelope into every output channel
    #[inline]
    fn apply_gain<T: Sample>(&self, channels: &mut [&mut [T]], i: usize, left: f64, right: f64) {
        let env = self.ypos;
        let mix = self.block.mix;
        let cv = self.settings.output_cv;
        for (c, channel) in channels.iter_mut().enumerate() {
            let out = if cv {
                env
            } else {
                let wet = if c == 0 { left } else { right } * env;
                let dry = channel[i].to_f64();
                wet * mix + dry * (1.0 - mix)
            };
            channel[i] = T::from_f64(out);
        }
    }
}

#[inline]
fn main_input<T: Sample>(channels: &[&mut [T]], i: usize) -> (f64, f64) {
    let left = channels[0][i].to_f64();
    let right = channels[channels.len().min(2) - 1][i].to_f64();
    (left, right)
}

/// Seven bit controller value for an envelope level in `[0, 1]`.
///
/// Bipolar output is centered on zero and sent as seven bit two's
/// complement, so the bottom half of the range wraps to 64..127.
pub fn cc_value(ypos: f64, bipolar: bool) -> u8 {
    let mut value = (ypos.clamp(0.0, 1.0) * 127.0).round() as i32;
    if bipolar {
        value -= 64;
    }
    (value & 0x7f) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::processor::settings::AntiNoise;

    const SAMPLE_RATE: f64 = 48000.0;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn shared_with(text: &str) -> Arc<Shared> {
        let shared = Arc::new(Shared::new());
        let mut pattern = Pattern::new(0);
        pattern.load_text(text).unwrap();
        for i in 0..PATTERN_COUNT {
            shared.publish(i, pattern.curve().clone());
        }
        shared
    }

    fn update_settings(shared: &Shared, f: impl FnOnce(&mut Settings)) {
        let mut settings = (*shared.settings()).clone();
        f(&mut settings);
        shared.store_settings(settings);
    }

    fn run(processor: &mut Processor, transport: &Transport, input: f32, n: usize) -> Vec<f32> {
        let mut left = vec![input; n];
        let mut right = vec![input; n];
        let mut out = Vec::new();
        processor.process_block(&mut [&mut left[..], &mut right[..]], &[], transport, &[], &mut out);
        left
    }

    #[test]
    fn test_cc_value() {
        assert_eq!(cc_value(1.0, false), 127);
        assert_eq!(cc_value(0.0, false), 0);
        assert_eq!(cc_value(0.5, true), 0);
        assert_eq!(cc_value(1.0, true), 63);
        assert_eq!(cc_value(0.0, true), 64);
    }

    #[test]
    fn test_get_y_maps_into_range() {
        // flat pattern at the bottom
        let shared = shared_with("0 1 0 1 1 1 0 1");
        shared.params().set(ParamId::Min, 0.2);
        shared.params().set(ParamId::Max, 0.8);
        let processor = Processor::new(shared, SAMPLE_RATE);
        assert!(approx_eq(processor.get_y(0.3), 0.2));
    }

    #[test]
    fn test_audio_mode_reports_latency() {
        let shared = shared_with("0 0 0 1 1 0 0 1");
        shared.params().set(ParamId::Trigger, 2.0);
        let processor = Processor::new(Arc::clone(&shared), SAMPLE_RATE);
        assert_eq!(processor.latency(), 240);
        assert_eq!(shared.latency(), 240);
    }

    #[test]
    fn test_latency_change_while_playing_warns() {
        let shared = shared_with("0 0 0 1 1 0 0 1");
        let mut processor = Processor::new(Arc::clone(&shared), SAMPLE_RATE);
        let transport = Transport::playing(120.0);
        run(&mut processor, &transport, 1.0, 64);
        assert!(!shared.latency_warning());

        shared.params().set(ParamId::Trigger, 2.0);
        run(&mut processor, &transport, 1.0, 64);
        assert!(shared.latency_warning());

        run(&mut processor, &Transport::default(), 1.0, 64);
        assert!(!shared.latency_warning());
    }

    #[test]
    fn test_cv_output_writes_envelope() {
        let shared = shared_with("0 0 0 1 1 0 0 1");
        update_settings(&shared, |s| {
            s.output_cv = true;
            s.anti_noise = AntiNoise::Off;
        });
        shared.params().set(ParamId::Max, 0.5);

        let mut processor = Processor::new(shared, SAMPLE_RATE);
        let out = run(&mut processor, &Transport::playing(120.0), 0.25, 32);
        assert!(out.iter().all(|&s| approx_eq(s as f64, 0.5)));
    }

    #[test]
    fn test_mix_blends_dry() {
        // envelope fully closed
        let shared = shared_with("0 1 0 1 1 1 0 1");
        shared.params().set(ParamId::Mix, 0.25);
        let mut processor = Processor::new(shared, SAMPLE_RATE);
        let out = run(&mut processor, &Transport::playing(120.0), 1.0, 32);
        assert!(out.iter().all(|&s| approx_eq(s as f64, 0.75)));
    }

    #[test]
    fn test_cc_sent_at_block_start() {
        let shared = shared_with("0 0 0 1 1 0 0 1");
        update_settings(&shared, |s| {
            s.output_cc = 2;
            s.output_cc_chan = 3;
            s.anti_noise = AntiNoise::Off;
        });

        let mut processor = Processor::new(shared, SAMPLE_RATE);
        let transport = Transport::playing(120.0);
        run(&mut processor, &transport, 1.0, 32);

        let mut left = vec![1.0f32; 32];
        let mut out = Vec::new();
        processor.process_block(&mut [&mut left[..]], &[], &transport, &[], &mut out);
        assert_eq!(
            out[0],
            MidiEvent::new(
                0,
                MidiMessage::ControlChange {
                    channel: 3,
                    controller: 1,
                    value: 127,
                }
            )
        );
    }
}
