//! Host transport and MIDI event types.

/// Playhead information the host provides with every block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    pub playing: bool,
    /// Beats per minute
    pub tempo: f64,
    /// Position of the block start in quarter notes
    pub beat_position: f64,
    pub looping: bool,
    /// Loop bounds in quarter notes
    pub loop_start: f64,
    pub loop_end: f64,
    /// Position of the block start in samples
    pub time_in_samples: i64,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            playing: false,
            tempo: 120.0,
            beat_position: 0.0,
            looping: false,
            loop_start: 0.0,
            loop_end: 0.0,
            time_in_samples: 0,
        }
    }
}

impl Transport {
    /// A playing transport at `tempo`, starting from zero.
    pub fn playing(tempo: f64) -> Self {
        Self {
            playing: true,
            tempo,
            ..Self::default()
        }
    }

    /// Moves the position forward by a block of `samples`.
    pub fn advance(&mut self, samples: usize, sample_rate: f64) {
        if !self.playing || sample_rate <= 0.0 {
            return;
        }
        self.time_in_samples += samples as i64;
        self.beat_position += samples as f64 * self.tempo / (60.0 * sample_rate);
        if self.looping && self.loop_end > self.loop_start && self.beat_position >= self.loop_end {
            self.beat_position = self.loop_start + (self.beat_position - self.loop_end);
        }
    }
}

/// A channel voice message. Channels are 0 based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiMessage {
    /// Note number and channel of a note-on with non-zero velocity.
    pub fn note_on(&self) -> Option<(u8, u8)> {
        match *self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } if velocity > 0 => Some((channel, note)),
            _ => None,
        }
    }
}

/// A MIDI message at a sample offset inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiEvent {
    pub offset: usize,
    pub message: MidiMessage,
}

impl MidiEvent {
    pub fn new(offset: usize, message: MidiMessage) -> Self {
        Self { offset, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_velocity_is_not_note_on() {
        let on = MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        };
        let silent = MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 0,
        };
        assert_eq!(on.note_on(), Some((0, 60)));
        assert_eq!(silent.note_on(), None);
    }

    #[test]
    fn test_advance_wraps_loop() {
        let mut transport = Transport {
            looping: true,
            loop_start: 0.0,
            loop_end: 4.0,
            ..Transport::playing(120.0)
        };
        // 120 bpm at 48k: 24000 samples per beat
        transport.advance(24000 * 5, 48000.0);
        assert!((transport.beat_position - 1.0).abs() < 1e-9);
        assert_eq!(transport.time_in_samples, 120000);
    }

    #[test]
    fn test_stopped_transport_stays() {
        let mut transport = Transport::default();
        transport.advance(512, 48000.0);
        assert_eq!(transport.time_in_samples, 0);
    }
}
