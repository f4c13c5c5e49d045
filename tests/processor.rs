use std::sync::Arc;

use curvegate::processor::{
    AntiNoise, Controller, MidiEvent, MidiMessage, ParamId, Processor, Shared, Transport,
};
use curvegate::{Clipboard, Pattern};

const SAMPLE_RATE: f64 = 48000.0;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Controller and processor over fresh shared state, with smoothing and
/// crossfades off so outputs follow the pattern exactly.
fn setup(configure: impl FnOnce(&Shared)) -> (Controller, Processor) {
    let shared = Arc::new(Shared::new());
    let mut controller = Controller::with_clipboard(Arc::clone(&shared), Clipboard::new());
    controller.update_settings(|s| s.anti_noise = AntiNoise::Off);
    configure(&shared);
    let processor = Processor::new(shared, SAMPLE_RATE);
    (controller, processor)
}

fn process(
    processor: &mut Processor,
    transport: &Transport,
    input: &[f32],
    midi_in: &[MidiEvent],
) -> (Vec<f32>, Vec<MidiEvent>) {
    let mut left = input.to_vec();
    let mut right = input.to_vec();
    let mut midi_out = Vec::new();
    processor.process_block(
        &mut [&mut left[..], &mut right[..]],
        &[],
        transport,
        midi_in,
        &mut midi_out,
    );
    (left, midi_out)
}

#[test]
fn test_sync_envelope_is_periodic() {
    let (_controller, mut processor) = setup(|_| {});
    // one bar at 120 BPM
    let bar = 96000;
    let offset = 12000;
    let transport = Transport::playing(120.0);

    let (out, _) = process(&mut processor, &transport, &vec![1.0; offset + 1], &[]);
    let first = out[offset] as f64;
    assert!(approx_eq(processor.xpos(), 0.125, 1e-9));

    let (out, _) = process(&mut processor, &transport, &vec![1.0; bar], &[]);
    let second = out[bar - 1] as f64;
    assert!(approx_eq(processor.xpos(), 0.125, 1e-6));
    assert!(approx_eq(first, second, 1e-6));
    // the default triangle is half open a quarter of the way in
    assert!(approx_eq(first, 0.25, 1e-6));
}

#[test]
fn test_midi_note_plays_one_shot() {
    let (mut controller, mut processor) = setup(|shared| {
        let params = shared.params();
        params.set(ParamId::Trigger, 1.0);
        params.set(ParamId::Sync, 0.0);
        params.set(ParamId::Rate, 10.0);
    });
    // fully open at the start, closing linearly
    controller
        .edit_pattern(0, |p| p.load_text("0 0 0 1 1 1 0 1"))
        .unwrap()
        .unwrap();
    let stopped = Transport::default();
    let ones = vec![1.0f32; 256];

    let (out, _) = process(&mut processor, &stopped, &ones, &[]);
    assert!(out.iter().all(|&s| s == 0.0), "silent at rest");

    let note = MidiEvent::new(
        10,
        MidiMessage::NoteOn {
            channel: 0,
            note: 60,
            velocity: 100,
        },
    );
    let (out, _) = process(&mut processor, &stopped, &ones, &[note]);
    assert_eq!(out[9], 0.0);
    assert!(out[10] > 0.99);
    assert!(out[255] > 0.9 && out[255] < out[10]);

    // a 10 Hz cycle is over after 4800 samples
    let (out, _) = process(&mut processor, &stopped, &vec![1.0; 5000], &[]);
    assert_eq!(*out.last().unwrap(), 0.0);
}

#[test]
fn test_pattern_notes_select_patterns() {
    let (mut controller, mut processor) = setup(|_| {});
    controller
        .edit_pattern(4, |p| p.load_text("0 1 0 1 1 1 0 1"))
        .unwrap()
        .unwrap();

    // channel 10 selects patterns; E is the fifth note of the octave
    let note = MidiEvent::new(
        0,
        MidiMessage::NoteOn {
            channel: 9,
            note: 64,
            velocity: 1,
        },
    );
    let (out, _) = process(&mut processor, &Transport::default(), &[1.0; 64], &[note]);
    assert_eq!(processor.active_pattern(), 4);
    assert_eq!(controller.shared().params().pattern(), 5);
    assert!(out.iter().all(|&s| s == 0.0));

    controller.poll();
    assert_eq!(controller.active_pattern(), 4);
}

#[test]
fn test_queued_switch_waits_for_beat() {
    let (mut controller, mut processor) = setup(|shared| {
        shared.params().set(ParamId::PatSync, 3.0);
    });
    controller
        .edit_pattern(0, |p| p.load_text("0 0 0 1 1 0 0 1"))
        .unwrap()
        .unwrap();
    controller
        .edit_pattern(1, |p| p.load_text("0 1 0 1 1 1 0 1"))
        .unwrap()
        .unwrap();

    let mut transport = Transport::playing(120.0);
    let (out, _) = process(&mut processor, &transport, &[1.0; 1000], &[]);
    assert!(out.iter().all(|&s| s == 1.0));
    transport.advance(1000, SAMPLE_RATE);

    controller.queue_pattern(2);
    // one beat is 24000 samples, so the switch lands 23000 samples later
    let (out, _) = process(&mut processor, &transport, &vec![1.0; 23000], &[]);
    assert!(out.iter().all(|&s| s == 1.0));
    assert_eq!(processor.active_pattern(), 0);
    transport.advance(23000, SAMPLE_RATE);

    let (out, _) = process(&mut processor, &transport, &[1.0; 100], &[]);
    assert!(out.iter().all(|&s| s == 0.0));
    assert_eq!(processor.active_pattern(), 1);
    assert_eq!(controller.shared().queued_pattern(), 0);
    assert!(controller.shared().take_switched());
}

#[test]
fn test_stopped_switch_is_immediate() {
    let (controller, mut processor) = setup(|shared| {
        shared.params().set(ParamId::PatSync, 5.0);
    });
    controller.queue_pattern(7);
    process(&mut processor, &Transport::default(), &[0.0; 8], &[]);
    assert_eq!(processor.active_pattern(), 6);
}

#[test]
fn test_audio_trigger_compensates_latency() {
    let (mut controller, mut processor) = setup(|shared| {
        let params = shared.params();
        params.set(ParamId::Trigger, 2.0);
        params.set(ParamId::Sync, 0.0);
        params.set(ParamId::Rate, 10.0);
    });
    controller.update_settings(|s| s.output_at_midi = 37);
    controller
        .edit_pattern(0, |p| p.load_text("0 0 0 1 1 1 0 1"))
        .unwrap()
        .unwrap();
    assert_eq!(processor.latency(), 240);
    assert_eq!(controller.shared().latency(), 240);

    let mut input = vec![0.0f32; 2048];
    input[500..].fill(1.0);
    let transport = Transport::playing(120.0);
    let (out, midi) = process(&mut processor, &transport, &input, &[]);

    // the hit at 500 is heard at 500 + latency, aligned with the delayed audio
    assert!(out[..740].iter().all(|&s| s == 0.0));
    assert_eq!(out[740], 1.0);
    assert!(out[741] > 0.99);
    assert_eq!(
        midi,
        vec![MidiEvent::new(
            740,
            MidiMessage::NoteOn {
                channel: 0,
                note: 36,
                velocity: 127,
            }
        )]
    );

    // the note off falls 100 ms later, in the next block
    let (_, midi) = process(&mut processor, &transport, &[1.0; 4096], &[]);
    assert_eq!(
        midi.first(),
        Some(&MidiEvent::new(
            740 + 4800 - 2048,
            MidiMessage::NoteOff {
                channel: 0,
                note: 36,
                velocity: 0,
            }
        ))
    );
}

#[test]
fn test_double_precision_path() {
    let (_controller, mut processor) = setup(|_| {});
    let mut left: Vec<f64> = (0..128).map(|i| (i as f64 * 0.1).sin()).collect();
    let expected = left.clone();
    let mut midi_out = Vec::new();
    // the default triangle is fully closed at the start of the bar
    processor.process_block(
        &mut [&mut left[..]],
        &[],
        &Transport::playing(120.0),
        &[],
        &mut midi_out,
    );
    for (out, input) in left.iter().zip(&expected) {
        assert!(out.abs() <= input.abs() * 0.01 + 1e-12);
    }
}

#[test]
fn test_display_follows_playback() {
    let (controller, mut processor) = setup(|_| {});
    let transport = Transport::playing(120.0);
    process(&mut processor, &transport, &[0.5; 4800], &[]);

    let display = controller.shared().display();
    let (x, y) = display.position();
    assert!(approx_eq(x, processor.xpos(), 1e-12));
    assert!(approx_eq(y, processor.ypos(), 1e-12));
    assert!(display.draw_seek());

    process(&mut processor, &Transport::default(), &[0.5; 16], &[]);
    assert!(!display.draw_seek());
}

#[test]
fn test_state_survives_reload() {
    let (mut controller, _processor) = setup(|shared| {
        shared.params().set(ParamId::Min, 0.3);
    });
    controller.edit_pattern(2, Pattern::load_sine).unwrap();
    controller.update_settings(|s| s.bipolar_cc = true);
    let json = controller.save_state_json().unwrap();

    let (mut restored, mut processor) = setup(|_| {});
    restored.load_state_json(&json).unwrap();
    assert_eq!(restored.shared().params().get(ParamId::Min), 0.3);
    assert!(restored.settings().bipolar_cc);
    assert_eq!(
        restored.pattern(2).unwrap().to_text(),
        controller.pattern(2).unwrap().to_text()
    );

    // the restored minimum reaches the audio thread
    let (out, _) = process(&mut processor, &Transport::playing(120.0), &[1.0; 4], &[]);
    assert!(approx_eq(out[0] as f64, 0.3, 1e-6));
}
