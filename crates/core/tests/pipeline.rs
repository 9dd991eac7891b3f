use std::sync::Arc;
use std::thread;

use midi_visualiser_core::{
    ControlInput, FramePublisher, FrameStatus, FrameUniforms, HostUniformBuffer, PacketList,
    ParameterSet, ParameterStore, StatusFilter,
};

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn control_changes_reach_the_uniform_buffer() {
    let store = Arc::new(ParameterStore::new());
    let mut input = ControlInput::new(&store);
    let mut publisher = FramePublisher::new(Arc::clone(&store));
    let mut buffer = HostUniformBuffer::allocated();

    input.handle_packet(&[0xB1, 13, 127]);
    input.handle_packet(&[0xB1, 16, 0]);
    input.handle_packet(&[0xB1, 14, 64]);

    let FrameStatus::Published(uniforms) = publisher.prepare_frame(&mut buffer) else {
        panic!("buffer was allocated");
    };
    assert_eq!(buffer.uniforms(), Some(uniforms));
    assert_close(uniforms.red, 1.0);
    assert_close(uniforms.green, 0.504);
    assert_close(uniforms.blue, 0.0);
    assert_close(uniforms.size, 0.0);
}

#[test]
fn note_on_packets_only_apply_with_the_voice_filter() {
    let packets: PacketList = [[0x91_u8, 13, 127], [0x91, 16, 0], [0x91, 14, 64]]
        .into_iter()
        .collect();

    let strict = Arc::new(ParameterStore::new());
    ControlInput::new(&strict).handle_packets(packets.iter());
    assert_eq!(strict.read_snapshot(), ParameterSet::default());

    let permissive = Arc::new(ParameterStore::new());
    ControlInput::new(&permissive)
        .with_filter(StatusFilter::AnyChannelVoice)
        .handle_packets(packets.iter());
    let mut buffer = HostUniformBuffer::allocated();
    FramePublisher::new(Arc::clone(&permissive)).prepare_frame(&mut buffer);

    let uniforms = buffer.uniforms().unwrap();
    assert_close(uniforms.red, 1.0);
    assert_close(uniforms.green, 0.504);
    assert_close(uniforms.blue, 0.0);
    assert_close(uniforms.size, 0.0);
}

#[test]
fn frames_only_ever_see_complete_writes() {
    // The writer keeps red + green == 1 and blue == size on every set it
    // publishes. A torn snapshot breaks one of those relations.
    const PACKETS: u8 = 127;
    const ROUNDS: usize = 200;

    let store = Arc::new(ParameterStore::with_initial(ParameterSet {
        red: 1.0,
        green: 0.0,
        blue: 0.0,
        size: 0.0,
    }));

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                for value in 0..=PACKETS {
                    let set = ParameterSet {
                        red: f32::from(value) / 127.0,
                        green: 1.0 - f32::from(value) / 127.0,
                        blue: f32::from(value) / 127.0,
                        size: f32::from(value) / 127.0,
                    };
                    store.write(set);
                }
            }
        })
    };

    let mut publisher = FramePublisher::new(Arc::clone(&store));
    let mut buffer = HostUniformBuffer::allocated();
    while !writer.is_finished() {
        publisher.prepare_frame(&mut buffer);
        let FrameUniforms {
            size,
            red,
            green,
            blue,
        } = buffer.uniforms().unwrap();
        assert!((red + green - 1.0).abs() < 1e-5, "torn colour {red} {green}");
        assert_eq!(blue, size);
        assert_eq!(red, blue);
    }
    writer.join().expect("writer thread panicked");
}

#[test]
fn input_thread_can_outlive_the_store() {
    let store = Arc::new(ParameterStore::new());
    let mut input = ControlInput::new(&store);

    let handle = thread::spawn(move || {
        for value in 0..=127 {
            input.handle_packet(&[0xB0, 13, value]);
        }
        input
    });
    drop(store);

    let input = handle.join().expect("input thread panicked");
    let stats = input.stats();
    assert_eq!(stats.events, 128);
    assert_eq!(stats.applied + stats.ignored, 128);
}

#[test]
fn inputs_from_two_ports_write_one_logical_set() {
    let store = Arc::new(ParameterStore::new());
    let mut keys = ControlInput::new(&store);
    let mut faders = ControlInput::new(&store);

    keys.handle_packet(&[0xB0, 13, 0]);
    faders.handle_packet(&[0xB0, 14, 127]);

    let snapshot = store.read_snapshot();
    assert_eq!(snapshot.red, 0.0);
    assert_eq!(snapshot.green, 1.0);
    assert_eq!(snapshot.blue, 0.0);
    assert_eq!(snapshot.size, 1.0);
}

#[test]
fn concurrent_ports_never_revert_each_others_fields() {
    const ROUNDS: usize = 200;

    let store = Arc::new(ParameterStore::new());
    let sweep = |controller: u8| {
        let mut input = ControlInput::new(&store);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                for value in (0..=127).rev() {
                    input.handle_packet(&[0xB0, controller, value]);
                }
                for value in 0..=127 {
                    input.handle_packet(&[0xB0, controller, value]);
                }
            }
            // red ends dark, green ends bright
            let last = if controller == 13 { 0 } else { 127 };
            input.handle_packet(&[0xB0, controller, last]);
            input.stats()
        })
    };
    let red = sweep(13);
    let green = sweep(14);

    let red_stats = red.join().expect("red input panicked");
    let green_stats = green.join().expect("green input panicked");
    assert_eq!(red_stats.applied, green_stats.applied);

    let snapshot = store.read_snapshot();
    assert_eq!(snapshot.red, 0.0);
    assert_eq!(snapshot.green, 1.0);
    assert_eq!(snapshot.blue, 0.0);
    assert_eq!(snapshot.size, 1.0);
    assert_eq!(store.generation(), 2 * red_stats.applied);
}
