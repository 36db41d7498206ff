use std::io;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use transmit::{
    check_buffer, AudioEncoder, EncodeError, NetworkSender, NullIndicator, PttEdge, PttState,
    TransmitConfig, TransmitPipeline, Transport, ValidationError,
};
use wire::{FrameCodec, FrameType};

#[derive(Clone, Default)]
struct Wire(Arc<Mutex<Vec<Vec<u8>>>>);

impl Transport for Wire {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().push(datagram.to_vec());
        Ok(datagram.len())
    }
}

struct Truncating;

impl AudioEncoder for Truncating {
    fn encode(&mut self, pcm: &[u8], _sample_count: usize) -> Result<Vec<u8>, EncodeError> {
        Ok(pcm[..16].to_vec())
    }
}

#[derive(Debug, Clone)]
enum Event {
    Edge(PttEdge),
    Valid,
    Short(usize),
    Silent,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Edge(PttEdge::Pressed)),
        Just(Event::Edge(PttEdge::Released)),
        Just(Event::Valid),
        (0usize..3840).prop_map(Event::Short),
        Just(Event::Silent),
    ]
}

proptest! {
    #[test]
    fn event_streams_keep_counters_consistent(events in prop::collection::vec(event(), 0..64)) {
        let config = TransmitConfig::default();
        let len = config.audio.expected_buffer_len();
        let wire = Wire::default();
        let pipeline = TransmitPipeline::new(
            &config,
            Truncating,
            NullIndicator,
            NetworkSender::new(wire.clone()),
        )
        .unwrap();

        let mut transmitting = false;
        let mut transitions = 0u64;
        let mut audio = 0u64;
        let mut invalid = 0u64;
        for event in &events {
            match event {
                Event::Edge(edge) => {
                    let next = *edge == PttEdge::Pressed;
                    if next != transmitting {
                        transitions += 1;
                        transmitting = next;
                    }
                    pipeline.handle_edge(*edge);
                }
                Event::Valid => {
                    audio += u64::from(transmitting);
                    pipeline.audio_buffer_ready(&vec![7u8; len]);
                }
                Event::Short(n) => {
                    invalid += u64::from(transmitting);
                    pipeline.audio_buffer_ready(&vec![7u8; *n]);
                }
                Event::Silent => {
                    invalid += u64::from(transmitting);
                    pipeline.audio_buffer_ready(&vec![0u8; len]);
                }
            }
        }

        let expected_state = if transmitting { PttState::Transmitting } else { PttState::Idle };
        prop_assert_eq!(pipeline.state(), expected_state);

        let report = pipeline.report();
        prop_assert_eq!(report.audio.frames_encoded, audio);
        prop_assert_eq!(report.audio.frames_sent, audio);
        prop_assert_eq!(report.audio.invalid_frames, invalid);
        prop_assert_eq!(report.network.packets_sent, transitions + audio);
        prop_assert_eq!(u64::from(pipeline.sequence()), transitions + audio);

        let reader = FrameCodec::current(config.station_id().unwrap());
        let frames = wire.0.lock().unwrap();
        let controls = frames
            .iter()
            .filter(|f| reader.parse_frame(f).map(|f| f.frame_type()) == Some(FrameType::Control))
            .count() as u64;
        prop_assert_eq!(controls, transitions);
    }

    #[test]
    fn check_buffer_rules(buf in prop::collection::vec(any::<u8>(), 0..64), expected in 0usize..64) {
        let result = check_buffer(&buf, expected);
        if buf.len() != expected {
            prop_assert_eq!(
                result,
                Err(ValidationError::WrongLength { expected, actual: buf.len() })
            );
        } else if buf.iter().all(|&b| b == 0) {
            prop_assert_eq!(result, Err(ValidationError::AllZero));
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
