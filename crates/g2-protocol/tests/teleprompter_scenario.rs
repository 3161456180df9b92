//! End-to-end scenarios: handshake, teleprompter stream and inbound events,
//! driven through the public API only.

use g2_protocol::*;

const SAMPLE_300: &str = "The quick brown fox jumps over the lazy dog while the \
    teleprompter keeps scrolling through a long answer that was generated by the \
    assistant and has to be split across many lines and pages so that it fits on \
    the small display of the glasses without losing any words along the way, even when \
    the answer is long.";

fn decode_all(frames: &[Vec<u8>]) -> Vec<Frame> {
    frames.iter().map(|f| parse_frame(f).unwrap()).collect()
}

// ============================================================================
// Handshake
// ============================================================================

#[test]
fn test_handshake_then_first_command() {
    let mut session = ProtocolSession::default();
    session.on_connected(1_760_000_000).unwrap();

    let mut sequences = Vec::new();
    let mut total_delay_ms = 0;
    {
        let handshake = session.handshake_mut().unwrap();
        while let Some(step) = handshake.next_step() {
            sequences.push(parse_frame(&step.frame).unwrap().sequence);
            total_delay_ms += step.delay_after.as_millis();
            handshake.mark_sent();
        }
        assert!(handshake.complete());
    }
    assert_eq!(sequences, vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(total_delay_ms, 6 * 100 + 500);
    assert!(session.is_authenticated());

    let frames = session
        .next_outbound_frames(&Command::TeleprompterInit {
            total_lines: 140,
            mode: ScrollMode::Manual,
        })
        .unwrap();
    let frame = parse_frame(&frames[0]).unwrap();
    assert_eq!(frame.sequence, POST_AUTH_SEQUENCE);
    assert_eq!(FieldReader::find_varint(&frame.payload, 2), Some(0x14));
}

// ============================================================================
// Teleprompter stream
// ============================================================================

#[test]
fn test_300_char_text_spans_pages_with_marker() {
    let text: String = SAMPLE_300.chars().take(300).collect();
    assert_eq!(text.chars().count(), 300);

    let pages = paginate_text(&text);
    assert_eq!(pages.len(), MIN_PAGES);
    assert!(wrap_lines(&text).len() > LINES_PER_PAGE);
    assert!(pages[0].lines().iter().all(|l| !l.trim().is_empty()));
    assert!(!pages[1].is_blank());

    let plan = teleprompter_plan(&text, ScrollMode::Manual);
    let marker = plan
        .iter()
        .position(|c| *c == Command::MidStreamMarker)
        .unwrap();
    assert!(matches!(plan[marker - 1], Command::ContentPage { page_index: 9, .. }));
    assert!(matches!(plan[marker + 1], Command::ContentPage { page_index: 10, .. }));

    // Page 0 carries its 10th line.
    match &plan[3] {
        Command::ContentPage { page_index: 0, lines } => {
            assert_eq!(lines.len(), LINES_PER_PAGE);
            assert_eq!(lines[9], pages[0].lines()[9]);
        }
        other => panic!("expected page 0, got {:?}", other),
    }
}

#[test]
fn test_stream_frames_use_consecutive_counters() {
    let mut session = ProtocolSession::default();
    let plan = teleprompter_plan(SAMPLE_300, ScrollMode::Auto);

    let mut assembler = MessageAssembler::new();
    let mut frames = Vec::new();
    for command in &plan {
        let parts = decode_all(&session.next_outbound_frames(command).unwrap());
        let sequence = parts[0].sequence;
        assert!(parts.iter().all(|p| p.sequence == sequence));
        frames.extend(parts.into_iter().filter_map(|p| assembler.push(p)));
    }
    assert_eq!(frames.len(), plan.len());
    assert_eq!(assembler.pending(), 0);

    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.sequence as usize, POST_AUTH_SEQUENCE as usize + i);
        assert_eq!(frame.frame_type, FrameType::Command);
    }

    // Wake and sync carry no message ID; everything between does, in order.
    let ids: Vec<Option<u64>> = frames
        .iter()
        .map(|f| FieldReader::find_varint(&f.payload, 2))
        .collect();
    assert_eq!(ids[0], None);
    assert_eq!(ids.last().copied().flatten(), None);
    let carried: Vec<u64> = ids[1..ids.len() - 1].iter().map(|id| id.unwrap()).collect();
    let expected: Vec<u64> = (0..carried.len() as u64).map(|i| 0x14 + i).collect();
    assert_eq!(carried, expected);

    assert_eq!(frames[0].service_id, ServiceId::DISPLAY_WAKE);
    assert_eq!(frames[1].service_id, ServiceId::DISPLAY_CONFIG);
    assert!(frames[2..frames.len() - 1]
        .iter()
        .all(|f| f.service_id == ServiceId::TELEPROMPTER));
}

// ============================================================================
// Inbound
// ============================================================================

#[test]
fn test_interleaved_inbound_notifications() {
    let mut decoder = InboundDecoder::new();

    let mut speech = FieldWriter::new();
    speech.varint(1, 1).message(3, |m| {
        m.bytes(1, b"what time is it").varint(2, 1);
    });
    let speech = speech.finish();

    let notifications = vec![
        Frame::response(1, ServiceId::AUTH_CONTROL, vec![0x08, 0x04, 0x10, 0x0C]),
        Frame::response(2, ServiceId::DISPLAY_TRIGGER, vec![0x03, 0x01]),
        Frame::response(3, ServiceId::CONVERSATE, speech),
        Frame::response(4, ServiceId::new(0x55, 0x01), vec![0xDE, 0xAD]),
    ];

    let events: Vec<DecodedEvent> = notifications
        .iter()
        .map(|f| decoder.deliver_bytes(&f.encode().unwrap()).unwrap().unwrap())
        .collect();

    assert_eq!(
        events,
        vec![
            DecodedEvent::AuthAck {
                service_id: ServiceId::AUTH_CONTROL,
                message_id: Some(0x0C)
            },
            DecodedEvent::Gesture {
                kind: GestureKind::SwipeForward
            },
            DecodedEvent::SpeechTranscript {
                text: "what time is it".to_string(),
                is_final: true
            },
            DecodedEvent::Opaque {
                service_id: ServiceId::new(0x55, 0x01),
                payload: vec![0xDE, 0xAD]
            },
        ]
    );
}

#[test]
fn test_corrupt_notification_does_not_poison_decoder() {
    let mut decoder = InboundDecoder::new();
    let good = Frame::response(1, ServiceId::GESTURE, vec![0x05, 0x01])
        .encode()
        .unwrap();

    let mut bad_length = good.clone();
    bad_length[3] += 1;
    assert_eq!(
        decoder.deliver_bytes(&bad_length).unwrap_err().kind(),
        "length_inconsistent"
    );
    assert_eq!(
        decoder.deliver_bytes(&good).unwrap(),
        Some(DecodedEvent::Gesture {
            kind: GestureKind::LongPress
        })
    );
}

#[test]
fn test_speech_transcript_split_across_packets() {
    let text = "remind me to call the office tomorrow morning at nine";
    let mut w = FieldWriter::new();
    w.varint(1, 3).varint(2, 0x41).message(5, |m| {
        m.bytes(1, text.as_bytes()).varint(2, 1);
    });
    let payload = w.finish();

    let chunks: Vec<&[u8]> = payload.chunks(25).collect();
    assert_eq!(chunks.len(), 3);
    let parts: Vec<Frame> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| Frame {
            packet_total: chunks.len() as u8,
            packet_index: i as u8 + 1,
            ..Frame::response(0x42, ServiceId::CONVERSATE, chunk.to_vec())
        })
        .collect();

    // Decoded on its own, a partial message carries no transcript.
    assert!(matches!(
        decode_event(&parts[0]),
        DecodedEvent::Opaque { .. }
    ));

    let mut decoder = InboundDecoder::new();
    let gesture = Frame::response(0x43, ServiceId::GESTURE, vec![0x01, 0x01])
        .encode()
        .unwrap();
    for part in &parts[..2] {
        assert_eq!(decoder.deliver_bytes(&part.encode().unwrap()).unwrap(), None);
        // Other notifications keep flowing while the message is incomplete.
        assert_eq!(
            decoder.deliver_bytes(&gesture).unwrap(),
            Some(DecodedEvent::Gesture {
                kind: GestureKind::Tap
            })
        );
    }
    assert_eq!(decoder.pending(), 1);

    assert_eq!(
        decoder.deliver_bytes(&parts[2].encode().unwrap()).unwrap(),
        Some(DecodedEvent::SpeechTranscript {
            text: text.to_string(),
            is_final: true
        })
    );
    assert_eq!(decoder.pending(), 0);
}
