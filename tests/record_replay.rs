//! End-to-end record → replay cycles through the public session API

use std::time::Duration;

use recplay_rs::codec::BlockLayout;
use recplay_rs::session::{NoopPacer, Player, Recorder};
use recplay_rs::store::MappedStore;
use recplay_rs::{FileHeader, RecPlayError, Session, SessionConfig, Strategy};

fn capture_config(dir: &tempfile::TempDir) -> SessionConfig {
    SessionConfig {
        file_path: dir.path().join("capture.iq"),
        bandwidth: 1.4e6,
        read_delay_us: 0,
        write_delay_us: 0,
        device_type: 7,
        tx_sample_advance: 120,
        ..Default::default()
    }
}

fn subframe(layout: BlockLayout, fill: u8) -> Vec<u8> {
    vec![fill; layout.payload_len()]
}

#[test]
fn record_then_replay_preserves_blocks_and_order() {
    let dir = tempfile::tempdir().unwrap();
    let layout = BlockLayout::for_bandwidth(1.4e6).unwrap();

    let record_config = SessionConfig {
        record: true,
        max_blocks: 4,
        ..capture_config(&dir)
    };
    let mut session = Session::from_config(&record_config).unwrap();
    let Session::Recording(recorder) = &mut session else {
        panic!("expected a recording session");
    };
    for tick in 0..4i64 {
        recorder
            .record(tick, &subframe(layout, tick as u8))
            .unwrap();
    }
    session.close().unwrap();

    let replay_config = SessionConfig {
        replay: true,
        loops: 1,
        ..capture_config(&dir)
    };
    let mut session = Session::from_config(&replay_config).unwrap();
    let Session::Replaying(player) = &mut session else {
        panic!("expected a replaying session");
    };
    assert_eq!(player.total_blocks(), 4);
    assert_eq!(player.header().device_type, 7);
    assert_eq!(player.header().tx_sample_advance, 120);

    for tick in 0..4i64 {
        let block = player.next_block().unwrap().unwrap();
        assert_eq!(block.timestamp, tick);
        assert_eq!(block.payload, &subframe(layout, tick as u8)[..]);
    }
    assert!(player.next_block().unwrap().is_none());
}

#[test]
fn recording_stops_at_max_blocks_despite_extra_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let layout = BlockLayout::for_bandwidth(1.4e6).unwrap();

    let record_config = SessionConfig {
        record: true,
        max_blocks: 3,
        ..capture_config(&dir)
    };
    let mut recorder = Recorder::open(&record_config).unwrap();
    // The driver keeps ticking well past the ceiling.
    for tick in 0..10i64 {
        recorder.record(tick, &subframe(layout, 0)).unwrap();
    }
    recorder.close().unwrap();

    let replay_config = SessionConfig {
        replay: true,
        ..capture_config(&dir)
    };
    let player = Player::open(&replay_config).unwrap();
    assert_eq!(player.total_blocks(), 3);
}

#[test]
fn streamed_strategy_round_trips_like_mapped() {
    let dir = tempfile::tempdir().unwrap();
    let layout = BlockLayout::for_bandwidth(3.0e6).unwrap();

    let record_config = SessionConfig {
        record: true,
        max_blocks: 2,
        bandwidth: 3.0e6,
        strategy: Strategy::Streamed,
        ..capture_config(&dir)
    };
    let mut recorder = Recorder::open(&record_config).unwrap();
    recorder.record(10, &subframe(layout, 0xAA)).unwrap();
    recorder.record(11, &subframe(layout, 0xBB)).unwrap();
    recorder.close().unwrap();

    let replay_config = SessionConfig {
        replay: true,
        loops: 2,
        strategy: Strategy::Streamed,
        ..capture_config(&dir)
    };
    let mut player = Player::open(&replay_config).unwrap();
    let mut timestamps = Vec::new();
    while let Some(block) = player.next_block().unwrap() {
        timestamps.push(block.timestamp);
    }
    assert_eq!(timestamps, vec![10, 11, 10, 11]);
}

// Three 8-byte payloads written and closed, reopened for a single
// replay pass: delivers exactly (1, "AAAAAAAA"), (2, "BBBBBBBB"),
// (3, "CCCCCCCC"), then end-of-stream on the fourth call.
#[test]
fn three_block_single_pass_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.iq");
    let layout = BlockLayout::with_payload_len(8);
    let header = FileHeader {
        device_type: 1,
        tx_sample_advance: 0,
        bandwidth: 1.4e6,
    };

    let store = MappedStore::create(&path, &header, layout, 3).unwrap();
    let mut recorder =
        Recorder::from_store(Box::new(store), 3, Duration::ZERO, Box::new(NoopPacer));
    recorder.record(1, b"AAAAAAAA").unwrap();
    recorder.record(2, b"BBBBBBBB").unwrap();
    recorder.record(3, b"CCCCCCCC").unwrap();
    recorder.close().unwrap();

    let (store, header, total) = MappedStore::open(&path, layout).unwrap();
    assert_eq!(total, 3);
    let mut player = Player::from_store(
        Box::new(store),
        header,
        1,
        Duration::ZERO,
        Box::new(NoopPacer),
    );

    for (ts, payload) in [(1, b"AAAAAAAA"), (2, b"BBBBBBBB"), (3, b"CCCCCCCC")] {
        let block = player.next_block().unwrap().unwrap();
        assert_eq!(block.timestamp, ts);
        assert_eq!(block.payload, payload);
    }
    assert!(player.next_block().unwrap().is_none());
}

#[test]
fn replay_of_foreign_file_fails_before_any_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foreign.bin");
    std::fs::write(&path, vec![0x42u8; 1024]).unwrap();

    let config = SessionConfig {
        replay: true,
        file_path: path,
        ..Default::default()
    };
    assert!(matches!(
        Session::from_config(&config),
        Err(RecPlayError::Format(_))
    ));
}
