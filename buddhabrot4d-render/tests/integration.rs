use std::sync::mpsc;
use std::thread;

use buddhabrot4d_core::{Blend, BuddhabrotConfig, ChannelThresholds};
use buddhabrot4d_render::{
    classify, export_png, Buddhabrot, Channel, RenderError, ScanEventKind, ScanState,
    IDLE_PROGRESS,
};

fn tiny_config() -> BuddhabrotConfig {
    let mut cfg = BuddhabrotConfig::for_canvas(4, 4);
    cfg.oversampling = Some(1);
    cfg.boundary_cap = 50;
    cfg.thresholds = ChannelThresholds {
        red: 50,
        green: 50,
        blue: 50,
    };
    cfg
}

fn scanned(cfg: BuddhabrotConfig) -> Buddhabrot {
    let mut engine = Buddhabrot::new(cfg).unwrap();
    engine.initialize().unwrap();
    engine.run_until_idle().unwrap();
    let (tx, rx) = mpsc::channel();
    engine.scan(move |ok| tx.send(ok).unwrap()).unwrap();
    engine.run_until_idle().unwrap();
    assert_eq!(rx.try_recv(), Ok(true));
    engine
}

#[test]
fn end_to_end_tiny_canvas() {
    let mut engine = scanned(tiny_config());

    assert_eq!(engine.state(), ScanState::Done);
    assert!(engine.done_painting());
    assert_eq!(engine.progress(), IDLE_PROGRESS);
    assert!(engine.accumulator().max(Channel::Red) > 0);

    let buf = engine.render();
    assert_eq!(buf.pixels.len(), 4 * 4 * 4);
    assert!(buf.pixels.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn end_to_end_tiny_canvas_with_default_green_and_blue() {
    let mut cfg = BuddhabrotConfig::for_canvas(4, 4);
    cfg.oversampling = Some(1);
    cfg.boundary_cap = 50;
    cfg.thresholds.red = 50;
    assert_eq!(cfg.thresholds.global_cap(), 500);

    let engine = scanned(cfg);
    assert_eq!(engine.state(), ScanState::Done);
    assert!(engine.done_painting());
    assert_eq!(engine.progress(), IDLE_PROGRESS);
    assert!(engine.accumulator().max(Channel::Red) > 0);
}

#[test]
fn end_to_end_default_projection_has_signal() {
    let mut cfg = BuddhabrotConfig::for_canvas(64, 48);
    cfg.oversampling = Some(2);
    cfg.boundary_cap = 200;
    cfg.thresholds = ChannelThresholds {
        red: 200,
        green: 60,
        blue: 20,
    };
    let mut engine = scanned(cfg);

    let acc = engine.accumulator();
    for ch in Channel::ALL {
        assert!(acc.total(ch) > 0, "{ch:?} channel should receive samples");
    }
    // Blue needs the fastest escapes, so it can never exceed red.
    assert!(acc.total(Channel::Blue) <= acc.total(Channel::Red));

    let buf = engine.render();
    assert!(buf
        .pixels
        .chunks_exact(4)
        .any(|p| p[0] > 0 || p[1] > 0 || p[2] > 0));
}

#[test]
fn scans_are_deterministic() {
    let a = scanned(tiny_config());
    let b = scanned(tiny_config());
    for ch in Channel::ALL {
        assert_eq!(a.accumulator().channel(ch), b.accumulator().channel(ch));
    }
}

#[test]
fn unit_blend_with_equal_volumes_matches_zero_blend() {
    let mut cfg = BuddhabrotConfig::for_canvas(24, 24);
    cfg.oversampling = Some(1);
    cfg.boundary_cap = 80;
    cfg.volume_b = cfg.volume_a;
    let zero = scanned(cfg.clone());

    cfg.blend = Blend::ONE;
    let one = scanned(cfg);
    assert_eq!(
        zero.accumulator().channel(Channel::Red),
        one.accumulator().channel(Channel::Red)
    );
}

#[test]
fn rescans_reset_the_accumulator() {
    let mut engine = scanned(tiny_config());
    let first = engine.accumulator().channel(Channel::Red).to_vec();
    engine.scan(|_| {}).unwrap();
    engine.run_until_idle().unwrap();
    assert_eq!(engine.accumulator().channel(Channel::Red), first.as_slice());
}

#[test]
fn cancel_from_another_thread() {
    let mut cfg = BuddhabrotConfig::for_canvas(40, 40);
    cfg.oversampling = Some(1);
    cfg.boundary_cap = 100;
    cfg.yield_interval_ms = 0;
    let mut engine = Buddhabrot::new(cfg).unwrap();
    engine.initialize().unwrap();
    engine.run_until_idle().unwrap();

    let (tx, rx) = mpsc::channel();
    engine.scan(move |ok| tx.send(ok).unwrap()).unwrap();
    engine.tick().unwrap();

    let control = engine.control();
    thread::spawn(move || control.request_cancel())
        .join()
        .unwrap();
    let rows_at_cancel = engine.control().rows().0;

    engine.run_until_idle().unwrap();
    assert_eq!(rx.try_recv(), Ok(false));
    assert_eq!(engine.state(), ScanState::Canceled);
    assert_eq!(engine.control().rows().0, rows_at_cancel);

    // A canceled engine accepts a fresh scan.
    let (tx, rx) = mpsc::channel();
    engine.scan(move |ok| tx.send(ok).unwrap()).unwrap();
    engine.run_until_idle().unwrap();
    assert_eq!(rx.try_recv(), Ok(true));
}

#[test]
fn progress_climbs_while_scanning() {
    let mut cfg = BuddhabrotConfig::for_canvas(16, 16);
    cfg.oversampling = Some(1);
    cfg.boundary_cap = 60;
    cfg.yield_interval_ms = 0;
    let mut engine = Buddhabrot::new(cfg).unwrap();
    engine.initialize().unwrap();
    engine.run_until_idle().unwrap();
    assert_eq!(engine.progress(), IDLE_PROGRESS);

    engine.scan(|_| {}).unwrap();
    let mut last = 0.0;
    while engine.tick().unwrap() {
        let p = engine.progress();
        assert!((0.0..=1.0).contains(&p));
        assert!(p >= last);
        last = p;
    }
    assert_eq!(engine.progress(), IDLE_PROGRESS);
}

#[test]
fn events_reach_every_live_subscriber() {
    let mut engine = Buddhabrot::new(tiny_config()).unwrap();
    let kept = engine.subscribe();
    drop(engine.subscribe());

    engine.initialize().unwrap();
    engine.run_until_idle().unwrap();
    engine.scan(|_| {}).unwrap();
    engine.run_until_idle().unwrap();

    let kinds: Vec<_> = kept.try_iter().map(|e| (e.kind, e.success)).collect();
    assert_eq!(
        kinds,
        vec![(ScanEventKind::ScanStart, true), (ScanEventKind::ScanEnd, true)]
    );
}

#[test]
fn mask_is_mirror_symmetric_on_the_default_view() {
    let cfg = BuddhabrotConfig::for_canvas(30, 21);
    let mask = classify(cfg.view().unwrap(), 100);
    for row in 0..21 {
        for col in 0..30 {
            assert_eq!(mask.get(row, col), mask.get(row, 29 - col));
        }
    }
}

#[test]
fn invalid_config_is_rejected() {
    let mut cfg = tiny_config();
    cfg.thresholds.green = 0;
    assert!(matches!(
        Buddhabrot::new(cfg),
        Err(RenderError::Core(_))
    ));
}

#[test]
fn export_after_scan() {
    let mut engine = scanned(tiny_config());
    let dir = std::env::temp_dir().join(format!("buddhabrot4d-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tiny.png");

    let config = engine.config().clone();
    export_png(engine.render(), &path, &config).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    std::fs::remove_dir_all(&dir).ok();
}
