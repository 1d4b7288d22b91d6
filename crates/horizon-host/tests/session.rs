mod support;

use std::time::Duration;

use horizon_host::engine::TextureId;
use horizon_host::frame::{LoopStatus, TickOutcome};
use horizon_host::host::SurfaceId;
use horizon_host::{FailurePolicy, FrameError, HostConfig, Session, SetupError};

use support::{Event, EventLog, MockHost, RecordingModule, count};

type TestSession = Session<MockHost, RecordingModule>;

fn session_with(host: impl FnOnce(EventLog) -> MockHost, config: HostConfig) -> (TestSession, EventLog) {
    let log = EventLog::default();
    let session = Session::new(host(log.clone()), RecordingModule::new(log.clone()), config);
    (session, log)
}

fn session(surfaces: &[&str]) -> (TestSession, EventLog) {
    session_with(|log| MockHost::new(log, surfaces), HostConfig::default())
}

fn at(frame: u64) -> Duration {
    Duration::from_millis(16 * frame)
}

fn renders(log: &EventLog) -> Vec<(TextureId, u64)> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Render(t, f) => Some((*t, *f)),
            _ => None,
        })
        .collect()
}

#[test]
fn valid_setup_renders_once_per_tick() {
    let (session, log) = session(&["canvas1"]);
    let canvas = SurfaceId::from("canvas1");

    let handle = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();
    assert!(handle.is_running());
    assert_eq!(session.active_surfaces(), vec![canvas.clone()]);

    for frame in 0..3 {
        assert_eq!(session.tick(&canvas, at(frame)), TickOutcome::Rendered);
    }

    assert_eq!(renders(&log), vec![(TextureId(1), 0), (TextureId(1), 1), (TextureId(1), 2)]);
    assert_eq!(handle.frames_rendered(), 3);
    // One request after start, one after each tick.
    assert_eq!(session.host().frame_requests.borrow().len(), 4);
}

#[test]
fn upload_happens_exactly_once_and_before_any_render() {
    let (session, log) = session(&["canvas1"]);
    let canvas = SurfaceId::from("canvas1");

    pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();
    session.tick(&canvas, at(0));
    session.tick(&canvas, at(1));

    let events = log.borrow().clone();
    let upload = events
        .iter()
        .position(|e| matches!(e, Event::Upload(src, _) if src == "sky.png"))
        .expect("upload event");
    let first_render = events
        .iter()
        .position(|e| matches!(e, Event::Render(..)))
        .expect("render event");

    assert!(upload < first_render);
    assert_eq!(count(&log, |e| matches!(e, Event::Upload(..))), 1);
    assert_eq!(
        &events[..3],
        &[Event::Instantiate, Event::Initialize, Event::Fetch("sky.png".into())]
    );
}

#[test]
fn missing_surface_fails_without_fetching() {
    let (session, log) = session(&["canvas1"]);

    let err = pollster::block_on(session.setup("missing", "sky.png")).unwrap_err();

    assert!(matches!(&err, SetupError::SurfaceNotFound(id) if id.as_str() == "missing"));
    assert_eq!(session.host().fetches(), 0);
    assert!(session.active_surfaces().is_empty());
    assert!(renders(&log).is_empty());
    assert_eq!(session.tick(&"missing".into(), at(0)), TickOutcome::NoLoop);
}

#[test]
fn failed_fetch_reports_source_and_never_renders() {
    let (session, log) = session_with(
        |log| MockHost::new(log, &["canvas1"]).with_broken_image("gone.png"),
        HostConfig::default(),
    );

    let err = pollster::block_on(session.setup("canvas1", "gone.png")).unwrap_err();

    match &err {
        SetupError::ResourceLoadError { image, reason } => {
            assert_eq!(image, "gone.png");
            assert!(reason.to_string().contains("404"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());
    assert_eq!(count(&log, |e| matches!(e, Event::Upload(..))), 0);
    assert_eq!(session.tick(&"canvas1".into(), at(0)), TickOutcome::NoLoop);
    assert!(renders(&log).is_empty());
}

#[test]
fn engine_is_instantiated_once_across_setups() {
    let (session, log) = session(&["canvas1", "canvas2"]);

    pollster::block_on(session.setup("canvas1", "a.png")).unwrap();
    let first = session.engine().expect("engine ready");
    pollster::block_on(session.setup("canvas2", "b.png")).unwrap();
    let second = session.engine().expect("engine ready");

    assert!(first.ptr_eq(&second));
    assert_eq!(count(&log, |e| *e == Event::Instantiate), 1);
    assert_eq!(count(&log, |e| *e == Event::Initialize), 1);
    assert_eq!(session.bootstrap().attempts(), 1);
    assert_eq!(session.active_surfaces().len(), 2);
}

#[tokio::test]
async fn concurrent_first_setups_share_one_engine() {
    let (session, log) = session(&["canvas1", "canvas2"]);
    let (c1, c2) = (SurfaceId::from("canvas1"), SurfaceId::from("canvas2"));

    let (a, b) = tokio::join!(
        session.setup("canvas1", "a.png"),
        session.setup("canvas2", "b.png")
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(count(&log, |e| *e == Event::Instantiate), 1);
    assert_eq!(count(&log, |e| *e == Event::Initialize), 1);

    let engine = session.engine().unwrap();
    let texture_of = |source: &str| {
        log.borrow()
            .iter()
            .find_map(|e| match e {
                Event::Upload(s, t) if s == source => Some(*t),
                _ => None,
            })
            .expect("upload event")
    };
    let (tex_a, tex_b) = (texture_of("a.png"), texture_of("b.png"));
    assert_ne!(tex_a, tex_b);
    assert_eq!(engine.borrow_mut().texture_source(tex_a), Some("a.png"));
    assert_eq!(engine.borrow_mut().texture_source(tex_b), Some("b.png"));

    assert_eq!(session.tick(&c1, at(0)), TickOutcome::Rendered);
    assert_eq!(session.tick(&c2, at(0)), TickOutcome::Rendered);
    assert_eq!(session.tick(&c1, at(1)), TickOutcome::Rendered);
    assert_eq!(renders(&log), vec![(tex_a, 0), (tex_b, 0), (tex_a, 1)]);

    assert!(session.stop(&c1));
    assert!(!a.is_running());
    assert_eq!(session.tick(&c1, at(2)), TickOutcome::NoLoop);
    assert_eq!(session.tick(&c2, at(1)), TickOutcome::Rendered);
    assert!(b.is_running());
    assert_eq!(renders(&log).last(), Some(&(tex_b, 1)));
    assert_eq!(count(&log, |e| matches!(e, Event::Release(_))), 1);
    assert_eq!(count(&log, |e| *e == Event::Release(tex_a)), 1);
}

#[test]
fn failed_engine_init_is_retried_by_the_next_setup() {
    let log = EventLog::default();
    let session = Session::new(
        MockHost::new(log.clone(), &["canvas1"]),
        RecordingModule::failing_first(log.clone(), 1),
        HostConfig::default(),
    );

    let err = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap_err();
    assert!(matches!(err, SetupError::EngineInitFailed(_)));
    assert_eq!(session.host().fetches(), 0);
    assert!(session.engine().is_none());

    pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();
    assert_eq!(session.bootstrap().attempts(), 2);
    assert_eq!(count(&log, |e| *e == Event::Initialize), 1);
}

#[test]
fn stop_token_halts_rendering_and_releases_texture() {
    let (session, log) = session(&["canvas1"]);
    let canvas = SurfaceId::from("canvas1");
    let handle = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();

    session.tick(&canvas, at(0));
    let requests_before = session.host().frame_requests.borrow().len();
    handle.stop();

    assert_eq!(session.tick(&canvas, at(1)), TickOutcome::Stopped);
    assert_eq!(session.tick(&canvas, at(2)), TickOutcome::NoLoop);
    assert_eq!(renders(&log).len(), 1);
    assert_eq!(session.host().frame_requests.borrow().len(), requests_before);
    assert_eq!(count(&log, |e| *e == Event::Release(TextureId(1))), 1);
    assert_eq!(handle.status(), LoopStatus::Stopped);
    assert!(session.active_surfaces().is_empty());
}

#[test]
fn session_stop_unbinds_surface() {
    let (session, log) = session(&["canvas1", "canvas2"]);
    let h1 = pollster::block_on(session.setup("canvas1", "a.png")).unwrap();
    let h2 = pollster::block_on(session.setup("canvas2", "b.png")).unwrap();

    assert!(session.stop(&"canvas1".into()));
    assert!(!session.stop(&"canvas1".into()));
    assert!(!h1.is_running());
    assert!(h2.is_running());
    assert_eq!(session.active_surfaces(), vec![SurfaceId::from("canvas2")]);

    session.stop_all();
    assert!(!h2.is_running());
    assert!(session.active_surfaces().is_empty());
    assert_eq!(count(&log, |e| matches!(e, Event::Release(_))), 2);
}

#[test]
fn new_setup_replaces_previous_loop() {
    let (session, log) = session(&["canvas1"]);
    let canvas = SurfaceId::from("canvas1");

    let old = pollster::block_on(session.setup("canvas1", "day.png")).unwrap();
    session.tick(&canvas, at(0));
    let new = pollster::block_on(session.setup("canvas1", "night.png")).unwrap();
    session.tick(&canvas, at(1));

    assert_eq!(old.status(), LoopStatus::Stopped);
    assert!(new.is_running());
    assert_eq!(count(&log, |e| *e == Event::Release(TextureId(1))), 1);
    assert_eq!(renders(&log), vec![(TextureId(1), 0), (TextureId(2), 0)]);

    let engine = session.engine().unwrap();
    assert_eq!(engine.borrow_mut().texture_source(TextureId(2)), Some("night.png"));
    assert_eq!(engine.borrow_mut().texture_source(TextureId(1)), None);
}

#[tokio::test]
async fn overlapping_setups_keep_only_the_latest() {
    let (session, log) = session_with(
        |log| MockHost::new(log, &["canvas1"]).with_slow_image("day.png"),
        HostConfig::default(),
    );

    let (first, second) = tokio::join!(
        session.setup("canvas1", "day.png"),
        session.setup("canvas1", "night.png")
    );

    assert!(matches!(first, Err(SetupError::Superseded { .. })));
    let handle = second.unwrap();
    assert!(handle.is_running());

    let engine = session.engine().unwrap();
    let uploads: Vec<Event> = log
        .borrow()
        .iter()
        .filter(|e| matches!(e, Event::Upload(..)))
        .cloned()
        .collect();
    assert_eq!(uploads.len(), 2);
    for upload in uploads {
        if let Event::Upload(source, texture) = upload {
            let alive = engine.borrow_mut().texture_source(texture).is_some();
            assert_eq!(alive, source == "night.png", "{source} -> {texture}");
        }
    }

    assert_eq!(session.tick(&"canvas1".into(), at(0)), TickOutcome::Rendered);
}

#[tokio::test]
async fn later_setup_replaces_one_that_finished_first() {
    let (session, log) = session_with(
        |log| MockHost::new(log, &["canvas1"]).with_slow_image("night.png"),
        HostConfig::default(),
    );

    let (first, second) = tokio::join!(
        session.setup("canvas1", "day.png"),
        session.setup("canvas1", "night.png")
    );

    let (first, second) = (first.unwrap(), second.unwrap());
    assert_eq!(first.status(), LoopStatus::Stopped);
    assert!(second.is_running());
    assert_eq!(session.handle(&"canvas1".into()).map(|h| h.id()), Some(second.id()));

    session.tick(&"canvas1".into(), at(0));
    let engine = session.engine().unwrap();
    let [(texture, 0)] = renders(&log)[..] else {
        panic!("expected exactly one render");
    };
    assert_eq!(engine.borrow_mut().texture_source(texture), Some("night.png"));
}

#[tokio::test]
async fn failing_setup_does_not_cancel_an_earlier_one() {
    let (session, log) = session_with(
        |log| {
            MockHost::new(log, &["canvas1"])
                .with_slow_image("day.png")
                .with_broken_image("gone.png")
        },
        HostConfig::default(),
    );

    let (first, second) = tokio::join!(
        session.setup("canvas1", "day.png"),
        session.setup("canvas1", "gone.png")
    );

    assert!(matches!(
        second,
        Err(SetupError::ResourceLoadError { ref image, .. }) if image == "gone.png"
    ));
    let handle = first.unwrap();
    assert!(handle.is_running());
    assert_eq!(session.active_surfaces(), vec![SurfaceId::from("canvas1")]);

    assert_eq!(session.tick(&"canvas1".into(), at(0)), TickOutcome::Rendered);
    assert_eq!(count(&log, |e| matches!(e, Event::Release(_))), 0);
}

#[tokio::test]
async fn stop_cancels_setups_still_loading() {
    let (session, log) = session_with(
        |log| MockHost::new(log, &["canvas1"]).with_slow_image("day.png"),
        HostConfig::default(),
    );
    let canvas = SurfaceId::from("canvas1");

    let (result, stopped) = tokio::join!(session.setup("canvas1", "day.png"), async {
        support::YieldOnce::new().await;
        session.stop(&canvas)
    });

    assert!(!stopped);
    assert!(matches!(result, Err(SetupError::Superseded { .. })));
    assert!(session.active_surfaces().is_empty());
    assert_eq!(count(&log, |e| matches!(e, Event::Release(_))), 1);
    assert!(renders(&log).is_empty());
}

#[test]
fn missing_context_skips_frames_and_keeps_looping() {
    let (session, log) = session(&["canvas1"]);
    let canvas = SurfaceId::from("canvas1");
    let handle = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();

    session.host().context_available.set(false);
    for frame in 0..3 {
        assert_eq!(session.tick(&canvas, at(frame)), TickOutcome::Skipped);
    }
    session.host().context_available.set(true);
    assert_eq!(session.tick(&canvas, at(3)), TickOutcome::Rendered);

    assert_eq!(handle.frames_skipped(), 3);
    assert_eq!(handle.frames_rendered(), 1);
    assert_eq!(renders(&log).len(), 1);
}

#[test]
fn render_error_is_skipped_under_default_policy() {
    let (session, _log) = session(&["canvas1"]);
    let canvas = SurfaceId::from("canvas1");
    let handle = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();

    session.engine().unwrap().borrow_mut().fail_render = true;
    assert_eq!(session.tick(&canvas, at(0)), TickOutcome::Skipped);
    assert_eq!(session.tick(&canvas, at(1)), TickOutcome::Skipped);
    assert!(handle.is_running());

    session.engine().unwrap().borrow_mut().fail_render = false;
    assert_eq!(session.tick(&canvas, at(2)), TickOutcome::Rendered);
}

#[test]
fn render_error_stops_loop_under_stop_policy() {
    let config = HostConfig {
        failure_policy: FailurePolicy::StopOnError,
        ..HostConfig::default()
    };
    let (session, log) = session_with(|log| MockHost::new(log, &["canvas1"]), config);
    let canvas = SurfaceId::from("canvas1");
    let handle = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();

    session.tick(&canvas, at(0));
    session.engine().unwrap().borrow_mut().fail_render = true;

    assert_eq!(session.tick(&canvas, at(1)), TickOutcome::Failed);
    assert_eq!(handle.status(), LoopStatus::Failed);
    let FrameError::RenderFatal { surface, frame, reason } = handle.take_error().unwrap();
    assert_eq!(surface, canvas);
    assert_eq!(frame, 1);
    assert!(reason.to_string().contains("video memory"));

    assert_eq!(session.tick(&canvas, at(2)), TickOutcome::NoLoop);
    assert_eq!(count(&log, |e| matches!(e, Event::Release(_))), 1);
    assert!(session.active_surfaces().is_empty());
}

#[test]
fn handles_are_shared_with_the_session() {
    let (session, _log) = session(&["canvas1"]);
    let handle = pollster::block_on(session.setup("canvas1", "sky.png")).unwrap();

    let looked_up = session.handle(&"canvas1".into()).unwrap();
    assert_eq!(looked_up.id(), handle.id());
    looked_up.stop();
    assert!(!handle.is_running());
}
