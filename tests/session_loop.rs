//! Session loop tests driven through the public API.
//!
//! A `RecordingSink` stands in for the detection service and a
//! `RecordingSurface` for the overlay, so every outbound request and draw call
//! can be asserted on.

use std::io::Cursor;
use std::time::Duration;

use base64::Engine;
use image::{ImageFormat, RgbImage, Rgba, RgbaImage};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use virtual_tryon::capture::StillFrameSource;
use virtual_tryon::channel::{
    ClientMessage, PoseDetection, RecordingSink, RequestKind, ServerEvent, TryOnResult,
};
use virtual_tryon::overlay::{DrawingSurface, RecordingSurface};
use virtual_tryon::pose::landmark::index;
use virtual_tryon::pose::{Dimension, Landmark, LandmarkSet, MeasurementSet};
use virtual_tryon::session::{
    self, GarmentSelection, SessionCommand, SessionExit, SessionSettings, SessionUpdate,
    TryOnController,
};

type Controller = TryOnController<RecordingSink, RecordingSurface>;

fn controller(settings: SessionSettings) -> Controller {
    TryOnController::new(settings, RecordingSink::new(), RecordingSurface::new(320, 240))
}

fn frames() -> StillFrameSource {
    StillFrameSource::from_images(vec![RgbImage::new(64, 48)])
}

/// 10 ticks per second: ticks land at 0, 100, 200 ms.
fn settings() -> SessionSettings {
    SessionSettings::default()
}

fn pose(seq: Option<u64>) -> ServerEvent {
    let mut landmarks = LandmarkSet::invisible();
    landmarks.set(index::LEFT_SHOULDER, Landmark::new(0.4, 0.3, 0.9));
    landmarks.set(index::RIGHT_SHOULDER, Landmark::new(0.6, 0.3, 0.9));
    ServerEvent::PoseDetected(PoseDetection {
        success: true,
        landmarks: Some(landmarks),
        measurements: Some(MeasurementSet::new().with(Dimension::ShoulderWidth, 120.4)),
        seq,
    })
}

fn png_data_url() -> String {
    let image = RgbaImage::from_pixel(16, 12, Rgba([200, 30, 30, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    )
}

/// Send each step after the given delay, then shut the loop down.
fn script(
    events: UnboundedSender<ServerEvent>,
    commands: UnboundedSender<SessionCommand>,
    steps: Vec<(u64, Result<ServerEvent, SessionCommand>)>,
) {
    tokio::spawn(async move {
        for (delay_ms, step) in steps {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            let _ = match step {
                Ok(event) => events.send(event).map_err(|_| ()),
                Err(command) => commands.send(command).map_err(|_| ()),
            };
        }
        tokio::time::sleep(Duration::from_millis(120)).await;
        let _ = commands.send(SessionCommand::Shutdown);
    });
}

#[tokio::test]
async fn test_pose_result_feeds_estimate_and_overlay() {
    let mut ctl = controller(settings());
    let mut src = frames();
    let (event_tx, mut events) = unbounded_channel();
    let (cmd_tx, mut commands) = unbounded_channel();
    let (update_tx, mut updates) = unbounded_channel();

    ctl.start();
    script(event_tx, cmd_tx, vec![(30, Ok(pose(None)))]);

    let exit = session::run(&mut ctl, &mut src, &mut events, &mut commands, Some(&update_tx)).await;
    assert_eq!(exit, SessionExit::Shutdown);

    assert_eq!(ctl.sink().count(RequestKind::Estimate), 1);
    assert_eq!(ctl.renderer().surface().lines().len(), 1);
    // One detection answered, the next one still outstanding
    assert_eq!(ctl.sink().count(RequestKind::Detect), 2);
    assert!(ctl.guard().is_busy());

    let mut seen = Vec::new();
    while let Ok(update) = updates.try_recv() {
        seen.push(update);
    }
    assert!(seen.contains(&SessionUpdate::Started));
    assert!(seen
        .iter()
        .any(|u| matches!(u, SessionUpdate::MeasurementsUpdated(m) if m.get(Dimension::ShoulderWidth) == Some(120.4))));
}

#[tokio::test]
async fn test_selection_sends_tryon_and_composites_result() {
    let mut ctl = controller(SessionSettings {
        tryon_enabled: true,
        ..settings()
    });
    let mut src = frames();
    let (event_tx, mut events) = unbounded_channel();
    let (cmd_tx, mut commands) = unbounded_channel();

    ctl.start();
    script(
        event_tx,
        cmd_tx,
        vec![
            (30, Ok(pose(None))),
            (
                30,
                Err(SessionCommand::SelectGarment(GarmentSelection::named(
                    2,
                    "Cozy Hoodie",
                ))),
            ),
            (
                30,
                Ok(ServerEvent::TryOnResult(TryOnResult {
                    success: true,
                    result_image: Some(png_data_url()),
                    seq: Some(1),
                })),
            ),
        ],
    );

    session::run(&mut ctl, &mut src, &mut events, &mut commands, None).await;

    assert_eq!(ctl.sink().count(RequestKind::TryOn), 1);
    match ctl.sink().sent_of(RequestKind::TryOn)[0] {
        ClientMessage::VirtualTryOn(req) => {
            assert_eq!(req.clothing_item_id, 2);
            assert_eq!(req.seq, 1);
            assert_eq!(req.measurements.get(Dimension::ShoulderWidth), Some(120.4));
        }
        other => panic!("unexpected message {:?}", other),
    }
    assert_eq!(ctl.renderer().surface().images(), vec![0.8]);
    assert_eq!(ctl.renderer().surface().alpha(), 1.0);
}

#[tokio::test]
async fn test_failed_tryon_leaves_overlay_untouched() {
    let mut ctl = controller(settings());
    let mut src = frames();
    let (event_tx, mut events) = unbounded_channel();
    let (cmd_tx, mut commands) = unbounded_channel();

    ctl.start();
    script(
        event_tx,
        cmd_tx,
        vec![
            (30, Ok(pose(None))),
            (
                30,
                Ok(ServerEvent::TryOnResult(TryOnResult {
                    success: false,
                    result_image: None,
                    seq: None,
                })),
            ),
        ],
    );

    session::run(&mut ctl, &mut src, &mut events, &mut commands, None).await;

    let surface = ctl.renderer().surface();
    assert_eq!(surface.clear_count(), 1);
    assert_eq!(surface.circles().len(), 2);
    assert!(surface.images().is_empty());
}

#[tokio::test]
async fn test_stop_with_request_in_flight_halts_ticks() {
    let mut ctl = controller(settings());
    let mut src = frames();
    let (event_tx, mut events) = unbounded_channel();
    let (cmd_tx, mut commands) = unbounded_channel();

    ctl.start();
    script(
        event_tx,
        cmd_tx,
        vec![
            (30, Ok(pose(None))),
            (120, Err(SessionCommand::Stop)),
            // The answer to the request that was in flight at stop
            (30, Ok(pose(Some(2)))),
            (150, Ok(pose(None))),
        ],
    );

    session::run(&mut ctl, &mut src, &mut events, &mut commands, None).await;

    assert!(!ctl.is_active());
    assert!(ctl.guard().is_idle());
    assert!(ctl.renderer().surface().is_blank());
    // No tick ran after stop, so nothing beyond the second detection went out
    assert_eq!(ctl.sink().count(RequestKind::Detect), 2);
    assert_eq!(ctl.sink().count(RequestKind::Estimate), 1);
}

#[tokio::test]
async fn test_disabled_detection_sends_nothing() {
    let mut ctl = controller(SessionSettings {
        detection_enabled: false,
        ..settings()
    });
    let mut src = frames();
    let (event_tx, mut events) = unbounded_channel();
    let (cmd_tx, mut commands) = unbounded_channel();

    cmd_tx.send(SessionCommand::Start).unwrap();
    script(event_tx, cmd_tx, vec![(100, Err(SessionCommand::SetOpacity(0.4)))]);

    session::run(&mut ctl, &mut src, &mut events, &mut commands, None).await;
    assert!(ctl.sink().sent().is_empty());
    assert_eq!(ctl.settings().tryon_opacity, 0.4);
}
