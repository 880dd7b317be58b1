//! Async event loop driving a [`TryOnController`].
//!
//! One task, one `tokio::select!`: the sampling timer, service events, user
//! commands and finished image decodes are handled one at a time, so the
//! controller never needs a lock.

use std::time::Duration;

use image::RgbaImage;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::{GarmentSelection, SessionUpdate, TickReport, TryOnController};
use crate::capture::FrameSource;
use crate::channel::{MessageSink, ServerEvent};
use crate::overlay::{decode_image, DecodeError, DrawingSurface};

/// User actions fed into the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Stop,
    SelectGarment(GarmentSelection),
    SetDetection(bool),
    SetEstimation(bool),
    SetTryOn(bool),
    SetOpacity(f32),
    SetConfidenceThreshold(f32),
    SetPreferredFit(String),
    /// Leave the loop. The session is left as it is so the caller can
    /// inspect the overlay before stopping it.
    Shutdown,
}

/// Why [`run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Shutdown,
    /// The detection service went away.
    ChannelClosed,
    /// Every command sender was dropped.
    CommandsClosed,
}

type DecodeOutcome = (Option<u64>, Result<RgbaImage, DecodeError>);

fn sampling_interval(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Resolves on the next sampling tick, or never while the session is stopped.
async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(interval) => interval.tick().await,
        None => std::future::pending().await,
    }
}

fn publish<K: MessageSink, S: DrawingSurface>(
    controller: &mut TryOnController<K, S>,
    updates: Option<&UnboundedSender<SessionUpdate>>,
) {
    for update in controller.drain_updates() {
        log::trace!("Session update: {:?}", update);
        if let Some(tx) = updates {
            // Nobody listening is not an error for the loop
            let _ = tx.send(update);
        }
    }
}

/// Run the session until shutdown, until the service channel closes or until
/// every command sender is dropped.
///
/// The sampling interval only exists while the session is active: stopping
/// drops it, starting creates a fresh one from the current settings.
pub async fn run<K, S>(
    controller: &mut TryOnController<K, S>,
    source: &mut dyn FrameSource,
    events: &mut UnboundedReceiver<ServerEvent>,
    commands: &mut UnboundedReceiver<SessionCommand>,
    updates: Option<&UnboundedSender<SessionUpdate>>,
) -> SessionExit
where
    K: MessageSink,
    S: DrawingSurface,
{
    let mut ticker = controller
        .is_active()
        .then(|| sampling_interval(controller.settings().sample_period()));
    let mut decodes: JoinSet<DecodeOutcome> = JoinSet::new();

    let exit = loop {
        publish(controller, updates);

        tokio::select! {
            _ = next_tick(&mut ticker) => {
                if let TickReport::Submitted { tick, seq } = controller.on_tick(source) {
                    log::trace!("Tick {} submitted as detect #{}", tick, seq);
                }
            }

            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => {
                        if let Some(job) = controller.on_event(event) {
                            decodes.spawn(async move {
                                let decoded = decode_image(job.payload).await;
                                (job.seq, decoded)
                            });
                        }
                    }
                    None => {
                        controller.on_channel_closed();
                        break SessionExit::ChannelClosed;
                    }
                }
            }

            maybe_command = commands.recv() => {
                let Some(command) = maybe_command else {
                    break SessionExit::CommandsClosed;
                };
                match command {
                    SessionCommand::Start => {
                        controller.start();
                        if ticker.is_none() {
                            ticker = Some(sampling_interval(controller.settings().sample_period()));
                        }
                    }
                    SessionCommand::Stop => {
                        controller.stop();
                        ticker = None;
                    }
                    SessionCommand::SelectGarment(selection) => {
                        controller.select_garment(selection, source);
                    }
                    SessionCommand::SetDetection(enabled) => controller.set_detection_enabled(enabled),
                    SessionCommand::SetEstimation(enabled) => controller.set_estimation_enabled(enabled),
                    SessionCommand::SetTryOn(enabled) => controller.set_tryon_enabled(enabled),
                    SessionCommand::SetOpacity(opacity) => controller.set_tryon_opacity(opacity),
                    SessionCommand::SetConfidenceThreshold(threshold) => {
                        controller.set_confidence_threshold(threshold)
                    }
                    SessionCommand::SetPreferredFit(fit) => controller.set_preferred_fit(fit),
                    SessionCommand::Shutdown => break SessionExit::Shutdown,
                }
            }

            Some(joined) = decodes.join_next(), if !decodes.is_empty() => {
                match joined {
                    Ok((seq, decoded)) => controller.finish_decode(seq, decoded),
                    Err(e) => log::warn!("Try-on decode task failed: {}", e),
                }
            }
        }
    };

    decodes.abort_all();
    publish(controller, updates);
    log::info!("Session loop exited: {:?}", exit);
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::StillFrameSource;
    use crate::channel::{PoseDetection, RecordingSink, RequestKind};
    use crate::overlay::RecordingSurface;
    use crate::session::SessionSettings;
    use image::RgbImage;
    use tokio::sync::mpsc::unbounded_channel;

    fn fast_settings() -> SessionSettings {
        SessionSettings {
            sample_rate_hz: 200,
            ..SessionSettings::default()
        }
    }

    #[tokio::test]
    async fn test_shutdown_command_exits_loop() {
        let mut ctl = TryOnController::new(
            fast_settings(),
            RecordingSink::new(),
            RecordingSurface::new(320, 240),
        );
        let mut src = StillFrameSource::from_images(vec![RgbImage::new(32, 24)]);
        let (_event_tx, mut events) = unbounded_channel();
        let (cmd_tx, mut commands) = unbounded_channel();
        let (update_tx, mut update_rx) = unbounded_channel();

        cmd_tx.send(SessionCommand::Start).unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            let _ = cmd_tx.send(SessionCommand::Shutdown);
        });

        let exit = run(&mut ctl, &mut src, &mut events, &mut commands, Some(&update_tx)).await;
        assert_eq!(exit, SessionExit::Shutdown);
        assert!(ctl.is_active());

        // Nothing ever answered, so only the first tick got through the guard
        assert_eq!(ctl.sink().count(RequestKind::Detect), 1);
        assert_eq!(update_rx.recv().await, Some(SessionUpdate::Started));
        assert!(update_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_event_channel_ends_loop_and_releases_guard() {
        let mut ctl = TryOnController::new(
            fast_settings(),
            RecordingSink::new(),
            RecordingSurface::new(320, 240),
        );
        let mut src = StillFrameSource::from_images(vec![RgbImage::new(32, 24)]);
        let (event_tx, mut events) = unbounded_channel::<ServerEvent>();
        let (_cmd_tx, mut commands) = unbounded_channel();

        ctl.start();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(event_tx);
        });

        let exit = run(&mut ctl, &mut src, &mut events, &mut commands, None).await;
        assert_eq!(exit, SessionExit::ChannelClosed);
        assert!(ctl.guard().is_idle());
    }

    #[tokio::test]
    async fn test_stopped_session_does_not_tick() {
        let mut ctl = TryOnController::new(
            fast_settings(),
            RecordingSink::new(),
            RecordingSurface::new(320, 240),
        );
        let mut src = StillFrameSource::from_images(vec![RgbImage::new(32, 24)]);
        let (event_tx, mut events) = unbounded_channel();
        let (cmd_tx, mut commands) = unbounded_channel();

        cmd_tx.send(SessionCommand::Start).unwrap();
        cmd_tx.send(SessionCommand::Stop).unwrap();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            // A late answer to whatever was in flight
            let _ = event_tx.send(ServerEvent::PoseDetected(PoseDetection::failed(None)));
            tokio::time::sleep(Duration::from_millis(40)).await;
            let _ = cmd_tx.send(SessionCommand::Shutdown);
        });

        run(&mut ctl, &mut src, &mut events, &mut commands, None).await;
        assert!(ctl.sink().count(RequestKind::Detect) <= 1);
        assert!(ctl.guard().is_idle());
        assert!(ctl.renderer().surface().is_blank());
    }
}
