use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

use super::{encode_jpeg_data_url, CameraSource, RawFrame};

struct LiveFeed {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    latest: watch::Receiver<Option<RawFrame>>,
}

/// Owns the camera lifecycle for the punch workflow.
///
/// While active, a background task keeps pulling frames from the source so
/// a capture is instant. Every exit path must end in [`stop`](Self::stop);
/// the feed task is cancelled and joined before the source is closed.
pub struct CameraController<C> {
    source: Arc<C>,
    feed: Arc<Mutex<Option<LiveFeed>>>,
    frame_interval: Duration,
}

impl<C> Clone for CameraController<C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            feed: self.feed.clone(),
            frame_interval: self.frame_interval,
        }
    }
}

impl<C: CameraSource> CameraController<C> {
    pub fn new(source: C, frame_interval: Duration) -> Self {
        Self {
            source: Arc::new(source),
            feed: Arc::new(Mutex::new(None)),
            frame_interval,
        }
    }

    /// Acquire the device and start the live feed. A no-op when already
    /// active.
    pub async fn start(&self) -> Result<()> {
        let mut feed = self.feed.lock().await;
        if feed.is_some() {
            return Ok(());
        }

        self.source.open().await?;

        let (frames_tx, frames_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(feed_loop(
            self.source.clone(),
            frames_tx,
            cancel.clone(),
            self.frame_interval,
        ));

        *feed = Some(LiveFeed {
            cancel,
            handle,
            latest: frames_rx,
        });
        info!("camera feed started");
        Ok(())
    }

    /// Stop the live feed and release the device. Safe to call when
    /// already stopped.
    pub async fn stop(&self) {
        let mut feed = self.feed.lock().await;
        if let Some(live) = feed.take() {
            live.cancel.cancel();
            if let Err(err) = live.handle.await {
                warn!("camera feed task failed to join: {err}");
            }
            self.source.close().await;
            info!("camera released");
        }
    }

    pub async fn is_active(&self) -> bool {
        self.feed.lock().await.is_some()
    }

    /// Grab one still frame from the live feed and encode it as a JPEG
    /// data URL. Fails when the camera is not active.
    pub async fn capture_still(&self) -> Result<String> {
        let latest = {
            let feed = self.feed.lock().await;
            let live = feed
                .as_ref()
                .ok_or_else(|| Error::Camera("The camera is not active.".to_string()))?;
            let frame = live.latest.borrow().clone();
            frame
        };

        // The feed may not have published a frame yet right after start;
        // fall back to a direct grab.
        let frame = match latest {
            Some(frame) => frame,
            None => self.source.grab_frame().await?,
        };

        encode_jpeg_data_url(&frame)
    }
}

async fn feed_loop<C: CameraSource>(
    source: Arc<C>,
    frames: watch::Sender<Option<RawFrame>>,
    cancel: CancellationToken,
    frame_interval: Duration,
) {
    let mut ticker = tokio::time::interval(frame_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match source.grab_frame().await {
                    Ok(frame) => {
                        let _ = frames.send(Some(frame));
                    }
                    Err(err) => warn!("camera frame grab failed: {err}"),
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
}
