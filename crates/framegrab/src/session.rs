//! Async capture sessions.
//!
//! A session runs a [`FrameGrabber`] on a blocking worker thread and
//! pumps frames over a bounded channel, so async code never touches the
//! blocking V4L2 calls directly. If capturing fails (e.g. the device is
//! unplugged) the worker keeps trying to reopen it until the session is
//! dropped.

use std::pin::Pin;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::task::{Context, Poll};

use framegrab_image::PixelFormat;
use tokio::{
    sync::mpsc,
    task::{JoinHandle, spawn_blocking},
};

use crate::config::GrabberConfig;
use crate::error::GrabberError;
use crate::frame::Frame;
use crate::grabber::FrameGrabber;

// capacity of the frame channel
const CHANNEL_CAPACITY: usize = 4;

// delay before reconnecting after failure
const WAIT_BEFORE_RECONNECT_MS: u64 = 100;

// negotiated geometry sent back from the worker after open
struct Negotiated {
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_rate: f32,
}

#[derive(Debug)]
pub struct CaptureSession {
    sender: mpsc::Sender<Frame>,
    receiver: mpsc::Receiver<Frame>,
    cancel: Arc<AtomicBool>,
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_rate: f32,
    join_handle: Option<JoinHandle<()>>,
}

impl CaptureSession {
    async fn spawn_worker(
        sender: mpsc::Sender<Frame>,
        config: GrabberConfig,
        cancel: Arc<AtomicBool>,
    ) -> Result<(JoinHandle<()>, Negotiated), GrabberError> {
        // The grabber is opened on the worker thread and the negotiated
        // geometry is sent back over a oneshot channel, so open and
        // capture always run on the same OS thread.
        let (init_tx, init_rx) =
            tokio::sync::oneshot::channel::<Result<Negotiated, GrabberError>>();

        let join_handle = spawn_blocking({
            move || {
                let mut grabber = match Self::open_streaming(&config) {
                    Ok(grabber) => {
                        let _ = init_tx.send(Ok(Negotiated {
                            width: grabber.width(),
                            height: grabber.height(),
                            format: grabber.format(),
                            frame_rate: grabber.frame_rate(),
                        }));
                        grabber
                    }
                    Err(e) => {
                        let _ = init_tx.send(Err(e));
                        return;
                    }
                };

                while !cancel.load(Ordering::Relaxed) {
                    // keep pumping frames until capturing fails
                    log::info!("capture worker: starting capture loop");
                    loop {
                        match grabber.grab() {
                            Ok(frame) => {
                                if sender.blocking_send(frame).is_err() {
                                    // main closed the channel, so drop everything
                                    return;
                                }
                            }
                            Err(e) => {
                                log::error!("capture worker: grab failed: {e}");
                                break;
                            }
                        }
                    }

                    // close the device, then wait and reopen
                    drop(grabber);
                    grabber = loop {
                        if cancel.load(Ordering::Relaxed) {
                            return;
                        }
                        log::info!("capture worker: reconnecting...");
                        std::thread::sleep(std::time::Duration::from_millis(
                            WAIT_BEFORE_RECONNECT_MS,
                        ));
                        if let Ok(grabber) = Self::open_streaming(&config) {
                            break grabber;
                        }
                        // device still gone, stay in the loop
                    };
                }
            }
        });

        let negotiated = init_rx
            .await
            .map_err(|_| GrabberError::Channel("worker thread died during init".to_string()))??;

        Ok((join_handle, negotiated))
    }

    fn open_streaming(config: &GrabberConfig) -> Result<FrameGrabber, GrabberError> {
        let mut grabber = FrameGrabber::open(config.clone())?;
        grabber.start()?;
        Ok(grabber)
    }

    /// Open a device and start streaming frames in the background.
    pub async fn open(config: GrabberConfig) -> Result<Self, GrabberError> {
        // channel for receiving frames
        let (sender, receiver) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);

        // external cancelation flag
        let cancel = Arc::new(AtomicBool::new(false));

        let (join_handle, negotiated) =
            Self::spawn_worker(sender.clone(), config, Arc::clone(&cancel)).await?;

        Ok(Self {
            sender,
            receiver,
            cancel,
            width: negotiated.width,
            height: negotiated.height,
            format: negotiated.format,
            frame_rate: negotiated.frame_rate,
            join_handle: Some(join_handle),
        })
    }

    // Negotiated capture geometry and rate

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    /// Switch to a different device or configuration.
    ///
    /// The current worker is shut down and a new one is spawned.
    pub async fn select(&mut self, config: GrabberConfig) -> Result<(), GrabberError> {
        // cancel the current worker; replacing the channel pair drops the
        // old receiver, which unblocks a worker parked in blocking_send
        // on a full channel
        self.cancel.store(true, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
        self.sender = sender;
        self.receiver = receiver;
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.await;
        }

        // reset cancel flag
        self.cancel.store(false, Ordering::Relaxed);

        // spawn a new worker
        let (join_handle, negotiated) =
            Self::spawn_worker(self.sender.clone(), config, Arc::clone(&self.cancel)).await?;
        self.join_handle = Some(join_handle);
        self.width = negotiated.width;
        self.height = negotiated.height;
        self.format = negotiated.format;
        self.frame_rate = negotiated.frame_rate;
        Ok(())
    }

    /// Await the next captured frame.
    pub async fn capture(&mut self) -> Result<Frame, GrabberError> {
        match self.receiver.recv().await {
            Some(frame) => Ok(frame),
            None => Err(GrabberError::Channel(
                "capture channel closed".to_string(),
            )),
        }
    }
}

impl futures_core::Stream for CaptureSession {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            handle.abort();
        }
    }
}
