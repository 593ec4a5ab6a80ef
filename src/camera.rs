// Live camera backdrop.
// The camera is opened and read on its own thread; the frame loop only picks
// up the newest decoded frame. Visual: the webcam feed behind the particles,
// or plain black when no camera could be opened.

use crate::error::Error;
use crate::tracking::Latest;
use crate::types::FrameBuffer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use nokhwa::{
    Buffer, Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

/// Open device `index`, asking for something close to `width`x`height`.
fn open(index: u32, width: u32, height: u32) -> Result<Camera, Error> {
    let fmt = CameraFormat::new(
        Resolution::new(width, height),
        FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
        30,
    );
    let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

    let mut cam = Camera::new(CameraIndex::Index(index), req)
        .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;
    cam.open_stream()
        .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;
    Ok(cam)
}

/// Raw camera buffer -> 0x00RRGGBB pixels.
fn decode(frame: &Buffer) -> Result<FrameBuffer, Error> {
    let rgb = frame
        .decode_image::<RgbFormat>()
        .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;
    let (w, h) = rgb.dimensions();
    let pixels = rgb
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect();
    Ok(FrameBuffer { width: w as usize, height: h as usize, pixels })
}

pub struct CameraBackdrop {
    frames: Latest<FrameBuffer>,
    running: Arc<AtomicBool>,
    live: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CameraBackdrop {
    /// Start capturing in the background. Never fails: a missing camera just
    /// leaves the backdrop black (reported once in the log).
    pub fn spawn(index: u32, width: u32, height: u32) -> Self {
        let frames = Latest::default();
        let running = Arc::new(AtomicBool::new(true));
        let live = Arc::new(AtomicBool::new(false));

        let worker = {
            let (frames, running, live) = (frames.clone(), Arc::clone(&running), Arc::clone(&live));
            std::thread::Builder::new()
                .name("camera".into())
                .spawn(move || capture_loop(index, width, height, &frames, &running, &live))
        };
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Camera thread failed to start: {e}");
                None
            }
        };

        Self { frames, running, live, worker }
    }

    /// Backdrop that never shows anything (`--no-camera`).
    pub fn disabled() -> Self {
        Self {
            frames: Latest::default(),
            running: Arc::new(AtomicBool::new(false)),
            live: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Newest frame since the last call, if any.
    pub fn latest(&self) -> Option<FrameBuffer> {
        self.frames.take()
    }

    /// True while frames are arriving.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for CameraBackdrop {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn capture_loop(
    index: u32,
    width: u32,
    height: u32,
    frames: &Latest<FrameBuffer>,
    running: &AtomicBool,
    live: &AtomicBool,
) {
    // 1) Open on this thread; the handle never leaves it.
    let mut cam = match open(index, width, height) {
        Ok(cam) => cam,
        Err(e) => {
            log::warn!("{e}; continuing without a camera backdrop");
            return;
        }
    };
    let res = cam.resolution();
    log::info!("Camera {index} streaming at {}x{}", res.width(), res.height());

    // 2) Pull, decode, post. Blocks on the device between frames.
    while running.load(Ordering::Acquire) {
        let result = cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))
            .and_then(|raw| decode(&raw));
        match result {
            Ok(fb) => {
                live.store(true, Ordering::Release);
                frames.post(fb);
            }
            Err(e) => {
                log::warn!("{e}; stopping camera backdrop");
                break;
            }
        }
    }

    live.store(false, Ordering::Release);
    if let Err(e) = cam.stop_stream() {
        log::debug!("Camera stop: {e}");
    }
}
