// One error type for the whole app.
// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Failed to load image `{name}`: {reason}")]
    ImageLoad { name: String, reason: String }, // One painting could not be decoded
    #[error("No masterpieces could be loaded ({attempted} tried). Check the image paths.")]
    NoImagesLoaded { attempted: usize },
    #[error("Hand tracking unavailable: {0}")]
    TrackingUnavailable(String), // Tracker not ready / stream broke
    #[error("Graphics context unavailable: {0}")]
    RenderContext(String), // No adapter / device
    #[error("Render error: {0}")]
    Render(String), // A frame failed on the GPU side
}

impl Error {
    /// Fatal errors end the session and bring up the reload screen.
    /// Image and tracking problems are recovered where they happen.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::ImageLoad { .. } | Error::TrackingUnavailable(_) | Error::CameraInit(_) | Error::CameraFrame(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_tracking_failures_are_recoverable() {
        let load = Error::ImageLoad { name: "Sunflowers".into(), reason: "404".into() };
        assert!(!load.is_fatal());
        assert!(!Error::TrackingUnavailable("not yet".into()).is_fatal());
    }

    #[test]
    fn empty_catalog_and_missing_gpu_are_fatal() {
        assert!(Error::NoImagesLoaded { attempted: 5 }.is_fatal());
        assert!(Error::RenderContext("no adapter".into()).is_fatal());
    }

    #[test]
    fn messages_name_the_failure() {
        let msg = Error::NoImagesLoaded { attempted: 2 }.to_string();
        assert!(msg.contains("No masterpieces"));
        assert!(msg.contains('2'));
    }
}
