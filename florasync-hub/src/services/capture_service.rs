use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use florasync_api::codec;
use florasync_api::message::{CaptureReport, UploadStatus};
use florasync_api::topics;

use crate::settings::Imaging;

use super::{MessagePublisher, ServiceError};

/// Logical frame name; the backend renames on ingest.
pub const CAPTURE_FILENAME: &str = "capture.jpg";

/// One JPEG frame on loan from the imaging source.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// The imaging source hands out frame buffers that must be returned on
/// every path, or the source starves.
pub trait Camera: Send {
    fn acquire(&mut self) -> Option<Frame>;
    fn release(&mut self, frame: Frame);
}

/// Production stand-in for the opaque imaging encoder: serves the most
/// recent staged JPEG from disk.
pub struct FileCamera {
    source_path: PathBuf,
    width: u32,
    height: u32,
}

impl FileCamera {
    pub fn new(settings: &Imaging) -> Self {
        Self {
            source_path: PathBuf::from(&settings.source_path),
            width: settings.width,
            height: settings.height,
        }
    }
}

impl Camera for FileCamera {
    fn acquire(&mut self) -> Option<Frame> {
        match std::fs::read(&self.source_path) {
            Ok(data) => Some(Frame {
                width: self.width,
                height: self.height,
                data: Bytes::from(data),
            }),
            Err(e) => {
                tracing::warn!("no frame available from {}: {e}", self.source_path.display());
                None
            }
        }
    }

    fn release(&mut self, _frame: Frame) {}
}

/// Acquire one frame per trigger, push it to the upload endpoint, report
/// the outcome over telemetry.
pub struct CaptureService<C>
where
    C: Camera,
{
    camera: C,
    http: reqwest::Client,
    upload_url: String,
}

impl<C> CaptureService<C>
where
    C: Camera,
{
    /// `timeout` caps one whole upload; the POST is awaited on the hub's
    /// single cooperative loop.
    pub fn new(camera: C, upload_url: String, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            camera,
            http,
            upload_url,
        })
    }

    pub async fn capture_and_upload<M>(&mut self, publisher: &M)
    where
        M: MessagePublisher,
    {
        let Some(frame) = self.camera.acquire() else {
            tracing::warn!("imaging source produced no frame, capture dropped");
            return;
        };

        tracing::info!(
            "frame captured: {}x{}, {} bytes",
            frame.width,
            frame.height,
            frame.data.len()
        );

        let report = match self.upload(&frame).await {
            Ok(()) => CaptureReport {
                status: UploadStatus::Uploaded,
                filename: CAPTURE_FILENAME.into(),
                resolution: format!("{}x{}", frame.width, frame.height),
                size_bytes: frame.data.len(),
                upload_method: "http_post".into(),
            },
            Err(e) => {
                tracing::error!("image upload failed: {e}");
                CaptureReport {
                    status: UploadStatus::Failed,
                    filename: CAPTURE_FILENAME.into(),
                    resolution: format!("{}x{}", frame.width, frame.height),
                    size_bytes: frame.data.len(),
                    upload_method: "http_post".into(),
                }
            }
        };

        // The buffer goes back to the source no matter how the upload went.
        self.camera.release(frame);

        match codec::encode(&report) {
            Ok(payload) => {
                if let Err(e) = publisher.publish(topics::IMAGE_STATUS, payload).await {
                    tracing::error!("capture report publish failed: {e}");
                }
            }
            Err(e) => tracing::error!("capture report encode failed: {e}"),
        }
    }

    async fn upload(&self, frame: &Frame) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(&self.upload_url)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(frame.data.clone())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("upload endpoint answered {status}").into());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("upload accepted: {}", body.trim());

        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;

    /// Hands out queued frames and counts the ones not yet returned.
    #[derive(Default)]
    pub struct MockCamera {
        pub frames: Vec<Frame>,
        pub outstanding: usize,
    }

    impl MockCamera {
        pub fn with_frame(bytes: &'static [u8]) -> Self {
            Self {
                frames: vec![Frame {
                    width: 800,
                    height: 600,
                    data: Bytes::from_static(bytes),
                }],
                outstanding: 0,
            }
        }
    }

    impl Camera for MockCamera {
        fn acquire(&mut self) -> Option<Frame> {
            let frame = self.frames.pop()?;
            self.outstanding += 1;
            Some(frame)
        }

        fn release(&mut self, _frame: Frame) {
            self.outstanding -= 1;
        }
    }
}
