//! Camera capability used by the punch workflow. Hardware access lives
//! behind [`CameraSource`]; the engine only needs "open, grab a still
//! frame, close". [`SyntheticCamera`] serves kiosks without hardware and
//! the test suite.

mod controller;

pub use controller::CameraController;

use std::io::Cursor;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageBuffer, ImageFormat, RgbImage};

use crate::error::{Error, Result};

/// One uncompressed still frame, RGB8 row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[async_trait]
pub trait CameraSource: Send + Sync + 'static {
    /// Acquire the device. Fails with `Error::Camera` when access is denied
    /// or the device is unsupported.
    async fn open(&self) -> Result<()>;

    /// The most recent frame from the open device.
    async fn grab_frame(&self) -> Result<RawFrame>;

    /// Release the device. Must be safe to call when already closed.
    async fn close(&self);
}

/// A hardware-free source producing a flat gray frame. Useful for demos and
/// tests; a real webcam adapter lives in the embedding shell.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    pub width: u32,
    pub height: u32,
    pub shade: u8,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            shade: 0x7f,
        }
    }
}

#[async_trait]
impl CameraSource for SyntheticCamera {
    async fn open(&self) -> Result<()> {
        Ok(())
    }

    async fn grab_frame(&self) -> Result<RawFrame> {
        Ok(RawFrame {
            width: self.width,
            height: self.height,
            pixels: vec![self.shade; (self.width * self.height * 3) as usize],
        })
    }

    async fn close(&self) {}
}

/// Encode a captured frame the way the punch request carries it:
/// `data:image/jpeg;base64,…`.
pub fn encode_jpeg_data_url(frame: &RawFrame) -> Result<String> {
    let image: RgbImage =
        ImageBuffer::from_raw(frame.width, frame.height, frame.pixels.clone()).ok_or_else(
            || Error::Camera("captured frame has a malformed pixel buffer".to_string()),
        )?;

    let mut encoded = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Jpeg)
        .map_err(|err| Error::Camera(format!("failed to encode captured frame: {err}")))?;

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&encoded)))
}
