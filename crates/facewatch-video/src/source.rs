//! Video sources — V4L2 devices and MJPEG-over-HTTP camera streams.

use crate::frame::{self, Frame, FrameError};
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use v4l::buffer::Type as BufType;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_READ_CHUNK: usize = 8192;
/// Guard against a stream that never produces an end-of-image marker.
const MAX_JPEG_BYTES: usize = 16 * 1024 * 1024;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("cannot open video source {uri}: {cause}")]
    OpenFailed { uri: String, cause: String },
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("stream ended")]
    EndOfStream,
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("read: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame decode: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A video source identified by a URI string: `http(s)://…` opens an
/// MJPEG-over-HTTP stream, anything else opens a V4L2 device path.
#[derive(Debug)]
pub enum VideoSource {
    Device(DeviceSource),
    Mjpeg(MjpegHttpSource),
}

impl VideoSource {
    pub fn open(uri: &str) -> Result<Self, SourceError> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            Ok(Self::Mjpeg(MjpegHttpSource::open(uri)?))
        } else {
            Ok(Self::Device(DeviceSource::open(uri)?))
        }
    }

    /// Read the next frame as interleaved BGR.
    pub fn read_frame(&mut self) -> Result<Frame, SourceError> {
        match self {
            Self::Device(d) => d.read_frame(),
            Self::Mjpeg(m) => m.read_frame(),
        }
    }
}

/// Negotiated V4L2 pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    /// YUYV 4:2:2 packed (2 bytes/pixel, BT.601 conversion to BGR).
    Yuyv,
    /// Motion-JPEG (per-frame JPEG decode).
    Mjpg,
}

/// V4L2 camera device.
///
/// The mmap stream is created on the first read and reused for the life of
/// the source, so the driver queues stay primed between frames.
pub struct DeviceSource {
    device: Device,
    stream: Option<MmapStream<'static>>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
}

impl std::fmt::Debug for DeviceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSource")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixel_format", &self.pixel_format)
            .finish_non_exhaustive()
    }
}

impl DeviceSource {
    /// Open a V4L2 device by path (e.g., "/dev/video0").
    pub fn open(device_path: &str) -> Result<Self, SourceError> {
        if !Path::new(device_path).exists() {
            return Err(SourceError::OpenFailed {
                uri: device_path.to_string(),
                cause: "device not found".into(),
            });
        }

        let device = Device::with_path(device_path).map_err(|e| SourceError::OpenFailed {
            uri: device_path.to_string(),
            cause: e.to_string(),
        })?;

        let caps = device.query_caps().map_err(|e| {
            SourceError::CaptureFailed(format!("failed to query capabilities: {e}"))
        })?;

        tracing::info!(
            device = device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera device"
        );

        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(SourceError::OpenFailed {
                uri: device_path.to_string(),
                cause: "device does not support video capture".into(),
            });
        }

        // Ask for YUYV at 640x480; accept what the driver negotiates as long
        // as it is a format we can convert.
        let mut fmt = device.format().map_err(|e| {
            SourceError::FormatNegotiationFailed(format!("failed to get format: {e}"))
        })?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = 640;
        fmt.height = 480;

        let negotiated = device.set_format(&fmt).map_err(|e| {
            SourceError::FormatNegotiationFailed(format!("failed to set format: {e}"))
        })?;

        let pixel_format = if negotiated.fourcc == FourCC::new(b"YUYV") {
            PixelFormat::Yuyv
        } else if negotiated.fourcc == FourCC::new(b"MJPG") {
            PixelFormat::Mjpg
        } else {
            return Err(SourceError::FormatNegotiationFailed(format!(
                "unsupported pixel format: {:?} (need YUYV or MJPG)",
                negotiated.fourcc
            )));
        };

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fourcc = ?negotiated.fourcc,
            "negotiated format"
        );

        Ok(Self {
            device,
            stream: None,
            width: negotiated.width,
            height: negotiated.height,
            pixel_format,
        })
    }

    /// Capture a single frame, converting to BGR.
    pub fn read_frame(&mut self) -> Result<Frame, SourceError> {
        if self.stream.is_none() {
            let stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
                .map_err(|e| {
                    SourceError::CaptureFailed(format!("failed to create mmap stream: {e}"))
                })?;
            self.stream = Some(stream);
        }
        let Some(stream) = self.stream.as_mut() else {
            return Err(SourceError::CaptureFailed("stream not initialized".into()));
        };

        let (buf, _meta) = stream
            .next()
            .map_err(|e| SourceError::CaptureFailed(format!("failed to dequeue buffer: {e}")))?;

        match self.pixel_format {
            PixelFormat::Yuyv => {
                let bgr = frame::yuyv_to_bgr(buf, self.width, self.height)?;
                Ok(Frame::from_bgr(bgr, self.width, self.height)?)
            }
            PixelFormat::Mjpg => decode_jpeg_frame(buf),
        }
    }
}

/// MJPEG-over-HTTP stream, the usual IP-camera transport
/// (`multipart/x-mixed-replace` with one JPEG per part).
///
/// Rather than parsing multipart boundaries, the reader scans the byte
/// stream for JPEG start/end-of-image markers, which survives the
/// boundary-format quirks of the various camera firmwares.
pub struct MjpegHttpSource {
    response: reqwest::blocking::Response,
    jpegs: JpegStreamBuffer,
}

impl std::fmt::Debug for MjpegHttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MjpegHttpSource")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

impl MjpegHttpSource {
    pub fn open(url: &str) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            // The stream is endless; only the connect phase gets a deadline.
            .timeout(None)
            .build()?;

        let response = client.get(url).send()?;
        if !response.status().is_success() {
            return Err(SourceError::OpenFailed {
                uri: url.to_string(),
                cause: format!("HTTP status {}", response.status()),
            });
        }

        tracing::info!(url, status = %response.status(), "connected to MJPEG stream");

        Ok(Self {
            response,
            jpegs: JpegStreamBuffer::new(),
        })
    }

    pub fn read_frame(&mut self) -> Result<Frame, SourceError> {
        loop {
            if let Some(jpeg) = self.jpegs.take_next_jpeg()? {
                return decode_jpeg_frame(&jpeg);
            }

            let mut chunk = [0u8; HTTP_READ_CHUNK];
            let n = self.response.read(&mut chunk)?;
            if n == 0 {
                return Err(SourceError::EndOfStream);
            }
            self.jpegs.extend(&chunk[..n]);
        }
    }
}

/// Reassembles complete JPEGs from an arbitrarily-chunked byte stream.
struct JpegStreamBuffer {
    buf: Vec<u8>,
}

impl JpegStreamBuffer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete JPEG (SOI..EOI inclusive) from the buffer,
    /// discarding any inter-part bytes before it.
    fn take_next_jpeg(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        let Some(start) = find_marker(&self.buf, JPEG_SOI) else {
            // No image start yet. Keep the final byte: a chunk boundary may
            // split the start-of-image marker.
            if self.buf.len() > 1 {
                self.buf.drain(..self.buf.len() - 1);
            }
            return Ok(None);
        };
        if start > 0 {
            self.buf.drain(..start);
        }

        match find_marker(&self.buf[2..], JPEG_EOI) {
            Some(rel_end) => {
                let end = 2 + rel_end + JPEG_EOI.len();
                let jpeg: Vec<u8> = self.buf.drain(..end).collect();
                Ok(Some(jpeg))
            }
            None if self.buf.len() > MAX_JPEG_BYTES => Err(SourceError::CaptureFailed(
                "MJPEG stream produced no end-of-image marker".into(),
            )),
            None => Ok(None),
        }
    }
}

fn find_marker(haystack: &[u8], marker: [u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|w| w == marker)
}

fn decode_jpeg_frame(jpeg: &[u8]) -> Result<Frame, SourceError> {
    let img = image::load_from_memory_with_format(jpeg, image::ImageFormat::Jpeg)?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::from_rgb(rgb.as_raw(), width, height)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_marker() {
        let data = [0x00, 0xFF, 0xD8, 0x01];
        assert_eq!(find_marker(&data, JPEG_SOI), Some(1));
        assert_eq!(find_marker(&data, JPEG_EOI), None);
    }

    #[test]
    fn test_decode_jpeg_frame() {
        // Encode a tiny image with the same library and decode it back.
        let rgb = image::RgbImage::from_pixel(4, 2, image::Rgb([200, 100, 50]));
        let mut jpeg = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(rgb)
            .write_to(&mut jpeg, image::ImageFormat::Jpeg)
            .unwrap();

        let frame = decode_jpeg_frame(jpeg.get_ref()).unwrap();
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 2);
        assert_eq!(frame.data.len(), 4 * 2 * 3);
    }

    #[test]
    fn test_jpeg_buffer_extracts_image_after_boundary_chatter() {
        let mut buf = JpegStreamBuffer::new();
        buf.extend(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
        buf.extend(&[0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9]);
        let jpeg = buf.take_next_jpeg().unwrap().unwrap();
        assert_eq!(jpeg, vec![0xFF, 0xD8, 0x01, 0x02, 0xFF, 0xD9]);
    }

    #[test]
    fn test_jpeg_buffer_keeps_start_marker_split_across_chunks() {
        // The 0xFF of the start-of-image marker arrives at the end of one
        // chunk, the 0xD8 at the front of the next.
        let mut buf = JpegStreamBuffer::new();
        buf.extend(b"--frame\r\n\xFF");
        assert!(buf.take_next_jpeg().unwrap().is_none());

        buf.extend(&[0xD8, 0x42, 0xFF, 0xD9]);
        let jpeg = buf.take_next_jpeg().unwrap().unwrap();
        assert_eq!(jpeg, vec![0xFF, 0xD8, 0x42, 0xFF, 0xD9]);
    }

    #[test]
    fn test_jpeg_buffer_waits_for_end_marker() {
        let mut buf = JpegStreamBuffer::new();
        buf.extend(&[0xFF, 0xD8, 0x01, 0x02]);
        assert!(buf.take_next_jpeg().unwrap().is_none());
        buf.extend(&[0x03, 0xFF, 0xD9]);
        let jpeg = buf.take_next_jpeg().unwrap().unwrap();
        assert_eq!(jpeg.len(), 7);
    }

    #[test]
    fn test_jpeg_buffer_yields_consecutive_images() {
        let mut buf = JpegStreamBuffer::new();
        buf.extend(&[0xFF, 0xD8, 0x01, 0xFF, 0xD9]);
        buf.extend(b"--frame\r\n");
        buf.extend(&[0xFF, 0xD8, 0x02, 0xFF, 0xD9]);

        assert_eq!(buf.take_next_jpeg().unwrap().unwrap()[2], 0x01);
        assert_eq!(buf.take_next_jpeg().unwrap().unwrap()[2], 0x02);
        assert!(buf.take_next_jpeg().unwrap().is_none());
    }

    #[test]
    fn test_open_missing_device_fails() {
        let err = VideoSource::open("/dev/video-does-not-exist").unwrap_err();
        assert!(matches!(err, SourceError::OpenFailed { .. }));
    }
}
