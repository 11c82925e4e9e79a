//! Frame type and pixel conversions — BGR/RGB swap, YUYV decode, downsampling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// A captured color frame, interleaved BGR (3 bytes per pixel).
///
/// BGR is the capture-side byte order; detection wants RGB, so the
/// pipeline calls [`Frame::to_rgb`] before handing pixels to the engine.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap an interleaved BGR buffer, validating its length.
    pub fn from_bgr(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = (width * height * 3) as usize;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Build a frame from an interleaved RGB buffer, swapping to BGR.
    pub fn from_rgb(rgb: &[u8], width: u32, height: u32) -> Result<Self, FrameError> {
        let expected = (width * height * 3) as usize;
        if rgb.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: rgb.len(),
            });
        }
        let mut data = Vec::with_capacity(expected);
        for px in rgb.chunks_exact(3) {
            data.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Interleaved RGB copy of this frame (the channel swap detection needs).
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(3) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        rgb
    }

    /// Bilinear downsample by `factor` (0 < factor <= 1).
    ///
    /// A factor of 1.0 returns a plain copy with no resampling.
    pub fn downsample(&self, factor: f32) -> Frame {
        if factor == 1.0 {
            return self.clone();
        }

        let src_w = self.width as usize;
        let src_h = self.height as usize;
        let new_w = ((self.width as f32 * factor).round() as usize).max(1);
        let new_h = ((self.height as f32 * factor).round() as usize).max(1);

        let inv_scale_x = src_w as f32 / new_w as f32;
        let inv_scale_y = src_h as f32 / new_h as f32;

        let mut out = vec![0u8; new_w * new_h * 3];

        for y in 0..new_h {
            let src_y = (y as f32 + 0.5) * inv_scale_y - 0.5;
            let y0 = (src_y.floor() as i32).clamp(0, src_h as i32 - 1) as usize;
            let y1 = (y0 + 1).min(src_h - 1);
            let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

            for x in 0..new_w {
                let src_x = (x as f32 + 0.5) * inv_scale_x - 0.5;
                let x0 = (src_x.floor() as i32).clamp(0, src_w as i32 - 1) as usize;
                let x1 = (x0 + 1).min(src_w - 1);
                let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

                for c in 0..3 {
                    let tl = self.data[(y0 * src_w + x0) * 3 + c] as f32;
                    let tr = self.data[(y0 * src_w + x1) * 3 + c] as f32;
                    let bl = self.data[(y1 * src_w + x0) * 3 + c] as f32;
                    let br = self.data[(y1 * src_w + x1) * 3 + c] as f32;

                    let val = tl * (1.0 - fx) * (1.0 - fy)
                        + tr * fx * (1.0 - fy)
                        + bl * (1.0 - fx) * fy
                        + br * fx * fy;

                    out[(y * new_w + x) * 3 + c] = val.round().clamp(0.0, 255.0) as u8;
                }
            }
        }

        Frame {
            data: out,
            width: new_w as u32,
            height: new_h as u32,
        }
    }
}

/// Convert packed YUYV (4:2:2) to interleaved BGR using BT.601 coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V], chroma shared by the
/// pixel pair.
pub fn yuyv_to_bgr(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let expected = (width * height * 2) as usize;
    if yuyv.len() < expected {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut bgr = Vec::with_capacity((width * height * 3) as usize);

    for quad in yuyv[..expected].chunks_exact(4) {
        let u = quad[1] as i32 - 128;
        let v = quad[3] as i32 - 128;
        for &y in &[quad[0], quad[2]] {
            let c = 298 * (y as i32 - 16);
            let b = (c + 516 * u + 128) >> 8;
            let g = (c - 100 * u - 208 * v + 128) >> 8;
            let r = (c + 409 * v + 128) >> 8;
            bgr.push(b.clamp(0, 255) as u8);
            bgr.push(g.clamp(0, 255) as u8);
            bgr.push(r.clamp(0, 255) as u8);
        }
    }

    Ok(bgr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(w: u32, h: u32, value: u8) -> Frame {
        Frame::from_bgr(vec![value; (w * h * 3) as usize], w, h).unwrap()
    }

    #[test]
    fn test_from_bgr_rejects_wrong_length() {
        assert!(Frame::from_bgr(vec![0u8; 5], 2, 1).is_err());
    }

    #[test]
    fn test_rgb_roundtrip_swaps_channels() {
        // One pixel: R=1, G=2, B=3
        let frame = Frame::from_rgb(&[1, 2, 3], 1, 1).unwrap();
        assert_eq!(frame.data, vec![3, 2, 1]); // stored as BGR
        assert_eq!(frame.to_rgb(), vec![1, 2, 3]);
    }

    #[test]
    fn test_downsample_identity_factor() {
        let frame = gray_frame(8, 8, 77);
        let out = frame.downsample(1.0);
        assert_eq!(out.width, 8);
        assert_eq!(out.data, frame.data);
    }

    #[test]
    fn test_downsample_half_dimensions() {
        let frame = gray_frame(64, 32, 100);
        let out = frame.downsample(0.5);
        assert_eq!(out.width, 32);
        assert_eq!(out.height, 16);
        // Uniform input stays uniform through bilinear sampling
        assert!(out.data.iter().all(|&p| p == 100));
    }

    #[test]
    fn test_yuyv_to_bgr_white_and_black() {
        // Two pixels: Y=235 (white), Y=16 (black), neutral chroma
        let yuyv = vec![235, 128, 16, 128];
        let bgr = yuyv_to_bgr(&yuyv, 2, 1).unwrap();
        assert_eq!(bgr.len(), 6);
        // White pixel ≈ 255 on all channels
        assert!(bgr[0] > 250 && bgr[1] > 250 && bgr[2] > 250, "white: {bgr:?}");
        // Black pixel ≈ 0 on all channels
        assert!(bgr[3] < 5 && bgr[4] < 5 && bgr[5] < 5, "black: {bgr:?}");
    }

    #[test]
    fn test_yuyv_to_bgr_rejects_short_buffer() {
        assert!(yuyv_to_bgr(&[235, 128], 2, 1).is_err());
    }
}
