//! Display window via minifb — annotated-frame preview and quit polling.

use crate::frame::Frame;
use minifb::{Key, Window, WindowOptions};
use thiserror::Error;

const TARGET_FPS: usize = 60;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("window: {0}")]
    Window(String),
    #[error("frame size {got_width}x{got_height} does not match window {width}x{height}")]
    FrameSizeMismatch {
        width: usize,
        height: usize,
        got_width: u32,
        got_height: u32,
    },
}

/// A preview window sized to the video frames it shows.
pub struct Display {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl Display {
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, DisplayError> {
        let (width, height) = (width as usize, height as usize);
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| DisplayError::Window(e.to_string()))?;
        window.set_target_fps(TARGET_FPS);

        Ok(Self {
            window,
            buffer: vec![0u32; width * height],
            width,
            height,
        })
    }

    /// Present a BGR frame.
    pub fn show(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if frame.width as usize != self.width || frame.height as usize != self.height {
            return Err(DisplayError::FrameSizeMismatch {
                width: self.width,
                height: self.height,
                got_width: frame.width,
                got_height: frame.height,
            });
        }

        for (dst, px) in self.buffer.iter_mut().zip(frame.data.chunks_exact(3)) {
            let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
            *dst = (r << 16) | (g << 8) | b;
        }

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| DisplayError::Window(e.to_string()))
    }

    /// True once the user closed the window or pressed 'q'.
    pub fn quit_requested(&self) -> bool {
        !self.window.is_open() || self.window.is_key_down(Key::Q)
    }
}
