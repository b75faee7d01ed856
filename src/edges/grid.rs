//! Flat three-channel float grid.
//!
//! Every float buffer in the pipeline (`gx`, `gy`, magnitude, the rescaled
//! map) is a [`ChannelGrid`]: row-major, `height × width × 3` values, with the
//! channel index varying fastest. Stages work on whole slices; the per-cell
//! accessors below exist for tests.

/// Channels per cell (red, green, blue).
pub const CHANNELS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGrid {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ChannelGrid {
    /// Zero-initialized grid of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height * CHANNELS],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }
}

#[cfg(test)]
impl ChannelGrid {
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) * CHANNELS)
    }

    /// The three channel values at `(x, y)`, or `None` outside the grid.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[f32; CHANNELS]> {
        let i = self.offset(x, y)?;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// Single channel value at `(x, y, c)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize, c: usize) -> Option<f32> {
        if c >= CHANNELS {
            return None;
        }
        self.offset(x, y).map(|i| self.data[i + c])
    }

    /// Overwrite the channels at `(x, y)`. Returns `false` outside the grid.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: [f32; CHANNELS]) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.data[i..i + CHANNELS].copy_from_slice(&value);
                true
            }
            None => false,
        }
    }
}
