use std::fmt;

/// Logical width in low resolution mode.
pub const LOW_WIDTH: usize = 64;
/// Logical height in low resolution mode.
pub const LOW_HEIGHT: usize = 32;
/// Width of the physical pixel grid, equal to the high resolution width.
pub const WIDTH: usize = 128;
/// Height of the physical pixel grid, equal to the high resolution height.
pub const HEIGHT: usize = 64;

/// The display mode, toggled by `00FE`/`00FF`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resolution {
    /// 64x32, every logical pixel is a 2x2 block of physical pixels.
    #[default]
    Low,
    /// 128x64, logical and physical pixels are the same.
    High,
}

impl Resolution {
    /// Logical width of the screen.
    pub const fn width(self) -> usize {
        WIDTH / self.scale()
    }

    /// Logical height of the screen.
    pub const fn height(self) -> usize {
        HEIGHT / self.scale()
    }

    /// Physical pixels per logical pixel along each axis.
    pub const fn scale(self) -> usize {
        match self {
            Resolution::Low => 2,
            Resolution::High => 1,
        }
    }

    /// Map a logical coordinate to the top left corner of its physical block.
    #[inline]
    pub const fn to_physical(self, x: usize, y: usize) -> (usize, usize) {
        (x * self.scale(), y * self.scale())
    }
}

type Grid = [[bool; WIDTH]; HEIGHT];

/// The video memory of the `Chip8`.
///
/// The backing grid is always allocated at the high resolution size, so
/// switching modes never reallocates. All access goes through the
/// resolution aware accessors.
#[derive(Clone, PartialEq, Eq)]
pub struct VideoMemory {
    pixels: Box<Grid>,
}

impl Default for VideoMemory {
    fn default() -> Self {
        Self {
            pixels: Box::new([[false; WIDTH]; HEIGHT]),
        }
    }
}

impl VideoMemory {
    /// Create a new blank `VideoMemory`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the logical pixel at (`x`, `y`).
    ///
    /// In low resolution the pixel is only on if its whole 2x2 block is on.
    pub fn get(&self, x: usize, y: usize, resolution: Resolution) -> bool {
        let (px, py) = resolution.to_physical(x, y);
        let scale = resolution.scale();
        (py..py + scale).all(|row| self.pixels[row][px..px + scale].iter().all(|&p| p))
    }

    /// Set the logical pixel at (`x`, `y`), writing its whole physical block.
    pub fn set(&mut self, x: usize, y: usize, value: bool, resolution: Resolution) {
        let (px, py) = resolution.to_physical(x, y);
        let scale = resolution.scale();
        for row in &mut self.pixels[py..py + scale] {
            row[px..px + scale].fill(value);
        }
    }

    /// Read a whole logical row.
    pub fn get_row(&self, y: usize, resolution: Resolution) -> Vec<bool> {
        (0..resolution.width())
            .map(|x| self.get(x, y, resolution))
            .collect()
    }

    /// Write a whole logical row. Missing trailing pixels are cleared.
    pub fn set_row(&mut self, y: usize, row: &[bool], resolution: Resolution) {
        for x in 0..resolution.width() {
            self.set(x, y, row.get(x).copied().unwrap_or(false), resolution);
        }
    }

    /// Clear every physical pixel.
    pub fn clear(&mut self) {
        for row in self.pixels.iter_mut() {
            row.fill(false);
        }
    }

    /// Scroll the content down by `n` logical rows, blanking the top.
    pub fn scroll_down(&mut self, n: usize, resolution: Resolution) {
        let blank = vec![false; resolution.width()];
        for y in (0..resolution.height()).rev() {
            let row = if y >= n {
                self.get_row(y - n, resolution)
            } else {
                blank.clone()
            };
            self.set_row(y, &row, resolution);
        }
    }

    /// Scroll the content right by `n` logical columns, blanking the left.
    pub fn scroll_right(&mut self, n: usize, resolution: Resolution) {
        let width = resolution.width();
        for y in 0..resolution.height() {
            let row = self.get_row(y, resolution);
            let shifted: Vec<bool> = (0..width).map(|x| x >= n && row[x - n]).collect();
            self.set_row(y, &shifted, resolution);
        }
    }

    /// Scroll the content left by `n` logical columns, blanking the right.
    pub fn scroll_left(&mut self, n: usize, resolution: Resolution) {
        let width = resolution.width();
        for y in 0..resolution.height() {
            let row = self.get_row(y, resolution);
            let shifted: Vec<bool> = (0..width).map(|x| x + n < width && row[x + n]).collect();
            self.set_row(y, &shifted, resolution);
        }
    }

    /// Take a snapshot of the screen as seen in `resolution`.
    pub fn snapshot(&self, resolution: Resolution) -> Frame {
        Frame {
            resolution,
            pixels: self.pixels.clone(),
        }
    }
}

impl fmt::Debug for VideoMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.snapshot(Resolution::High).to_ascii())
    }
}

/// An immutable copy of the video memory handed out to observers.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    resolution: Resolution,
    pixels: Box<Grid>,
}

impl Default for Frame {
    fn default() -> Self {
        VideoMemory::default().snapshot(Resolution::Low)
    }
}

impl Frame {
    /// The resolution the frame was captured in.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Logical width of the frame.
    pub fn width(&self) -> usize {
        self.resolution.width()
    }

    /// Logical height of the frame.
    pub fn height(&self) -> usize {
        self.resolution.height()
    }

    /// Get the logical pixel at (`x`, `y`) in the frame's resolution.
    pub fn get(&self, x: usize, y: usize) -> bool {
        let (px, py) = self.resolution.to_physical(x, y);
        let scale = self.resolution.scale();
        (py..py + scale).all(|row| self.pixels[row][px..px + scale].iter().all(|&p| p))
    }

    /// The fixed 64x32 view of the frame, regardless of resolution.
    pub fn low_res(&self) -> [[bool; LOW_WIDTH]; LOW_HEIGHT] {
        let mut out = [[false; LOW_WIDTH]; LOW_HEIGHT];
        for (y, row) in out.iter_mut().enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                let (px, py) = Resolution::Low.to_physical(x, y);
                *pixel = self.pixels[py][px]
                    && self.pixels[py][px + 1]
                    && self.pixels[py + 1][px]
                    && self.pixels[py + 1][px + 1];
            }
        }
        out
    }

    /// Number of logical pixels that are on.
    pub fn lit_pixels(&self) -> usize {
        (0..self.height())
            .map(|y| (0..self.width()).filter(|&x| self.get(x, y)).count())
            .sum()
    }

    /// Render the frame as text, `#` for on and `.` for off, one line per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width() + 1) * self.height());
        for y in 0..self.height() {
            for x in 0..self.width() {
                out.push(if self.get(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_mapping() {
        assert_eq!(Resolution::Low.to_physical(3, 5), (6, 10));
        assert_eq!(Resolution::High.to_physical(3, 5), (3, 5));
        assert_eq!(Resolution::Low.width(), 64);
        assert_eq!(Resolution::Low.height(), 32);
        assert_eq!(Resolution::High.width(), 128);
        assert_eq!(Resolution::High.height(), 64);
    }

    #[test]
    fn test_low_res_set_fills_block() {
        let mut video = VideoMemory::new();
        video.set(1, 1, true, Resolution::Low);
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            assert!(video.get(x, y, Resolution::High));
        }
        assert!(!video.get(1, 1, Resolution::High));
        assert!(!video.get(4, 2, Resolution::High));
        assert!(video.get(1, 1, Resolution::Low));
    }

    #[test]
    fn test_low_res_get_needs_full_block() {
        let mut video = VideoMemory::new();
        video.set(2, 2, true, Resolution::High);
        assert!(!video.get(1, 1, Resolution::Low));
        video.set(3, 2, true, Resolution::High);
        video.set(2, 3, true, Resolution::High);
        video.set(3, 3, true, Resolution::High);
        assert!(video.get(1, 1, Resolution::Low));
    }

    #[test]
    fn test_clear() {
        let mut video = VideoMemory::new();
        video.set(10, 10, true, Resolution::High);
        video.set(10, 10, true, Resolution::Low);
        video.clear();
        assert_eq!(video, VideoMemory::new());
    }

    #[test]
    fn test_rows_symmetric_in_both_resolutions() {
        for resolution in [Resolution::Low, Resolution::High] {
            let mut video = VideoMemory::new();
            let mut row = vec![false; resolution.width()];
            row[0] = true;
            row[5] = true;
            video.set_row(3, &row, resolution);
            assert_eq!(video.get_row(3, resolution), row);
            assert_eq!(video.get_row(4, resolution), vec![false; resolution.width()]);
        }
    }

    #[test]
    fn test_scroll_down() {
        let mut video = VideoMemory::new();
        video.set(5, 0, true, Resolution::High);
        video.set(5, 63, true, Resolution::High);
        video.scroll_down(4, Resolution::High);
        assert!(!video.get(5, 0, Resolution::High));
        assert!(video.get(5, 4, Resolution::High));
        // the bottom row scrolled off the screen
        assert_eq!(video.snapshot(Resolution::High).lit_pixels(), 1);
    }

    #[test]
    fn test_scroll_down_low_res_moves_logical_rows() {
        let mut video = VideoMemory::new();
        video.set(0, 0, true, Resolution::Low);
        video.scroll_down(2, Resolution::Low);
        assert!(!video.get(0, 0, Resolution::Low));
        assert!(video.get(0, 2, Resolution::Low));
    }

    #[test]
    fn test_scroll_left_and_right() {
        let mut video = VideoMemory::new();
        video.set(0, 0, true, Resolution::High);
        video.set(127, 1, true, Resolution::High);
        video.scroll_right(4, Resolution::High);
        assert!(video.get(4, 0, Resolution::High));
        assert!(!video.get(0, 0, Resolution::High));
        assert!(!video.get(127, 1, Resolution::High));

        video.scroll_left(4, Resolution::High);
        assert!(video.get(0, 0, Resolution::High));
        assert_eq!(video.snapshot(Resolution::High).lit_pixels(), 1);
    }

    #[test]
    fn test_frame_views() {
        let mut video = VideoMemory::new();
        video.set(63, 31, true, Resolution::Low);
        let frame = video.snapshot(Resolution::Low);
        assert_eq!(frame.width(), 64);
        assert!(frame.get(63, 31));
        assert!(frame.low_res()[31][63]);
        assert_eq!(frame.lit_pixels(), 1);

        let ascii = frame.to_ascii();
        assert_eq!(ascii.lines().count(), 32);
        assert!(ascii.lines().last().unwrap().ends_with('#'));

        let high = video.snapshot(Resolution::High);
        assert_eq!(high.lit_pixels(), 4);
        assert!(high.low_res()[31][63]);
    }
}
