/// Structuring element geometry. The anchor is always the center cell
/// `(width / 2, height / 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    /// Every cell of the `width x height` box.
    Box {
        /// Columns.
        width: usize,
        /// Rows.
        height: usize,
    },

    /// The center row and the center column.
    Cross {
        /// Columns.
        width: usize,
        /// Rows.
        height: usize,
    },

    /// The ellipse inscribed in the box.
    Ellipse {
        /// Columns.
        width: usize,
        /// Rows.
        height: usize,
    },
}

/// A binary structuring element, stored row major with one byte per cell.
///
/// ```
/// use cvpipe_imgproc::morphology::{Kernel, KernelShape};
///
/// let plus = Kernel::new(KernelShape::Cross { width: 3, height: 3 });
/// assert_eq!(plus.offsets().len(), 5);
/// assert_eq!(plus.pad(), (1, 1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Kernel {
    /// Rasterize `shape`.
    pub fn new(shape: KernelShape) -> Self {
        match shape {
            KernelShape::Box { width, height } => box_kernel(width, height),
            KernelShape::Cross { width, height } => cross_kernel(width, height),
            KernelShape::Ellipse { width, height } => ellipse_kernel(width, height),
        }
    }

    fn from_fn(width: usize, height: usize, inside: impl Fn(usize, usize) -> bool) -> Self {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| u8::from(inside(x, y)))
            .collect();

        Kernel {
            data,
            width,
            height,
        }
    }

    /// The mask, 1 for active cells.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance from the top left cell to the anchor, as (rows, cols).
    pub fn pad(&self) -> (usize, usize) {
        (self.height / 2, self.width / 2)
    }

    /// Active cells as `(dx, dy)` relative to the anchor, in row major order.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let (ay, ax) = self.pad();
        self.data
            .iter()
            .enumerate()
            .filter(|(_, on)| **on == 1)
            .map(|(i, _)| {
                let (x, y) = (i % self.width, i / self.width);
                (x as isize - ax as isize, y as isize - ay as isize)
            })
            .collect()
    }
}

/// All cells active.
pub fn box_kernel(width: usize, height: usize) -> Kernel {
    Kernel::from_fn(width, height, |_, _| true)
}

/// The center row and column active.
pub fn cross_kernel(width: usize, height: usize) -> Kernel {
    let (cx, cy) = (width / 2, height / 2);
    Kernel::from_fn(width, height, |x, y| x == cx || y == cy)
}

/// Each row holds the chord of the ellipse with semi axes `(width / 2, height / 2)`,
/// rounded to whole cells and centered on the middle column.
pub fn ellipse_kernel(width: usize, height: usize) -> Kernel {
    let (a, b) = ((width / 2) as f32, (height / 2) as isize);

    Kernel::from_fn(width, height, |x, y| {
        let dy = y as isize - b;
        if dy.abs() > b {
            return false;
        }
        let t = if b > 0 {
            1.0 - (dy * dy) as f32 / (b * b) as f32
        } else {
            1.0
        };
        let half = (a * t.sqrt()).round() as isize;
        (x as isize - a as isize).abs() <= half
    })
}
