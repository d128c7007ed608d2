/// Shapes of morphological `Kernels`.
///
/// All kernels are centered at their geometric center.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelShape {
    /// A square box structuring element.
    Box {
        /// The side length of the square kernel (size x size).
        size: usize,
    },

    /// A cross (plus) shaped structuring element.
    ///
    /// Only pixels along the horizontal and vertical center lines are included.
    Cross {
        /// The side length of the square cross kernel (size x size).
        size: usize,
    },

    /// A digital disk: every offset `(dy, dx)` with `dx^2 + dy^2 <= radius^2`.
    ///
    /// Fractional radii are allowed, e.g. `sqrt(5)` gives the 5x5 square
    /// without its corners.
    Disk {
        /// The radius of the disk in pixels.
        radius: f32,
    },
}

/// A morphological structuring element.
///
/// The kernel stores a binary mask where 1 indicates pixels included in the
/// operation and 0 indicates excluded pixels.
///
/// # Example
///
/// ```rust
/// use rhizo_imgproc::morphology::{Kernel, KernelShape};
///
/// let kernel = Kernel::new(KernelShape::Disk { radius: 1.0 });
/// assert_eq!(kernel.width(), 3);
/// assert_eq!(kernel.pad(), (1, 1));
/// assert_eq!(kernel.data(), &[0, 1, 0, 1, 1, 1, 0, 1, 0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Kernel {
    /// Create a morphological kernel from a shape.
    pub fn new(shape: KernelShape) -> Self {
        match shape {
            KernelShape::Box { size } => box_kernel(size),
            KernelShape::Cross { size } => cross_kernel(size),
            KernelShape::Disk { radius } => disk_kernel(radius),
        }
    }

    /// Get a reference to the kernel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the width of the kernel.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get the height of the kernel.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the padding for the kernel (offset from center).
    pub fn pad(&self) -> (usize, usize) {
        (self.height / 2, self.width / 2)
    }

    /// Number of active elements.
    pub fn num_active(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Offsets `(dy, dx)` of the active elements relative to the center.
    pub fn offsets(&self) -> Vec<(isize, isize)> {
        let (py, px) = self.pad();
        self.data
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0)
            .map(|(i, _)| {
                (
                    (i / self.width) as isize - py as isize,
                    (i % self.width) as isize - px as isize,
                )
            })
            .collect()
    }
}

/// Create a box structuring element.
pub fn box_kernel(size: usize) -> Kernel {
    Kernel {
        data: vec![1u8; size * size],
        width: size,
        height: size,
    }
}

/// Create a cross structuring element.
pub fn cross_kernel(size: usize) -> Kernel {
    let mut data = vec![0u8; size * size];
    let mid = size / 2;
    for i in 0..size {
        data[mid * size + i] = 1;
        data[i * size + mid] = 1;
    }
    Kernel {
        data,
        width: size,
        height: size,
    }
}

/// Create a disk structuring element.
pub fn disk_kernel(radius: f32) -> Kernel {
    let radius = radius.max(0.0) as f64;
    let half = radius.floor() as isize;
    let size = (2 * half + 1) as usize;
    // tolerance for radii given as rounded square roots
    let r2 = radius * radius + 1e-6;

    let mut data = vec![0u8; size * size];
    for dy in -half..=half {
        for dx in -half..=half {
            if ((dx * dx + dy * dy) as f64) <= r2 {
                data[((dy + half) as usize) * size + (dx + half) as usize] = 1;
            }
        }
    }

    Kernel {
        data,
        width: size,
        height: size,
    }
}
