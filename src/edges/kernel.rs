//! The Sobel kernel pair.

/// A 3×3 integer convolution kernel, indexed `[row][column]`.
pub type Kernel3 = [[i32; 3]; 3];

/// Responds to horizontal intensity change (vertical edges).
pub const SOBEL_X: Kernel3 = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Responds to vertical intensity change (horizontal edges).
pub const SOBEL_Y: Kernel3 = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];
