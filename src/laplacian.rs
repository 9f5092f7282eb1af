pub const ADJACENT_WEIGHT: f32 = 0.2;
pub const DIAGONAL_WEIGHT: f32 = 0.05;

#[rustfmt::skip]
pub const KERNEL: [f32; 9] = [
    DIAGONAL_WEIGHT, ADJACENT_WEIGHT, DIAGONAL_WEIGHT,
    ADJACENT_WEIGHT, -1.00,           ADJACENT_WEIGHT,
    DIAGONAL_WEIGHT, ADJACENT_WEIGHT, DIAGONAL_WEIGHT,
];

/// Discrete 9-point Laplacian of `field` at `(x, y)`. The grid is a torus:
/// neighbours past an edge come from the opposite one.
pub fn laplacian(field: &[f32], width: usize, height: usize, x: usize, y: usize) -> f32 {
    let lx = if x == 0 { width - 1 } else { x - 1 };
    let rx = (x + 1) % width;

    let ty = if y == 0 { height - 1 } else { y - 1 };
    let by = (y + 1) % height;

    let at = |xx: usize, yy: usize| field[yy * width + xx];

    let adjacent = at(x, ty) + at(x, by) + at(lx, y) + at(rx, y);
    let diagonals = at(lx, ty) + at(rx, ty) + at(lx, by) + at(rx, by);

    adjacent * ADJACENT_WEIGHT + diagonals * DIAGONAL_WEIGHT - at(x, y)
}
