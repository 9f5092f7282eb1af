use crate::grid::{Cell, Grid, DEAD, SEED};

/// The two "chemicals" the brush can paint. They are seed presets rather than
/// concentrations: `A` drops catalyst in, `B` wipes back to substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chemical {
    A,
    B,
}

impl Chemical {
    pub fn cell(self) -> Cell {
        match self {
            Chemical::A => SEED,
            Chemical::B => DEAD,
        }
    }
}

impl std::str::FromStr for Chemical {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Chemical::A),
            "B" | "b" => Ok(Chemical::B),
            other => Err(format!("unknown chemical {:?}, expected A or B", other)),
        }
    }
}

pub fn brush_radius(brush_size: f32, scale_x: f32) -> i64 {
    ((brush_size * scale_x / 4.0).floor() as i64).max(2)
}

/// Maps a pointer position on the display to a grid cell together with the
/// horizontal display to grid scale.
pub fn pointer_to_grid(
    (px, py): (f32, f32),
    (display_width, display_height): (f32, f32),
    grid: &Grid,
) -> ((i64, i64), f32) {
    let scale_x = grid.width() as f32 / display_width;
    let scale_y = grid.height() as f32 / display_height;

    let gx = (px * scale_x).floor() as i64;
    let gy = (py * scale_y).floor() as i64;

    ((gx, gy), scale_x)
}

/// Writes `cell` on the disc of `radius` around `(cx, cy)`; the disc wraps
/// around the edges just like the diffusion does.
///
/// A disc of radius `max(width, height)` already covers the whole torus, so
/// larger radii are capped there.
pub fn paint(grid: &mut Grid, (cx, cy): (i64, i64), radius: i64, cell: Cell) {
    let w = grid.width() as i64;
    let h = grid.height() as i64;
    let radius = radius.min(w.max(h));

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }

            let x = (cx + dx).rem_euclid(w) as usize;
            let y = (cy + dy).rem_euclid(h) as usize;
            grid.set((x, y), cell);
        }
    }
}

pub fn disturb_at_pointer(
    grid: &mut Grid,
    pointer: (f32, f32),
    display_size: (f32, f32),
    brush_size: f32,
    chemical: Chemical,
) {
    let (center, scale_x) = pointer_to_grid(pointer, display_size, grid);
    let radius = brush_radius(brush_size, scale_x);

    log::trace!("disturbance at {:?} r={} {:?}", center, radius, chemical);
    paint(grid, center, radius, chemical.cell());
}
