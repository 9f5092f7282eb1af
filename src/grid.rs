use rand::Rng;

// chemical A, chemical B
pub type Cell = (f32, f32);

/// Substrate only, nothing can react here.
pub const DEAD: Cell = (1.0, 0.0);

/// Catalyst dropped in, the state every seed and disturbance writes.
pub const SEED: Cell = (0.0, 1.0);

const CENTER_SEED_HALF_WIDTH: usize = 10;
const RANDOM_SEEDS: usize = 5;

/// Two concentration fields over a toroidal grid, double buffered so that a
/// step only ever reads the values of the previous step.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,

    a: Vec<f32>,
    b: Vec<f32>,
    next_a: Vec<f32>,
    next_b: Vec<f32>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;

        Grid {
            width,
            height,
            a: vec![DEAD.0; size],
            b: vec![DEAD.1; size],
            next_a: vec![DEAD.0; size],
            next_b: vec![DEAD.1; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn index(&self, (x, y): (usize, usize)) -> usize {
        y * self.width + x
    }

    pub fn get(&self, pos: (usize, usize)) -> Cell {
        let i = self.index(pos);
        (self.a[i], self.b[i])
    }

    pub fn set(&mut self, pos: (usize, usize), (a, b): Cell) {
        let i = self.index(pos);
        self.a[i] = a;
        self.b[i] = b;
    }

    pub fn a(&self) -> &[f32] {
        &self.a
    }

    pub fn b(&self) -> &[f32] {
        &self.b
    }

    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), Cell)> + '_ {
        self.a.iter().zip(&self.b).enumerate().map(move |(i, (a, b))| {
            let x = i % self.width;
            let y = i / self.width;

            ((x, y), (*a, *b))
        })
    }

    /// Fills every cell with `cell`.
    pub fn fill(&mut self, (a, b): Cell) {
        self.a.fill(a);
        self.b.fill(b);
    }

    /// Back to the dead state plus a centered seed and a handful of random
    /// ones, without them nothing ever grows.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        self.fill(DEAD);

        let cx = self.width / 2;
        let cy = self.height / 2;
        self.seed_square(cx, cy, CENTER_SEED_HALF_WIDTH);

        for _ in 0..RANDOM_SEEDS {
            let (sx, sy, half_width) = self.random_seed(rng);
            self.seed_square(sx, sy, half_width);
        }
    }

    /// Center and half-width of a random seed patch: the center lies in the
    /// middle 60% of each axis, the half-width in `3..=7`.
    fn random_seed<R: Rng>(&self, rng: &mut R) -> (usize, usize, usize) {
        let (w, h) = (self.width as f32, self.height as f32);

        let sx = (w * 0.2 + rng.gen::<f32>() * w * 0.6) as usize;
        let sy = (h * 0.2 + rng.gen::<f32>() * h * 0.6) as usize;
        let half_width = rng.gen_range(3..8);

        (sx, sy, half_width)
    }

    /// Seeds the square `[cx - hw, cx + hw] x [cy - hw, cy + hw]`, clipped at
    /// the grid edges.
    pub fn seed_square(&mut self, cx: usize, cy: usize, half_width: usize) {
        let x0 = cx.saturating_sub(half_width);
        let y0 = cy.saturating_sub(half_width);
        let x1 = (cx + half_width).min(self.width.saturating_sub(1));
        let y1 = (cy + half_width).min(self.height.saturating_sub(1));

        for y in y0..=y1 {
            for x in x0..=x1 {
                self.set((x, y), SEED);
            }
        }
    }

    /// The current fields together with the scratch fields to write the next
    /// step into.
    pub(crate) fn split_mut(&mut self) -> (&[f32], &[f32], &mut [f32], &mut [f32]) {
        (&self.a, &self.b, &mut self.next_a, &mut self.next_b)
    }

    /// Makes the scratch fields current, O(1).
    pub(crate) fn swap(&mut self) {
        std::mem::swap(&mut self.a, &mut self.next_a);
        std::mem::swap(&mut self.b, &mut self.next_b);
    }
}
