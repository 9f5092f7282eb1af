use crate::grid::Grid;
use crate::laplacian::laplacian;
use crate::params::SimulationParams;

/// Advances both fields by one forward Euler step of the Gray-Scott system.
///
/// The whole next state is written to the scratch buffers before the swap, so
/// no cell ever reads a neighbour that was already updated in this step.
#[allow(clippy::many_single_char_names)]
pub fn simulate(grid: &mut Grid, params: &SimulationParams) {
    let (width, height) = (grid.width(), grid.height());
    let (da, db) = (params.diffusion_a, params.diffusion_b);
    let f = params.feed;
    let k = params.kill;
    let dt = params.dt;

    let (cur_a, cur_b, next_a, next_b) = grid.split_mut();

    for (i, (na, nb)) in next_a.iter_mut().zip(next_b.iter_mut()).enumerate() {
        let (x, y) = (i % width, i / width);

        let a = cur_a[i];
        let b = cur_b[i];

        let lap_a = laplacian(cur_a, width, height, x, y);
        let lap_b = laplacian(cur_b, width, height, x, y);

        let reaction = a * b * b;

        *na = (a + (da * lap_a - reaction + f * (1.0 - a)) * dt).clamp(0.0, 1.0);
        *nb = (b + (db * lap_b + reaction - (k + f) * b) * dt).clamp(0.0, 1.0);
    }

    grid.swap();
}

pub fn simulate_n(grid: &mut Grid, params: &SimulationParams, iterations: usize) {
    for _ in 0..iterations {
        simulate(grid, params);
    }
}
