//! Gray-Scott reaction-diffusion on a toroidal grid, rendered through neon
//! color gradients and driven by audio.
//!
//! ```
//! use turing_rave::{Config, Simulation};
//!
//! let config = Config {
//!     width: 64,
//!     height: 64,
//!     display_width: 128,
//!     display_height: 128,
//!     seed: Some(7),
//!     ..Config::default()
//! };
//!
//! let mut sim = Simulation::new(&config).unwrap();
//! for _ in 0..10 {
//!     sim.frame();
//! }
//! assert_eq!(sim.renderer().display().dimensions(), (128, 128));
//! ```

pub mod audio;
pub mod color;
pub mod config;
pub mod disturb;
pub mod error;
pub mod f32range;
pub mod grid;
pub mod integrator;
pub mod laplacian;
pub mod params;
pub mod render;
pub mod sim;

pub use config::Config;
pub use error::{AudioError, Error, Result};
pub use f32range::F32Range;
pub use grid::{Cell, Grid};
pub use integrator::simulate;
pub use params::SimulationParams;
pub use sim::Simulation;
