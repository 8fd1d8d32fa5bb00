//! Bedload transport in a one-dimensional flume.
//!
//! Equal grains rest on a fixed bed. Each iteration some of them are
//! entrained, hop downstream to the nearest free vertex and settle again,
//! while every subregion counts the grains crossing its downstream boundary.
//!
//! | Module            | Contents                                            |
//! |-------------------|-----------------------------------------------------|
//! | [`particle`]      | `Particle`, `ParticleId`, `SupportPair`, `ParticleTable` |
//! | [`subregion`]     | `Subregion`, `define_subregions`                    |
//! | [`bed`]           | `build_streambed`                                   |
//! | [`support`]       | support search and placement                        |
//! | [`vertex`]        | `VertexCatalog`                                     |
//! | [`initializer`]   | initial model particle seeding                      |
//! | [`entrainment`]   | per-iteration particle selection                    |
//! | [`hop`]           | hop distributions and desired positions             |
//! | [`transport`]     | target resolution and collision repair              |
//! | [`state`]         | active flags, ages, flux                            |
//! | [`simulation`]    | `Simulation` driver                                 |

pub mod bed;
pub mod entrainment;
pub mod error;
pub mod hop;
pub mod initializer;
pub mod particle;
pub mod simulation;
pub mod state;
pub mod subregion;
pub mod support;
pub mod transport;
pub mod vertex;


pub use error::{Side, SimError, SimResult};
pub use particle::{Particle, ParticleId, ParticleTable, SupportPair};
pub use simulation::{IterationReport, Simulation};
pub use subregion::{define_subregions, Subregion};
pub use transport::{find_closest_vertex, HopTarget};
pub use vertex::VertexCatalog;
