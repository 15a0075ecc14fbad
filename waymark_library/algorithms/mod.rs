//! Pure computational algorithms for planning and estimation
//!
//! Nothing in here performs I/O. Planners log through `tracing`; everything
//! else is plain computation over owned values.
//!
//! # Available Algorithms
//!
//! ## Motion Planning
//! - **dstar_lite**: D* Lite incremental replanning on 4-connected grids
//! - **astar**: A* from-scratch search, 4- or 8-connected
//! - **grid**: shared grid coordinates, neighbor order and occupancy
//!
//! ## Linear Algebra
//! - **matrix**: immutable dense matrices with inverse, LU solve,
//!   Cholesky, symmetric eigendecomposition and SVD

pub mod astar;
pub mod dstar_lite;
pub mod grid;
pub mod matrix;
