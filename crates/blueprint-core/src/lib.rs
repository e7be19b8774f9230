//! Blueprint Core Types and Definitions
//!
//! This crate provides the foundational types for the Blueprint diagram
//! editor core. It includes:
//!
//! - **Geometry**: Positions, sizes, bounds, and grid snapping ([`geometry`] module)
//! - **Type references**: VLNV identifiers used to resolve components from a
//!   library ([`vlnv::Vlnv`])
//! - **Design documents**: The persisted shape of a diagram — instances,
//!   hierarchical interfaces, connections, and columns ([`design`] module)

pub mod design;
pub mod geometry;
pub mod vlnv;
