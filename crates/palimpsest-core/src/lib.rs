//! Palimpsest Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Palimpsest
//! overlay compositor. It includes:
//!
//! - **Identifiers**: String-interned cell identifiers ([`identifier::CellId`])
//! - **Geometry**: Points, sizes and bounding boxes ([`geometry`] module)
//! - **Elements**: Owned markup fragments ([`element::Element`])
//! - **Tree**: Arena representation of a rendered diagram ([`tree::DiagramTree`])
//! - **Selectors**: The CSS subset used to address content mounts ([`selector`] module)
//! - **Markup**: Reading and writing SVG documents ([`markup`] module)

pub mod element;
pub mod geometry;
pub mod identifier;
pub mod markup;
pub mod selector;
pub mod tree;
