pub mod app;
pub mod config;
pub mod filter;
pub mod graph;
pub mod ingest;
pub mod layout;
pub mod stats;

pub use graph::{Edge, Node, NodeKind, RawGraph, Relation};
pub use layout::{compute, Layout, LayoutResult};
