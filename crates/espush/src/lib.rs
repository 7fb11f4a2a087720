//! Top-level facade crate for espush.
//!
//! Re-exports the core instrument vectors and the exporter so users can depend on a single crate.

pub mod core {
    pub use espush_core::*;
}

pub mod exporter {
    pub use espush_exporter::*;
}
