//! Low-level wire-format primitives shared by decode and encode: percent
//! encoding, numeric entities, and key-path segmentation.

pub mod entities;
pub mod key_path;
pub mod percent;
