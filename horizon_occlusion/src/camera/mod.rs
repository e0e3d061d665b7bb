//! Camera module: the viewpoint handed to the cull traversal.
//!
//! Passive data container. The caller owns and drives cameras; the
//! occlusion system only reads them for one traversal.

mod camera;

pub use camera::{Camera, CameraRole};
