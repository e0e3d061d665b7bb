/*!
# Horizon Occlusion

CPU-side occlusion culling for large streamed scenes.

Each frame a small software depth buffer is filled with cheap conservative
occluders (coarse terrain, simplified buildings) and candidate objects are
tested against it before they reach the renderer. Occlusion never hides
something visible: every degenerate case answers "visible".

## Architecture

- **OcclusionCuller**: per-frame wrapper around a `DepthRasterizer`
- **SoftwareDepthBuffer**: tiled reciprocal-depth rasterizer
- **TerrainOccluder**: min-pooled coarse terrain around the camera
- **OccluderMeshCache**: vertex-clustered building occluders, one per node
- **OcclusionSystem**: scene / cell / paged-chunk traversal over a `SceneGraph`
*/

// Internal modules
pub mod error;
pub mod log;
pub mod settings;
pub mod bounds;
pub mod camera;
pub mod rasterizer;
pub mod scene;
pub mod simplify;
pub mod terrain;
pub mod cull;

// Main horizon namespace module
pub mod horizon {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::settings::OcclusionSettings;

    // Entry point
    pub use crate::cull::{OcclusionSystem, FrameContext, CullOutput, VisibleDrawable, DebugOverlay};

    // Logging sub-module (types only, macros stay at the crate root)
    pub mod log {
        pub use crate::log::{Log, Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod bounds {
        pub use crate::bounds::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod rasterizer {
        pub use crate::rasterizer::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod simplify {
        pub use crate::simplify::*;
    }

    pub mod terrain {
        pub use crate::terrain::*;
    }
}

// Re-export math library at crate root
pub use glam;
