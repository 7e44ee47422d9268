pub mod error;
pub mod geometry;
pub mod models;
pub mod pipeline;
pub mod stages;
pub mod viz;

pub use error::{Error, Result};
pub use models::{
    BoundingBox, DetectionResult, EyeState, FaceState, PassengerState, PipelineConfig, Region,
};
pub use pipeline::{
    FullPipeline, ImageInput, ModelPaths, NoEyePipeline, SeatPipeline, DEFAULT_VIZ_DIR,
};
pub use stages::{EmptinessDetector, ReferenceMap};
pub use viz::Visualizer;
