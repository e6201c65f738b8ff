mod frame_pipeline;
mod memory_gate;

pub use frame_pipeline::{
    index_video, CancellationToken, FrameSource, FrameSourceErrorKind, IndexingErrorKind,
    PipelineCfg,
};
pub use memory_gate::MemoryGate;
