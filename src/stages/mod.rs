pub mod stage0_segment;
pub mod stage1_match;
pub mod stage2_aggregate;
pub mod stage3_render;

pub use stage0_segment::*;
pub use stage1_match::*;
pub use stage2_aggregate::*;
pub use stage3_render::*;
