pub mod journey;
pub mod rule;
pub mod table;
pub mod utterance;

pub use journey::*;
pub use rule::*;
pub use table::*;
pub use utterance::*;
