pub mod entity;
pub mod ids;
pub mod line;
pub mod state;

pub use entity::{Entity, EntityKind, Payload};
pub use ids::{EntityId, IdGenerator, LineId, MetadataId};
pub use line::Line;
pub use state::{FenceKind, LexerState};
