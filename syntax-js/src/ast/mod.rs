pub mod node;
pub mod slot;
pub mod syntax;

pub use node::Node;
pub use node::NodeId;
pub use slot::Slot;
pub use slot::SlotMut;
pub use syntax::*;
