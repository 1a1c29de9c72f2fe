mod device;
mod event;
mod group;
mod policy;
mod vertex;

pub use device::*;
pub use event::*;
pub use group::*;
pub use policy::*;
pub use vertex::*;
