mod linkage;
mod mapping;

pub use linkage::*;
pub use mapping::*;
