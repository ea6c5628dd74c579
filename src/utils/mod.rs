mod ids;
pub mod time;

pub use ids::longid;
