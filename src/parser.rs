pub mod bvh;
pub mod load;

pub use bvh::parse_bvh;
pub use load::load_bvh;
