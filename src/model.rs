mod animation;
mod skeleton;

pub use animation::*;
pub use skeleton::*;
