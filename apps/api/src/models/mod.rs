pub mod subscription;
pub mod usage;
