pub mod export;
pub mod tree;
