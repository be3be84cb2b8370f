pub mod body;
pub mod mesh;
