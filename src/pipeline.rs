pub mod assembler;
pub mod clip;
pub mod lighting;
pub mod renderer;
pub mod sink;
pub mod sort;
pub mod triangulate;
