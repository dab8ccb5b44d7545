pub mod context;
pub mod normalize;
pub mod role;
pub mod similarity;
pub mod tokens;
