pub mod document;
pub mod selection;
pub mod session;
pub mod shape;
