pub mod actions;
pub mod fix;
pub mod parse;
