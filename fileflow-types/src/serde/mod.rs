pub mod nullable;
pub mod time;
