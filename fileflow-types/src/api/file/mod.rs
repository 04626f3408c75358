pub mod share;
