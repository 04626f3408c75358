pub mod favourites;
pub mod file;
pub mod files;
pub mod folders;
pub mod notifications;
pub mod response;
pub mod socket;
