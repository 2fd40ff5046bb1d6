pub mod user;
pub mod group;
pub mod post;
pub mod comment;
pub mod follow;
