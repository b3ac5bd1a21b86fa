pub mod blobs;
pub mod projects;
pub mod users;
