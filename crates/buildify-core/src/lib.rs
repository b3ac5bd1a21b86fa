//! Domain logic for buildify: prompt construction, remote model calls, the
//! output sanitation/parsing pipeline, duplicate-name filtering, image
//! storage, and authentication.

pub mod auth;
pub mod datauri;
pub mod dedupe;
pub mod generate;
pub mod images;
pub mod output;
pub mod password;
pub mod prompt;
pub mod provider;
pub mod sanitize;
pub mod token;
