//! Shared helpers for unit tests in this crate.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use buildify_core::prompt::TextRequest;
use buildify_core::provider::{GeneratedImage, ImageModel, ProviderError, TextModel};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Serialize tests that mutate process environment variables.
pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Sets and removes environment variables, restoring the previous values
/// when dropped. Hold [`lock_env`] for as long as the guard lives.
pub struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub fn new() -> Self {
        Self { saved: Vec::new() }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.save(name);
        unsafe { std::env::set_var(name, value) };
    }

    pub fn remove(&mut self, name: &str) {
        self.save(name);
        unsafe { std::env::remove_var(name) };
    }

    fn save(&mut self, name: &str) {
        if !self.saved.iter().any(|(n, _)| n == name) {
            self.saved.push((name.to_owned(), std::env::var(name).ok()));
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.saved.drain(..).rev() {
            match value {
                Some(v) => unsafe { std::env::set_var(&name, v) },
                None => unsafe { std::env::remove_var(&name) },
            }
        }
    }
}

/// Text model that always answers with the same reply, or fails with an
/// HTTP status.
pub struct FakeText(pub Result<String, u16>);

impl FakeText {
    pub fn replying(text: &str) -> Self {
        Self(Ok(text.to_owned()))
    }

    pub fn failing(status: u16) -> Self {
        Self(Err(status))
    }
}

#[async_trait]
impl TextModel for FakeText {
    fn name(&self) -> &str {
        "fake-text"
    }

    async fn generate(&self, _request: &TextRequest) -> Result<String, ProviderError> {
        match &self.0 {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(ProviderError::Status {
                provider: "fake-text",
                status: *status,
                body: "model overloaded".to_owned(),
            }),
        }
    }
}

/// Image model that returns fixed PNG-typed bytes, or fails.
pub struct FakeImage(pub Result<Vec<u8>, u16>);

impl FakeImage {
    pub fn returning(bytes: &[u8]) -> Self {
        Self(Ok(bytes.to_vec()))
    }
}

#[async_trait]
impl ImageModel for FakeImage {
    fn name(&self) -> &str {
        "fake-image"
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedImage, ProviderError> {
        match &self.0 {
            Ok(bytes) => Ok(GeneratedImage {
                mime: "image/png".to_owned(),
                bytes: bytes.clone(),
            }),
            Err(status) => Err(ProviderError::Status {
                provider: "fake-image",
                status: *status,
                body: "model loading".to_owned(),
            }),
        }
    }
}
