pub mod backend;
pub mod client;

pub use backend::QuizBackend;
pub use client::ApiClient;
