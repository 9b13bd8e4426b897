pub mod connect;
pub mod github;
pub mod gitlab;
mod transport;

pub use connect::{ForgeOptions, provider_for};
pub use github::{GitHubConfig, GitHubProvider};
pub use gitlab::{GitLabConfig, GitLabProvider};
pub use transport::HttpContentClient;
