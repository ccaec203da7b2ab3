pub mod config;
pub mod error;
pub mod response;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use response::AgentResponse;
