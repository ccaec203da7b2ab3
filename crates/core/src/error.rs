use thiserror::Error;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Agent not initialized: call initialize() first")]
    NotInitialized,

    #[error("No metrics found for the specified campaign and time period")]
    NoDataFound,

    #[error("Store error: {0}")]
    StoreFailure(String),

    #[error("Validation error: {0}")]
    ValidationFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CampaignError {
    /// Wrap an adapter error coming out of a storage or enrichment collaborator.
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreFailure(err.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailure(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_message_is_user_facing() {
        assert_eq!(
            CampaignError::NoDataFound.to_string(),
            "No metrics found for the specified campaign and time period"
        );
    }

    #[test]
    fn test_store_errors_pass_message_through() {
        let err = CampaignError::store(anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "Store error: connection reset");
    }
}
