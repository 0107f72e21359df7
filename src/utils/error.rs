use thiserror::Error;

pub const INVALID_TOKEN_MESSAGE: &str =
    "Your Personal Access Token is invalid - please check it and try again";
pub const INVALID_LINK_MESSAGE: &str =
    "Your portfolio link is invalid - please check it and try again";
pub const UNEXPECTED_MESSAGE: &str =
    "Something went wrong... check the logs for details or wait and try again";

const MALFORMED_REQUEST_MESSAGE: &str = "Something went wrong with the request - check that your portfolio link looks like https://app.asana.com/0/portfolio/12345/list";
const UNAUTHORIZED_MESSAGE: &str = "You're not authorized to get this portfolio - check that you pasted your Personal Access Token correctly and your portfolio link is correct";
const NOT_FOUND_MESSAGE: &str = "We couldn't find that portfolio - check that your portfolio link looks like https://app.asana.com/0/portfolio/12345/list";

/// Fixed user-facing text for terminal API statuses. Unlisted codes stay silent.
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some(MALFORMED_REQUEST_MESSAGE),
        401 | 403 => Some(UNAUTHORIZED_MESSAGE),
        404 => Some(NOT_FOUND_MESSAGE),
        _ => None,
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Missing required input: {field}")]
    MissingInput { field: &'static str },

    #[error("Invalid portfolio link '{link}': {reason}")]
    InvalidPortfolioLink { link: String, reason: String },

    #[error("Credential check failed with status {status}")]
    InvalidCredential { status: u16 },

    #[error("API returned status {status} for portfolio {portfolio}")]
    ApiStatus { status: u16, portfolio: String },

    #[error("Portfolio {portfolio} was reached more than once")]
    PortfolioRevisited { portfolio: String },

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Authentication,
    Api,
    Unexpected,
    Configuration,
}

impl ExportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ExportError::MissingInput { .. } | ExportError::InvalidPortfolioLink { .. } => {
                ErrorCategory::Input
            }
            ExportError::InvalidCredential { .. } => ErrorCategory::Authentication,
            ExportError::ApiStatus { .. } | ExportError::PortfolioRevisited { .. } => {
                ErrorCategory::Api
            }
            ExportError::Http(_)
            | ExportError::IoError(_)
            | ExportError::SerializationError(_) => ErrorCategory::Unexpected,
            ExportError::ConfigError { .. } | ExportError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Text shown to the person running the export, if any.
    pub fn user_message(&self) -> Option<String> {
        match self {
            ExportError::MissingInput { field: "portfolio" } => {
                Some(INVALID_LINK_MESSAGE.to_string())
            }
            ExportError::MissingInput { .. } | ExportError::InvalidCredential { .. } => {
                Some(INVALID_TOKEN_MESSAGE.to_string())
            }
            ExportError::InvalidPortfolioLink { .. } => Some(INVALID_LINK_MESSAGE.to_string()),
            ExportError::ApiStatus { status, .. } => status_message(*status).map(str::to_string),
            ExportError::PortfolioRevisited { portfolio } => Some(format!(
                "Portfolio {portfolio} was already exported through another path - the repeated branch was skipped"
            )),
            ExportError::ConfigError { .. } | ExportError::InvalidConfigValueError { .. } => {
                Some(self.to_string())
            }
            ExportError::Http(_)
            | ExportError::IoError(_)
            | ExportError::SerializationError(_) => Some(UNEXPECTED_MESSAGE.to_string()),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => {
                "Pass --token and a link like https://app.asana.com/0/portfolio/12345/list"
            }
            ErrorCategory::Authentication => "Create a new Personal Access Token and try again",
            ErrorCategory::Api => "Check that the token can see every nested portfolio",
            ErrorCategory::Unexpected => "Wait a moment and run the export again",
            ErrorCategory::Configuration => "Fix the configuration file and try again",
        }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
