use crate::utils::error::{ExportError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ExportError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u32, min_value: u32) -> Result<()> {
    if value < min_value {
        return Err(ExportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_token(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        return Err(ExportError::MissingInput { field: "token" });
    }
    Ok(())
}

/// Pulls the numeric portfolio id out of a link such as
/// `https://app.asana.com/0/portfolio/12345/list`.
///
/// The id is the second-to-last `/` segment. It must be at least three
/// ASCII digits long.
pub fn parse_portfolio_reference(link: &str) -> Result<String> {
    if link.trim().is_empty() {
        return Err(ExportError::MissingInput { field: "portfolio" });
    }

    let invalid = |reason: &str| ExportError::InvalidPortfolioLink {
        link: link.to_string(),
        reason: reason.to_string(),
    };

    let segments: Vec<&str> = link.split('/').collect();
    if segments.len() < 3 {
        return Err(invalid("expected at least three path segments"));
    }

    let candidate = segments[segments.len() - 2];
    if candidate.is_empty() {
        return Err(invalid("portfolio id segment is empty"));
    }
    if !candidate.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("portfolio id must be numeric"));
    }
    if candidate.len() < 3 {
        return Err(invalid("portfolio id is too short"));
    }

    Ok(candidate.to_string())
}
