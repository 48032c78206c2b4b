use reqwest::Url;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Invalid launch URL: {0}")]
    InvalidUrl(String),
}

/// Overrides supplied when the dashboard is opened from a link such as
/// `https://host/?owner=rust-lang&repo=rust&token=ghp_...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub token: Option<String>,
}

impl LaunchParams {
    /// Both owner and repo were supplied, so they override the stored
    /// configuration and the dashboard opens on the issue list.
    pub fn targets_repository(&self) -> bool {
        self.owner.is_some() && self.repo.is_some()
    }
}

/// Parse launch parameters from a full URL or a bare query string
/// (`?owner=a&repo=b` or `owner=a&repo=b`). Empty values count as absent.
pub fn parse_launch(input: &str) -> Result<LaunchParams, LaunchError> {
    let input = input.trim();
    let parsed = match Url::parse(input) {
        Ok(url) => url,
        Err(_) => {
            let query = input.trim_start_matches('?');
            Url::parse(&format!("http://localhost/?{query}"))
                .map_err(|_| LaunchError::InvalidUrl(input.to_string()))?
        }
    };

    let mut params = LaunchParams::default();
    for (key, value) in parsed.query_pairs() {
        if value.is_empty() {
            continue;
        }
        let slot = match &*key {
            "owner" => &mut params.owner,
            "repo" => &mut params.repo,
            "token" => &mut params.token,
            _ => continue,
        };
        *slot = Some(value.into_owned());
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let params = parse_launch("https://nexus.local/?owner=rust-lang&repo=rust").unwrap();
        assert_eq!(params.owner.as_deref(), Some("rust-lang"));
        assert_eq!(params.repo.as_deref(), Some("rust"));
        assert!(params.token.is_none());
        assert!(params.targets_repository());
    }

    #[test]
    fn test_parse_bare_query() {
        let params = parse_launch("?owner=c&repo=d&token=t0k").unwrap();
        assert_eq!(params.owner.as_deref(), Some("c"));
        assert_eq!(params.repo.as_deref(), Some("d"));
        assert_eq!(params.token.as_deref(), Some("t0k"));

        let params = parse_launch("owner=c&repo=d").unwrap();
        assert!(params.targets_repository());
    }

    #[test]
    fn test_parse_ignores_unknown_and_empty_values() {
        let params = parse_launch("?owner=c&repo=&view=settings").unwrap();
        assert_eq!(params.owner.as_deref(), Some("c"));
        assert!(params.repo.is_none());
        assert!(!params.targets_repository());
    }

    #[test]
    fn test_parse_decodes_percent_escapes() {
        let params = parse_launch("?owner=my%20org&repo=r").unwrap();
        assert_eq!(params.owner.as_deref(), Some("my org"));
    }
}
