//! Link domain parsing and classification.

use url::Url;

use crate::models::LinkType;

/// Host of `raw`, or `raw` itself when it is not an absolute URL with a host.
pub fn link_domain(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => host.to_string(),
            None => raw.to_string(),
        },
        Err(_) => raw.to_string(),
    }
}

/// Richer classification, only applied to links from the relational store.
pub fn classify_link(url: &str, domain: &str) -> LinkType {
    let domain = domain.to_lowercase();
    let url = url.to_lowercase();

    if domain.contains("github.com") {
        LinkType::Github
    } else if [".github.io", "vercel.app", "netlify.app"]
        .iter()
        .any(|d| domain.contains(d))
    {
        LinkType::Personal
    } else if ["docs", "documentation", "readme", "wiki"]
        .iter()
        .any(|t| url.contains(t))
    {
        LinkType::Documentation
    } else {
        LinkType::Other
    }
}
