// Scope policy: which discovered URLs belong to the target domain

use crate::error::ScanError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Prefix prepended to candidates that carry neither a scheme nor a leading
/// slash (bare hosts like `api.example.com`). Removed again before the
/// normalized URL is handed back.
const SYNTHESIZED_SCHEME: &str = "https://";

/// How far outside the target domain a discovery may wander.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopePolicy {
    /// Host must equal the target domain
    Strict,
    /// Host must end with the target domain (domain and subdomains)
    #[default]
    Subs,
    /// Host must contain the target domain anywhere
    Fuzzy,
    /// Everything with a host
    Yolo,
}

impl ScopePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopePolicy::Strict => "strict",
            ScopePolicy::Subs => "subs",
            ScopePolicy::Fuzzy => "fuzzy",
            ScopePolicy::Yolo => "yolo",
        }
    }

    pub fn admits(&self, host: &str, domain: &str) -> bool {
        match self {
            ScopePolicy::Strict => host == domain,
            ScopePolicy::Subs => host.ends_with(domain),
            ScopePolicy::Fuzzy => host.contains(domain),
            ScopePolicy::Yolo => true,
        }
    }
}

impl FromStr for ScopePolicy {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ScopePolicy::Strict),
            "subs" => Ok(ScopePolicy::Subs),
            "fuzzy" => Ok(ScopePolicy::Fuzzy),
            "yolo" => Ok(ScopePolicy::Yolo),
            other => Err(ScanError::ParseError(format!("unknown scope policy '{}'", other))),
        }
    }
}

impl fmt::Display for ScopePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn prefix(&self) -> &'static str {
        match self {
            Scheme::Http => "http://",
            Scheme::Https => "https://",
        }
    }
}

impl FromStr for Scheme {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ScanError::ParseError(format!("unknown scheme '{}'", other))),
        }
    }
}

/// Scope filter bound to one job's target domain. Cheap to clone and
/// shared read-only by every aggregator of the job.
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    domain: String,
    policy: ScopePolicy,
    scheme: Scheme,
    base: Option<Url>,
}

impl ScopeFilter {
    pub fn new(domain: &str, policy: ScopePolicy, scheme: Scheme) -> Self {
        let domain = domain.to_ascii_lowercase();
        let base = Url::parse(&format!("{}{}", scheme.prefix(), domain)).ok();
        Self {
            domain,
            policy,
            scheme,
            base,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// `scheme://domain`, the root every relative candidate resolves against.
    pub fn root_url(&self) -> String {
        format!("{}{}", self.scheme.prefix(), self.domain)
    }

    /// Resolve `candidate` against the job root and apply the policy.
    ///
    /// Returns the normalized URL when the candidate is in scope. Anything
    /// that fails to parse or resolves to an empty host is rejected.
    pub fn accepts(&self, candidate: &str) -> Option<String> {
        let base = self.base.as_ref()?;

        let synthesized = !candidate.contains("http://")
            && !candidate.contains("https://")
            && !candidate.starts_with('/');

        let resolved = if synthesized {
            base.join(&format!("{}{}", SYNTHESIZED_SCHEME, candidate))
        } else {
            base.join(candidate)
        }
        .ok()?;

        if !self.in_scope(&resolved) {
            return None;
        }

        let mut normalized = resolved.to_string();
        if synthesized {
            normalized = normalized.replacen(SYNTHESIZED_SCHEME, "", 1);
            // url always renders an empty path as "/"
            if resolved.path() == "/"
                && resolved.query().is_none()
                && resolved.fragment().is_none()
                && !candidate.ends_with('/')
            {
                normalized.pop();
            }
        }
        Some(normalized)
    }

    /// Policy check on an already absolute URL.
    pub fn in_scope(&self, url: &Url) -> bool {
        match host_with_port(url) {
            Some(host) => self.policy.admits(&host, &self.domain),
            None => false,
        }
    }
}

/// `host[:port]` of a URL, `None` when it has no (or an empty) host.
pub fn host_with_port(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
