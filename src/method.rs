use http::Method;
use std::fmt;
use std::str::FromStr;

/// Method a route or middleware is registered for: one verb, or `*` for all.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    /// Whether a request with `method` is covered by this filter
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(m) => m == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(method)
    }
}

impl FromStr for MethodFilter {
    type Err = http::method::InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(MethodFilter::Any);
        }
        Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map(MethodFilter::Only)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("*"),
            MethodFilter::Only(m) => f.write_str(m.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("get".parse::<MethodFilter>().ok(), Some(MethodFilter::Only(Method::GET)));
        assert_eq!("*".parse::<MethodFilter>().ok(), Some(MethodFilter::Any));
    }

    #[test]
    fn test_any_allows_every_method() {
        assert!(MethodFilter::Any.allows(&Method::DELETE));
        assert!(!MethodFilter::Only(Method::GET).allows(&Method::POST));
    }
}
