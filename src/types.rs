use crate::error::{Result, WaystoneError};
use std::fmt;
use std::sync::Arc;

/// One candidate base address, tagged with its position in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    index: usize,
    base_url: Arc<str>,
}

impl Endpoint {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a relative path onto the base address with exactly one `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

/// Ordered, immutable set of interchangeable backends.
///
/// Order decides race submission order only; once a sticky route is warm it
/// carries no precedence.
#[derive(Debug, Clone)]
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
}

impl EndpointPool {
    pub fn new<I, S>(addrs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut endpoints = Vec::new();
        for (index, addr) in addrs.into_iter().enumerate() {
            let trimmed = addr.as_ref().trim().trim_end_matches('/');
            if trimmed.is_empty() {
                return Err(WaystoneError::Config(format!(
                    "Endpoint #{} is blank",
                    index
                )));
            }
            endpoints.push(Endpoint {
                index,
                base_url: Arc::from(trimmed),
            });
        }

        if endpoints.is_empty() {
            return Err(WaystoneError::Config(
                "Endpoint pool must contain at least one address".into(),
            ));
        }

        Ok(Self { endpoints })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Endpoint> {
        self.endpoints.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}

/// A successful value together with the endpoint that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult<T> {
    pub value: T,
    pub endpoint: Endpoint,
}

impl<T> AttemptResult<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}
