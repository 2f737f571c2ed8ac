//! Request signing.
//!
//! Token acquisition is out of scope; the signer only attaches existing
//! credentials to outgoing calls.

pub trait RequestSigner: Send + Sync {
    fn sign(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

pub struct BearerTokenSigner {
    token: String,
}

impl BearerTokenSigner {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl RequestSigner for BearerTokenSigner {
    fn sign(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

/// No credentials; useful against a local development server.
pub struct NoopSigner;

impl RequestSigner for NoopSigner {
    fn sign(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
    }
}
