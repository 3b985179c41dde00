//! Per-call metadata for the gRPC binding.
//!
//! The identity goes out as binary metadata (`customer-id-bin`, `corpus-id-bin`), each an
//! 8-byte big-endian integer. The credential adds exactly one ASCII entry, `authorization`
//! or `x-api-key`.
use crate::auth::Credential;
use crate::client::TransportError;
use crate::identity::{CORPUS_ID_BIN_KEY, CUSTOMER_ID_BIN_KEY, IdentityContext};
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;

#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    customer_id: [u8; 8],
    corpus_id: Option<[u8; 8]>,
    auth_key: &'static str,
    auth_value: MetadataValue<Ascii>,
}

impl AuthInterceptor {
    pub fn new(credential: &Credential, identity: IdentityContext) -> Result<Self, TransportError> {
        let (auth_key, value) = credential.auth_header();
        let mut auth_value: MetadataValue<Ascii> = value
            .parse()
            .map_err(|_| TransportError::InvalidMetadata(auth_key))?;
        auth_value.set_sensitive(true);

        Ok(Self {
            customer_id: identity.customer_id_bin(),
            corpus_id: identity.corpus_id_bin(),
            auth_key,
            auth_value,
        })
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: tonic::Request<()>) -> Result<tonic::Request<()>, tonic::Status> {
        let metadata = request.metadata_mut();
        metadata.insert_bin(
            CUSTOMER_ID_BIN_KEY,
            MetadataValue::from_bytes(&self.customer_id),
        );
        if let Some(corpus_id) = &self.corpus_id {
            metadata.insert_bin(CORPUS_ID_BIN_KEY, MetadataValue::from_bytes(corpus_id));
        }
        metadata.insert(self.auth_key, self.auth_value.clone());
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_identity_and_api_key() {
        let credential = Credential::ApiKey("zqt_key".into());
        let mut interceptor =
            AuthInterceptor::new(&credential, IdentityContext::for_corpus(258, 3)).unwrap();

        let request = interceptor.call(tonic::Request::new(())).unwrap();
        let metadata = request.metadata();

        let customer = metadata.get_bin("customer-id-bin").unwrap().to_bytes().unwrap();
        assert_eq!(customer.as_ref(), &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert!(metadata.get_bin("corpus-id-bin").is_some());
        assert_eq!(metadata.get("x-api-key").unwrap(), "zqt_key");
        assert!(metadata.get("authorization").is_none());
    }

    #[test]
    fn account_calls_have_no_corpus_entry() {
        let credential = Credential::bearer("tkn");
        let mut interceptor =
            AuthInterceptor::new(&credential, IdentityContext::for_account(1)).unwrap();

        let request = interceptor.call(tonic::Request::new(())).unwrap();

        assert!(request.metadata().get_bin("corpus-id-bin").is_none());
        assert_eq!(request.metadata().get("authorization").unwrap(), "Bearer tkn");
    }
}
