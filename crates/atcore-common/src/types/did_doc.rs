//! DID documents: pure data transforms over the W3C DID document shape (§4.13).

use bon::Builder;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::DidDocError;
use crate::types::did::Did;

/// A single verification method entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub controller: String,
    #[serde(rename = "publicKeyMultibase", skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

/// A single service entry (e.g. the PDS endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: String,
}

/// A W3C DID document, as used for ATProto identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "alsoKnownAs", skip_serializing_if = "Vec::is_empty", default)]
    pub also_known_as: Vec<String>,
    #[serde(rename = "verificationMethod", default)]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub service: Vec<Service>,
}

/// Options for building a fresh DID document (§4.13, `bon::Builder` per the
/// ambient convention for small option structs).
#[derive(Builder)]
pub struct DidDocumentOptions {
    pub handle: Option<String>,
    pub pds_endpoint: Option<String>,
    pub signing_key_multibase: Option<String>,
    #[builder(default)]
    pub also_known_as: Vec<String>,
}

const ATPROTO_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
const MULTIKEY_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

impl DidDocument {
    /// Assemble a document for any DID method from keyword options.
    pub fn create(did: &Did, opts: DidDocumentOptions) -> Self {
        let mut also_known_as = opts.also_known_as;
        if let Some(handle) = &opts.handle {
            also_known_as.push(format!("at://{handle}"));
        }

        let mut verification_method = Vec::new();
        if let Some(key) = &opts.signing_key_multibase {
            verification_method.push(VerificationMethod {
                id: format!("{}#atproto", did.as_str()),
                type_: "Multikey".into(),
                controller: did.as_str().to_string(),
                public_key_multibase: Some(key.clone()),
            });
        }

        let mut service = Vec::new();
        if let Some(endpoint) = &opts.pds_endpoint {
            service.push(Service {
                id: "#atproto_pds".into(),
                type_: "AtprotoPersonalDataServer".into(),
                service_endpoint: endpoint.clone(),
            });
        }

        Self {
            context: vec![ATPROTO_CONTEXT.into(), MULTIKEY_CONTEXT.into()],
            id: did.as_str().to_string(),
            also_known_as,
            verification_method,
            service,
        }
    }

    /// Assemble a `did:web` document for `domain`.
    pub fn create_web(domain: &str, opts: DidDocumentOptions) -> Result<Self, DidDocError> {
        let did = Did::parse(&format!("did:web:{domain}"))?;
        Ok(Self::create(&did, opts))
    }

    /// Append a service entry.
    pub fn add_service(&mut self, service: Service) {
        self.service.push(service);
    }

    /// Replace the `#atproto` verification method, inserting one if absent.
    pub fn update_signing_key(&mut self, public_key_multibase: String) {
        let id = format!("{}#atproto", self.id);
        if let Some(existing) = self
            .verification_method
            .iter_mut()
            .find(|vm| vm.id.ends_with("#atproto"))
        {
            existing.public_key_multibase = Some(public_key_multibase);
        } else {
            self.verification_method.push(VerificationMethod {
                id,
                type_: "Multikey".into(),
                controller: self.id.clone(),
                public_key_multibase: Some(public_key_multibase),
            });
        }
    }

    /// The first verification method whose id ends `#atproto`.
    pub fn get_signing_key(&self) -> Option<&VerificationMethod> {
        self.verification_method
            .iter()
            .find(|vm| vm.id.ends_with("#atproto"))
    }

    /// A service entry by its `type` field.
    pub fn get_service(&self, service_type: &str) -> Option<&Service> {
        self.service.iter().find(|s| s.type_ == service_type)
    }

    /// The `AtprotoPersonalDataServer` service endpoint, if present.
    pub fn get_pds_endpoint(&self) -> Option<&str> {
        self.get_service("AtprotoPersonalDataServer")
            .map(|s| s.service_endpoint.as_str())
    }

    /// The first `at://…` entry in `alsoKnownAs`.
    pub fn get_handle(&self) -> Option<&str> {
        self.also_known_as
            .iter()
            .find(|a| a.starts_with("at://"))
            .map(|a| a.trim_start_matches("at://"))
    }
}

/// `did:web` resolution URL per §4.13: the identifier's colon-separated
/// segments after the method become path segments under the host.
///
/// - `example.com` → `https://example.com/.well-known/did.json`
/// - `example.com:user:alice` → `https://example.com/user/alice/did.json`
pub fn build_did_web_url(identifier: &str) -> Result<String, DidDocError> {
    let mut parts = identifier.split(':');
    let host = parts
        .next()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DidDocError::NotWebDid(identifier.into()))?;
    let mut url = Url::parse(&format!("https://{host}/")).map_err(DidDocError::InvalidUrl)?;
    let rest: Vec<&str> = parts.collect();
    if rest.is_empty() {
        url.set_path(".well-known/did.json");
    } else {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| DidDocError::InvalidUrl(url::ParseError::SetHostOnCannotBeABaseUrl))?;
        for seg in rest {
            // Minimally percent-decode each segment per spec guidance.
            let decoded = percent_decode_str(seg).decode_utf8_lossy();
            segments.push(&decoded);
        }
        segments.push("did.json");
        drop(segments);
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plc_did() -> Did {
        Did::parse("did:plc:44ybard66vv44zksje25o7dz").unwrap()
    }

    #[test]
    fn creates_document_with_signing_key_and_service() {
        let did = plc_did();
        let opts = DidDocumentOptions::builder()
            .handle("alice.bsky.social".to_string())
            .pds_endpoint("https://pds.example.com".to_string())
            .signing_key_multibase("zDnaer...".to_string())
            .build();
        let doc = DidDocument::create(&did, opts);
        assert_eq!(doc.id, did.as_str());
        assert_eq!(doc.get_handle(), Some("alice.bsky.social"));
        assert_eq!(doc.get_pds_endpoint(), Some("https://pds.example.com"));
        assert!(doc.get_signing_key().is_some());
    }

    #[test]
    fn update_signing_key_replaces_existing() {
        let did = plc_did();
        let opts = DidDocumentOptions::builder()
            .signing_key_multibase("zOld...".to_string())
            .build();
        let mut doc = DidDocument::create(&did, opts);
        doc.update_signing_key("zNew...".to_string());
        assert_eq!(doc.verification_method.len(), 1);
        assert_eq!(
            doc.get_signing_key().unwrap().public_key_multibase,
            Some("zNew...".to_string())
        );
    }

    #[test]
    fn add_service_appends() {
        let did = plc_did();
        let mut doc = DidDocument::create(&did, DidDocumentOptions::builder().build());
        doc.add_service(Service {
            id: "#labeler".into(),
            type_: "AtprotoLabeler".into(),
            service_endpoint: "https://mod.example.com".into(),
        });
        assert!(doc.get_service("AtprotoLabeler").is_some());
    }

    #[test]
    fn did_web_url_no_path() {
        assert_eq!(
            build_did_web_url("example.com").unwrap(),
            "https://example.com/.well-known/did.json"
        );
    }

    #[test]
    fn did_web_url_with_path() {
        assert_eq!(
            build_did_web_url("example.com:user:alice").unwrap(),
            "https://example.com/user/alice/did.json"
        );
    }

    #[test]
    fn create_web_builds_correct_did() {
        let doc = DidDocument::create_web("example.com", DidDocumentOptions::builder().build())
            .unwrap();
        assert_eq!(doc.id, "did:web:example.com");
    }
}
