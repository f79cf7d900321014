//! OCI registry client for pushing and pulling release images.
//!
//! Uses `oci-distribution` for registry operations.

use async_trait::async_trait;
use oci_distribution::Client;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::manifest::OciImageIndex;
use oci_distribution::secrets::RegistryAuth;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::auth::{CredentialProvider, registry_auth};
use crate::image::ArchiveImage;
use crate::reference::RegistryReference;
use crate::registry::{PulledLayer, Registry};
use crate::{DOCKER_GZIP_MEDIA_TYPE, Error, OCI_MEDIA_TYPE, OCI_TAR_MEDIA_TYPE, Result};

/// Connection settings for registries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Registries to reach over plain HTTP (e.g. `localhost:5000`).
    pub insecure_registries: Vec<String>,
}

impl RegistryConfig {
    fn protocol(&self) -> ClientProtocol {
        if self.insecure_registries.is_empty() {
            ClientProtocol::Https
        } else {
            ClientProtocol::HttpsExcept(self.insecure_registries.clone())
        }
    }
}

/// OCI registry client with explicitly supplied credentials.
pub struct OciClient {
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl OciClient {
    /// Create a client with default configuration.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_config(&RegistryConfig::default(), credentials)
    }

    /// Create a client with the given connection settings.
    #[must_use]
    pub fn with_config(config: &RegistryConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        let client_config = ClientConfig {
            protocol: config.protocol(),
            ..Default::default()
        };
        let client = Client::new(client_config);
        Self {
            client,
            credentials,
        }
    }

    /// Resolve authentication for the registry of `reference`.
    fn auth(&self, reference: &RegistryReference) -> Result<RegistryAuth> {
        let credentials = self.credentials.resolve(reference.registry())?;
        trace!(
            registry = %reference.registry(),
            authenticated = credentials.is_some(),
            "Resolved registry credentials"
        );
        Ok(registry_auth(credentials))
    }
}

#[async_trait]
impl Registry for OciClient {
    async fn push_image(
        &self,
        reference: &RegistryReference,
        image: &ArchiveImage,
    ) -> Result<()> {
        let auth = self.auth(reference)?;
        debug!(%reference, digest = %image.digest, "Pushing image");

        let response = self
            .client
            .push(
                reference.as_reference(),
                std::slice::from_ref(&image.layer),
                image.config.clone(),
                &auth,
                Some(image.manifest.clone()),
            )
            .await
            .map_err(|e| Error::push(reference, e.to_string()))?;

        debug!(%reference, manifest_url = %response.manifest_url, "Pushed image");
        Ok(())
    }

    async fn push_index(
        &self,
        reference: &RegistryReference,
        index: &OciImageIndex,
    ) -> Result<()> {
        let auth = self.auth(reference)?;
        debug!(%reference, manifests = index.manifests.len(), "Pushing index");

        let url = self
            .client
            .push_manifest_list(reference.as_reference(), &auth, index.clone())
            .await
            .map_err(|e| Error::push(reference, e.to_string()))?;

        info!(%reference, %url, "Pushed index");
        Ok(())
    }

    async fn pull_layers(&self, reference: &RegistryReference) -> Result<Vec<PulledLayer>> {
        let auth = self.auth(reference)?;
        info!(%reference, "Pulling image");

        let image = self
            .client
            .pull(
                reference.as_reference(),
                &auth,
                vec![OCI_MEDIA_TYPE, OCI_TAR_MEDIA_TYPE, DOCKER_GZIP_MEDIA_TYPE],
            )
            .await
            .map_err(|e| Error::pull(reference, e.to_string()))?;

        debug!(
            %reference,
            digest = ?image.digest,
            layer_count = image.layers.len(),
            "Pulled image"
        );

        Ok(image
            .layers
            .into_iter()
            .map(|layer| PulledLayer {
                digest: layer.sha256_digest(),
                media_type: layer.media_type,
                data: layer.data,
            })
            .collect())
    }
}
