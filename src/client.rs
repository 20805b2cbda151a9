//! The entry point most applications start from.

use std::sync::Arc;

use tracing::info;

use crate::api::ApiRequestor;
use crate::config::Configuration;
use crate::error::Result;
use crate::http::{HttpTransport, ReqwestTransport};
use crate::projects::ProjectsController;

/// Bundles the configuration, transport and resource controllers.
///
/// ```no_run
/// use caplena::projects::ListProjects;
/// use caplena::{Client, Configuration};
///
/// # fn main() -> caplena::Result<()> {
/// let client = Client::new(Configuration::from_env()?)?;
/// for project in client.projects().list(ListProjects::default()) {
///     println!("{}", project?.name());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    projects: Arc<ProjectsController>,
}

impl Client {
    /// Creates a client talking to the API over HTTPS.
    pub fn new(config: Configuration) -> Result<Self> {
        let transport = ReqwestTransport::new(config.retry.clone())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client on top of a custom transport, e.g. a mock in tests.
    pub fn with_transport(config: Configuration, transport: Arc<dyn HttpTransport>) -> Self {
        info!(
            base_uri = config.api_base_uri.url(),
            version = %config.api_version,
            transport = %transport.identifier(),
            "Creating Caplena client"
        );
        let requestor = Arc::new(ApiRequestor::new(config, transport));
        Self {
            projects: ProjectsController::new(requestor),
        }
    }

    pub fn projects(&self) -> &Arc<ProjectsController> {
        &self.projects
    }
}
