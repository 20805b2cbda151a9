//! Prints the most recently modified projects of the configured account.
//!
//! ```bash
//! CAPLENA_API_KEY=... RUST_LOG=info cargo run --bin list_projects
//! ```

use caplena::object::RemoteResource;
use caplena::projects::ListProjects;
use caplena::runtime::setup_tracing;
use caplena::{Client, Configuration};
use tracing::{error, info};

const SHOWN: usize = 20;

fn main() {
    setup_tracing();

    if let Err(e) = run() {
        error!(error = %e, "Listing projects failed");
        std::process::exit(1);
    }
}

fn run() -> caplena::Result<()> {
    let client = Client::new(Configuration::from_env()?)?;
    let mut projects = client.projects().list(ListProjects {
        limit: Some(SHOWN),
        ..Default::default()
    });

    info!(total = projects.total_count()?, "Listing projects");
    for project in projects {
        let project = project?;
        println!(
            "{}  {:<40}  {}  {}",
            project.id(),
            project.name(),
            project.language(),
            project.upload_status()
        );
    }
    Ok(())
}
