mod app;
mod camera;
mod cli;
mod engine;
mod input;

use clap::Parser;
use horizon_host::desktop::DesktopHost;
use horizon_host::device::GpuInit;
use horizon_host::logging::{LoggingConfig, init_logging};
use horizon_host::window::{Runtime, RuntimeConfig, SurfaceConfig};
use horizon_host::{HostConfig, Session};

use crate::app::StudioApp;
use crate::cli::Cli;
use crate::engine::SkyModule;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    });

    let surfaces = cli.surface_args()?;
    let runtime = RuntimeConfig {
        surfaces: surfaces
            .iter()
            .map(|s| SurfaceConfig::new(s.id.clone()))
            .collect(),
    };

    let config = HostConfig {
        failure_policy: cli.policy.into(),
        log_every: cli.log_every,
        ..HostConfig::default()
    };
    log::info!(
        "opening {} surface(s), failure policy {:?}",
        surfaces.len(),
        config.failure_policy
    );

    let session = Session::new(DesktopHost::new(), SkyModule::new(cli.fov), config);
    Runtime::run(runtime, GpuInit::default(), StudioApp::new(session, surfaces))
}
