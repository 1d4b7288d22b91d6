use std::fmt;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use horizon_host::FailurePolicy;
use horizon_host::host::SurfaceId;

/// Surface opened when no `--surface` is given.
pub const DEFAULT_SURFACE: &str = "canvas1";

#[derive(Parser, Debug)]
#[command(name = "horizon-studio", version, about = "Shows an equirectangular sky map in one window per surface")]
pub struct Cli {
    /// Image for the default `canvas1` surface.
    #[arg(value_name = "IMAGE")]
    pub image: Option<String>,

    /// Additional surface as `ID=IMAGE` (repeatable).
    #[arg(long = "surface", value_name = "ID=IMAGE")]
    pub surfaces: Vec<SurfaceArg>,

    /// Render failure handling.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Skip)]
    pub policy: PolicyChoice,

    /// Log repeated per-frame problems once every N frames.
    #[arg(long, default_value_t = 120)]
    pub log_every: u32,

    /// Initial vertical field of view, degrees.
    #[arg(long, default_value_t = 100.0)]
    pub fov: f32,

    /// Debug logging for the horizon crates.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Requested surfaces, the positional image first.
    pub fn surface_args(&self) -> anyhow::Result<Vec<SurfaceArg>> {
        let mut out = Vec::with_capacity(self.surfaces.len() + 1);
        if let Some(image) = &self.image {
            out.push(SurfaceArg {
                id: SurfaceId::from(DEFAULT_SURFACE),
                image: image.clone(),
            });
        }
        for arg in &self.surfaces {
            anyhow::ensure!(
                !out.iter().any(|s: &SurfaceArg| s.id == arg.id),
                "surface `{}` given more than once",
                arg.id
            );
            out.push(arg.clone());
        }
        anyhow::ensure!(
            !out.is_empty(),
            "nothing to show: pass an IMAGE or at least one --surface ID=IMAGE"
        );
        Ok(out)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyChoice {
    /// Log the failure and keep the loop going.
    #[value(alias = "skip-and-continue")]
    Skip,
    /// End the loop on the first failure.
    #[value(alias = "stop-on-error")]
    Stop,
}

impl From<PolicyChoice> for FailurePolicy {
    fn from(choice: PolicyChoice) -> Self {
        match choice {
            PolicyChoice::Skip => FailurePolicy::SkipAndContinue,
            PolicyChoice::Stop => FailurePolicy::StopOnError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceArg {
    pub id: SurfaceId,
    pub image: String,
}

impl FromStr for SurfaceArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, image) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=IMAGE, got `{s}`"))?;
        let (id, image) = (id.trim(), image.trim());
        if id.is_empty() || image.is_empty() {
            return Err(format!("expected ID=IMAGE, got `{s}`"));
        }
        Ok(Self {
            id: SurfaceId::from(id),
            image: image.to_string(),
        })
    }
}

impl fmt::Display for SurfaceArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.id, self.image)
    }
}
