use anyhow::{bail, Context, Result};
use fabric_migrate::profiles::reconcile_switch_profiles;
use fabric_migrate::report::render_outcomes;

use crate::cli::{OutputFormat, ProfilesArgs};
use crate::inputs;
use crate::path_guard;

pub fn run_profiles(args: ProfilesArgs) -> Result<()> {
    if let Some(out_path) = &args.write_fabric {
        path_guard::ensure_outputs_distinct(&[out_path.as_path()], &[args.fabric.as_path()])?;
    }

    let (mut fabric, mut snapshot) = inputs::fabric(&args.fabric)?;
    let report = reconcile_switch_profiles(&mut snapshot, &mut fabric);

    if let Some(path) = &args.write_fabric {
        fabric
            .save_state(path)
            .with_context(|| "failed to write fabric state")?;
    }

    match args.format {
        OutputFormat::Text => println!("{}", render_outcomes(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if report.has_failures() {
        bail!("profiles finished with {} failed objects", report.failed());
    }
    Ok(())
}
