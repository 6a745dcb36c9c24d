use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse outputs that would overwrite an input or each other.
pub fn ensure_outputs_distinct(outputs: &[&Path], inputs: &[&Path]) -> Result<()> {
    let inputs = inputs
        .iter()
        .map(|p| comparable(p).map(|norm| (norm, *p)))
        .collect::<Result<Vec<_>>>()?;

    let mut claimed: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());
    for output in outputs {
        let norm = comparable(output)?;
        if let Some((_, input)) = inputs.iter().find(|(n, _)| *n == norm) {
            bail!(
                "refusing to overwrite input file: output {} matches input {}",
                output.display(),
                input.display()
            );
        }
        if let Some((_, other)) = claimed.iter().find(|(n, _)| *n == norm) {
            bail!(
                "output {} is given twice (also as {})",
                output.display(),
                other.display()
            );
        }
        claimed.push((norm, *output));
    }
    Ok(())
}

fn comparable(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()));
    }
    // `..` is not resolved for paths that do not exist yet.
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().context("current_dir")?
    };
    Ok(base.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_matching_input_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("fabric.json");
        std::fs::write(&input, "{}").expect("write");

        let err = ensure_outputs_distinct(&[input.as_path()], &[input.as_path()]).expect_err("same file");
        assert!(err.to_string().contains("refusing to overwrite input file"));
    }

    #[test]
    fn two_outputs_on_one_path_are_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.json");

        let err = ensure_outputs_distinct(&[out.as_path(), out.as_path()], &[]).expect_err("twice");
        assert!(err.to_string().contains("given twice"));
        let other = dir.path().join("other.json");
        ensure_outputs_distinct(&[out.as_path(), other.as_path()], &[]).expect("distinct outputs");
    }
}
