//! Brain-outline overlays rendered with FSL.
//!
//! An outline is derived from a BET run on one image and drawn in red over
//! another, then sliced along each axis into a single PNG strip.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{GearError, Result};
use crate::fsl::commands::{self, suffixed};
use crate::fsl::FslRunner;

const OUTLINE_WORK_DIR: &str = "outline_work";

/// Run BET on `image`, seeded at its center of mass. Returns the BET output root.
pub async fn bet(fsl: &dyn FslRunner, image: &Path, work_dir: &Path) -> Result<PathBuf> {
    let stdout = fsl.run(commands::fslstats(image, &["-C"])).await?;
    let center: [String; 3] = commands::parse_stats(&stdout, 3)?
        .try_into()
        .map_err(|_| GearError::invalid_parameter("fslstats", "expected a 3D center of mass"))?;
    debug!("Center of mass of {}: {:?}", image.display(), center);

    let bet_root = work_dir.join("bet");
    fsl.run(commands::bet2(image, &bet_root, &center)?).await?;
    Ok(bet_root)
}

/// Turn BET's overlay image into a binary outline of the brain edge.
///
/// The overlay minus the original leaves the drawn edge; its 97th percentile
/// is used as threshold before binarising.
pub async fn bet_to_outline(fsl: &dyn FslRunner, original: &Path, bet_root: &Path) -> Result<PathBuf> {
    let overlay = suffixed(bet_root, "_overlay.nii.gz");
    let diff = suffixed(bet_root, "_diff");
    let thresh = suffixed(bet_root, "_thresh");
    let outline = suffixed(bet_root, "_outline");

    fsl.run(commands::fslmaths_op(
        &overlay,
        "-sub",
        Some(&commands::path_arg(original)),
        &diff,
    ))
    .await?;

    let stdout = fsl.run(commands::fslstats(&diff, &["-p", "97"])).await?;
    let threshold = commands::parse_stats(&stdout, 1)?.remove(0);

    fsl.run(commands::fslmaths_op(&diff, "-thr", Some(&threshold), &thresh))
        .await?;
    fsl.run(commands::fslmaths_op(&thresh, "-bin", None, &outline))
        .await?;

    remove_intermediate(&suffixed(&thresh, ".nii.gz"))?;
    remove_intermediate(&suffixed(&diff, ".nii.gz"))?;

    Ok(outline)
}

fn remove_intermediate(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Intermediate {} was not written", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Draw `outline` over `background` and render the three mid-plane slices
/// side by side into `<output>.png`, which is returned.
pub async fn render_overlay(
    fsl: &dyn FslRunner,
    background: &Path,
    outline: &Path,
    output: &Path,
) -> Result<PathBuf> {
    fsl.run(commands::overlay(background, outline, output)).await?;

    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    let slices = commands::slice_pngs(dir);
    fsl.run(commands::slicer(output, &slices)).await?;

    let png = suffixed(output, ".png");
    fsl.run(commands::pngappend(&slices, &png)).await?;
    Ok(png)
}

/// Outline the brain in `outline` and draw it over `background`, naming the
/// result `name`. Scratch files go to `outline_work` next to `name`.
pub async fn outline_overlay(
    fsl: &dyn FslRunner,
    background: &Path,
    outline: &Path,
    name: &Path,
) -> Result<PathBuf> {
    let work_dir = name
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(OUTLINE_WORK_DIR);
    std::fs::create_dir_all(&work_dir)?;

    info!(
        "Outlining {} over {}",
        outline.display(),
        background.display()
    );
    let bet_root = bet(fsl, outline, &work_dir).await?;
    let mask_outline = bet_to_outline(fsl, outline, &bet_root).await?;
    render_overlay(fsl, background, &mask_outline, name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsl::FslRunnerImpl;
    use crate::gear::GearEnvironment;
    use crate::subprocess::MockProcessRunner;
    use std::sync::Arc;

    fn mock_fsl() -> (FslRunnerImpl, MockProcessRunner) {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("fslstats")
            .with_args(|args| args.last().map(String::as_str) == Some("-C"))
            .returns_stdout("32.5 40.0 18.25 \n")
            .finish();
        mock.expect_command("fslstats")
            .with_args(|args| args.ends_with(&["-p".to_string(), "97".to_string()]))
            .returns_stdout("812.000000 \n")
            .finish();
        for program in ["bet2", "fslmaths", "overlay", "slicer", "pngappend"] {
            mock.expect_command(program).returns_success().finish();
        }
        let fsl = FslRunnerImpl::new(Arc::new(mock.clone()), GearEnvironment::new());
        (fsl, mock)
    }

    #[tokio::test]
    async fn test_bet_seeds_center_of_mass() {
        let (fsl, mock) = mock_fsl();
        let root = bet(&fsl, Path::new("/w/img.nii.gz"), Path::new("/w/ow"))
            .await
            .unwrap();

        assert_eq!(root, PathBuf::from("/w/ow/bet"));
        let bet_call = &mock.calls()[1];
        assert_eq!(bet_call.program, "bet2");
        assert_eq!(&bet_call.args[bet_call.args.len() - 4..], ["-c", "32.5", "40.0", "18.25"]);
    }

    #[tokio::test]
    async fn test_outline_steps_and_cleanup() {
        let dir = tempfile::tempdir().unwrap();
        let bet_root = dir.path().join("bet");
        std::fs::write(suffixed(&bet_root, "_diff.nii.gz"), b"x").unwrap();
        std::fs::write(suffixed(&bet_root, "_thresh.nii.gz"), b"x").unwrap();

        let (fsl, mock) = mock_fsl();
        let outline = bet_to_outline(&fsl, Path::new("/in/orig.nii.gz"), &bet_root)
            .await
            .unwrap();

        assert_eq!(outline, suffixed(&bet_root, "_outline"));
        let history = mock.calls();
        let ops: Vec<&str> = history
            .iter()
            .map(|c| c.args[1].as_str())
            .collect();
        assert_eq!(ops, vec!["-sub", "-p", "-thr", "-bin"]);
        assert_eq!(history[2].args[2], "812.000000");
        assert!(!suffixed(&bet_root, "_diff.nii.gz").exists());
        assert!(!suffixed(&bet_root, "_thresh.nii.gz").exists());
    }

    #[tokio::test]
    async fn test_outline_overlay_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let name = dir.path().join("corrected_over_original");

        let (fsl, mock) = mock_fsl();
        let png = outline_overlay(
            &fsl,
            Path::new("/in/orig.nii.gz"),
            Path::new("/out/corrected.nii.gz"),
            &name,
        )
        .await
        .unwrap();

        assert_eq!(png, suffixed(&name, ".png"));
        assert!(dir.path().join(OUTLINE_WORK_DIR).is_dir());
        assert_eq!(
            mock.called_programs(),
            vec![
                "fslstats", "bet2", "fslmaths", "fslstats", "fslmaths", "fslmaths", "overlay",
                "slicer", "pngappend",
            ]
        );
        // BET runs on the outlined image, the overlay is drawn on the background
        assert_eq!(mock.calls()[0].args[0], "/out/corrected.nii.gz");
        assert_eq!(mock.calls()[6].args[2], "/in/orig.nii.gz");
    }

    #[tokio::test]
    async fn test_bad_center_of_mass_fails() {
        let mut mock = MockProcessRunner::new();
        mock.expect_command("fslstats").returns_stdout("\n").finish();
        let fsl = FslRunnerImpl::new(Arc::new(mock.clone()), GearEnvironment::new());

        assert!(bet(&fsl, Path::new("/w/img"), Path::new("/w")).await.is_err());
        assert!(mock.verify_called("bet2", 0));
    }
}
