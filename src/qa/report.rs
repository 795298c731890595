use image::{imageops, Rgb, RgbImage};
use plotters::prelude::{BitMapBackend, IntoDrawingArea, IntoFont, TextStyle, BLACK};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::outline::outline_overlay;
use crate::error::{ErrorCode, GearError, Result};
use crate::fsl::FslRunner;
use crate::gear::inputs::file_name;

/// White band between stacked panels, in pixels
pub const SEPARATOR_HEIGHT: u32 = 16;

/// Band above each panel that carries its title
pub const TITLE_HEIGHT: u32 = 36;

const TITLE_FONT_SIZE: u32 = 22;

pub const REPORT_TITLES: [&str; 2] = ["topup (red) over original", "original (red) over topup"];

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Stack `panels` vertically, centered, into one PNG at `output`, each
/// under a white band with its title drawn in it.
pub fn compose_report(panels: &[PathBuf], titles: &[&str], output: &Path) -> Result<()> {
    if panels.len() != titles.len() {
        return Err(GearError::validation_with_code(
            ErrorCode::VALIDATION_MISMATCHED_LENGTHS,
            format!(
                "{} report panels but {} titles",
                panels.len(),
                titles.len()
            ),
            Some("titles".to_string()),
        ));
    }
    if panels.is_empty() {
        return Err(GearError::validation("a report needs at least one panel"));
    }

    let images = panels
        .iter()
        .map(|path| {
            image::open(path)
                .map(|img| img.to_rgb8())
                .map_err(|e| GearError::from(e).with_context(path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let width = images.iter().map(RgbImage::width).max().unwrap_or(0);
    let height = images.iter().map(RgbImage::height).sum::<u32>()
        + TITLE_HEIGHT * images.len() as u32
        + SEPARATOR_HEIGHT * (images.len() as u32 - 1);

    let mut canvas = RgbImage::from_pixel(width, height, WHITE);
    let mut title_rows = Vec::with_capacity(images.len());
    let mut y = 0u32;
    for panel in &images {
        title_rows.push(y);
        let x = (width - panel.width()) / 2;
        imageops::overlay(&mut canvas, panel, i64::from(x), i64::from(y + TITLE_HEIGHT));
        y += TITLE_HEIGHT + panel.height() + SEPARATOR_HEIGHT;
    }

    draw_titles(&mut canvas, titles, &title_rows);
    canvas.save(output)?;

    info!("Wrote QA report {}", output.display());
    Ok(())
}

/// Draw each title centered in the band starting at the matching row.
///
/// Text rendering needs a system font; without one the bands stay blank.
fn draw_titles(canvas: &mut RgbImage, titles: &[&str], rows: &[u32]) {
    let (width, height) = canvas.dimensions();
    let root = BitMapBackend::with_buffer(canvas, (width, height)).into_drawing_area();
    let style = TextStyle::from(("sans-serif", TITLE_FONT_SIZE).into_font())
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for (title, row) in titles.iter().zip(rows) {
        let anchor = ((width / 2) as i32, (row + TITLE_HEIGHT / 2) as i32);
        if let Err(e) = root.draw_text(title, &style, anchor) {
            warn!("Could not draw report title {:?}: {}", title, e);
            return;
        }
    }
    if let Err(e) = root.present() {
        warn!("Could not render report titles: {}", e);
    }
}

/// File name without its `.nii`/`.nii.gz` extension
pub fn image_stem(path: &Path) -> String {
    let name = file_name(path);
    match name.find(".nii") {
        Some(end) => name[..end].to_string(),
        None => name,
    }
}

/// Outline overlays in both directions for an original/corrected pair,
/// composed into `<original stem>_QA_report.png` under `output_base`.
pub async fn generate_topup_report(
    fsl: &dyn FslRunner,
    original: &Path,
    corrected: &Path,
    output_base: &Path,
) -> Result<PathBuf> {
    info!("overlay 1");
    let panel1 = outline_overlay(
        fsl,
        original,
        corrected,
        &output_base.join("corrected_over_original"),
    )
    .await?;

    info!("overlay 2");
    let panel2 = outline_overlay(
        fsl,
        corrected,
        original,
        &output_base.join("original_over_corrected"),
    )
    .await?;

    info!("generating report");
    let report = output_base.join(format!("{}_QA_report.png", image_stem(original)));
    compose_report(&[panel1, panel2], &REPORT_TITLES, &report)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsl::FslRunnerImpl;
    use crate::gear::GearEnvironment;
    use crate::subprocess::MockProcessRunner;
    use std::sync::Arc;

    fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
        RgbImage::from_pixel(width, height, Rgb(color))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_compose_stacks_titled_panels() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 200, 10, [255, 0, 0]);
        write_png(&b, 100, 6, [0, 0, 255]);

        let out = dir.path().join("report.png");
        compose_report(&[a, b], &["first", "second"], &out).unwrap();

        let report = image::open(&out).unwrap().to_rgb8();
        let second_band = TITLE_HEIGHT + 10 + SEPARATOR_HEIGHT;
        assert_eq!(report.dimensions(), (200, second_band + TITLE_HEIGHT + 6));

        // a title band sits above each panel; its left edge stays clear of centered text
        for row in (0..TITLE_HEIGHT).chain(second_band..second_band + TITLE_HEIGHT) {
            assert_eq!(report.get_pixel(0, row), &WHITE, "row {}", row);
        }
        assert_eq!(report.get_pixel(0, TITLE_HEIGHT), &Rgb([255, 0, 0]));
        assert_eq!(report.get_pixel(0, TITLE_HEIGHT + 10), &WHITE);

        // narrower panel is centered
        let second_panel = second_band + TITLE_HEIGHT;
        assert_eq!(report.get_pixel(0, second_panel), &WHITE);
        assert_eq!(report.get_pixel(100, second_panel), &Rgb([0, 0, 255]));

        assert!(!dir.path().join("report.txt").exists());
    }

    #[test]
    fn test_mismatched_titles_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        write_png(&a, 4, 4, [0, 0, 0]);

        let err = compose_report(&[a], &["one", "two"], &dir.path().join("r.png")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_MISMATCHED_LENGTHS);
        assert!(!dir.path().join("r.png").exists());
    }

    #[test]
    fn test_missing_panel_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compose_report(
            &[dir.path().join("absent.png")],
            &["t"],
            &dir.path().join("r.png"),
        )
        .unwrap_err();
        assert!(err.user_message().contains("absent.png"));
    }

    #[test]
    fn test_image_stem() {
        assert_eq!(image_stem(Path::new("/in/dwi_AP.nii.gz")), "dwi_AP");
        assert_eq!(image_stem(Path::new("/in/b0.nii")), "b0");
        assert_eq!(image_stem(Path::new("/in/scan")), "scan");
    }

    #[tokio::test]
    async fn test_generate_topup_report() {
        let dir = tempfile::tempdir().unwrap();
        // pngappend is mocked, so the panels it would write are staged up front
        write_png(&dir.path().join("corrected_over_original.png"), 30, 10, [9, 9, 9]);
        write_png(&dir.path().join("original_over_corrected.png"), 30, 10, [7, 7, 7]);

        let mut mock = MockProcessRunner::new();
        mock.expect_command("fslstats")
            .with_args(|args| args.last().map(String::as_str) == Some("-C"))
            .returns_stdout("1 2 3\n")
            .finish();
        mock.expect_command("fslstats").returns_stdout("5\n").finish();
        for program in ["bet2", "fslmaths", "overlay", "slicer", "pngappend"] {
            mock.expect_command(program).returns_success().finish();
        }
        let fsl = FslRunnerImpl::new(Arc::new(mock.clone()), GearEnvironment::new());

        let report = generate_topup_report(
            &fsl,
            Path::new("/in/dwi.nii.gz"),
            Path::new("/out/topup-corrected-dwi.nii.gz"),
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(report, dir.path().join("dwi_QA_report.png"));
        assert_eq!(
            image::open(&report).unwrap().to_rgb8().dimensions(),
            (30, 2 * TITLE_HEIGHT + 20 + SEPARATOR_HEIGHT)
        );
        assert!(mock.verify_called("overlay", 2));
        assert!(mock.verify_called("bet2", 2));
    }
}
