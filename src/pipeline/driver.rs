use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ErrorCode, GearError, Result};
use crate::fsl::commands::{self, TopupOptions};
use crate::fsl::FslRunner;
use crate::gear::inputs::file_name;
use crate::gear::{ApplyTarget, GearContext, GearInputs};
use crate::qa::generate_topup_report;
use crate::transform::{read_movpar, rigid_transform, select_row, write_premat};
use crate::volume::VolumeProbe;

/// Files produced by a pipeline run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutcome {
    /// Topup output basename (`<output>/topup`)
    pub topup_out: PathBuf,
    pub corrected: Vec<PathBuf>,
    pub motion_corrected: Vec<PathBuf>,
    pub reports: Vec<PathBuf>,
}

/// Runs the gear steps in order: check inputs, prepare the topup input,
/// topup, applytopup, motion premat and QA.
pub struct TopupPipeline {
    context: GearContext,
    fsl: Arc<dyn FslRunner>,
    probe: Arc<dyn VolumeProbe>,
    dry_run: bool,
}

/// Wrap a step failure so the message names the step. Configuration and
/// input problems keep their category.
fn step_failed(step: &'static str, message: &'static str) -> impl FnOnce(GearError) -> GearError {
    move |err| match err {
        GearError::Config { .. } | GearError::Input { .. } => err,
        GearError::Pipeline { .. } => err.with_step(step),
        other => GearError::pipeline_with_code(
            ErrorCode::PIPELINE_STEP_FAILED,
            format!("{}: {}", message, other.user_message()),
        )
        .with_step(step)
        .with_source(other),
    }
}

impl TopupPipeline {
    pub fn new(
        context: GearContext,
        fsl: Arc<dyn FslRunner>,
        probe: Arc<dyn VolumeProbe>,
    ) -> Self {
        Self {
            context,
            fsl,
            probe,
            dry_run: false,
        }
    }

    /// Skip the steps that read files written by the external tools
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<PipelineOutcome> {
        let config = self.context.config();
        self.context.log_config();

        std::fs::create_dir_all(self.context.work_dir())?;
        std::fs::create_dir_all(self.context.output_dir())?;

        info!("Checking inputs");
        let (inputs, targets) = self
            .check_inputs()
            .map_err(step_failed("check inputs", "Error with input validation"))?;

        info!("Generating topup input");
        let merged = self
            .prepare_topup_input(&inputs)
            .await
            .map_err(step_failed("prepare input", "Error generating topup inputs"))?;

        info!("Running Topup");
        let topup = self
            .run_topup(&inputs, merged)
            .await
            .map_err(step_failed("topup", "Error running topup"))?;

        let mut outcome = PipelineOutcome {
            topup_out: topup.out.clone(),
            ..Default::default()
        };

        if config.topup_only {
            info!("topup_only is set, not applying the correction");
        } else {
            info!("Applying Topup Correction");
            outcome.corrected = self
                .apply_topup(&inputs, &targets, &topup.out)
                .await
                .map_err(step_failed("apply topup", "Error applying topup to inputs"))?;
        }

        if config.motion_premat {
            if self.dry_run {
                info!("[dry-run] skipping motion premat");
            } else {
                info!("Applying topup motion parameters");
                outcome.motion_corrected = self
                    .motion_premat(&topup, &targets, &outcome.corrected)
                    .await
                    .map_err(step_failed("motion premat", "Error applying motion parameters"))?;
            }
        }

        if config.qa {
            if self.dry_run {
                info!("[dry-run] skipping topup QA");
            } else {
                info!("Running Topup QA");
                outcome.reports = self
                    .run_qa(&inputs, &targets, &outcome.corrected)
                    .await
                    .map_err(step_failed("qa", "Error running topup QC"))?;
            }
        }

        info!("Topup gear finished");
        Ok(outcome)
    }

    fn check_inputs(&self) -> Result<(GearInputs, Vec<ApplyTarget>)> {
        let inputs = GearInputs::resolve(&self.context)?;
        let targets = inputs.apply_targets(self.probe.as_ref())?;

        let parameters = std::fs::read_to_string(&inputs.acquisition_parameters).map_err(|e| {
            GearError::input(
                ErrorCode::INPUT_UNREADABLE,
                format!("cannot read acquisition parameters: {}", e),
                crate::gear::inputs::ACQUISITION_PARAMETERS,
            )
        })?;
        info!("Acquisition parameters:\n{}", parameters.trim_end());

        match &inputs.config_file {
            Some(path) => info!("Using config settings in {}", path.display()),
            None => info!("Using default config values"),
        }

        Ok((inputs, targets))
    }

    /// Reduce each image to one volume in the work dir and merge them in time
    async fn prepare_topup_input(&self, inputs: &GearInputs) -> Result<PathBuf> {
        let work_dir = self.context.work_dir();
        let image1 = work_dir.join("Image1");
        let image2 = work_dir.join("Image2");

        for (input, output) in [(&inputs.image_1, &image1), (&inputs.image_2, &image2)] {
            let command = if self.probe.is_4d(input)? {
                info!("Using volume 1 in 4D image {}", file_name(input));
                commands::fslroi(input, output, 0, 1)
            } else {
                commands::fslmaths_copy(input, output)
            };
            self.fsl.run(command).await?;
        }

        let merged = work_dir.join("topup_vols");
        self.fsl
            .run(commands::fslmerge_time(&merged, &[&image1, &image2]))
            .await?;
        Ok(merged)
    }

    async fn run_topup(&self, inputs: &GearInputs, merged: PathBuf) -> Result<TopupOptions> {
        let config = self.context.config();
        let config_path = inputs
            .config_file
            .clone()
            .unwrap_or_else(|| self.context.default_topup_config());

        let mut options = TopupOptions::new(
            merged,
            inputs.acquisition_parameters.clone(),
            config_path,
            self.context.output_dir(),
        );
        options.displacement_field = config.displacement_field;
        options.jacobian_determinants = config.jacobian_determinants;
        options.rigid_body_matrix = config.rigid_body_matrix;
        options.verbose = config.verbose;
        options.debug = config.topup_debug_level;

        match std::fs::read_to_string(&options.config) {
            Ok(settings) => info!("Using config settings:\n\n{}\n", settings.trim_end()),
            Err(e) => warn!(
                "Cannot read topup config {}: {}",
                options.config.display(),
                e
            ),
        }

        self.fsl.run_logged(commands::topup(&options)?).await?;
        Ok(options)
    }

    async fn apply_topup(
        &self,
        inputs: &GearInputs,
        targets: &[ApplyTarget],
        topup_out: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut corrected = Vec::with_capacity(targets.len());
        for target in targets {
            let output = self
                .context
                .output_dir()
                .join(format!("topup-corrected-{}", target.file_name()));

            let command = commands::applytopup(
                &target.path,
                &inputs.acquisition_parameters,
                target.index,
                topup_out,
                &output,
            )?;
            self.fsl.run(command).await?;
            corrected.push(output);
        }
        Ok(corrected)
    }

    /// Resample each target with the rigid transform topup estimated for its row
    async fn motion_premat(
        &self,
        topup: &TopupOptions,
        targets: &[ApplyTarget],
        corrected: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let rows = read_movpar(&topup.movpar_path())?;
        let output_dir = self.context.output_dir();

        let mut outputs = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            let params = select_row(&rows, target.index)?;
            let matrix = rigid_transform(&params)?;

            let premat = output_dir.join(format!("topup-premat-{}.mat", target.index));
            write_premat(&premat, &matrix)?;

            let input = corrected.get(i).unwrap_or(&target.path);
            let output = output_dir.join(format!("topup-moco-{}", target.file_name()));
            self.fsl
                .run(commands::applywarp(&target.path, input, &output, &premat)?)
                .await?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    async fn run_qa(
        &self,
        inputs: &GearInputs,
        targets: &[ApplyTarget],
        corrected: &[PathBuf],
    ) -> Result<Vec<PathBuf>> {
        let work_dir = self.context.work_dir();
        let output_dir = self.context.output_dir();

        if corrected.is_empty() {
            info!("No corrected images, no QA report to generate");
            return Ok(Vec::new());
        }

        let mut reports = Vec::with_capacity(corrected.len());
        for (target, corrected) in targets.iter().zip(corrected) {
            let report = generate_topup_report(self.fsl.as_ref(), &target.path, corrected, work_dir)
                .await?;
            let destination = output_dir.join(file_name(&report));
            move_file(&report, &destination)?;
            reports.push(destination);
        }

        if inputs.config_file.is_none() {
            let default_config = self.context.default_topup_config();
            if default_config.exists() {
                std::fs::copy(&default_config, output_dir.join("config_file.txt"))?;
            } else {
                info!("no path {}", default_config.display());
            }
        }

        Ok(reports)
    }
}

/// Rename, falling back to copy and delete across file systems
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)?;
    Ok(())
}
