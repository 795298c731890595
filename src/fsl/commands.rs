//! Pure builders for every FSL command line the gear runs.
//!
//! Each builder returns the full token list, program first. Nothing here
//! touches the file system or spawns a process.

use std::path::{Path, PathBuf};

use crate::command::{build_command_list, OptionMap};
use crate::error::{ErrorCode, GearError, Result};

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// `path` with `suffix` appended to its final component, e.g. `bet` -> `bet_outline`
pub fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn program(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

/// `fslroi <input> <output> <tmin> <tsize>`: extract a range of volumes
pub fn fslroi(input: &Path, output: &Path, tmin: usize, tsize: usize) -> Vec<String> {
    vec![
        "fslroi".to_string(),
        path_arg(input),
        path_arg(output),
        tmin.to_string(),
        tsize.to_string(),
    ]
}

/// `fslmaths <input> <output>`: extension agnostic copy
pub fn fslmaths_copy(input: &Path, output: &Path) -> Vec<String> {
    vec!["fslmaths".to_string(), path_arg(input), path_arg(output)]
}

/// `fslmaths <input> <op> <operand> <output>`
pub fn fslmaths_op(input: &Path, op: &str, operand: Option<&str>, output: &Path) -> Vec<String> {
    let mut command = vec!["fslmaths".to_string(), path_arg(input), op.to_string()];
    command.extend(operand.map(str::to_string));
    command.push(path_arg(output));
    command
}

/// `fslmerge -t <output> <inputs...>`: concatenate in time
pub fn fslmerge_time(output: &Path, inputs: &[&Path]) -> Vec<String> {
    let mut command = vec![
        "fslmerge".to_string(),
        "-t".to_string(),
        path_arg(output),
    ];
    command.extend(inputs.iter().map(|p| path_arg(p)));
    command
}

/// `fslstats <image> <args...>`
pub fn fslstats(image: &Path, args: &[&str]) -> Vec<String> {
    let mut command = vec!["fslstats".to_string(), path_arg(image)];
    command.extend(args.iter().map(|a| a.to_string()));
    command
}

/// Options for a `topup` run.
///
/// `out` is the output basename; the optional outputs are derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TopupOptions {
    pub imain: PathBuf,
    pub datain: PathBuf,
    pub out: PathBuf,
    pub fout: PathBuf,
    pub iout: PathBuf,
    pub logout: PathBuf,
    pub config: PathBuf,
    pub displacement_field: bool,
    pub jacobian_determinants: bool,
    pub rigid_body_matrix: bool,
    pub verbose: bool,
    pub debug: u8,
}

impl TopupOptions {
    /// Standard output layout under `output_dir`
    pub fn new(imain: PathBuf, datain: PathBuf, config: PathBuf, output_dir: &Path) -> Self {
        Self {
            imain,
            datain,
            out: output_dir.join("topup"),
            fout: output_dir.join("topup-fmap"),
            iout: output_dir.join("topup-input-corrected"),
            logout: output_dir.join("topup-log.txt"),
            config,
            displacement_field: false,
            jacobian_determinants: false,
            rigid_body_matrix: false,
            verbose: false,
            debug: 0,
        }
    }

    pub fn to_options(&self) -> OptionMap {
        let mut options = OptionMap::new()
            .with("imain", &self.imain)
            .with("datain", &self.datain)
            .with("out", &self.out)
            .with("fout", &self.fout)
            .with("iout", &self.iout)
            .with("logout", &self.logout)
            .with("config", &self.config);

        if self.displacement_field {
            options.set("dfout", suffixed(&self.out, "-dfield"));
        }
        if self.jacobian_determinants {
            options.set("jacout", suffixed(&self.out, "-jacdet"));
        }
        if self.rigid_body_matrix {
            options.set("rbmout", suffixed(&self.out, "-rbmat"));
        }
        if self.verbose {
            options.set("verbose", true);
        }
        if self.debug > 0 {
            options.set("debug", self.debug);
        }
        options
    }

    /// Movement parameters topup writes next to `out`
    pub fn movpar_path(&self) -> PathBuf {
        suffixed(&self.out, "_movpar.txt")
    }
}

pub fn topup(options: &TopupOptions) -> Result<Vec<String>> {
    build_command_list(program("topup"), &options.to_options(), true)
}

/// `applytopup` with Jacobian modulation and spline interpolation
pub fn applytopup(
    imain: &Path,
    datain: &Path,
    inindex: usize,
    topup: &Path,
    out: &Path,
) -> Result<Vec<String>> {
    let options = OptionMap::new()
        .with("imain", imain)
        .with("datain", datain)
        .with("inindex", inindex)
        .with("topup", topup)
        .with("method", "jac")
        .with("interp", "spline")
        .with("out", out);
    build_command_list(program("applytopup"), &options, true)
}

/// `applywarp` with a rigid pre-transform and no warp field
pub fn applywarp(reference: &Path, input: &Path, out: &Path, premat: &Path) -> Result<Vec<String>> {
    let options = OptionMap::new()
        .with("ref", reference)
        .with("in", input)
        .with("out", out)
        .with("premat", premat)
        .with("interp", "spline");
    build_command_list(program("applywarp"), &options, true)
}

/// `bet2` producing the overlay (`-o`) and mask (`-m`) images, seeded at `center`
pub fn bet2(image: &Path, out: &Path, center: &[String; 3]) -> Result<Vec<String>> {
    let options = OptionMap::new()
        .with("o", true)
        .with("m", true)
        .with("t", true)
        .with("f", 0.5)
        .with("w", 0.4);
    let mut command = build_command_list(
        vec!["bet2".to_string(), path_arg(image), path_arg(out)],
        &options,
        true,
    )?;
    command.push("-c".to_string());
    command.extend(center.iter().cloned());
    Ok(command)
}

/// `overlay 0 0 <background> -a <outline> 0.001 5 <output>`
pub fn overlay(background: &Path, outline: &Path, output: &Path) -> Vec<String> {
    vec![
        "overlay".to_string(),
        "0".to_string(),
        "0".to_string(),
        path_arg(background),
        "-a".to_string(),
        path_arg(outline),
        "0.001".to_string(),
        "5".to_string(),
        path_arg(output),
    ]
}

/// Mid-plane slices along each axis: `x0v.png`, `y0v.png`, `z0v.png` in `dir`
pub fn slice_pngs(dir: &Path) -> [PathBuf; 3] {
    [dir.join("x0v.png"), dir.join("y0v.png"), dir.join("z0v.png")]
}

/// `slicer <image> -c -s 3 -x 0.5 <x> -y 0.5 <y> -z 0.5 <z>`
pub fn slicer(image: &Path, slices: &[PathBuf; 3]) -> Vec<String> {
    let mut command = vec![
        "slicer".to_string(),
        path_arg(image),
        "-c".to_string(),
        "-s".to_string(),
        "3".to_string(),
    ];
    for (axis, slice) in ["-x", "-y", "-z"].iter().zip(slices) {
        command.push(axis.to_string());
        command.push("0.5".to_string());
        command.push(path_arg(slice));
    }
    command
}

/// `pngappend <x> + 4 <y> + 4 <z> <output>`: side by side with a 4 pixel gap
pub fn pngappend(slices: &[PathBuf; 3], output: &Path) -> Vec<String> {
    let mut command = vec!["pngappend".to_string(), path_arg(&slices[0])];
    for slice in &slices[1..] {
        command.push("+".to_string());
        command.push("4".to_string());
        command.push(path_arg(slice));
    }
    command.push(path_arg(output));
    command
}

/// Parse the whitespace-separated numbers printed by `fslstats`.
pub fn parse_stats(stdout: &str, expected: usize) -> Result<Vec<String>> {
    let values: Vec<String> = stdout.split_whitespace().map(str::to_string).collect();

    if values.len() != expected {
        return Err(GearError::validation_with_code(
            ErrorCode::VALIDATION_INVALID_PARAMETER,
            format!(
                "expected {} values from fslstats, got {}: {:?}",
                expected,
                values.len(),
                stdout.trim()
            ),
            Some("fslstats".to_string()),
        ));
    }

    if let Some(bad) = values.iter().find(|v| v.parse::<f64>().is_err()) {
        return Err(GearError::invalid_parameter(
            "fslstats",
            format!("fslstats printed a non-numeric value: {}", bad),
        ));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(command: &[String]) -> Vec<&str> {
        command.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_prepare_commands() {
        assert_eq!(
            strs(&fslroi(Path::new("/in/ap.nii.gz"), Path::new("/work/Image1"), 0, 1)),
            vec!["fslroi", "/in/ap.nii.gz", "/work/Image1", "0", "1"]
        );
        assert_eq!(
            strs(&fslmaths_copy(Path::new("/in/pa.nii.gz"), Path::new("/work/Image2"))),
            vec!["fslmaths", "/in/pa.nii.gz", "/work/Image2"]
        );
        assert_eq!(
            strs(&fslmerge_time(
                Path::new("/work/topup_vols"),
                &[Path::new("/work/Image1"), Path::new("/work/Image2")]
            )),
            vec!["fslmerge", "-t", "/work/topup_vols", "/work/Image1", "/work/Image2"]
        );
    }

    #[test]
    fn test_topup_default_options() {
        let options = TopupOptions::new(
            "/work/topup_vols".into(),
            "/in/acqp.txt".into(),
            "/flywheel/v0/b02b0.cnf".into(),
            Path::new("/out"),
        );

        assert_eq!(
            strs(&topup(&options).unwrap()),
            vec![
                "topup",
                "--imain=/work/topup_vols",
                "--datain=/in/acqp.txt",
                "--out=/out/topup",
                "--fout=/out/topup-fmap",
                "--iout=/out/topup-input-corrected",
                "--logout=/out/topup-log.txt",
                "--config=/flywheel/v0/b02b0.cnf",
            ]
        );
        assert_eq!(options.movpar_path(), PathBuf::from("/out/topup_movpar.txt"));
    }

    #[test]
    fn test_topup_optional_outputs() {
        let mut options = TopupOptions::new(
            "/w/v".into(),
            "/a.txt".into(),
            "/c.cnf".into(),
            Path::new("/out"),
        );
        options.displacement_field = true;
        options.rigid_body_matrix = true;
        options.verbose = true;
        options.debug = 2;

        let command = topup(&options).unwrap();
        assert_eq!(
            strs(&command[8..]),
            vec![
                "--dfout=/out/topup-dfield",
                "--rbmout=/out/topup-rbmat",
                "--verbose",
                "--debug=2",
            ]
        );
    }

    #[test]
    fn test_applytopup() {
        let command = applytopup(
            Path::new("/in/dwi.nii.gz"),
            Path::new("/in/acqp.txt"),
            2,
            Path::new("/out/topup"),
            Path::new("/out/topup-corrected-dwi.nii.gz"),
        )
        .unwrap();

        assert_eq!(
            strs(&command),
            vec![
                "applytopup",
                "--imain=/in/dwi.nii.gz",
                "--datain=/in/acqp.txt",
                "--inindex=2",
                "--topup=/out/topup",
                "--method=jac",
                "--interp=spline",
                "--out=/out/topup-corrected-dwi.nii.gz",
            ]
        );
    }

    #[test]
    fn test_applywarp() {
        let command = applywarp(
            Path::new("/in/a.nii.gz"),
            Path::new("/in/a.nii.gz"),
            Path::new("/out/topup-moco-a.nii.gz"),
            Path::new("/out/topup-premat-1.mat"),
        )
        .unwrap();

        assert_eq!(
            strs(&command),
            vec![
                "applywarp",
                "--ref=/in/a.nii.gz",
                "--in=/in/a.nii.gz",
                "--out=/out/topup-moco-a.nii.gz",
                "--premat=/out/topup-premat-1.mat",
                "--interp=spline",
            ]
        );
    }

    #[test]
    fn test_bet2() {
        let center = ["45.1".to_string(), "50".to_string(), "30.25".to_string()];
        let command = bet2(Path::new("/w/img.nii.gz"), Path::new("/w/bet"), &center).unwrap();

        assert_eq!(
            strs(&command),
            vec![
                "bet2", "/w/img.nii.gz", "/w/bet", "-o", "-m", "-t", "-f", "0.5", "-w", "0.4",
                "-c", "45.1", "50", "30.25",
            ]
        );
    }

    #[test]
    fn test_fslmaths_op() {
        assert_eq!(
            strs(&fslmaths_op(
                Path::new("/w/bet_diff"),
                "-thr",
                Some("12.5"),
                Path::new("/w/bet_thresh")
            )),
            vec!["fslmaths", "/w/bet_diff", "-thr", "12.5", "/w/bet_thresh"]
        );
        assert_eq!(
            strs(&fslmaths_op(
                Path::new("/w/bet_thresh"),
                "-bin",
                None,
                Path::new("/w/bet_outline")
            )),
            vec!["fslmaths", "/w/bet_thresh", "-bin", "/w/bet_outline"]
        );
    }

    #[test]
    fn test_render_commands() {
        let slices = slice_pngs(Path::new("/w"));

        assert_eq!(
            strs(&overlay(Path::new("/bg.nii.gz"), Path::new("/w/bet_outline"), Path::new("/w/name"))),
            vec!["overlay", "0", "0", "/bg.nii.gz", "-a", "/w/bet_outline", "0.001", "5", "/w/name"]
        );
        assert_eq!(
            strs(&slicer(Path::new("/w/name"), &slices)),
            vec![
                "slicer", "/w/name", "-c", "-s", "3", "-x", "0.5", "/w/x0v.png", "-y", "0.5",
                "/w/y0v.png", "-z", "0.5", "/w/z0v.png",
            ]
        );
        assert_eq!(
            strs(&pngappend(&slices, Path::new("/w/name.png"))),
            vec![
                "pngappend", "/w/x0v.png", "+", "4", "/w/y0v.png", "+", "4", "/w/z0v.png",
                "/w/name.png",
            ]
        );
    }

    #[test]
    fn test_parse_stats() {
        assert_eq!(
            parse_stats("45.123 50.5 30.0 \n", 3).unwrap(),
            vec!["45.123", "50.5", "30.0"]
        );
        assert_eq!(parse_stats("812.000000\n", 1).unwrap(), vec!["812.000000"]);

        let err = parse_stats("1 2\n", 3).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_INVALID_PARAMETER);

        assert!(parse_stats("1 nan? 3", 3).is_err());
    }
}
