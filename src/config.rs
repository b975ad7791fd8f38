use super::{Error, Result};
use clap::Parser;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const IMAGE_EXTENSION: &str = "png";
pub const ANIMATION_EXTENSION: &str = "gif";

/// Batch rendering configuration
#[derive(Parser, Serialize, Debug, Clone, PartialEq)]
#[command(
    name = "cfd_visual",
    about = "Create initial condition images and GIF animations from CFDBench 3D data"
)]
pub struct RunConfig {
    /// Name of the CFDBench subdataset
    #[arg(long)]
    pub name: String,
    /// Root directory of the CFDBench subdataset
    #[arg(long)]
    pub dir: PathBuf,
    /// Directory to save log files
    #[arg(long, alias = "log_dir", default_value = "log")]
    pub log_dir: PathBuf,
    /// Temporary directory to save PNG frames
    #[arg(long, alias = "temp_dir", default_value = "temp_gif_frames")]
    pub temp_dir: PathBuf,
    /// Output directory to save images and GIF files
    #[arg(long, alias = "out_dir", default_value = "gif")]
    pub out_dir: PathBuf,
    /// Variable names to render
    #[arg(long, num_args = 1.., required = true)]
    pub vars: Vec<String>,
    /// Data split names to render
    #[arg(long, num_args = 1.., required = true)]
    pub types: Vec<String>,
    /// First case index of each data split
    #[arg(long, alias = "cases_start", num_args = 1.., required = true)]
    pub cases_start: Vec<u32>,
    /// End (exclusive) case index of each data split
    #[arg(long, alias = "cases_end", num_args = 1.., required = true)]
    pub cases_end: Vec<u32>,
    /// Axis to slice the 3D data along
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub axis: i64,
    /// Duration of each animation frame in seconds
    #[arg(long, default_value_t = 0.1, allow_negative_numbers = true)]
    pub duration: f64,
    /// Maximum number of frames of an animation
    #[arg(long, alias = "max_frames", default_value_t = 40)]
    pub max_frames: usize,
}

impl RunConfig {
    /// Checks the configuration before any work is done
    pub fn validate(&self) -> Result<()> {
        if !(0..=2).contains(&self.axis) {
            return Err(Error::InvalidArgument(format!(
                "axis must be 0, 1, or 2, found {}",
                self.axis
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "duration must be positive, found {}",
                self.duration
            )));
        }
        if self.max_frames == 0 {
            return Err(Error::InvalidArgument(
                "maximum number of frames must be positive".into(),
            ));
        }
        if self.types.len() != self.cases_start.len() || self.cases_start.len() != self.cases_end.len()
        {
            return Err(Error::InvalidArgument(format!(
                "length of types ({}), cases_start ({}) and cases_end ({}) must be the same",
                self.types.len(),
                self.cases_start.len(),
                self.cases_end.len()
            )));
        }
        if let Some((name, (start, end))) = self
            .types
            .iter()
            .zip(self.cases_start.iter().zip(&self.cases_end))
            .find(|(_, (start, end))| start > end)
        {
            return Err(Error::InvalidArgument(format!(
                "cases of {name} start at {start} after they end at {end}"
            )));
        }
        Ok(())
    }
    /// Returns the slicing axis, assuming a validated configuration
    pub fn slice_axis(&self) -> usize {
        self.axis.clamp(0, 2) as usize
    }
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration)
    }
    /// Returns the SHA-256 hex digest of the configuration
    pub fn run_identity(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{:x}", Sha256::digest(json.as_bytes())))
    }
    /// Returns the temporary directory of this run
    pub fn work_dir(&self) -> Result<PathBuf> {
        Ok(self.temp_dir.join(self.run_identity()?))
    }
    /// Returns the root of this dataset's outputs
    pub fn output_root(&self) -> PathBuf {
        self.out_dir.join(&self.name)
    }
    pub fn log_path(&self, split: &DataSplit) -> PathBuf {
        self.log_dir.join(format!("{}_{}.log", self.name, split.name))
    }
    pub fn splits(&self) -> Vec<DataSplit> {
        self.types
            .iter()
            .zip(self.cases_start.iter().zip(&self.cases_end))
            .map(|(name, (&start, &end))| DataSplit {
                name: name.clone(),
                cases: start..end,
            })
            .collect()
    }
}

/// A named range of cases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSplit {
    pub name: String,
    pub cases: Range<u32>,
}

impl DataSplit {
    /// Returns the targets of this split, case by case and variable by variable
    pub fn targets<'a>(&'a self, vars: &'a [String]) -> impl Iterator<Item = RenderTarget> + 'a {
        self.cases.clone().flat_map(move |case| {
            vars.iter().map(move |variable| RenderTarget {
                split: self.name.clone(),
                case,
                variable: variable.clone(),
            })
        })
    }
}

/// One array file and its two outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub split: String,
    pub case: u32,
    pub variable: String,
}

impl RenderTarget {
    fn case_dir(&self) -> String {
        format!("case{:04}", self.case)
    }
    /// `{root}/{split}/case{NNNN}/{variable}.npy`
    pub fn input_path(&self, root: &Path) -> PathBuf {
        root.join(&self.split)
            .join(self.case_dir())
            .join(format!("{}.npy", self.variable))
    }
    /// `{out_root}/{split}/case{NNNN}/{variable}_ic.png`
    pub fn still_path(&self, out_root: &Path) -> PathBuf {
        out_root
            .join(&self.split)
            .join(self.case_dir())
            .join(format!("{}_ic.{IMAGE_EXTENSION}", self.variable))
    }
    /// `{out_root}/{split}/case{NNNN}/{variable}.gif`
    pub fn animation_path(&self, out_root: &Path) -> PathBuf {
        out_root
            .join(&self.split)
            .join(self.case_dir())
            .join(format!("{}.{ANIMATION_EXTENSION}", self.variable))
    }
}

impl std::fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.split, self.case_dir(), self.variable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> std::result::Result<RunConfig, clap::Error> {
        let mut args = vec![
            "cfd_visual",
            "--name",
            "cylinder",
            "--dir",
            "data/cylinder",
            "--vars",
            "u",
            "v",
        ];
        args.extend_from_slice(extra);
        RunConfig::try_parse_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&[
            "--types",
            "bc",
            "geo",
            "--cases-start",
            "0",
            "0",
            "--cases-end",
            "50",
            "20",
        ])
        .unwrap();
        assert_eq!(config.axis, 0);
        assert_eq!(config.duration, 0.1);
        assert_eq!(config.max_frames, 40);
        assert_eq!(config.log_dir, PathBuf::from("log"));
        assert_eq!(config.temp_dir, PathBuf::from("temp_gif_frames"));
        assert_eq!(config.out_dir, PathBuf::from("gif"));
        assert_eq!(config.vars, ["u", "v"]);
        config.validate().unwrap();
        assert_eq!(
            config.splits(),
            vec![
                DataSplit { name: "bc".into(), cases: 0..50 },
                DataSplit { name: "geo".into(), cases: 0..20 },
            ]
        );
    }

    #[test]
    fn underscore_aliases() {
        let config = parse(&[
            "--types",
            "bc",
            "--cases_start",
            "3",
            "--cases_end",
            "5",
            "--max_frames",
            "7",
            "--log_dir",
            "logs",
            "--out_dir",
            "out",
            "--temp_dir",
            "tmp",
        ])
        .unwrap();
        assert_eq!(config.cases_start, [3]);
        assert_eq!(config.max_frames, 7);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn rejects_bad_axis() {
        for axis in ["5", "-1"] {
            let config = parse(&[
                "--types", "bc", "--cases-start", "0", "--cases-end", "1", "--axis", axis,
            ])
            .unwrap();
            assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn rejects_non_positive_duration() {
        for duration in ["0", "-0.5"] {
            let config = parse(&[
                "--types", "bc", "--cases-start", "0", "--cases-end", "1", "--duration", duration,
            ])
            .unwrap();
            assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn rejects_mismatched_lists() {
        let config = parse(&[
            "--types", "bc", "geo", "--cases-start", "0", "--cases-end", "1", "2",
        ])
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn rejects_reversed_case_range() {
        let config = parse(&["--types", "bc", "--cases-start", "4", "--cases-end", "1"]).unwrap();
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn run_identity_tracks_configuration() {
        let a = parse(&["--types", "bc", "--cases-start", "0", "--cases-end", "1"]).unwrap();
        let mut b = a.clone();
        assert_eq!(a.run_identity().unwrap(), b.run_identity().unwrap());
        b.max_frames = 10;
        assert_ne!(a.run_identity().unwrap(), b.run_identity().unwrap());
        let id = a.run_identity().unwrap();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a.work_dir().unwrap(), PathBuf::from("temp_gif_frames").join(id));
    }

    #[test]
    fn file_layout() {
        let target = RenderTarget {
            split: "bc".into(),
            case: 7,
            variable: "u".into(),
        };
        assert_eq!(
            target.input_path(Path::new("data")),
            PathBuf::from("data/bc/case0007/u.npy")
        );
        assert_eq!(
            target.still_path(Path::new("gif/cylinder")),
            PathBuf::from("gif/cylinder/bc/case0007/u_ic.png")
        );
        assert_eq!(
            target.animation_path(Path::new("gif/cylinder")),
            PathBuf::from("gif/cylinder/bc/case0007/u.gif")
        );
        assert_eq!(target.to_string(), "bc/case0007/u");
    }

    #[test]
    fn targets_are_half_open() {
        let split = DataSplit { name: "bc".into(), cases: 2..4 };
        let vars = vec!["u".to_string(), "v".to_string()];
        let targets: Vec<_> = split.targets(&vars).map(|t| t.to_string()).collect();
        assert_eq!(
            targets,
            ["bc/case0002/u", "bc/case0002/v", "bc/case0003/u", "bc/case0003/v"]
        );
    }
}
