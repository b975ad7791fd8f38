use super::{
    sample_indices, AnimationEncoder, ArrayLoader, Caption, GifAnimator, HeatmapRenderer,
    NpyLoader, RenderTarget, Result, RunConfig, RunLogger, SliceRenderer,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outputs produced and skipped by one [BatchDriver::run]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub stills: usize,
    pub animations: usize,
    /// Outputs that already existed
    pub skipped: usize,
}

/// Renders every (data split, case, variable) target of a configuration
///
/// An output that already exists is never rendered again, so an interrupted
/// run resumes where it stopped.
pub struct BatchDriver<L, R, E> {
    config: RunConfig,
    loader: L,
    renderer: R,
    encoder: E,
}

impl BatchDriver<NpyLoader, HeatmapRenderer, GifAnimator> {
    /// Creates a driver reading `.npy` files and writing PNG images and GIF animations
    pub fn from_config(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let encoder = GifAnimator::new(config.frame_duration());
        Self::new(config, NpyLoader, HeatmapRenderer::default(), encoder)
    }
}

impl<L, R, E> BatchDriver<L, R, E>
where
    L: ArrayLoader,
    R: SliceRenderer,
    E: AnimationEncoder,
{
    /// Creates a driver, failing on an invalid configuration
    pub fn new(config: RunConfig, loader: L, renderer: R, encoder: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            loader,
            renderer,
            encoder,
        })
    }
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
    /// Renders all missing outputs, stopping at the first failure
    pub fn run(&self) -> Result<RunSummary> {
        let out_root = self.config.output_root();
        let work_dir = self.config.work_dir()?;
        fs::create_dir_all(&out_root)?;
        fs::create_dir_all(&self.config.log_dir)?;

        let mut summary = RunSummary::default();
        for split in self.config.splits() {
            let logger = RunLogger::create(&self.config.log_path(&split))?;
            logger.in_scope(|| {
                info!(
                    split = %split.name,
                    cases = ?split.cases,
                    work_dir = %work_dir.display(),
                    "processing data split"
                );
                for target in split.targets(&self.config.vars) {
                    self.process_target(&target, &out_root, &work_dir, &mut summary)
                        .map_err(|e| {
                            error!("{target}: {e}");
                            e
                        })?;
                }
                Ok::<_, crate::Error>(())
            })?;
        }
        Ok(summary)
    }

    fn process_target(
        &self,
        target: &RenderTarget,
        out_root: &Path,
        work_dir: &Path,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let input = target.input_path(&self.config.dir);

        let still = target.still_path(out_root);
        if still.exists() {
            debug!(path = %still.display(), "image exists, skipping");
            summary.skipped += 1;
        } else {
            self.render_still(&input, &still)?;
            summary.stills += 1;
        }

        let animation = target.animation_path(out_root);
        if animation.exists() {
            debug!(path = %animation.display(), "animation exists, skipping");
            summary.skipped += 1;
        } else {
            self.render_animation(&input, &animation, work_dir)?;
            summary.animations += 1;
        }
        Ok(())
    }

    fn render_still(&self, input: &Path, still: &Path) -> Result<()> {
        let volume = self.loader.load(input)?;
        create_parent(still)?;
        self.renderer.render_slice(
            &volume,
            self.config.slice_axis(),
            0,
            &Caption::InitialCondition,
            still,
        )?;
        info!(path = %still.display(), "PNG image has been successfully saved");
        Ok(())
    }

    fn render_animation(&self, input: &Path, animation: &Path, work_dir: &Path) -> Result<()> {
        let axis = self.config.slice_axis();
        let volume = self.loader.load(input)?;
        let indices = sample_indices(volume.len_of(axis)?, self.config.max_frames)?;
        debug!(frames = indices.len(), "sampled slice indices");

        if work_dir.exists() {
            for entry in fs::read_dir(work_dir)? {
                let stale = entry?.path();
                warn!(path = %stale.display(), "removing leftover file of an interrupted run");
            }
            fs::remove_dir_all(work_dir)?;
        }
        fs::create_dir_all(work_dir)?;
        create_parent(animation)?;

        let mut frames: Vec<PathBuf> = Vec::with_capacity(indices.len());
        for index in indices {
            let frame = work_dir.join(format!("slice_{index}.png"));
            self.renderer
                .render_slice(&volume, axis, index, &Caption::TimeStep(index), &frame)?;
            frames.push(frame);
        }
        self.encoder.encode(&frames, animation, work_dir)?;
        info!(path = %animation.display(), "GIF file has been successfully saved");
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
