//! Fan-out engine: one window definition replicated over several images.
//!
//! The first image is the master. Its window owns the controls; every
//! other image gets a copy of the window that reads the master's
//! controls. When the master goes stale every window redraws from its
//! own original image. There is no shared upstream cache between
//! independent images, so there is nothing to resume from.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use crate::diagnostics::{EngineStats, TickOutcome};
use crate::engine::{Engine, Lifecycle, Phase};
use crate::frontend::Frontend;
use crate::pipeline::{Element, collect_windows};
use crate::types::{EngineConfig, RgbaImage, TrackpipeError};
use crate::window::Window;

/// A decoded image and the identity its window is displayed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Display identity, usually the path it was loaded from.
    pub name: String,
    /// The pixels. Never modified by the engine.
    pub image: RgbaImage,
}

impl SourceImage {
    /// Pair an in-memory image with a display identity.
    #[must_use]
    pub fn new(name: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }
}

/// Decode every path into an RGBA image named after its path.
///
/// Every path is checked for existence before any is decoded.
///
/// # Errors
///
/// Returns [`TrackpipeError::MissingImage`] for the first path that does
/// not exist, or [`TrackpipeError::ImageDecode`] if a file cannot be
/// decoded.
pub fn load_images<P: AsRef<Path>>(
    paths: impl IntoIterator<Item = P>,
) -> Result<Vec<SourceImage>, TrackpipeError> {
    let paths: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    if let Some(missing) = paths.iter().find(|p| !p.exists()) {
        return Err(TrackpipeError::MissingImage(missing.clone()));
    }
    paths
        .iter()
        .map(|path| {
            let image = image::open(path)?.to_rgba8();
            debug!(
                path = %path.display(),
                width = image.width(),
                height = image.height(),
                "loaded image"
            );
            Ok(SourceImage::new(path.display().to_string(), image))
        })
        .collect()
}

/// Make display identities unique by suffixing repeats with `#n`.
fn unique_names(images: &mut [SourceImage]) {
    let mut seen = HashSet::new();
    for image in images {
        let mut name = image.name.clone();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            n += 1;
            name = format!("{}#{n}", image.name);
        }
        image.name = name;
    }
}

/// Fan-out engine.
#[derive(Debug)]
pub struct FanOut {
    /// Master first, then one slave per remaining image.
    windows: Vec<Window>,
    images: Vec<SourceImage>,
    lifecycle: Lifecycle,
}

impl FanOut {
    /// Replicate the single window in `elements` across `images`.
    ///
    /// Bare stages are wrapped into one window first. The master window
    /// is displayed and controlled under the first image's name; each
    /// slave is displayed under its own image's name.
    ///
    /// # Errors
    ///
    /// Returns [`TrackpipeError::TooManyWindows`] for more than one
    /// window, [`TrackpipeError::NoImages`] for an empty image list, and
    /// the construction errors of [`Pipeline::new`](crate::Pipeline::new).
    pub fn new(
        elements: impl IntoIterator<Item = Element>,
        mut images: Vec<SourceImage>,
        config: EngineConfig,
    ) -> Result<Self, TrackpipeError> {
        let lifecycle = Lifecycle::new(config)?;
        let mut windows = collect_windows(elements)?;
        if windows.len() > 1 {
            return Err(TrackpipeError::TooManyWindows(windows.len()));
        }
        let Some(mut master) = windows.pop() else {
            return Err(TrackpipeError::EmptyPipeline);
        };
        if images.is_empty() {
            return Err(TrackpipeError::NoImages);
        }

        unique_names(&mut images);
        master.retarget(&images[0].name);
        let mut windows = Vec::with_capacity(images.len());
        for image in images.iter().skip(1) {
            windows.push(master.replicate(&image.name, master.name()));
        }
        windows.insert(0, master);

        Ok(Self {
            windows,
            images,
            lifecycle,
        })
    }

    /// Build from image files on disk.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`load_images`] and [`new`](Self::new).
    pub fn open<P: AsRef<Path>>(
        elements: impl IntoIterator<Item = Element>,
        paths: impl IntoIterator<Item = P>,
        config: EngineConfig,
    ) -> Result<Self, TrackpipeError> {
        Self::new(elements, load_images(paths)?, config)
    }

    /// Master window first, then the slaves in image order.
    #[must_use]
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    /// The window whose controls drive every other window.
    #[must_use]
    pub fn master(&self) -> Option<&Window> {
        self.windows.first()
    }

    /// The original images, in the order given.
    #[must_use]
    pub fn images(&self) -> &[SourceImage] {
        &self.images
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.lifecycle.config
    }

    fn initialize(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError> {
        let mut windows = self.windows.iter();
        if let Some(master) = windows.next() {
            master.register(&mut *frontend.controls)?;
        }
        for slave in windows {
            slave.verify_controls(&*frontend.controls)?;
        }
        for window in &self.windows {
            frontend.surface.ensure_open(window.name());
        }
        info!(images = self.images.len(), "fan-out started");

        self.redraw_all(frontend)?;
        self.lifecycle.phase = Phase::Running;
        Ok(TickOutcome::Redrawn {
            from_window: 0,
            windows: self.windows.len(),
        })
    }

    fn step(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError> {
        if let Some(reason) = self
            .lifecycle
            .poll(frontend, self.windows.iter().map(Window::name))
        {
            return Ok(self.lifecycle.terminate(frontend, reason));
        }

        let Some((master, slaves)) = self.windows.split_first_mut() else {
            return Ok(TickOutcome::Idle);
        };
        if master.stale_index(&*frontend.controls)?.is_none() {
            self.lifecycle.stats.idle_ticks += 1;
            trace!(tick = self.lifecycle.stats.ticks, "master clean");
            return Ok(TickOutcome::Idle);
        }
        for slave in slaves {
            slave.refresh(&*frontend.controls)?;
        }

        debug!(
            tick = self.lifecycle.stats.ticks,
            windows = self.windows.len(),
            "master changed, redrawing every image"
        );
        self.redraw_all(frontend)?;
        self.lifecycle.stats.redraw_ticks += 1;
        Ok(TickOutcome::Redrawn {
            from_window: 0,
            windows: self.windows.len(),
        })
    }

    /// Draw every window from its own original image.
    fn redraw_all(&mut self, frontend: &mut Frontend<'_>) -> Result<(), TrackpipeError> {
        let policy = self.lifecycle.config.on_transform_error;
        for (window, source) in self.windows.iter_mut().zip(&self.images) {
            let report = window.draw(&source.image, &mut *frontend.surface, policy)?;
            self.lifecycle.stats.record_draw(report);
        }
        Ok(())
    }
}

impl Engine for FanOut {
    fn tick(&mut self, frontend: &mut Frontend<'_>) -> Result<TickOutcome, TrackpipeError> {
        match self.lifecycle.phase {
            Phase::Initializing => self.initialize(frontend),
            Phase::Running => self.step(frontend),
            Phase::Terminated(reason) => Ok(TickOutcome::Terminated(reason)),
        }
    }

    fn stats(&self) -> &EngineStats {
        &self.lifecycle.stats
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operator::Operator;
    use crate::param::{ParamSpec, ParamValues};
    use crate::stage::Stage;
    use crate::types::OperatorError;

    #[derive(Clone)]
    struct Keep;

    impl Operator for Keep {
        fn params(&self) -> Vec<ParamSpec> {
            vec![ParamSpec::new("k")]
        }

        fn transform(
            &self,
            image: &RgbaImage,
            _params: &ParamValues<'_>,
        ) -> Result<RgbaImage, OperatorError> {
            Ok(image.clone())
        }
    }

    fn images(names: &[&str]) -> Vec<SourceImage> {
        names
            .iter()
            .map(|n| SourceImage::new(*n, RgbaImage::new(2, 2)))
            .collect()
    }

    #[test]
    fn slaves_track_the_master() {
        let fan = FanOut::new(
            [Stage::new(Keep).into()],
            images(&["a.png", "b.png", "c.png"]),
            EngineConfig::default(),
        )
        .unwrap();

        let names: Vec<_> = fan.windows().iter().map(Window::name).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
        assert!(
            fan.windows()
                .iter()
                .all(|w| w.control_source() == "a.png")
        );
    }

    #[test]
    fn more_than_one_window_is_rejected() {
        let err = FanOut::new(
            [
                Window::new("x", vec![]).unwrap().into(),
                Window::new("y", vec![]).unwrap().into(),
            ],
            images(&["a.png"]),
            EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TrackpipeError::TooManyWindows(2)));
    }

    #[test]
    fn no_images_is_rejected() {
        let err =
            FanOut::new([Stage::new(Keep).into()], Vec::new(), EngineConfig::default()).unwrap_err();
        assert!(matches!(err, TrackpipeError::NoImages));
    }

    #[test]
    fn repeated_image_names_get_distinct_identities() {
        let mut list = images(&["a.png", "a.png", "b.png", "a.png"]);
        unique_names(&mut list);
        let names: Vec<_> = list.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["a.png", "a.png#2", "b.png", "a.png#3"]);
    }

    #[test]
    fn load_images_reports_first_missing_path() {
        let err = load_images(["/definitely/not/here.png"]).unwrap_err();
        assert!(matches!(err, TrackpipeError::MissingImage(ref p) if p.ends_with("here.png")));
    }
}
