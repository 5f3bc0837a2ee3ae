use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::capture::domain::frame_source::{share, FrameSource, FrameSourceFactory, SharedFrameSource};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum StillImageError {
    #[error("unsupported image extension: {0}")]
    UnsupportedExtension(PathBuf),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Serves a single image file as a live frame source.
///
/// The image is decoded on `start` and dropped on `stop`, so the source
/// follows the same ready/not-ready lifecycle as a camera would. Each start
/// produces a new frame with the next sequence number.
pub struct StillImageSource {
    path: PathBuf,
    frame: Option<Frame>,
    active: bool,
    produced: u64,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
            active: false,
            produced: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(&self) -> Result<Frame, StillImageError> {
        let img = image::open(&self.path)
            .map_err(|source| StillImageError::Decode {
                path: self.path.clone(),
                source,
            })?
            .to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::new(img.into_raw(), width, height, 3, 0))
    }
}

impl FrameSource for StillImageSource {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let frame = self.decode()?.with_sequence(self.produced);
        self.produced += 1;
        log::info!(
            "Still image source {} started ({}x{}x{}, frame #{})",
            self.path.display(),
            frame.width(),
            frame.height(),
            frame.channels(),
            frame.sequence()
        );
        self.frame = Some(frame);
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
        self.frame = None;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.frame.as_ref().map(|f| (f.width(), f.height()))
    }

    fn current_frame(&self) -> Option<&Frame> {
        if self.active {
            self.frame.as_ref()
        } else {
            None
        }
    }
}

/// Builds a [`StillImageSource`] for managers that own their source.
pub struct StillImageSourceFactory {
    path: PathBuf,
}

impl StillImageSourceFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSourceFactory for StillImageSourceFactory {
    fn create(&self) -> Result<SharedFrameSource, Box<dyn std::error::Error>> {
        if !is_image(&self.path) {
            return Err(StillImageError::UnsupportedExtension(self.path.clone()).into());
        }
        Ok(share(StillImageSource::new(self.path.clone())))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("face.png");
        image::RgbImage::from_pixel(width, height, image::Rgb([90, 60, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_not_ready_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let source = StillImageSource::new(write_png(dir.path(), 8, 4));
        assert!(!source.is_active());
        assert!(!source.is_ready());
        assert!(source.dimensions().is_none());
    }

    #[test]
    fn test_start_decodes_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = StillImageSource::new(write_png(dir.path(), 8, 4));
        source.start().unwrap();

        assert!(source.is_active());
        assert!(source.is_ready());
        assert_eq!(source.dimensions(), Some((8, 4)));
        let frame = source.current_frame().unwrap();
        assert_eq!(&frame.data()[..3], &[90, 60, 30]);
    }

    #[test]
    fn test_restart_produces_next_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = StillImageSource::new(write_png(dir.path(), 8, 4));
        source.start().unwrap();
        assert_eq!(source.current_frame().unwrap().sequence(), 0);

        source.stop();
        source.start().unwrap();
        assert_eq!(source.current_frame().unwrap().sequence(), 1);
    }

    #[test]
    fn test_failed_start_keeps_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 8, 4);
        let mut source = StillImageSource::new(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(source.start().is_err());

        write_png(dir.path(), 8, 4);
        source.start().unwrap();
        assert_eq!(source.current_frame().unwrap().sequence(), 0);
    }

    #[test]
    fn test_stop_releases_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = StillImageSource::new(write_png(dir.path(), 8, 4));
        source.start().unwrap();
        source.stop();

        assert!(!source.is_active());
        assert!(source.current_frame().is_none());
    }

    #[test]
    fn test_start_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = StillImageSource::new(dir.path().join("missing.png"));
        assert!(source.start().is_err());
        assert!(!source.is_active());
    }

    #[test]
    fn test_factory_rejects_non_image_path() {
        let factory = StillImageSourceFactory::new("clip.mp4");
        assert!(factory.create().is_err());
    }

    #[test]
    fn test_factory_creates_inactive_source() {
        let dir = tempfile::tempdir().unwrap();
        let factory = StillImageSourceFactory::new(write_png(dir.path(), 2, 2));
        let source = factory.create().unwrap();
        assert!(!source.lock().unwrap().is_active());
    }
}
