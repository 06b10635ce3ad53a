//! Thumbnail generation.
//!
//! A thumbnail is a reduced copy of a stored image, written under the same name into the
//! thumbnail directory. Its presence is the only signal that one exists: generation is
//! asynchronous and best-effort, never retried, and a thumbnail goes stale when its source is
//! overwritten by a path that does not regenerate it (FTP uploads, for instance).
//!
//! The upload path hands work over through the [`ThumbnailScheduler`] trait:
//!
//! - [`DetachedScheduler`] sends jobs over a channel to a dispatcher task, which runs each one
//!   on the blocking pool. The uploader never waits and never sees the outcome.
//! - [`InlineScheduler`] runs the job before `submit` returns, for tests and the CLI.
//!
//! Both swallow failures after logging them. A failed job never leaves a partial file behind,
//! because output is staged and renamed into place like every other write.

use crate::CoreConfig;
use filedrop_files::{discard_staged, staging_path_in};
use filedrop_types::FileKey;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Errors raised while producing a thumbnail.
///
/// These never reach an uploading client.
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error("no image encoder for {0}")]
    UnsupportedFormat(FileKey),
    #[error("failed to decode {path}: {source}", path = path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode thumbnail for {name}: {source}")]
    Encode {
        name: FileKey,
        #[source]
        source: image::ImageError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request to derive a thumbnail from a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailJob {
    /// Location of the stored source file
    pub source: PathBuf,
    /// Name shared by the source and the thumbnail
    pub name: FileKey,
}

/// Produces thumbnails into one output directory.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    output_dir: PathBuf,
    bound: u32,
}

impl ThumbnailGenerator {
    /// `bound` is the edge of the square box thumbnails are fitted into.
    pub fn new(output_dir: PathBuf, bound: u32) -> Self {
        Self { output_dir, bound }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.thumbnail_dir().to_path_buf(), cfg.thumbnail_size())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Final location of the thumbnail for `name`.
    pub fn path_for(&self, name: &FileKey) -> PathBuf {
        self.output_dir.join(name.as_str())
    }

    /// Decode `source`, fit it into the bounding box and write it as `name`.
    ///
    /// The aspect ratio is preserved and the larger dimension ends up at most `bound` pixels;
    /// images already inside the box are re-encoded at their own size rather than enlarged.
    /// Resampling uses Lanczos3. The output format follows the extension of `name`, and any
    /// previous thumbnail of that name is replaced atomically.
    ///
    /// # Errors
    /// Returns `ThumbnailError` if the source cannot be decoded, `name` has no encodable
    /// extension, or the output cannot be written. Nothing is left in the output directory
    /// on failure.
    pub fn generate(&self, source: &Path, name: &FileKey) -> Result<PathBuf, ThumbnailError> {
        let destination = self.path_for(name);
        let format = ImageFormat::from_path(&destination)
            .map_err(|_| ThumbnailError::UnsupportedFormat(name.clone()))?;

        let decode_err = |source_err| ThumbnailError::Decode {
            path: source.to_path_buf(),
            source: source_err,
        };
        let image = image::ImageReader::open(source)?
            .with_guessed_format()?
            .decode()
            .map_err(decode_err)?;

        let thumbnail = fit_within(image, self.bound);
        let thumbnail = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(thumbnail.to_rgb8()),
            _ => thumbnail,
        };

        let staging_path = staging_path_in(&self.output_dir, name)?;
        if let Err(e) = thumbnail.save_with_format(&staging_path, format) {
            discard_staged(&staging_path);
            return Err(ThumbnailError::Encode {
                name: name.clone(),
                source: e,
            });
        }
        if let Err(e) = fs::rename(&staging_path, &destination) {
            discard_staged(&staging_path);
            return Err(ThumbnailError::Io(e));
        }

        Ok(destination)
    }

    /// Run a job, logging its outcome instead of returning it.
    pub fn run(&self, job: &ThumbnailJob) {
        match self.generate(&job.source, &job.name) {
            Ok(path) => tracing::info!(name = %job.name, path = ?path, "generated thumbnail"),
            Err(e) => tracing::warn!(name = %job.name, error = %e, "thumbnail generation failed"),
        }
    }
}

fn fit_within(image: DynamicImage, bound: u32) -> DynamicImage {
    if image.width() <= bound && image.height() <= bound {
        return image;
    }
    image.resize(bound, bound, FilterType::Lanczos3)
}

/// Hand-off point between an ingress path and thumbnail generation.
///
/// `submit` must return without waiting for the job to finish, unless the implementation
/// is explicitly synchronous. It reports nothing back: outcomes are logged.
pub trait ThumbnailScheduler: Send + Sync + std::fmt::Debug {
    fn submit(&self, job: ThumbnailJob);
}

/// Runs each job on the caller's thread before returning.
#[derive(Debug, Clone)]
pub struct InlineScheduler {
    generator: ThumbnailGenerator,
}

impl InlineScheduler {
    pub fn new(generator: ThumbnailGenerator) -> Self {
        Self { generator }
    }
}

impl ThumbnailScheduler for InlineScheduler {
    fn submit(&self, job: ThumbnailJob) {
        self.generator.run(&job);
    }
}

/// Sends jobs to a dispatcher task that runs each one on the blocking pool.
///
/// There is no queue bound and no limit on concurrent generations. Jobs cannot be cancelled
/// once submitted. Two jobs for the same name race and the last rename wins.
#[derive(Debug, Clone)]
pub struct DetachedScheduler {
    sender: mpsc::UnboundedSender<ThumbnailJob>,
}

impl DetachedScheduler {
    /// Start the dispatcher on the current Tokio runtime.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(generator: ThumbnailGenerator) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ThumbnailJob>();

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let generator = generator.clone();
                tokio::task::spawn_blocking(move || generator.run(&job));
            }
            tracing::debug!("thumbnail dispatcher stopped");
        });

        Self { sender }
    }
}

impl ThumbnailScheduler for DetachedScheduler {
    fn submit(&self, job: ThumbnailJob) {
        if let Err(rejected) = self.sender.send(job) {
            tracing::warn!(name = %rejected.0.name, "thumbnail dispatcher is gone; dropping job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use std::time::Duration;
    use tempfile::TempDir;

    fn key(name: &str) -> FileKey {
        FileKey::sanitize(name).unwrap()
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        img.save_with_format(path, ImageFormat::Png).unwrap();
    }

    fn setup() -> (TempDir, PathBuf, ThumbnailGenerator) {
        let temp = TempDir::new().unwrap();
        let source_dir = temp.path().join("uploads");
        let output_dir = temp.path().join("thumbnails");
        fs::create_dir_all(&source_dir).unwrap();
        fs::create_dir_all(&output_dir).unwrap();
        (temp, source_dir, ThumbnailGenerator::new(output_dir, 100))
    }

    fn leftover_staging(generator: &ThumbnailGenerator) -> usize {
        fs::read_dir(generator.output_dir().join(filedrop_files::STAGING_DIR_NAME))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn fits_landscape_image_within_bound() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("wide.png");
        write_png(&source, 400, 200);

        let out = generator.generate(&source, &key("wide.png")).unwrap();
        let thumb = image::open(&out).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 50));
        assert_eq!(leftover_staging(&generator), 0);
    }

    #[test]
    fn fits_portrait_image_within_bound() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("tall.png");
        write_png(&source, 150, 600);

        let out = generator.generate(&source, &key("tall.png")).unwrap();
        let thumb = image::open(&out).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (25, 100));
    }

    #[test]
    fn small_images_are_not_enlarged() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("icon.png");
        write_png(&source, 32, 16);

        let out = generator.generate(&source, &key("icon.png")).unwrap();
        let thumb = image::open(&out).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (32, 16));
    }

    #[test]
    fn jpeg_output_drops_alpha() {
        let (_temp, source_dir, generator) = setup();
        // PNG content under a .jpg name: decoded by content, encoded by name.
        let source = source_dir.join("photo.jpg");
        write_png(&source, 300, 300);

        let out = generator.generate(&source, &key("photo.jpg")).unwrap();
        let reader = image::ImageReader::open(&out)
            .unwrap()
            .with_guessed_format()
            .unwrap();
        assert_eq!(reader.format(), Some(ImageFormat::Jpeg));
        let thumb = reader.decode().unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 100));
    }

    #[test]
    fn regenerating_replaces_previous_thumbnail() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("cat.png");

        write_png(&source, 200, 200);
        generator.generate(&source, &key("cat.png")).unwrap();

        write_png(&source, 400, 100);
        let out = generator.generate(&source, &key("cat.png")).unwrap();
        let thumb = image::open(&out).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 25));
    }

    #[test]
    fn corrupt_source_leaves_no_output() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("broken.png");
        fs::write(&source, b"definitely not a png").unwrap();

        let result = generator.generate(&source, &key("broken.png"));
        assert!(matches!(result, Err(ThumbnailError::Decode { .. })));
        assert!(!generator.path_for(&key("broken.png")).exists());
        assert_eq!(leftover_staging(&generator), 0);
    }

    #[test]
    fn missing_source_is_an_error() {
        let (_temp, source_dir, generator) = setup();
        let result = generator.generate(&source_dir.join("gone.png"), &key("gone.png"));
        assert!(matches!(result, Err(ThumbnailError::Io(_))));
        assert!(!generator.path_for(&key("gone.png")).exists());
    }

    #[test]
    fn unknown_output_extension_is_rejected() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("image.weird");
        write_png(&source, 10, 10);

        let result = generator.generate(&source, &key("image.weird"));
        assert!(matches!(result, Err(ThumbnailError::UnsupportedFormat(_))));
    }

    #[test]
    fn inline_scheduler_swallows_failures() {
        let (_temp, source_dir, generator) = setup();
        let scheduler = InlineScheduler::new(generator.clone());

        let good = source_dir.join("good.gif");
        let img = ImageBuffer::from_pixel(250, 125, Rgb([10u8, 20, 30]));
        DynamicImage::ImageRgb8(img)
            .save_with_format(&good, ImageFormat::Gif)
            .unwrap();
        scheduler.submit(ThumbnailJob {
            source: good,
            name: key("good.gif"),
        });
        scheduler.submit(ThumbnailJob {
            source: source_dir.join("missing.png"),
            name: key("missing.png"),
        });

        assert!(generator.path_for(&key("good.gif")).exists());
        assert!(!generator.path_for(&key("missing.png")).exists());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn detached_scheduler_returns_before_generation() {
        let (_temp, source_dir, generator) = setup();
        let source = source_dir.join("later.png");
        write_png(&source, 500, 250);

        let scheduler = DetachedScheduler::spawn(generator.clone());
        scheduler.submit(ThumbnailJob {
            source,
            name: key("later.png"),
        });

        let target = generator.path_for(&key("later.png"));
        let mut waited = Duration::ZERO;
        while !target.exists() && waited < Duration::from_secs(10) {
            tokio::time::sleep(Duration::from_millis(20)).await;
            waited += Duration::from_millis(20);
        }

        let thumb = image::open(&target).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 50));
    }
}
