use std::path::{Path, PathBuf};

use cvpipe_image::DynImage;
use cvpipe_io::ImageFormat;

use crate::error::SinkError;

/// A consumer of named pipeline results.
///
/// The executor presents every output of a successful run in step order, then
/// calls [`ResultSink::finish`] once.
pub trait ResultSink {
    /// Take ownership of a named result.
    fn present(&mut self, name: &str, image: DynImage) -> Result<(), SinkError>;

    /// Called after the last result was presented.
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A sink that drops every result.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn present(&mut self, name: &str, _image: DynImage) -> Result<(), SinkError> {
        log::trace!("discarding `{name}`");
        Ok(())
    }
}

/// A sink that keeps every result in memory.
#[derive(Debug, Default, Clone)]
pub struct CaptureSink {
    images: Vec<(String, DynImage)>,
    finished: bool,
}

impl CaptureSink {
    /// The captured results in presentation order.
    pub fn images(&self) -> &[(String, DynImage)] {
        &self.images
    }

    /// Get a captured result by name.
    pub fn get(&self, name: &str) -> Option<&DynImage> {
        self.images
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, image)| image)
    }

    /// Whether [`ResultSink::finish`] was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl ResultSink for CaptureSink {
    fn present(&mut self, name: &str, image: DynImage) -> Result<(), SinkError> {
        self.images.push((name.to_string(), image));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}

/// A sink that writes every result to `<dir>/<name>.<ext>`.
///
/// Characters outside `[A-Za-z0-9_.-]` are replaced by `_` in the file name.
/// A result whose file name was already written by this sink is rejected with
/// [`SinkError::NameCollision`]. The directory is created on the first write.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    format: ImageFormat,
    written: Vec<PathBuf>,
}

impl FileSink {
    /// Create a sink writing into `dir` with the given encoding.
    pub fn new(dir: impl AsRef<Path>, format: ImageFormat) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            format,
            written: Vec::new(),
        }
    }

    /// The paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// The path a result with the given name is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut stem = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        if stem.is_empty() || stem.chars().all(|c| c == '.') {
            stem = "_".repeat(stem.len().max(1));
        }
        self.dir.join(format!("{stem}.{}", self.format.extension()))
    }
}

impl ResultSink for FileSink {
    fn present(&mut self, name: &str, image: DynImage) -> Result<(), SinkError> {
        let path = self.path_for(name);
        if self.written.contains(&path) {
            return Err(SinkError::NameCollision {
                name: name.to_string(),
                path,
            });
        }

        std::fs::create_dir_all(&self.dir)?;
        cvpipe_io::write_image(&path, &image, self.format)?;
        log::info!("wrote `{name}` to {}", path.display());

        self.written.push(path);
        Ok(())
    }
}

#[cfg(feature = "display")]
mod display {
    use std::io::BufRead;

    use cvpipe_image::{ChannelImage, ColorSpace, DynImage};

    use super::ResultSink;
    use crate::error::SinkError;

    fn unavailable(err: impl std::fmt::Display) -> SinkError {
        SinkError::DisplayUnavailable(err.to_string())
    }

    /// A sink that shows every result in a Rerun viewer.
    ///
    /// Each result is logged under its name. [`ResultSink::finish`] blocks until
    /// Enter is pressed on stdin.
    pub struct DisplaySink {
        rec: rerun::RecordingStream,
    }

    impl DisplaySink {
        /// Spawn a viewer and connect to it.
        pub fn spawn() -> Result<Self, SinkError> {
            let rec = rerun::RecordingStreamBuilder::new("cvpipe")
                .spawn()
                .map_err(unavailable)?;
            Ok(Self { rec })
        }
    }

    impl ResultSink for DisplaySink {
        fn present(&mut self, name: &str, image: DynImage) -> Result<(), SinkError> {
            let size = (image.width() as u32, image.height() as u32);

            // the viewer takes 8-bit gray or rgb samples
            let (samples, model) = match image.to_u8().map_err(unavailable)? {
                ChannelImage::Mono(img) => (img.into_vec(), rerun::ColorModel::L),
                ChannelImage::Color(img) => {
                    let mut samples = img.into_vec();
                    if image.color_space() == ColorSpace::Bgr {
                        samples.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
                    }
                    (samples, rerun::ColorModel::RGB)
                }
            };

            self.rec
                .log(
                    name,
                    &rerun::Image::from_elements(samples.as_slice(), size.into(), model),
                )
                .map_err(unavailable)?;

            Ok(())
        }

        fn finish(&mut self) -> Result<(), SinkError> {
            println!("Press Enter to exit");
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;

            Ok(())
        }
    }
}

#[cfg(feature = "display")]
pub use display::DisplaySink;

#[cfg(test)]
mod tests {
    use cvpipe_image::{Image, ImageSize};

    use super::*;

    fn pixel(value: u8) -> DynImage {
        let size = ImageSize {
            width: 1,
            height: 1,
        };
        match Image::new(size, vec![value]) {
            Ok(img) => DynImage::gray_u8(img),
            Err(err) => panic!("{err}"),
        }
    }

    #[test]
    fn capture_keeps_order() -> Result<(), SinkError> {
        let mut sink = CaptureSink::default();
        sink.present("b", pixel(2))?;
        sink.present("a", pixel(1))?;
        assert!(!sink.is_finished());
        sink.finish()?;

        assert!(sink.is_finished());
        assert_eq!(sink.images()[0].0, "b");
        assert_eq!(sink.get("a"), Some(&pixel(1)));
        assert_eq!(sink.get("c"), None);

        NullSink.present("ignored", pixel(0))?;

        Ok(())
    }

    #[test]
    fn file_names_are_sanitized() {
        let sink = FileSink::new("/out", ImageFormat::Png);
        assert_eq!(sink.path_for("edges"), PathBuf::from("/out/edges.png"));
        assert_eq!(sink.path_for("a/b c"), PathBuf::from("/out/a_b_c.png"));
        assert_eq!(sink.path_for(".."), PathBuf::from("/out/__.png"));
        assert_eq!(sink.path_for(""), PathBuf::from("/out/_.png"));
    }

    #[test]
    fn file_sink_creates_the_directory() -> Result<(), SinkError> {
        let tmp_dir = tempfile::tempdir()?;
        let dir = tmp_dir.path().join("nested").join("out");

        let mut sink = FileSink::new(&dir, ImageFormat::Bmp);
        sink.present("dot", pixel(42))?;

        assert_eq!(sink.written(), &[dir.join("dot.bmp")]);
        assert!(dir.join("dot.bmp").is_file());

        Ok(())
    }

    #[test]
    fn file_sink_refuses_to_overwrite() -> Result<(), SinkError> {
        let tmp_dir = tempfile::tempdir()?;
        let mut sink = FileSink::new(tmp_dir.path(), ImageFormat::Png);

        sink.present("a b", pixel(1))?;
        let res = sink.present("a_b", pixel(2));
        assert!(matches!(
            res,
            Err(SinkError::NameCollision { ref name, ref path })
                if name == "a_b" && *path == tmp_dir.path().join("a_b.png")
        ));

        // the first result is kept
        assert_eq!(sink.written(), &[tmp_dir.path().join("a_b.png")]);
        let kept = cvpipe_io::read_image_any(&sink.written()[0])?;
        assert_eq!(kept, pixel(1));

        Ok(())
    }
}
