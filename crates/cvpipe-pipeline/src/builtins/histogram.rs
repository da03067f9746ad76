use cvpipe_image::{ChannelImage, DynImage, Image, ImageSize, PixelData};
use cvpipe_imgproc::histogram;

use super::{require_gray_u8, with_dst};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

const MAX_RANGE: f64 = 1e6;

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "equalize_hist",
        equalize_hist,
        TransformSpec::new("Spread the intensities of a gray image over the full range"),
    )?;

    registry.register(
        "clahe",
        clahe,
        TransformSpec::new("Contrast limited adaptive histogram equalization")
            .param(ParamSpec::float("clip_limit", 0.0, 1000.0, 2.0))
            .param(ParamSpec::size("tile_grid", 1, 256, (8, 8))),
    )?;

    registry.register(
        "calc_hist",
        calc_hist,
        TransformSpec::new("Histogram of one channel as a single column f32 image")
            .inputs(1, 2)
            .param(ParamSpec::int("channel", 0, 2, 0))
            .param(ParamSpec::int("bins", 1, 256, 256))
            .param(ParamSpec::vector("range", -MAX_RANGE, MAX_RANGE, &[0.0, 256.0])),
    )?;

    registry.register(
        "calc_hist_2d",
        calc_hist_2d,
        TransformSpec::new("Joint histogram of two channels as a f32 image")
            .param(ParamSpec::size("channels", 0, 2, (0, 1)))
            .param(ParamSpec::size("bins", 1, 1024, (256, 180)))
            .param(ParamSpec::vector("range_x", -MAX_RANGE, MAX_RANGE, &[0.0, 256.0]))
            .param(ParamSpec::vector("range_y", -MAX_RANGE, MAX_RANGE, &[0.0, 180.0])),
    )?;

    Ok(())
}

fn equalize_hist(inputs: &[&DynImage], _params: &Params) -> Result<DynImage, TransformError> {
    let src = require_gray_u8(inputs[0], "equalize_hist")?;
    let dst = with_dst(src.size(), |dst| histogram::equalize_histogram(src, dst))?;
    Ok(DynImage::gray_u8(dst))
}

fn clahe(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let src = require_gray_u8(inputs[0], "clahe")?;
    let clip_limit = params.float("clip_limit")?;
    let tile_grid = params.size("tile_grid")?;

    let dst = with_dst(src.size(), |dst| {
        histogram::clahe(src, dst, clip_limit, tile_grid)
    })?;
    Ok(DynImage::gray_u8(dst))
}

fn calc_hist(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let channel = params.usize("channel")?;
    let bins = params.usize("bins")?;
    let [lo, hi] = params.vector::<2>("range")?;

    let mask = match inputs.get(1) {
        Some(mask) => Some(require_gray_u8(mask, "the calc_hist mask")?),
        None => None,
    };

    let counts = match inputs[0].pixels() {
        PixelData::U8(ChannelImage::Mono(src)) => {
            histogram::calc_hist(src, channel, mask, bins, (lo, hi))?
        }
        PixelData::U8(ChannelImage::Color(src)) => {
            histogram::calc_hist(src, channel, mask, bins, (lo, hi))?
        }
        PixelData::F32(ChannelImage::Mono(src)) => {
            histogram::calc_hist(src, channel, mask, bins, (lo, hi))?
        }
        PixelData::F32(ChannelImage::Color(src)) => {
            histogram::calc_hist(src, channel, mask, bins, (lo, hi))?
        }
    };

    let size = ImageSize {
        width: 1,
        height: bins,
    };
    Ok(DynImage::gray_f32(Image::new(size, counts)?))
}

fn calc_hist_2d(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let channels = params.size("channels")?;
    let bins = params.size("bins")?;
    let [x0, x1] = params.vector::<2>("range_x")?;
    let [y0, y1] = params.vector::<2>("range_y")?;
    let (range_x, range_y) = ((x0, x1), (y0, y1));

    let counts = match inputs[0].pixels() {
        PixelData::U8(ChannelImage::Mono(src)) => {
            histogram::calc_hist_2d(src, channels, bins, range_x, range_y)?
        }
        PixelData::U8(ChannelImage::Color(src)) => {
            histogram::calc_hist_2d(src, channels, bins, range_x, range_y)?
        }
        PixelData::F32(ChannelImage::Mono(src)) => {
            histogram::calc_hist_2d(src, channels, bins, range_x, range_y)?
        }
        PixelData::F32(ChannelImage::Color(src)) => {
            histogram::calc_hist_2d(src, channels, bins, range_x, range_y)?
        }
    };

    let size = ImageSize {
        width: bins.0,
        height: bins.1,
    };
    Ok(DynImage::gray_f32(Image::new(size, counts)?))
}

#[cfg(test)]
mod tests {
    use cvpipe_image::{ColorSpace, Depth};
    use serde_json::json;

    use super::super::testing::{gray, rgb, run};
    use super::*;

    #[test]
    fn histograms_are_float_columns() -> Result<(), TransformError> {
        let image = gray(4, 1, vec![0, 0, 128, 255]);

        let hist = run("calc_hist", &[&image], &[("bins", json!(2))])?;
        assert_eq!(hist.depth(), Depth::F32);
        assert_eq!((hist.width(), hist.height()), (1, 2));
        assert_eq!(hist.to_f32()?.as_slice(), &[2.0, 2.0]);

        let mask = gray(4, 1, vec![0, 255, 255, 0]);
        let masked = run("calc_hist", &[&image, &mask], &[("bins", json!(2))])?;
        assert_eq!(masked.to_f32()?.as_slice(), &[1.0, 1.0]);

        let color = rgb(2, 1, vec![10, 200, 0, 200, 10, 0]);
        let joint = run(
            "calc_hist_2d",
            &[&color],
            &[
                ("bins", json!([2, 2])),
                ("range_x", json!([0, 256])),
                ("range_y", json!([0, 256])),
            ],
        )?;
        assert_eq!((joint.width(), joint.height()), (2, 2));
        assert_eq!(joint.to_f32()?.as_slice(), &[0.0, 1.0, 1.0, 0.0]);

        Ok(())
    }

    #[test]
    fn equalization_needs_gray_u8() -> Result<(), TransformError> {
        let image = gray(4, 1, vec![10, 10, 20, 30]);
        let equalized = run("equalize_hist", &[&image], &[])?;
        assert_eq!(equalized.to_u8()?.as_slice(), &[0, 0, 128, 255]);

        let flat = gray(16, 16, vec![90; 256]);
        let clahe = run("clahe", &[&flat], &[("tile_grid", json!([2, 2]))])?;
        assert_eq!(clahe.size(), flat.size());

        let color = rgb(1, 1, vec![1, 2, 3]);
        assert!(run("equalize_hist", &[&color], &[]).is_err());
        assert!(run("clahe", &[&color], &[]).is_err());

        Ok(())
    }

    #[test]
    fn joint_histogram_shape_follows_bins() -> Result<(), TransformError> {
        let hsv = rgb(2, 1, vec![100, 200, 255, 20, 40, 255]).with_color_space(ColorSpace::Hsv)?;

        let joint = run(
            "calc_hist_2d",
            &[&hsv],
            &[
                ("bins", json!([4, 2])),
                ("range_x", json!([0, 256])),
                ("range_y", json!([0, 180])),
            ],
        )?;
        assert_eq!((joint.width(), joint.height()), (4, 2));

        #[rustfmt::skip]
        assert_eq!(joint.to_f32()?.as_slice(), &[
            1.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]);

        Ok(())
    }

    #[test]
    fn clahe_keeps_flat_images_flat() -> Result<(), TransformError> {
        for (width, height, grid) in [(12, 12, 5), (10, 7, 4)] {
            let flat = gray(width, height, vec![90; width * height]);
            let out = run("clahe", &[&flat], &[("tile_grid", json!([grid, grid]))])?;

            let samples = out.to_u8()?;
            let first = samples.as_slice()[0];
            assert!(samples.as_slice().iter().all(|&v| v == first));
        }

        Ok(())
    }
}
