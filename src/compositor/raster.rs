use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::{Affine, Point, Rgba8};
use crate::foundation::error::{LectioError, LectioResult};

/// One rendered output frame: premultiplied RGBA8, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRGBA {
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Encode as PNG (straight alpha), for stills and previews.
    pub fn to_png(&self) -> LectioResult<Vec<u8>> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        let img = image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| LectioError::evaluation("frame buffer size mismatch"))?;
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(out.into_inner())
    }
}

/// A decoded background image ready to be used as a paint.
#[derive(Clone, Debug)]
pub struct SceneImage {
    pub width: u32,
    pub height: u32,
    pub paint: vello_cpu::Image,
}

/// Decode image bytes to a premultiplied pixmap, downscaling anything larger than `max_w x max_h`.
pub fn decode_scene_image(bytes: &[u8], max_w: u32, max_h: u32) -> LectioResult<SceneImage> {
    let mut dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    if dyn_img.width() > max_w || dyn_img.height() > max_h {
        dyn_img = dyn_img.resize(max_w, max_h, image::imageops::FilterType::Triangle);
    }
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(LectioError::validation("image has zero size"));
    }

    let mut bytes = rgba.into_raw();
    premultiply_rgba8_in_place(&mut bytes);
    Ok(SceneImage {
        width,
        height,
        paint: premul_bytes_to_image(&bytes, width, height)?,
    })
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = crate::foundation::math::mul_div255_u16(u16::from(*c), a) as u8;
        }
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

pub(crate) fn premul_bytes_to_image(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> LectioResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| LectioError::evaluation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| LectioError::evaluation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(LectioError::evaluation("premultiplied image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Single-column alpha ramp: dark above `top`, clear between, dark again below `bottom`.
pub(crate) fn scrim_image(
    color: Rgba8,
    height: u32,
    top: f64,
    bottom: f64,
) -> LectioResult<vello_cpu::Image> {
    const BASE: f64 = 0.22;
    let h = f64::from(height.max(1));
    let mut bytes = Vec::with_capacity(height as usize * 4);
    for y in 0..height.max(1) {
        let yf = f64::from(y) + 0.5;
        let edge = if yf < top {
            1.0 - yf / top.max(1.0)
        } else if yf > bottom {
            (yf - bottom) / (h - bottom).max(1.0)
        } else {
            0.0
        };
        let t = (BASE + (1.0 - BASE) * edge.clamp(0.0, 1.0)) as f32;
        bytes.extend_from_slice(&color.with_opacity(t).to_premul_array());
    }
    premul_bytes_to_image(&bytes, 1, height.max(1))
}

pub(crate) fn color(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn rect_to_cpu(r: crate::foundation::core::Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

/// Flatten any kurbo shape into the rasterizer's path type.
pub(crate) fn shape_to_cpu(shape: &impl kurbo::Shape) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/raster.rs"]
mod tests;
