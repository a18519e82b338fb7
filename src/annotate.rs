//! Drawing detected regions and the coverage overlay

use opencv::{
    core::{Mat, Point, Scalar, Vector},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::color::ColorConverter;
use crate::config::DetectionConfig;
use crate::constants::annotation as defaults;
use crate::detection::{Detection, Region};
use crate::{Result, ScanError};

/// How detected regions are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationStyle {
    /// Labeled axis-aligned rectangle per region
    BoundingBox,
    /// Raw region outlines
    Outline,
}

/// Draws regions and the percentage overlay onto a copy of an image
#[derive(Debug, Clone)]
pub struct Annotator {
    style: AnnotationStyle,
    box_color: Scalar,
    outline_color: Scalar,
    text_color: Scalar,
    region_label: String,
}

impl Annotator {
    /// Build from detection config, parsing the hex colors
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        let converter = ColorConverter::new();
        let annotation = &config.annotation;
        Ok(Self {
            style: config.style,
            box_color: converter.hex_to_bgr_scalar(&annotation.box_color)?,
            outline_color: converter.hex_to_bgr_scalar(&annotation.outline_color)?,
            text_color: converter.hex_to_bgr_scalar(&annotation.text_color)?,
            region_label: annotation.region_label.clone(),
        })
    }

    pub fn style(&self) -> AnnotationStyle {
        self.style
    }

    /// Return an annotated copy of `image`
    pub fn annotate(&self, image: &Mat, detection: &Detection) -> Result<Mat> {
        let mut canvas = image
            .try_clone()
            .map_err(|e| ScanError::opencv("clone", e))?;

        match self.style {
            AnnotationStyle::BoundingBox => self.draw_boxes(&mut canvas, &detection.regions)?,
            AnnotationStyle::Outline => self.draw_outlines(&mut canvas, &detection.regions)?,
        }
        self.draw_percentage(&mut canvas, detection.percentage)?;

        Ok(canvas)
    }

    fn draw_boxes(&self, canvas: &mut Mat, regions: &[Region]) -> Result<()> {
        for region in regions {
            let rect = region.bounding_rect;
            imgproc::rectangle_points(
                canvas,
                Point::new(rect.x, rect.y),
                Point::new(rect.x + rect.width, rect.y + rect.height),
                self.box_color,
                defaults::BOX_THICKNESS,
                LINE_8,
                0,
            )
            .map_err(|e| ScanError::opencv("rectangle", e))?;

            imgproc::put_text(
                canvas,
                &self.region_label,
                Point::new(rect.x, rect.y - defaults::LABEL_OFFSET_Y),
                FONT_HERSHEY_SIMPLEX,
                defaults::LABEL_FONT_SCALE,
                self.box_color,
                defaults::BOX_THICKNESS,
                LINE_8,
                false,
            )
            .map_err(|e| ScanError::opencv("put_text label", e))?;
        }
        Ok(())
    }

    fn draw_outlines(&self, canvas: &mut Mat, regions: &[Region]) -> Result<()> {
        if regions.is_empty() {
            return Ok(());
        }

        let contours: Vector<Vector<Point>> = regions.iter().map(|r| r.contour.clone()).collect();
        imgproc::draw_contours(
            canvas,
            &contours,
            -1, // all
            self.outline_color,
            defaults::OUTLINE_THICKNESS,
            LINE_8,
            &Mat::default(),
            i32::MAX,
            Point::new(0, 0),
        )
        .map_err(|e| ScanError::opencv("draw_contours", e))
    }

    fn draw_percentage(&self, canvas: &mut Mat, percentage: f64) -> Result<()> {
        let origin = Point::new(
            defaults::OVERLAY_X,
            canvas.rows() - defaults::OVERLAY_BOTTOM_MARGIN,
        );
        imgproc::put_text(
            canvas,
            &overlay_text(percentage),
            origin,
            FONT_HERSHEY_SIMPLEX,
            defaults::OVERLAY_FONT_SCALE,
            self.text_color,
            defaults::OVERLAY_THICKNESS,
            LINE_AA,
            false,
        )
        .map_err(|e| ScanError::opencv("put_text percentage", e))
    }
}

/// Overlay string for a coverage percentage
pub fn overlay_text(percentage: f64) -> String {
    format!("{:.2}% color", percentage)
}
