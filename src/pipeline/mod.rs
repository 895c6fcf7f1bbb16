//! Frame-level orchestration.
//!
//! A frame runs `decode -> rescale -> suppress -> project -> emit`. No state is
//! carried between calls: a [`Pipeline`] only holds its configuration and the
//! read-only class table, so one instance can serve several threads. Any error
//! aborts the whole frame; there are no partial results.

mod classes;

pub use classes::ClassTable;

use crate::candidate::nms::Suppressor;
use crate::candidate::Candidate;
use crate::color::{color_for_class, Rgb};
use crate::decode::{DecodeParams, Layout, ObjectnessMode};
use crate::geometry::{BoxRescaler, FrameSize, InputSize, PixelRect};
use crate::mask::{Mask, MaskConfig, MaskProjector, MaskSource, Prototypes};
use crate::tensor::{RawOutput, StorageOrder, TensorView};
use crate::trace::{trace_event, trace_span};
use crate::util::{DecodeError, DecodeResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Configuration for a [`Pipeline`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Network input resolution.
    pub input_size: InputSize,
    /// Export layout of the detection tensor.
    pub layout: Layout,
    /// Storage order of the detection tensor; `Auto` infers it from the shape.
    pub storage_order: StorageOrder,
    /// Class score fields per row; defaults to the class table length.
    pub num_classes: Option<usize>,
    /// Score floor; candidates need a strictly higher score.
    pub score_threshold: f32,
    /// IoU at which duplicates are suppressed.
    pub nms_iou_threshold: f32,
    /// The frame was letterboxed onto a top-left anchored square canvas.
    /// Only honoured for square input sizes.
    pub letterbox: bool,
    /// Suppress duplicates across classes.
    pub class_agnostic: bool,
    /// Upper bound on detections per frame.
    pub max_detections: Option<usize>,
    /// Objectness handling for score-inline rows.
    pub objectness: ObjectnessMode,
    /// Mask projection settings.
    pub mask: MaskConfig,
    /// Project masks in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_size: InputSize::square(640),
            layout: Layout::BoxFirst,
            storage_order: StorageOrder::Auto,
            num_classes: None,
            score_threshold: 0.25,
            nms_iou_threshold: 0.45,
            letterbox: true,
            class_agnostic: false,
            max_detections: Some(300),
            objectness: ObjectnessMode::Ignore,
            mask: MaskConfig::default(),
            parallel: false,
        }
    }
}

/// Final per-object result.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
    /// Box clipped to the frame.
    pub bbox: PixelRect,
    /// Binary mask with the same size as `bbox`.
    pub mask: Option<Mask>,
    pub color: Rgb,
}

/// Detections of one frame, or the error that aborted it.
#[derive(Debug, Default)]
pub struct FrameOutcome {
    /// Empty whenever `error` is set.
    pub detections: Vec<Detection>,
    pub error: Option<DecodeError>,
}

impl FrameOutcome {
    /// Returns true when the frame decoded without error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// A candidate that survived rescaling, with both box variants.
struct Placed {
    candidate: Candidate,
    raw: PixelRect,
    clipped: PixelRect,
}

/// Postprocessing pipeline for one model configuration.
pub struct Pipeline {
    classes: ClassTable,
    config: PipelineConfig,
    num_classes: usize,
}

impl Pipeline {
    /// Validates the configuration against the class table.
    pub fn new(classes: ClassTable, config: PipelineConfig) -> DecodeResult<Self> {
        let num_classes = config.num_classes.unwrap_or(classes.len());
        if num_classes == 0 {
            return Err(DecodeError::InvalidInput("class count must be at least 1"));
        }
        if config.input_size.width == 0 || config.input_size.height == 0 {
            return Err(DecodeError::InvalidInput("input size must be non-zero"));
        }
        for value in [
            config.score_threshold,
            config.nms_iou_threshold,
            config.mask.threshold,
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DecodeError::InvalidInput("thresholds must lie in [0, 1]"));
            }
        }
        if config.max_detections == Some(0) {
            return Err(DecodeError::InvalidInput("max_detections must be at least 1"));
        }
        Ok(Self {
            classes,
            config,
            num_classes,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Class table.
    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    /// Class score fields expected per row.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Like [`Pipeline::run`], folding an error into an empty outcome.
    pub fn run_frame(&self, output: &RawOutput<'_>, frame: FrameSize) -> FrameOutcome {
        match self.run(output, frame) {
            Ok(detections) => FrameOutcome {
                detections,
                error: None,
            },
            Err(err) => FrameOutcome {
                detections: Vec::new(),
                error: Some(err),
            },
        }
    }

    /// Decodes one frame's raw output into detections, best first.
    pub fn run(&self, output: &RawOutput<'_>, frame: FrameSize) -> DecodeResult<Vec<Detection>> {
        let _span = trace_span!("pipeline", width = frame.width, height = frame.height).entered();
        let cfg = &self.config;
        let rescaler = BoxRescaler::new(cfg.input_size, frame, cfg.letterbox)?;

        let min_fields = cfg.layout.min_fields(self.num_classes);
        let view = TensorView::from_tensor(output.detections, min_fields, cfg.storage_order)?;
        // Mask tensors are neither read nor validated while masks are off.
        let masks = match output.masks {
            Some(tensor) if cfg.mask.enabled => {
                Some(TensorView::row_aligned(tensor, view.rows())?)
            }
            _ => None,
        };
        let source = if cfg.mask.enabled {
            let prototypes = output
                .prototypes
                .map(Prototypes::from_tensor)
                .transpose()?;
            let coeff_len = match masks {
                Some(masks) => masks.fields(),
                None => view.fields() - min_fields,
            };
            MaskSource::resolve(prototypes, coeff_len)?
        } else {
            None
        };

        let params = DecodeParams {
            num_classes: self.num_classes,
            score_threshold: cfg.score_threshold,
            objectness: cfg.objectness,
        };
        let mut candidates = cfg.layout.decode(view, masks, &params)?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        for candidate in candidates.iter() {
            self.classes.name(candidate.class_id)?;
        }
        if source.is_none() {
            for candidate in candidates.iter_mut() {
                candidate.mask_coeffs = Vec::new();
            }
        }

        let placed = place(candidates, &rescaler);
        let boxes: Vec<PixelRect> = placed.iter().map(|p| p.clipped).collect();
        let scores: Vec<f32> = placed.iter().map(|p| p.candidate.score).collect();
        let class_ids: Vec<usize> = placed.iter().map(|p| p.candidate.class_id).collect();

        let suppressor = Suppressor {
            iou_threshold: cfg.nms_iou_threshold,
            score_threshold: cfg.score_threshold,
            class_agnostic: cfg.class_agnostic,
            max_detections: cfg.max_detections,
        };
        let keep = suppressor.suppress(&boxes, &scores, &class_ids)?;
        let kept: Vec<&Placed> = keep.iter().map(|&idx| &placed[idx]).collect();

        let projector =
            source.map(|source| MaskProjector::new(source, cfg.mask, cfg.input_size));
        let masks = self.project_masks(projector, &kept)?;

        let mut detections = Vec::with_capacity(kept.len());
        for (item, mask) in kept.into_iter().zip(masks) {
            let class_id = item.candidate.class_id;
            detections.push(Detection {
                class_id,
                class_name: self.classes.name(class_id)?.to_owned(),
                confidence: item.candidate.score,
                bbox: item.clipped,
                mask,
                color: color_for_class(class_id),
            });
        }
        Ok(detections)
    }

    fn project_masks(
        &self,
        projector: Option<MaskProjector<'_>>,
        kept: &[&Placed],
    ) -> DecodeResult<Vec<Option<Mask>>> {
        let Some(projector) = projector else {
            return Ok(vec![None; kept.len()]);
        };
        let _span = trace_span!("project_masks", count = kept.len()).entered();

        #[cfg(feature = "rayon")]
        let masks = if self.config.parallel {
            kept.par_iter()
                .map(|item| projector.project(&item.candidate, item.raw, item.clipped))
                .collect::<DecodeResult<Vec<_>>>()?
        } else {
            project_sequential(&projector, kept)?
        };
        #[cfg(not(feature = "rayon"))]
        let masks = project_sequential(&projector, kept)?;

        trace_event!("masks", count = masks.iter().flatten().count());
        Ok(masks)
    }
}

fn project_sequential(
    projector: &MaskProjector<'_>,
    kept: &[&Placed],
) -> DecodeResult<Vec<Option<Mask>>> {
    kept.iter()
        .map(|item| projector.project(&item.candidate, item.raw, item.clipped))
        .collect()
}

/// Rescales candidates into the frame, dropping boxes that clip to nothing.
fn place(candidates: Vec<Candidate>, rescaler: &BoxRescaler) -> Vec<Placed> {
    let total = candidates.len();
    let placed: Vec<Placed> = candidates
        .into_iter()
        .filter_map(|candidate| {
            rescaler
                .to_clipped_pixels(&candidate.bbox)
                .map(|(raw, clipped)| Placed {
                    candidate,
                    raw,
                    clipped,
                })
        })
        .collect();
    trace_event!("degenerate_boxes", count = total - placed.len());
    placed
}
