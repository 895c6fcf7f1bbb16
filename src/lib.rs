//! YoloDecode turns raw YOLO-family detection/segmentation outputs into
//! frame-space detections.
//!
//! The crate covers postprocessing only: it takes the tensors a model runner
//! produced for one frame and returns class-labelled, duplicate-free boxes with
//! optional binary masks. Two export layouts are supported (box-first and
//! score-inline), either storage order, and masks from prototype coefficients
//! or inline per-row fields. Mask projection can run in parallel via the
//! `rayon` feature.
//!
//! ```
//! use yolodecode::{ClassTable, FrameSize, InputSize, Pipeline, PipelineConfig};
//! use yolodecode::{RawOutput, RawTensor};
//!
//! let classes = ClassTable::new(["cat", "dog", "bird"]);
//! let config = PipelineConfig {
//!     input_size: InputSize::square(100),
//!     letterbox: false,
//!     ..PipelineConfig::default()
//! };
//! let pipeline = Pipeline::new(classes, config).unwrap();
//!
//! let row = [50.0, 50.0, 20.0, 20.0, 0.1, 0.9, 0.2];
//! let shape = [1, 1, 7];
//! let output = RawOutput::new(RawTensor::new(&row, &shape).unwrap());
//! let detections = pipeline.run(&output, FrameSize::new(200, 200)).unwrap();
//! assert_eq!(detections[0].class_name, "dog");
//! ```

pub mod candidate;
pub mod color;
pub mod decode;
pub mod geometry;
#[cfg(feature = "image-io")]
pub mod io;
pub mod lowlevel;
pub mod mask;
pub mod pipeline;
pub mod preprocess;
pub mod tensor;
mod trace;
pub mod util;

pub use candidate::Candidate;
pub use color::{color_for_class, Rgb};
pub use decode::{Layout, ObjectnessMode};
pub use geometry::{FrameSize, InputSize, ModelBox, PixelRect};
pub use mask::{Mask, MaskActivation, MaskConfig};
pub use pipeline::{ClassTable, Detection, FrameOutcome, Pipeline, PipelineConfig};
pub use tensor::{RawOutput, RawTensor, StorageOrder, TensorView};
pub use util::{DecodeError, DecodeResult};
