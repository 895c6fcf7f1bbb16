use yolodecode::lowlevel::BoxRescaler;
use yolodecode::preprocess::{blob_from_rgb, letterbox_square, BlobOptions};
use yolodecode::{
    ClassTable, DecodeError, FrameSize, InputSize, ModelBox, Pipeline, PixelRect, RawTensor,
    StorageOrder, TensorView,
};

fn ramp(rows: usize, fields: usize, order: StorageOrder) -> Vec<f32> {
    let mut data = vec![0.0f32; rows * fields];
    for r in 0..rows {
        for f in 0..fields {
            let idx = match order {
                StorageOrder::ChannelMajor => f * rows + r,
                _ => r * fields + f,
            };
            data[idx] = (r * 10 + f) as f32;
        }
    }
    data
}

#[test]
fn raw_tensor_rejects_small_buffer() {
    let data = [0.0f32; 5];
    let err = RawTensor::new(&data, &[1, 2, 3]).err().unwrap();
    assert_eq!(err, DecodeError::BufferTooSmall { needed: 6, got: 5 });
}

#[test]
fn raw_tensor_rejects_rank_zero() {
    let data = [0.0f32; 1];
    let err = RawTensor::new(&data, &[]).err().unwrap();
    assert_eq!(
        err,
        DecodeError::ShapeMismatch {
            shape: vec![],
            reason: "tensor has rank 0",
        }
    );
}

#[test]
fn channel_major_tensor_reads_as_rows() {
    let data = ramp(8, 6, StorageOrder::ChannelMajor);
    let tensor = RawTensor::new(&data, &[1, 6, 8]).unwrap();
    assert_eq!(tensor.rank(), 3);
    let view = TensorView::from_tensor(tensor, 6, StorageOrder::Auto).unwrap();

    assert_eq!(view.order(), StorageOrder::ChannelMajor);
    assert_eq!(view.rows(), 8);
    assert_eq!(view.fields(), 6);
    assert_eq!(view.get(3, 4), Some(34.0));
    assert_eq!(
        view.row(2).unwrap().to_vec(),
        vec![20.0, 21.0, 22.0, 23.0, 24.0, 25.0]
    );
    assert_eq!(view.to_detection_major(), ramp(8, 6, StorageOrder::DetectionMajor));
}

#[test]
fn detection_major_tensor_is_read_in_place() {
    let data = ramp(8, 6, StorageOrder::DetectionMajor);
    let tensor = RawTensor::new(&data, &[1, 8, 6]).unwrap();
    let view = TensorView::from_tensor(tensor, 6, StorageOrder::Auto).unwrap();

    assert_eq!(view.order(), StorageOrder::DetectionMajor);
    assert_eq!(view.rows(), 8);
    assert_eq!(view.get(7, 5), Some(75.0));
    assert!(view.get(8, 0).is_none());
    assert!(view.get(0, 6).is_none());
}

#[test]
fn single_row_tensor_resolves_either_way() {
    let data: Vec<f32> = (0..7).map(|v| v as f32).collect();

    let tensor = RawTensor::new(&data, &[1, 1, 7]).unwrap();
    let view = TensorView::from_tensor(tensor, 7, StorageOrder::Auto).unwrap();
    assert_eq!((view.rows(), view.fields()), (1, 7));
    assert_eq!(view.order(), StorageOrder::DetectionMajor);

    let tensor = RawTensor::new(&data, &[1, 7, 1]).unwrap();
    let view = TensorView::from_tensor(tensor, 7, StorageOrder::Auto).unwrap();
    assert_eq!((view.rows(), view.fields()), (1, 7));
    assert_eq!(view.order(), StorageOrder::ChannelMajor);
    assert_eq!(view.row(0).unwrap().to_vec(), data);
}

#[test]
fn forced_order_overrides_heuristic() {
    let data = ramp(6, 8, StorageOrder::DetectionMajor);
    let tensor = RawTensor::new(&data, &[1, 6, 8]).unwrap();
    let view = TensorView::from_tensor(tensor, 4, StorageOrder::DetectionMajor).unwrap();
    assert_eq!((view.rows(), view.fields()), (6, 8));
    assert_eq!(view.get(5, 7), Some(57.0));
}

#[test]
fn tensor_too_narrow_for_layout_is_shape_mismatch() {
    let data = [0.0f32; 9];
    let tensor = RawTensor::new(&data, &[1, 3, 3]).unwrap();
    let err = TensorView::from_tensor(tensor, 7, StorageOrder::Auto)
        .err()
        .unwrap();
    assert_eq!(
        err,
        DecodeError::ShapeMismatch {
            shape: vec![1, 3, 3],
            reason: "no axis can hold the layout's fields",
        }
    );

    let data = [0.0f32; 6];
    let tensor = RawTensor::new(&data, &[1, 1, 2, 3]).unwrap();
    let err = TensorView::from_tensor(tensor, 2, StorageOrder::Auto)
        .err()
        .unwrap();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
}

#[test]
fn row_slices_stay_in_bounds() {
    let data = ramp(8, 6, StorageOrder::ChannelMajor);
    let tensor = RawTensor::new(&data, &[1, 6, 8]).unwrap();
    let view = TensorView::from_tensor(tensor, 6, StorageOrder::Auto).unwrap();
    let row = view.row(1).unwrap();

    assert_eq!(row.slice(4, 2).unwrap().to_vec(), vec![14.0, 15.0]);
    assert!(row.slice(4, 3).is_none());
    assert!(row.get(6).is_none());
    assert!(view.row(8).is_none());
}

#[test]
fn row_aligned_views_follow_detection_rows() {
    let data = ramp(8, 4, StorageOrder::DetectionMajor);
    let tensor = RawTensor::new(&data, &[1, 8, 4]).unwrap();
    let view = TensorView::row_aligned(tensor, 8).unwrap();
    assert_eq!(view.order(), StorageOrder::DetectionMajor);
    assert_eq!(view.get(6, 3), Some(63.0));

    let tensor = RawTensor::new(&data, &[1, 8, 2, 2]).unwrap();
    let view = TensorView::row_aligned(tensor, 8).unwrap();
    assert_eq!(view.fields(), 4);

    let data = ramp(8, 4, StorageOrder::ChannelMajor);
    let tensor = RawTensor::new(&data, &[1, 4, 8]).unwrap();
    let view = TensorView::row_aligned(tensor, 8).unwrap();
    assert_eq!(view.order(), StorageOrder::ChannelMajor);
    assert_eq!(view.get(6, 3), Some(63.0));

    let err = TensorView::row_aligned(tensor, 5).err().unwrap();
    assert_eq!(
        err,
        DecodeError::ShapeMismatch {
            shape: vec![1, 4, 8],
            reason: "mask tensor rows do not align with detections",
        }
    );
}

#[test]
fn pixel_rect_iou_and_clipping() {
    let a = PixelRect::new(0, 0, 10, 10);
    let b = PixelRect::new(5, 0, 10, 10);
    assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(a.iou(&PixelRect::new(20, 20, 5, 5)), 0.0);
    assert_eq!(PixelRect::new(0, 0, 0, 10).iou(&PixelRect::new(0, 0, 0, 10)), 0.0);

    let frame = FrameSize::new(10, 10);
    assert_eq!(
        PixelRect::new(-5, -5, 20, 20).clip_to(frame),
        Some(PixelRect::new(0, 0, 10, 10))
    );
    assert_eq!(PixelRect::new(12, 0, 5, 5).clip_to(frame), None);
    assert_eq!(PixelRect::new(3, 3, -2, 4).clip_to(frame), None);
}

#[test]
fn direct_resize_scales_axes_independently() {
    let rescaler =
        BoxRescaler::new(InputSize::square(640), FrameSize::new(1280, 720), false).unwrap();
    assert_eq!(rescaler.x_factor(), 2.0);
    assert_eq!(rescaler.y_factor(), 1.125);
    let rect = rescaler.to_pixels(&ModelBox::new(320.0, 320.0, 64.0, 64.0));
    assert_eq!(rect, PixelRect::new(576, 324, 128, 72));
}

#[test]
fn letterbox_scales_by_square_side_without_offset() {
    let rescaler =
        BoxRescaler::new(InputSize::square(640), FrameSize::new(1280, 720), true).unwrap();
    assert_eq!(rescaler.x_factor(), 2.0);
    assert_eq!(rescaler.y_factor(), 2.0);
    let rect = rescaler.to_pixels(&ModelBox::new(320.0, 160.0, 64.0, 64.0));
    assert_eq!(rect, PixelRect::new(576, 256, 128, 128));

    let (raw, clipped) = rescaler
        .to_clipped_pixels(&ModelBox::new(320.0, 350.0, 64.0, 64.0))
        .unwrap();
    assert_eq!(raw, PixelRect::new(576, 636, 128, 128));
    assert_eq!(clipped, PixelRect::new(576, 636, 128, 84));
}

#[test]
fn letterbox_is_ignored_for_non_square_inputs() {
    let input = InputSize::new(200, 100);
    assert!(!input.is_square());
    let rescaler = BoxRescaler::new(input, FrameSize::new(400, 100), true).unwrap();
    assert_eq!(rescaler.x_factor(), 2.0);
    assert_eq!(rescaler.y_factor(), 1.0);
    assert_eq!(
        rescaler.to_pixels(&ModelBox::new(100.0, 50.0, 20.0, 20.0)),
        PixelRect::new(180, 40, 40, 20)
    );
}

#[test]
fn rescaler_rejects_empty_sizes() {
    let err = BoxRescaler::new(InputSize::square(0), FrameSize::new(10, 10), false)
        .err()
        .unwrap();
    assert_eq!(err, DecodeError::InvalidInput("input size must be non-zero"));
}

#[test]
fn class_table_parses_lines_and_checks_range() {
    let table = ClassTable::from_lines("person\n\n  car \nbus\n");
    assert_eq!(table.len(), 3);
    assert_eq!(table.names(), &["person", "car", "bus"]);
    assert_eq!(table.get(1), Some("car"));
    assert_eq!(
        table.name(5).err().unwrap(),
        DecodeError::ClassIndexOutOfRange {
            class_id: 5,
            len: 3,
        }
    );
}

#[test]
fn letterbox_canvas_is_top_left_anchored() {
    let pixels = [10u8, 20, 30, 40, 50, 60];
    let (canvas, side) = letterbox_square(&pixels, 2, 1).unwrap();
    assert_eq!(side, 2);
    assert_eq!(&canvas[..6], &pixels);
    assert!(canvas[6..].iter().all(|&v| v == 0));
}

#[test]
fn blob_is_planar_and_normalized() {
    let pixels = [255u8, 0, 0].repeat(4);
    let options = BlobOptions {
        input_size: InputSize::square(2),
        letterbox: false,
        swap_rb: false,
    };
    let blob = blob_from_rgb(&pixels, 2, 2, options).unwrap();
    assert_eq!(blob.len(), 12);
    assert!(blob[..4].iter().all(|&v| (v - 1.0).abs() < 1e-6));
    assert!(blob[4..].iter().all(|&v| v.abs() < 1e-6));

    let swapped = blob_from_rgb(
        &pixels,
        2,
        2,
        BlobOptions {
            swap_rb: true,
            ..options
        },
    )
    .unwrap();
    assert!(swapped[8..].iter().all(|&v| (v - 1.0).abs() < 1e-6));
}

#[test]
fn non_square_blob_skips_letterbox() {
    // 2x1 frame into a 2x1 input: letterboxing would pad a zero row in.
    let pixels = [255u8, 255, 255, 255, 255, 255];
    let blob = blob_from_rgb(
        &pixels,
        2,
        1,
        BlobOptions {
            input_size: InputSize::new(2, 1),
            letterbox: true,
            swap_rb: false,
        },
    )
    .unwrap();
    assert_eq!(blob.len(), 6);
    assert!(blob.iter().all(|&v| (v - 1.0).abs() < 1e-6));
}

#[test]
fn pipeline_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Pipeline>();
    assert_send_sync::<ClassTable>();
}
