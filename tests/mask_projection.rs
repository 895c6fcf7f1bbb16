use yolodecode::lowlevel::{MaskProjector, MaskSource, Prototypes};
use yolodecode::{
    Candidate, DecodeError, InputSize, MaskActivation, MaskConfig, ModelBox, PixelRect,
    RawTensor,
};

fn candidate(bbox: ModelBox, mask_coeffs: Vec<f32>) -> Candidate {
    Candidate {
        row: 0,
        class_id: 0,
        score: 0.9,
        bbox,
        mask_coeffs,
    }
}

/// Two 4x4 planes: plane 0 is dark on the left half, plane 1 is a diagonal ramp.
fn prototype_data() -> Vec<f32> {
    let mut data = Vec::with_capacity(32);
    for _y in 0..4 {
        for x in 0..4 {
            data.push(if x < 2 { 0.0 } else { 1.0 });
        }
    }
    for y in 0..4 {
        for x in 0..4 {
            data.push((x + y) as f32);
        }
    }
    data
}

fn mask_rows(mask: &yolodecode::Mask) -> Vec<Vec<u8>> {
    mask.data()
        .chunks(mask.width())
        .map(|row| row.to_vec())
        .collect()
}

#[test]
fn prototypes_combine_linearly() {
    let data = prototype_data();
    let tensor = RawTensor::new(&data, &[1, 2, 4, 4]).unwrap();
    let protos = Prototypes::from_tensor(tensor).unwrap();
    assert_eq!((protos.count(), protos.height(), protos.width()), (2, 4, 4));

    let field = protos.combine(&[2.0, 0.5]).unwrap();
    assert_eq!(field[0], 0.0);
    assert_eq!(field[3], 2.0 + 1.5);
    assert_eq!(field[15], 2.0 + 3.0);

    let err = protos.combine(&[1.0]).err().unwrap();
    assert_eq!(
        err,
        DecodeError::ShapeMismatch {
            shape: vec![2, 4, 4],
            reason: "coefficient count differs from prototype count",
        }
    );
}

#[test]
fn mask_source_follows_tensors_present() {
    let data = prototype_data();
    let protos = Prototypes::from_tensor(RawTensor::new(&data, &[1, 2, 4, 4]).unwrap()).unwrap();

    assert!(MaskSource::resolve(None, 0).unwrap().is_none());
    assert!(matches!(
        MaskSource::resolve(Some(protos), 2).unwrap(),
        Some(MaskSource::Coefficients(_))
    ));
    assert!(matches!(
        MaskSource::resolve(None, 16).unwrap(),
        Some(MaskSource::Inline { side: 4 })
    ));

    let err = MaskSource::resolve(Some(protos), 3).err().unwrap();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
    let err = MaskSource::resolve(Some(protos), 0).err().unwrap();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
    let err = MaskSource::resolve(None, 32).err().unwrap();
    assert_eq!(
        err,
        DecodeError::ShapeMismatch {
            shape: vec![32],
            reason: "inline mask field is not square",
        }
    );
}

#[test]
fn zero_coefficients_give_empty_mask_of_box_size() {
    let data = prototype_data();
    let protos = Prototypes::from_tensor(RawTensor::new(&data, &[1, 2, 4, 4]).unwrap()).unwrap();
    let projector = MaskProjector::new(
        MaskSource::Coefficients(protos),
        MaskConfig::default(),
        InputSize::square(4),
    );
    assert!(matches!(projector.source(), MaskSource::Coefficients(p) if p.count() == 2));
    let det = candidate(ModelBox::new(2.0, 2.0, 4.0, 4.0), vec![0.0, 0.0]);
    let raw = PixelRect::new(10, 20, 30, 15);

    let mask = projector.project(&det, raw, raw).unwrap().unwrap();
    assert_eq!((mask.width(), mask.height()), (30, 15));
    assert_eq!(mask.foreground_count(), 0);
}

#[test]
fn mask_pixels_are_binary() {
    let data = prototype_data();
    let protos = Prototypes::from_tensor(RawTensor::new(&data, &[1, 2, 4, 4]).unwrap()).unwrap();
    let projector = MaskProjector::new(
        MaskSource::Coefficients(protos),
        MaskConfig::default(),
        InputSize::square(4),
    );
    let det = candidate(ModelBox::new(2.0, 2.0, 4.0, 4.0), vec![0.0, 1.0]);
    let raw = PixelRect::new(0, 0, 17, 11);

    let mask = projector.project(&det, raw, raw).unwrap().unwrap();
    assert!(mask.data().iter().all(|&v| v == 0 || v == 255));
    assert!(mask.foreground_count() > 0);
    assert!(mask.foreground_count() < 17 * 11);
    // the ramp grows toward the bottom-right corner
    assert_eq!(mask.get(0, 0), Some(0));
    assert_eq!(mask.get(16, 10), Some(255));
}

#[test]
fn inline_field_is_stretched_over_box() {
    let projector = MaskProjector::new(
        MaskSource::Inline { side: 2 },
        MaskConfig::default(),
        InputSize::square(64),
    );
    let det = candidate(ModelBox::new(2.0, 2.0, 4.0, 4.0), vec![0.0, 0.0, 1.0, 1.0]);
    let raw = PixelRect::new(0, 0, 4, 4);

    let mask = projector.project(&det, raw, raw).unwrap().unwrap();
    assert_eq!(
        mask_rows(&mask),
        vec![vec![0; 4], vec![0; 4], vec![255; 4], vec![255; 4]]
    );

    let wrong = candidate(det.bbox, vec![0.0; 9]);
    let err = projector.project(&wrong, raw, raw).err().unwrap();
    assert!(matches!(err, DecodeError::ShapeMismatch { .. }));
}

#[test]
fn clipped_box_samples_its_part_of_the_field() {
    let projector = MaskProjector::new(
        MaskSource::Inline { side: 2 },
        MaskConfig::default(),
        InputSize::square(64),
    );
    let det = candidate(ModelBox::new(0.0, 2.0, 4.0, 4.0), vec![0.0, 1.0, 0.0, 1.0]);
    let raw = PixelRect::new(-2, 0, 4, 4);
    let clipped = PixelRect::new(0, 0, 2, 4);

    let mask = projector.project(&det, raw, clipped).unwrap().unwrap();
    assert_eq!((mask.width(), mask.height()), (2, 4));
    // the visible half is the right half of the field
    assert_eq!(mask.foreground_count(), 8);
}

#[test]
fn zero_area_box_has_no_mask() {
    let projector = MaskProjector::new(
        MaskSource::Inline { side: 2 },
        MaskConfig::default(),
        InputSize::square(64),
    );
    let det = candidate(ModelBox::new(2.0, 2.0, 0.0, 4.0), vec![0.0, 0.0, 1.0, 1.0]);
    let raw = PixelRect::new(2, 0, 0, 4);
    assert!(projector.project(&det, raw, raw).unwrap().is_none());
}

#[test]
fn crop_to_box_samples_window_under_box() {
    let data = prototype_data();
    let protos = Prototypes::from_tensor(RawTensor::new(&data[..16], &[1, 1, 4, 4]).unwrap())
        .unwrap();
    let det = candidate(ModelBox::new(3.0, 2.0, 2.0, 4.0), vec![1.0]);
    let raw = PixelRect::new(0, 0, 4, 4);

    let stretched = MaskProjector::new(
        MaskSource::Coefficients(protos),
        MaskConfig::default(),
        InputSize::square(4),
    );
    let mask = stretched.project(&det, raw, raw).unwrap().unwrap();
    assert_eq!(mask.foreground_count(), 8);

    let cropped = MaskProjector::new(
        MaskSource::Coefficients(protos),
        MaskConfig {
            crop_to_box: true,
            ..MaskConfig::default()
        },
        InputSize::square(4),
    );
    let mask = cropped.project(&det, raw, raw).unwrap().unwrap();
    assert_eq!(mask.foreground_count(), 16);
}

#[test]
fn sigmoid_activation_thresholds_at_zero_logit() {
    let projector = MaskProjector::new(
        MaskSource::Inline { side: 2 },
        MaskConfig {
            activation: MaskActivation::Sigmoid,
            ..MaskConfig::default()
        },
        InputSize::square(64),
    );
    let det = candidate(ModelBox::new(1.0, 1.0, 2.0, 2.0), vec![-6.0, 6.0, -6.0, 6.0]);
    let raw = PixelRect::new(0, 0, 2, 2);
    let mask = projector.project(&det, raw, raw).unwrap().unwrap();
    assert_eq!(mask_rows(&mask), vec![vec![0, 255], vec![0, 255]]);
}
