#[cfg(test)]
mod tests {
    use crate::config::EstimatorConfig;
    use crate::depth::DepthModel;
    use crate::error::VolumeError;
    use crate::hand::HandDetector;
    use crate::pipeline::VolumePipeline;
    use crate::types::{DepthMap, EstimateRequest, HandLandmarks, Point2D};
    use anyhow::Result;
    use image::{ImageBuffer, Rgb};
    use std::cell::Cell;
    use std::rc::Rc;

    // =========================================================================
    // Scripted capability providers. The trait seams exist exactly so the
    // geometric logic can run against fixed landmarks and synthetic depth
    // instead of real model weights.
    // =========================================================================

    struct ScriptedHands {
        hands: Vec<HandLandmarks>,
    }

    impl HandDetector for ScriptedHands {
        fn detect(&mut self, _frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<Vec<HandLandmarks>> {
            Ok(self.hands.clone())
        }
    }

    /// Flat depth field; records how often inference ran.
    struct FlatDepth {
        calls: Rc<Cell<usize>>,
    }

    impl DepthModel for FlatDepth {
        fn estimate(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<DepthMap> {
            self.calls.set(self.calls.get() + 1);
            let (w, h) = frame.dimensions();
            Ok(DepthMap::from_raw(w, h, vec![5.0; (w * h) as usize]))
        }
    }

    /// Left-to-right depth ramp, so masks on different sides see different means.
    struct RampDepth;

    impl DepthModel for RampDepth {
        fn estimate(&mut self, frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<DepthMap> {
            let (w, h) = frame.dimensions();
            let data = (0..w * h).map(|i| (i % w) as f32).collect();
            Ok(DepthMap::from_raw(w, h, data))
        }
    }

    struct FailingDepth;

    impl DepthModel for FailingDepth {
        fn estimate(&mut self, _frame: &ImageBuffer<Rgb<u8>, Vec<u8>>) -> Result<DepthMap> {
            anyhow::bail!("session run failed")
        }
    }

    // A hand in the lower-right corner: palm spans 0.3 of the frame height,
    // with enough lateral spread for a real hull.
    fn corner_hand() -> HandLandmarks {
        let mut points = Vec::with_capacity(21);
        for i in 0..21 {
            let t = i as f32 / 20.0;
            points.push(Point2D {
                x: 0.80 + 0.08 * (t * std::f32::consts::TAU).cos(),
                y: 0.78 + 0.08 * (t * std::f32::consts::TAU).sin(),
            });
        }
        points[HandLandmarks::WRIST] = Point2D { x: 0.85, y: 0.95 };
        points[HandLandmarks::MIDDLE_FINGER_TIP] = Point2D { x: 0.85, y: 0.65 };
        HandLandmarks::new(points)
    }

    // Wrist and fingertip distinct (palm length fine) but every keypoint on
    // one line, so the hull rasterizes to nothing.
    fn collinear_hand() -> HandLandmarks {
        let points = (0..21)
            .map(|i| Point2D {
                x: 0.2 + 0.6 * i as f32 / 20.0,
                y: 0.5,
            })
            .collect();
        HandLandmarks::new(points)
    }

    /// Dark food disc centered on a light table, away from the corner hand.
    fn plate_frame(size: u32) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        ImageBuffer::from_fn(size, size, |x, y| {
            let c = size as f32 / 2.0;
            let r = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
            if r < size as f32 / 6.0 {
                Rgb([70, 45, 30])
            } else {
                Rgb([235, 230, 225])
            }
        })
    }

    fn test_config() -> EstimatorConfig {
        let mut config = EstimatorConfig::default();
        config.artifacts.save = false;
        config
    }

    fn pipeline_with(
        hands: Vec<HandLandmarks>,
        depth: Box<dyn DepthModel>,
    ) -> VolumePipeline {
        VolumePipeline::new(Box::new(ScriptedHands { hands }), depth, test_config())
    }

    #[test]
    fn no_hand_short_circuits_before_depth() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline = pipeline_with(vec![], Box::new(FlatDepth { calls: calls.clone() }));

        let err = pipeline
            .estimate_frame(&plate_frame(160), &EstimateRequest::new(18.0))
            .unwrap_err();
        assert!(matches!(err, VolumeError::NoHandDetected));
        assert_eq!(calls.get(), 0, "depth stage must not run without a hand");
    }

    #[test]
    fn scale_factor_is_exactly_hand_length_over_palm() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline =
            pipeline_with(vec![corner_hand()], Box::new(FlatDepth { calls }));

        // Palm spans 0.30 of a 160 px frame = 48 px
        let out = pipeline
            .estimate_frame(&plate_frame(160), &EstimateRequest::new(18.0))
            .unwrap();
        assert!((out.hand_pixel_length - 48.0).abs() < 1e-3);
        assert!((out.scale_cm_per_px - 18.0 / 48.0).abs() < 1e-5);
        assert!(out.scale_cm_per_px > 0.0);
    }

    #[test]
    fn uniform_frame_yields_zero_area_and_volume() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline =
            pipeline_with(vec![corner_hand()], Box::new(FlatDepth { calls }));

        // Nothing separable from the table: the food-only mask is empty
        let frame = ImageBuffer::from_pixel(160, 160, Rgb([210u8, 210, 210]));
        let out = pipeline
            .estimate_frame(&frame, &EstimateRequest::new(18.0))
            .unwrap();
        assert_eq!(out.area_cm2, 0.0);
        assert_eq!(out.volume_cm3, 0.0);
    }

    #[test]
    fn estimates_are_bit_identical_across_runs() {
        let frame = plate_frame(160);
        let request = EstimateRequest::new(18.0);

        let run = || {
            pipeline_with(vec![corner_hand()], Box::new(RampDepth))
                .estimate_frame(&frame, &request)
                .unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.depth_ratio.to_bits(), b.depth_ratio.to_bits());
        assert_eq!(a.perspective_factor.to_bits(), b.perspective_factor.to_bits());
        assert_eq!(a.volume_cm3.to_bits(), b.volume_cm3.to_bits());
    }

    #[test]
    fn thickness_floor_holds_through_the_pipeline() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline =
            pipeline_with(vec![corner_hand()], Box::new(FlatDepth { calls }));

        let out = pipeline
            .estimate_frame(&plate_frame(160), &EstimateRequest::new(18.0))
            .unwrap();
        assert!(out.thickness_cm >= 0.1);
    }

    #[test]
    fn volume_scales_linearly_with_bowl_factor() {
        let frame = plate_frame(160);
        let at = |factor: f32| {
            let mut request = EstimateRequest::new(18.0);
            request.bowl_factor = factor;
            pipeline_with(vec![corner_hand()], Box::new(RampDepth))
                .estimate_frame(&frame, &request)
                .unwrap()
                .volume_cm3
        };
        let full = at(1.0);
        let half = at(0.5);
        assert!(full > 0.0, "plate disc should produce nonzero volume");
        assert_eq!(full, 2.0 * half);
    }

    #[test]
    fn collinear_hand_is_empty_mask_not_a_crash() {
        let mut pipeline = pipeline_with(vec![collinear_hand()], Box::new(RampDepth));
        let err = pipeline
            .estimate_frame(&plate_frame(160), &EstimateRequest::new(18.0))
            .unwrap_err();
        assert!(matches!(err, VolumeError::EmptyHandMask));
    }

    #[test]
    fn depth_failure_is_surfaced_not_defaulted() {
        let mut pipeline = pipeline_with(vec![corner_hand()], Box::new(FailingDepth));
        let err = pipeline
            .estimate_frame(&plate_frame(160), &EstimateRequest::new(18.0))
            .unwrap_err();
        assert!(matches!(err, VolumeError::ModelFailure(_)));
    }

    #[test]
    fn implausible_hand_length_is_rejected() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline =
            pipeline_with(vec![corner_hand()], Box::new(FlatDepth { calls: calls.clone() }));

        for bad in [5.0, 30.0, f32::NAN] {
            let err = pipeline
                .estimate_frame(&plate_frame(160), &EstimateRequest::new(bad))
                .unwrap_err();
            assert!(matches!(err, VolumeError::InvalidRequest(_)));
        }
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn malformed_bytes_are_a_decode_failure() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline =
            pipeline_with(vec![corner_hand()], Box::new(FlatDepth { calls }));
        let err = pipeline
            .estimate(b"not an image", &EstimateRequest::new(18.0))
            .unwrap_err();
        assert!(matches!(err, VolumeError::DecodeFailure(_)));
    }

    #[test]
    fn occlusion_requires_a_hand() {
        let calls = Rc::new(Cell::new(0));
        let mut pipeline = pipeline_with(vec![], Box::new(FlatDepth { calls }));
        let err = pipeline.occlude_hand(&plate_frame(64)).unwrap_err();
        assert!(matches!(err, VolumeError::NoHandDetected));
    }
}
