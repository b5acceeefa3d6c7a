use lsl_core::{Bucket, DragState, Point, Rect};
use lsl_experiment::{
    BucketPlacement, Correctness, DragController, DragSurface, DragTrial, DragTrialConfig, ExperimentConfig,
    ExperimentError, PointerOutcome, RewardedBucket, SceneSurface, TrialStep, Viewport, assemble,
};
use lsl_timing::ManualTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn two_basket_config(correctness: Correctness) -> DragTrialConfig {
    DragTrialConfig {
        element: "images/stimulus/animal_3.png".into(),
        buckets: vec![
            Bucket::new("images/baskets/basket-green.png", "Emerald Vault"),
            Bucket::new("images/baskets/basket-blue.png", "Azure Haven"),
        ],
        text_prompt: "Drag the relic into a basket.".into(),
        randomize_bucket_order: false,
        bucket_start_angle: 0.0,
        correctness,
    }
}

/// Grabs the draggable at its center and drags it so its center lands `nudge` px right
/// and below the center of `bucket`.
fn drag_onto(trial: &mut DragTrial<SceneSurface, ManualTimer>, timer: &ManualTimer, bucket: usize, nudge: f64) -> TrialStep {
    let start = trial.draggable_rect().center();
    let target = trial.bucket_rect(bucket).unwrap().center().offset_by(nudge, nudge);
    assert_eq!(trial.pointer_down(start), PointerOutcome::Grabbed);
    for step in 1..=10 {
        timer.advance_ms(16);
        let t = step as f64 / 10.0;
        let at = Point::new(start.x + (target.x - start.x) * t, start.y + (target.y - start.y) * t);
        assert_eq!(trial.pointer_move(at), PointerOutcome::Moved);
    }
    timer.advance_ms(5);
    trial.pointer_up()
}

#[test]
fn corner_inside_target_is_a_drop() {
    let timer = ManualTimer::new();
    let surface = SceneSurface::new(
        Rect::new(0.0, 0.0, 20.0, 20.0),
        vec![Rect::new(100.0, 100.0, 200.0, 200.0)],
    );
    let mut c = DragController::new(surface, timer.clone(), &ExperimentConfig::default()).unwrap();

    c.pointer_down(Point::new(10.0, 10.0));
    timer.advance_ms(40);
    c.pointer_move(Point::new(150.0, 150.0));
    timer.advance_ms(40);
    assert_eq!(c.surface().draggable_rect(), Rect::new(140.0, 140.0, 160.0, 160.0));

    match c.pointer_up() {
        PointerOutcome::Dropped { bucket, rt_ms } => {
            assert_eq!(bucket, 0);
            assert_eq!(rt_ms, 80.0);
        }
        other => panic!("expected a drop, got {other:?}"),
    }
    assert!(!c.surface().is_draggable_visible());
    assert_eq!(c.state(), DragState::Dropped);
    assert_eq!(c.pointer_down(Point::new(150.0, 150.0)), PointerOutcome::Ignored);
}

#[test]
fn missed_drop_returns_home_and_allows_a_second_attempt() {
    let timer = ManualTimer::new();
    let mut rng = StdRng::seed_from_u64(1);
    let mut trial = DragTrial::setup(
        two_basket_config(Correctness::Fixed(1)),
        Viewport::new(1280.0, 800.0),
        &ExperimentConfig::default(),
        timer.clone(),
        &mut rng,
    )
    .unwrap();
    let home = trial.draggable_rect();

    // Straight up, away from both baskets on the horizontal axis.
    trial.pointer_down(home.center());
    timer.advance_ms(50);
    trial.pointer_move(home.center().offset_by(0.0, -200.0));
    timer.advance_ms(50);
    assert_eq!(trial.pointer_up(), TrialStep::Pending(PointerOutcome::Returned { attempt: 0 }));
    assert_eq!(trial.state(), DragState::Returned);
    assert_eq!(trial.draggable_rect().top_left(), home.top_left());
    assert_eq!(trial.surface().return_count(), 1);
    assert_eq!(trial.attempt_count(), 1);

    let record = match drag_onto(&mut trial, &timer, 1, 10.0) {
        TrialStep::Finished(record) => record,
        other => panic!("second attempt should finish, got {other:?}"),
    };
    assert_eq!(record.drag_data.len(), 2);
    assert_eq!(record.drag_data[0].len(), 10);
    assert!(!record.drag_data[1].is_empty());
    assert_eq!(record.drop_bucket, Some(1));
}

#[test]
fn dropping_on_the_rewarded_bucket_is_correct() {
    let timer = ManualTimer::new();
    let mut rng = StdRng::seed_from_u64(3);
    let mut trial = DragTrial::setup(
        two_basket_config(Correctness::Fixed(1)),
        Viewport::new(1280.0, 800.0),
        &ExperimentConfig::default(),
        timer.clone(),
        &mut rng,
    )
    .unwrap();

    let TrialStep::Finished(record) = drag_onto(&mut trial, &timer, 1, 10.0) else {
        panic!("drop expected");
    };
    assert!(record.is_correct);
    assert_eq!(record.drop_bucket, Some(1));
    assert_eq!(record.correct_bucket_index, 1);
    assert_eq!(record.stimuli, vec!["images/stimulus/animal_3.png".to_string()]);
    assert_eq!(record.rt, 165.0);
    assert!(record.buckets[1].dropped);
    assert!(!record.buckets[0].dropped);
    assert_eq!(record.buckets[0].name, "images/baskets/basket-green.png");
    assert_eq!(record.buckets[1].position, 1);
    assert!(record.bucket_probs.is_none());
}

#[test]
fn perfectly_aligned_drop_is_missed() {
    let timer = ManualTimer::new();
    let surface = SceneSurface::new(
        Rect::new(0.0, 0.0, 100.0, 100.0),
        vec![Rect::new(300.0, 0.0, 400.0, 100.0)],
    );
    let mut c = DragController::new(surface, timer.clone(), &ExperimentConfig::default()).unwrap();

    // Same-sized squares with every edge flush: no corner is strictly inside.
    c.pointer_down(Point::new(50.0, 50.0));
    timer.advance_ms(20);
    c.pointer_move(Point::new(350.0, 50.0));
    assert_eq!(c.surface().draggable_rect(), Rect::new(300.0, 0.0, 400.0, 100.0));
    assert_eq!(c.pointer_up(), PointerOutcome::Returned { attempt: 0 });

    c.pointer_down(Point::new(50.0, 50.0));
    c.pointer_move(Point::new(351.0, 51.0));
    assert!(matches!(c.pointer_up(), PointerOutcome::Dropped { bucket: 0, .. }));
}

#[test]
fn randomized_slots_still_record_semantic_buckets() {
    let timer = ManualTimer::new();
    let mut config = two_basket_config(Correctness::Probabilistic(vec![0.2, 0.8]));
    config.buckets.push(Bucket::new("images/baskets/basket-red.png", "Crimson Nook"));
    config.buckets.push(Bucket::new("images/baskets/basket-yellow.png", "Golden Repository"));
    config.correctness = Correctness::Probabilistic(vec![0.1, 0.1, 0.7, 0.1]);
    config.randomize_bucket_order = true;
    config.bucket_start_angle = 45.0;

    let mut rng = StdRng::seed_from_u64(42);
    let mut trial = DragTrial::setup(
        config,
        Viewport::new(1440.0, 900.0),
        &ExperimentConfig::default(),
        timer.clone(),
        &mut rng,
    )
    .unwrap();

    let slot_of_two = trial.arrangement().slot_of(2).unwrap();
    let TrialStep::Finished(record) = drag_onto(&mut trial, &timer, 2, -12.0) else {
        panic!("drop expected");
    };
    assert_eq!(record.drop_bucket, Some(2));
    assert_eq!(record.buckets[2].position, slot_of_two);
    let rect = trial.bucket_rect(2).unwrap();
    assert_eq!((record.buckets[2].x, record.buckets[2].y), (rect.left, rect.top));
    assert_eq!(record.bucket_probs, Some(vec![0.1, 0.1, 0.7, 0.1]));
    assert_eq!(record.is_correct, record.correct_bucket_index == 2);
}

#[test]
fn forced_end_produces_an_unscored_record_once() {
    let timer = ManualTimer::new();
    let mut rng = StdRng::seed_from_u64(5);
    let mut trial = DragTrial::setup(
        two_basket_config(Correctness::Fixed(0)),
        Viewport::new(1280.0, 800.0),
        &ExperimentConfig::default(),
        timer.clone(),
        &mut rng,
    )
    .unwrap();

    trial.pointer_down(trial.draggable_rect().center());
    timer.advance_ms(35);
    assert_eq!(trial.tick(), 3);
    assert_eq!(trial.sample_count(), 3);

    let record = trial.force_finish().unwrap();
    assert_eq!(record.drop_bucket, None);
    assert!(!record.is_correct);
    assert_eq!(record.drag_data.len(), 1);
    assert_eq!(record.drag_data[0].len(), 3);
    assert_eq!(record.rt, 35.0);
    assert_eq!(trial.state(), DragState::Abandoned);
    assert!(trial.force_finish().is_none());
    assert_eq!(trial.pointer_up(), TrialStep::Pending(PointerOutcome::Ignored));
}

#[test]
fn bad_configurations_refuse_to_start() {
    let timer = ManualTimer::new();
    let mut rng = StdRng::seed_from_u64(0);
    let exp = ExperimentConfig::default();
    let viewport = Viewport::new(1280.0, 800.0);

    let out_of_range = two_basket_config(Correctness::Fixed(2));
    assert!(matches!(
        DragTrial::setup(out_of_range, viewport, &exp, timer.clone(), &mut rng),
        Err(ExperimentError::InvalidConfiguration(_))
    ));

    let wrong_len = two_basket_config(Correctness::Probabilistic(vec![1.0]));
    assert!(matches!(
        DragTrial::setup(wrong_len, viewport, &exp, timer.clone(), &mut rng),
        Err(ExperimentError::InvalidConfiguration(_))
    ));

    let oversized = two_basket_config(Correctness::Probabilistic(vec![5.0, 3.0]));
    assert!(matches!(
        DragTrial::setup(oversized, viewport, &exp, timer.clone(), &mut rng),
        Err(ExperimentError::InvalidConfiguration(_))
    ));

    let not_a_number = two_basket_config(Correctness::Probabilistic(vec![f64::NAN, 0.5]));
    assert!(matches!(
        DragTrial::setup(not_a_number, viewport, &exp, timer.clone(), &mut rng),
        Err(ExperimentError::InvalidConfiguration(_))
    ));

    let mut no_image = two_basket_config(Correctness::Fixed(0));
    no_image.buckets[0].image.clear();
    assert!(matches!(
        DragTrial::setup(no_image, viewport, &exp, timer.clone(), &mut rng),
        Err(ExperimentError::Setup(_))
    ));

    assert!(matches!(
        DragTrial::setup(
            two_basket_config(Correctness::Fixed(0)),
            Viewport::new(0.0, 0.0),
            &exp,
            timer,
            &mut rng
        ),
        Err(ExperimentError::Setup(_))
    ));
}

#[test]
fn surface_with_extra_buckets_is_rejected() {
    let timer = ManualTimer::new();
    let mut rng = StdRng::seed_from_u64(2);
    let result = DragTrial::setup_on(
        two_basket_config(Correctness::Fixed(0)),
        Viewport::new(1280.0, 800.0),
        &ExperimentConfig::default(),
        timer,
        &mut rng,
        |geometry, arrangement| {
            let mut rects = arrangement.bucket_rects();
            rects.push(geometry.home_rect());
            SceneSurface::new(geometry.home_rect(), rects)
        },
    );
    assert!(matches!(result, Err(ExperimentError::InvalidConfiguration(_))));
}

#[test]
fn assembling_twice_gives_the_same_record() {
    let placements = vec![
        BucketPlacement { name: "a".into(), position: 1, x: 5.0, y: 6.0 },
        BucketPlacement { name: "b".into(), position: 0, x: 7.0, y: 8.0 },
    ];
    let attempts = vec![vec![], vec![lsl_core::DragSample { x: 1.0, y: 2.0, time: 3.0 }]];
    let rewarded = RewardedBucket { index: 0, probabilities: Some(vec![0.8, 0.2]) };
    let stimuli = vec!["relic.png".to_string()];

    let first = assemble(&attempts, &placements, &rewarded, Some(1), 420.0, &stimuli);
    let second = assemble(&attempts, &placements, &rewarded, Some(1), 420.0, &stimuli);
    assert_eq!(first, second);
    assert!(!first.is_correct);
}
