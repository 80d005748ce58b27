use std::thread;

use crate::error::{GeofenceError, SourceError};
use crate::{GeofenceEvaluator, GeofenceOptions, HistorySource, LocationPoint, MemorySource};

fn p(lng: f64, lat: f64) -> LocationPoint {
    LocationPoint::new(lng, lat)
}

/// Three tight triangles around Joinville and one lone point
fn joinville() -> Vec<LocationPoint> {
    vec![
        // home
        p(-48.8702, -26.3183),
        p(-48.8700, -26.3185),
        p(-48.8704, -26.3186),
        p(-48.8701, -26.3187),
        // work
        p(-48.8450, -26.3000),
        p(-48.8452, -26.3003),
        p(-48.8448, -26.3002),
        // once
        p(-48.6000, -26.9000),
    ]
}

struct FailingSource;

impl HistorySource for FailingSource {
    fn fetch_history(&self, _user_id: &str) -> Result<Vec<LocationPoint>, SourceError> {
        Err(SourceError::Query("Failed on connect: timed out".to_string()))
    }
}

#[test]
fn tight_triangle() -> Result<(), String> {
    let source = MemorySource::new().with_history(
        "u1",
        vec![p(0.0, 0.0), p(0.0, 0.0001), p(0.0001, 0.0)],
    );
    let evaluator = GeofenceEvaluator::new(source);

    let geofence = evaluator.geofence("u1", Some(260.0)).map_err(|e| e.to_string())?;
    assert_eq!(1, geofence.regions.len());
    assert_eq!(3, geofence.regions[0].vertices.len());
    assert_eq!(0, geofence.dropped);

    assert_eq!(Ok(false), evaluator.evaluate("u1", 0.00003, 0.00003, None).map_err(|e| e.to_string()));
    assert_eq!(Ok(true), evaluator.evaluate("u1", 10.0, 10.0, None).map_err(|e| e.to_string()));

    Ok(())
}

#[test]
fn empty_history_always_alerts() -> Result<(), String> {
    let evaluator = GeofenceEvaluator::new(MemorySource::new());

    assert!(evaluator.evaluate("nobody", 0.0, 0.0, None).map_err(|e| e.to_string())?);
    assert!(evaluator.evaluate("nobody", -48.87, -26.31, Some(5000.0)).map_err(|e| e.to_string())?);

    Ok(())
}

#[test]
fn single_point_history_always_alerts() -> Result<(), String> {
    let source = MemorySource::new().with_history("u1", vec![p(-48.87, -26.31)]);
    let evaluator = GeofenceEvaluator::new(source);

    assert!(evaluator.evaluate("u1", -48.87, -26.31, None).map_err(|e| e.to_string())?);
    assert!(evaluator.geofence("u1", None).map_err(|e| e.to_string())?.is_empty());

    Ok(())
}

#[test]
fn usual_places() -> Result<(), String> {
    let source = MemorySource::new().with_history("AA251", joinville());
    let evaluator = GeofenceEvaluator::new(source);

    let geofence = evaluator.geofence("AA251", None).map_err(|e| e.to_string())?;
    assert_eq!(2, geofence.regions.len());

    let at_home = evaluator.evaluate("AA251", -48.8702, -26.3185, None).map_err(|e| e.to_string())?;
    assert!(!at_home);
    let at_work = evaluator.evaluate("AA251", -48.8450, -26.3002, None).map_err(|e| e.to_string())?;
    assert!(!at_work);
    // inside the radius of home, but outside its hull
    let near_home = evaluator.evaluate("AA251", -48.8702, -26.3170, None).map_err(|e| e.to_string())?;
    assert!(near_home);
    // seen once, never a region
    let once = evaluator.evaluate("AA251", -48.6000, -26.9000, None).map_err(|e| e.to_string())?;
    assert!(once);

    Ok(())
}

#[test]
fn small_radius_leaves_no_regions() -> Result<(), String> {
    let source = MemorySource::new().with_history("AA251", joinville());
    let evaluator = GeofenceEvaluator::new(source);

    let geofence = evaluator.geofence("AA251", Some(1.0)).map_err(|e| e.to_string())?;
    assert!(geofence.is_empty());
    assert!(evaluator.evaluate("AA251", -48.8702, -26.3185, Some(1.0)).map_err(|e| e.to_string())?);

    Ok(())
}

#[test]
fn collinear_history_alerts() -> Result<(), String> {
    let source = MemorySource::new().with_history(
        "u1",
        vec![p(0.0, 0.0), p(0.0001, 0.0001), p(0.0002, 0.0002), p(0.0003, 0.0003)],
    );
    let evaluator = GeofenceEvaluator::new(source);

    let geofence = evaluator.geofence("u1", None).map_err(|e| e.to_string())?;
    assert!(geofence.is_empty());
    assert_eq!(1, geofence.dropped);
    assert!(evaluator.evaluate("u1", 0.0001, 0.0001, None).map_err(|e| e.to_string())?);

    Ok(())
}

#[test]
fn history_order_does_not_matter() -> Result<(), String> {
    let history = joinville();
    let mut reversed = history.clone();
    reversed.reverse();
    let mut rotated = history.clone();
    rotated.rotate_left(3);

    let queries = [
        p(-48.8702, -26.3185),
        p(-48.8450, -26.3002),
        p(-48.8702, -26.3170),
        p(-48.6000, -26.9000),
        p(0.0, 0.0),
    ];

    let source = MemorySource::new()
        .with_history("a", history)
        .with_history("b", reversed)
        .with_history("c", rotated);
    let evaluator = GeofenceEvaluator::new(source);

    for q in queries {
        let a = evaluator.evaluate("a", q.longitude, q.latitude, None).map_err(|e| e.to_string())?;
        let b = evaluator.evaluate("b", q.longitude, q.latitude, None).map_err(|e| e.to_string())?;
        let c = evaluator.evaluate("c", q.longitude, q.latitude, None).map_err(|e| e.to_string())?;
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    Ok(())
}

#[test]
fn idempotent() -> Result<(), String> {
    let source = MemorySource::new().with_history("AA251", joinville());
    let evaluator = GeofenceEvaluator::new(source);

    let first = evaluator.evaluate("AA251", -48.8701, -26.3185, None).map_err(|e| e.to_string())?;
    let second = evaluator.evaluate("AA251", -48.8701, -26.3185, None).map_err(|e| e.to_string())?;
    assert_eq!(first, second);

    let g1 = evaluator.geofence("AA251", None).map_err(|e| e.to_string())?;
    let g2 = evaluator.geofence("AA251", None).map_err(|e| e.to_string())?;
    assert_eq!(g1, g2);

    Ok(())
}

#[test]
fn invalid_query() {
    let source = MemorySource::new().with_history("AA251", joinville());
    let evaluator = GeofenceEvaluator::new(source);

    let err = evaluator.evaluate("AA251", f64::NAN, -26.31, None).unwrap_err();
    assert!(matches!(err, GeofenceError::InvalidCoordinates { .. }));
    assert!(err.is_input_error());

    let err = evaluator.evaluate("AA251", -48.87, f64::INFINITY, None).unwrap_err();
    assert!(err.is_input_error());

    let err = evaluator.evaluate("AA251", -48.87, -26.31, Some(-5.0)).unwrap_err();
    assert!(matches!(err, GeofenceError::InvalidRadius(_)));
}

#[test]
fn invalid_query_is_rejected_before_fetch() {
    let evaluator = GeofenceEvaluator::new(FailingSource);

    let err = evaluator.evaluate("AA251", f64::NAN, 0.0, None).unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn upstream_failure() {
    let evaluator = GeofenceEvaluator::new(FailingSource);

    let err = evaluator.evaluate("AA251", -48.87, -26.31, None).unwrap_err();
    assert!(!err.is_input_error());
    match err {
        GeofenceError::Upstream { user_id, source } => {
            assert_eq!("AA251", user_id);
            assert!(matches!(source, SourceError::Query(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn non_finite_history_is_skipped() -> Result<(), String> {
    let source = MemorySource::new().with_history(
        "u1",
        vec![
            p(0.0, 0.0),
            p(0.0, 0.0001),
            p(0.0001, 0.0),
            p(f64::NAN, 0.0),
            p(0.0, f64::INFINITY),
        ],
    );
    let evaluator = GeofenceEvaluator::new(source);

    let geofence = evaluator.geofence("u1", None).map_err(|e| e.to_string())?;
    assert_eq!(1, geofence.regions.len());
    assert!(!evaluator.evaluate("u1", 0.00003, 0.00003, None).map_err(|e| e.to_string())?);

    Ok(())
}

#[test]
fn custom_min_samples() -> Result<(), String> {
    let source = MemorySource::new().with_history(
        "u1",
        vec![p(0.0, 0.0), p(0.0, 0.0001), p(0.0001, 0.0)],
    );
    let options = GeofenceOptions {
        min_samples: 4,
        ..GeofenceOptions::new()
    };
    let evaluator = GeofenceEvaluator::with_options(source, options);

    assert_eq!(4, evaluator.options().min_samples);
    assert!(evaluator.evaluate("u1", 0.00003, 0.00003, None).map_err(|e| e.to_string())?);

    Ok(())
}

#[test]
fn concurrent_evaluations() {
    let source = MemorySource::new()
        .with_history("AA251", joinville())
        .with_history("u1", vec![p(0.0, 0.0), p(0.0, 0.0001), p(0.0001, 0.0)]);
    let evaluator = GeofenceEvaluator::new(source);

    let results: Vec<Result<bool, String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let evaluator = &evaluator;
                s.spawn(move || {
                    let (user, q) = if i % 2 == 0 {
                        ("AA251", p(-48.8702, -26.3185))
                    } else {
                        ("u1", p(0.00003, 0.00003))
                    };
                    evaluator
                        .evaluate(user, q.longitude, q.latitude, None)
                        .map_err(|e| e.to_string())
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err("panicked".to_string())))
            .collect()
    });

    assert_eq!(8, results.len());
    for r in results {
        assert_eq!(Ok(false), r);
    }
}
