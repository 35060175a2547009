use super::*;

#[test]
fn first_call_fires() {
    let mut throttle = Throttle::new(Duration::from_millis(250));
    assert!(throttle.try_fire_at(Instant::now()));
}

#[test]
fn calls_inside_window_are_rejected() {
    let mut throttle = Throttle::new(Duration::from_millis(250));
    let start = Instant::now();
    assert!(throttle.try_fire_at(start));
    assert!(!throttle.try_fire_at(start + Duration::from_millis(100)));
    assert!(!throttle.try_fire_at(start + Duration::from_millis(249)));
}

#[test]
fn call_after_window_fires_again() {
    let mut throttle = Throttle::new(Duration::from_millis(250));
    let start = Instant::now();
    assert!(throttle.try_fire_at(start));
    assert!(throttle.try_fire_at(start + Duration::from_millis(250)));
    assert!(!throttle.try_fire_at(start + Duration::from_millis(300)));
}

#[test]
fn zero_window_never_throttles() {
    let mut throttle = Throttle::new(Duration::ZERO);
    let now = Instant::now();
    assert!(throttle.try_fire_at(now));
    assert!(throttle.try_fire_at(now));
}
