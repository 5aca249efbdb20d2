use super::*;

#[test]
fn nothing_due_until_scheduled() {
    let mut d = Debouncer::new();
    assert!(!d.is_pending());
    assert_eq!(d.take_due(1_000), None);
}

#[test]
fn fires_once_after_deadline() {
    let mut d = Debouncer::new();
    let generation = d.schedule(1_000, 300);
    assert_eq!(d.take_due(1_299), None);
    assert_eq!(d.take_due(1_300), Some(generation));
    assert_eq!(d.take_due(5_000), None);
}

#[test]
fn rescheduling_collapses_bursts() {
    let mut d = Debouncer::new();
    let first = d.schedule(0, 300);
    let second = d.schedule(200, 300);
    assert_ne!(first, second);
    assert_eq!(d.take_due(300), None);
    assert_eq!(d.take_due(500), Some(second));
}

#[test]
fn flush_fires_immediately() {
    let mut d = Debouncer::new();
    let generation = d.schedule(0, 10_000);
    assert_eq!(d.flush(), Some(generation));
    assert_eq!(d.flush(), None);
}

#[test]
fn cancel_retires_the_generation() {
    let mut d = Debouncer::new();
    let cancelled = d.schedule(0, 100);
    d.cancel();
    assert!(!d.is_pending());
    assert_eq!(d.take_due(1_000), None);

    let next = d.schedule(1_000, 100);
    assert!(next > cancelled + 1);
    assert_eq!(d.take_due(1_100), Some(next));
}
