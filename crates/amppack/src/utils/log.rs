use std::time::{Duration, Instant};

/// `(42 ms)`, `(3.042 s)` or `(1 m 3.042 s)`.
pub fn format_execution_time(elapsed: Duration) -> String {
  let total_secs = elapsed.as_secs();
  let mins = total_secs / 60;
  let secs = total_secs % 60;
  let ms = elapsed.subsec_millis();
  if mins > 0 {
    format!("({mins} m {secs}.{ms:03} s)")
  } else if secs == 0 {
    format!("({ms:03} ms)")
  } else {
    format!("({secs}.{ms:03} s)")
  }
}

pub fn end_build_step(step_name: &str, target_name: &str, start: Instant) {
  tracing::info!("{step_name} {target_name} {}", format_execution_time(start.elapsed()));
}

#[test]
fn formats_like_a_stopwatch() {
  assert_eq!(format_execution_time(Duration::from_millis(42)), "(042 ms)");
  assert_eq!(format_execution_time(Duration::from_millis(3_042)), "(3.042 s)");
  assert_eq!(format_execution_time(Duration::from_millis(63_042)), "(1 m 3.042 s)");
}
