pub mod aggregate;
pub mod cadence;
pub mod recurring;

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
