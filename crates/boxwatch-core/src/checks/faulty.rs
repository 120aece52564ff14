// measurement_faulty: readings a sensor type reports when it is broken or
// disconnected.

use super::parse_number;

/// (sensor type, exact reading) pairs known to indicate a fault.
const KNOWN_FAULTY: &[(&str, f64)] = &[
    ("BMP280", 0.0),
    ("HDC1008", 0.0),
    ("HDC1008", -40.0),
    ("SDS 011", 0.0),
];

#[allow(clippy::float_cmp)]
pub fn is_known_faulty(sensor_type: &str, value: f64) -> bool {
    KNOWN_FAULTY
        .iter()
        .any(|&(t, v)| t == sensor_type && v == value)
}

pub(super) fn check(sensor_type: &str, value: &str) -> Result<bool, String> {
    let value = parse_number(value, "value")?;
    Ok(is_known_faulty(sensor_type, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        assert!(is_known_faulty("HDC1008", 0.0));
        assert!(is_known_faulty("HDC1008", -40.0));
        assert!(is_known_faulty("BMP280", -0.0));
        assert!(!is_known_faulty("HDC1008", 5.0));
        assert!(!is_known_faulty("BMP280", -40.0));
        assert!(!is_known_faulty("hdc1008", 0.0));
    }
}
