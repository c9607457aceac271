/// pt-PT display rendering for grades and aggregates: at most one
/// fraction digit, none when the value is whole, comma as the decimal
/// separator. `12.5 -> "12,5"`, `10.0 -> "10"`.
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", rounded).replace('.', ",")
    }
}
