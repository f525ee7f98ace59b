//! Human-readable formatting for resource quantities

/// Render milli-vCPU as whole vCPUs, trimming trailing zeros
/// (250 -> "0.25", 1000 -> "1", 1500 -> "1.5").
pub fn prettify_vcpu(milli_vcpu: i64) -> String {
    let vcpus = milli_vcpu as f64 / 1000.0;
    let formatted = format!("{:.3}", vcpus);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Render MiB as GiB when it divides evenly into quarters of a GiB,
/// otherwise as MiB (2048 -> "2 GiB", 1536 -> "1.5 GiB", 384 -> "384 MiB").
pub fn prettify_memory(mib: i64) -> String {
    if mib.abs() >= 1024 && mib % 256 == 0 {
        let gib = mib as f64 / 1024.0;
        let formatted = format!("{:.2}", gib);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        format!("{} GiB", trimmed)
    } else {
        format!("{} MiB", mib)
    }
}

/// Dollar amount with two decimals, e.g. "$125.00/mo".
pub fn format_monthly_price(amount: f64) -> String {
    format!("${:.2}/mo", amount)
}
