use chrono::{DateTime, TimeZone, Utc};

/// Compute time since a unix timestamp in nanoseconds, returning a human-readable string
pub fn time_since_nanos(nanos: i64) -> String {
    if nanos <= 0 {
        return "-".to_string();
    }
    let ts = Utc.timestamp_nanos(nanos);
    time_since(&ts, Utc::now())
}

pub fn time_since(ts: &DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total_secs = now.signed_duration_since(*ts).num_seconds();
    if total_secs < 0 {
        return "0s".to_string();
    }

    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if days > 365 {
        let years = days / 365;
        format!("{}y{}d", years, days % 365)
    } else if days > 7 {
        format!("{}d", days)
    } else if days > 0 {
        format!("{}d{}h", days, hours)
    } else if hours > 0 {
        format!("{}h{}m", hours, mins)
    } else if mins > 0 {
        format!("{}m{}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

pub fn pad_key(n: usize) -> String {
    format!("{:020}", n)
}

/// Human readable byte count (binary units).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Strips ANSI escape sequences and control characters that would corrupt the frame.
///
/// Tabs become four spaces; `\r` is dropped.
pub fn sanitize_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    // CSI: parameters until a final byte in 0x40..=0x7e
                    for n in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&n) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    // OSC: terminated by BEL or ST
                    while let Some(n) = chars.next() {
                        if n == '\x07' {
                            break;
                        }
                        if n == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            },
            '\t' => out.push_str("    "),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_since_buckets() {
        let now = Utc::now();
        assert_eq!(time_since(&(now - Duration::seconds(42)), now), "42s");
        assert_eq!(time_since(&(now - Duration::seconds(125)), now), "2m5s");
        assert_eq!(time_since(&(now - Duration::hours(3)), now), "3h0m");
        assert_eq!(time_since(&(now - Duration::days(2)), now), "2d0h");
        assert_eq!(time_since(&(now - Duration::days(30)), now), "30d");
    }

    #[test]
    fn test_pad_key_sorts_lexically() {
        assert!(pad_key(9) < pad_key(10));
        assert_eq!(pad_key(7).len(), 20);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_sanitize_line_strips_escapes() {
        assert_eq!(sanitize_line("\x1b[1;32mok\x1b[0m\r"), "ok");
        assert_eq!(sanitize_line("a\tb"), "a    b");
        assert_eq!(sanitize_line("\x1b]0;title\x07prompt$ "), "prompt$ ");
    }
}
