// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Misc utility functions.

use std::{
    fs::OpenOptions,
    io::Write,
    path::Path,
    time::Duration,
};

/// Print a line to stdout and append it to the report file, if one is given.
pub fn write_and_print(line: String, report_path: Option<&Path>) -> std::io::Result<()> {
    println!("{}", line);
    if let Some(path) = report_path {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// Header line for a report section, stamped with the local time.
pub fn report_header(title: &str) -> String {
    format!(
        "\n[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        title
    )
}

/// 'points' evenly spaced values from 'start' to 'end' inclusive.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Format a duration into a pretty String.
/// e.g. 1500 µs is 1.500 ms
pub fn format_elapsed_time(elapsed: Duration) -> String {
    let micros = elapsed.as_micros();
    if micros >= 1_000_000 {
        format!("{:.3} s", elapsed.as_secs_f64())
    } else if micros >= 1000 {
        format!("{:.3} ms", micros as f64 / 1000.0)
    } else {
        format!("{} µs", micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_format_elapsed_time() {
        assert_eq!(format_elapsed_time(Duration::from_micros(250)), "250 µs");
        assert_eq!(format_elapsed_time(Duration::from_micros(1500)), "1.500 ms");
        assert_eq!(format_elapsed_time(Duration::from_millis(2500)), "2.500 s");
    }
}
