//! Terminal output helpers
//!
//! Status lines go to stderr so that `print` and `summary --json` keep
//! stdout machine-readable.

use colored::{ColoredString, Colorize};

fn status(marker: ColoredString, msg: &str) {
    eprintln!("{} {}", marker, msg);
}

pub fn success(msg: &str) {
    status("✓".green(), msg);
}

pub fn error(msg: &str) {
    status("✗".red(), msg);
}

pub fn info(msg: &str) {
    status("ℹ".blue(), msg);
}

pub fn warning(msg: &str) {
    status("⚠".yellow(), msg);
}

/// `kept/read`, green when nothing was dropped
pub fn kept<N: PartialEq + std::fmt::Display>(kept: N, read: N) -> ColoredString {
    let text = format!("{}/{}", kept, read);
    if kept == read {
        text.green()
    } else {
        text.yellow()
    }
}

/// Bold column header underlined to its own width
pub fn table_header(header: &str) {
    let width = header.chars().count();
    let indent = width - header.trim_start().chars().count();
    println!("{}", header.bold());
    println!("{}{}", " ".repeat(indent), "=".repeat(width - indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kept_fraction() {
        colored::control::set_override(false);
        assert_eq!(kept(3, 3).to_string(), "3/3");
        assert_eq!(kept(1usize, 4).to_string(), "1/4");
    }
}
