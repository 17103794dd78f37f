use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use std::io::Write;

// Print the found banner in green (works on Windows CMD via termcolor)
pub fn print_service_found(name: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_intense(true));
    let _ = writeln!(&mut stdout, "{} service found!", name);
    let _ = stdout.reset();
}

pub fn print_service_missing(name: &str, tries: u32) {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_intense(true));
    let _ = writeln!(
        &mut stdout,
        "Failed to find {} service after {} attempts.",
        name, tries
    );
    let _ = stdout.reset();
}
