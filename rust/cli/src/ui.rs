use std::fmt::Display;
use std::io::Write;

pub fn write_error(err: &mut dyn Write, msg: impl Display) -> std::io::Result<()> {
    writeln!(err, "Error: {}", msg)
}
