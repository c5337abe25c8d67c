pub fn write_diff(
    writer: &mut dyn std::fmt::Write,
    expected: &str,
    actual: &str,
    expected_name: Option<&dyn std::fmt::Display>,
    actual_name: Option<&dyn std::fmt::Display>,
    palette: crate::report::Palette,
) -> Result<(), std::fmt::Error> {
    #[cfg(feature = "diff")]
    {
        write_diff_inner(
            writer,
            expected,
            actual,
            expected_name,
            actual_name,
            palette,
        )
    }

    #[cfg(not(feature = "diff"))]
    {
        if let Some(expected_name) = expected_name {
            writeln!(writer, "{} {}:", expected_name, palette.info("(expected)"))?;
        } else {
            writeln!(writer, "{}:", palette.info("Expected"))?;
        }
        writeln!(writer, "{}", palette.info(expected))?;
        if let Some(actual_name) = actual_name {
            writeln!(writer, "{} {}:", actual_name, palette.error("(actual)"))?;
        } else {
            writeln!(writer, "{}:", palette.error("Actual"))?;
        }
        writeln!(writer, "{}", palette.error(actual))?;
        Ok(())
    }
}

#[cfg(feature = "diff")]
fn write_diff_inner(
    writer: &mut dyn std::fmt::Write,
    expected: &str,
    actual: &str,
    expected_name: Option<&dyn std::fmt::Display>,
    actual_name: Option<&dyn std::fmt::Display>,
    palette: crate::report::Palette,
) -> Result<(), std::fmt::Error> {
    let changes = similar::TextDiff::configure()
        .algorithm(similar::Algorithm::Patience)
        .timeout(std::time::Duration::from_millis(500))
        .newline_terminated(false)
        .diff_lines(expected, actual);

    writeln!(writer)?;
    if let Some(expected_name) = expected_name {
        writeln!(
            writer,
            "{}",
            palette.info(format_args!("--- {} (expected)", expected_name))
        )?;
    } else {
        writeln!(writer, "{}", palette.info(format_args!("--- Expected")))?;
    }
    if let Some(actual_name) = actual_name {
        writeln!(
            writer,
            "{}",
            palette.error(format_args!("+++ {} (actual)", actual_name))
        )?;
    } else {
        writeln!(writer, "{}", palette.error(format_args!("+++ Actual")))?;
    }
    for op in changes.ops() {
        for change in changes.iter_inline_changes(op) {
            match change.tag() {
                similar::ChangeTag::Insert => {
                    write_change(writer, change, "+", palette.actual, palette.error, palette)?;
                }
                similar::ChangeTag::Delete => {
                    write_change(writer, change, "-", palette.expected, palette.info, palette)?;
                }
                similar::ChangeTag::Equal => {
                    write_change(writer, change, "|", palette.hint, palette.hint, palette)?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "diff")]
fn write_change(
    writer: &mut dyn std::fmt::Write,
    change: similar::InlineChange<'_, str>,
    sign: &str,
    em_style: crate::report::Style,
    style: crate::report::Style,
    palette: crate::report::Palette,
) -> Result<(), std::fmt::Error> {
    use crate::report::Styled;

    if let Some(index) = change.old_index() {
        write!(writer, "{:>4} ", palette.hint(index + 1))?;
    } else {
        write!(writer, "{:>4} ", " ")?;
    }
    if let Some(index) = change.new_index() {
        write!(writer, "{:>4} ", palette.hint(index + 1))?;
    } else {
        write!(writer, "{:>4} ", " ")?;
    }
    write!(writer, "{} ", Styled::new(sign, style))?;
    for &(emphasized, change) in change.values() {
        let cur_style = if emphasized { em_style } else { style };
        write!(writer, "{}", Styled::new(change, cur_style))?;
    }
    if change.missing_newline() {
        writeln!(writer, "{}", Styled::new("∅", em_style))?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(feature = "diff")]
    #[test]
    fn diff_eq() {
        let expected = "Hello\nWorld\n";
        let actual = "Hello\nWorld\n";
        let palette = crate::report::Palette::plain();

        let mut actual_diff = String::new();
        write_diff(
            &mut actual_diff,
            expected,
            actual,
            Some(&"version.tpl"),
            Some(&"stdout"),
            palette,
        )
        .unwrap();
        let expected_diff = "
--- version.tpl (expected)
+++ stdout (actual)
   1    1 | Hello
   2    2 | World
";

        assert_eq!(expected_diff, actual_diff);
    }

    #[cfg(feature = "diff")]
    #[test]
    fn diff_changed_line() {
        let expected = "Version: 3.0\nAuthors:\n";
        let actual = "Version: 2.0\nAuthors:\n";
        let palette = crate::report::Palette::plain();

        let mut actual_diff = String::new();
        write_diff(&mut actual_diff, expected, actual, None, None, palette).unwrap();
        let expected_diff = "
--- Expected
+++ Actual
   1      - Version: 3.0
        1 + Version: 2.0
   2    2 | Authors:
";

        assert_eq!(expected_diff, actual_diff);
    }

    #[cfg(feature = "diff")]
    #[test]
    fn diff_trailing_newline_missing() {
        let expected = "Ping\n";
        let actual = "Ping";
        let palette = crate::report::Palette::plain();

        let mut actual_diff = String::new();
        write_diff(&mut actual_diff, expected, actual, None, None, palette).unwrap();
        let expected_diff = "
--- Expected
+++ Actual
   1      - Ping
        1 + Ping∅
";

        assert_eq!(expected_diff, actual_diff);
    }

    #[cfg(not(feature = "diff"))]
    #[test]
    fn fallback_blocks() {
        let palette = crate::report::Palette::plain();

        let mut actual_diff = String::new();
        write_diff(&mut actual_diff, "Ping", "Pong", None, None, palette).unwrap();
        assert_eq!(actual_diff, "Expected:\nPing\nActual:\nPong\n");
    }
}
