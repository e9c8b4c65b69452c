use super::{AnalysisResult, popularity, summarize};
use crate::Result;
use core::fmt::Write;
use owo_colors::OwoColorize;

pub fn generate<W: Write>(result: &AnalysisResult, use_colors: bool, writer: &mut W) -> Result<()> {
    let summary = summarize(result);

    write_heading(writer, "Summary", use_colors)?;
    writeln!(writer, "  Users:              {}", summary.total_users)?;
    writeln!(writer, "  Total extensions:   {}", summary.total_entries)?;
    writeln!(writer, "  Unique extensions:  {}", summary.unique_extensions)?;
    writeln!(writer, "  Successful lookups: {}", summary.successful_lookups)?;

    if summary.failed_lookups > 0 && use_colors {
        writeln!(writer, "  Failed lookups:     {}", summary.failed_lookups.red().bold())?;
    } else {
        writeln!(writer, "  Failed lookups:     {}", summary.failed_lookups)?;
    }

    let ranking = popularity(result);
    if ranking.is_empty() {
        return Ok(());
    }

    writeln!(writer)?;
    write_heading(writer, "Extension usage", use_colors)?;

    let rank_width = ranking.len().to_string().len();
    let name_width = ranking.iter().map(|u| u.metadata.display_name.chars().count()).max().unwrap_or(0);

    for (index, usage) in ranking.iter().enumerate() {
        let rank = index + 1;
        let plural = if usage.users == 1 { "" } else { "s" };
        let name = &usage.metadata.display_name;

        if use_colors {
            writeln!(
                writer,
                "  {rank:>rank_width$}. {:<name_width$}  {} user{plural}  {}",
                name.bold(),
                usage.users.cyan(),
                usage.identifier.dimmed()
            )?;
        } else {
            writeln!(
                writer,
                "  {rank:>rank_width$}. {name:<name_width$}  {} user{plural}  {}",
                usage.users, usage.identifier
            )?;
        }
    }

    Ok(())
}

fn write_heading<W: Write>(writer: &mut W, heading: &str, use_colors: bool) -> Result<()> {
    if use_colors {
        writeln!(writer, "{}", heading.bold())?;
    } else {
        writeln!(writer, "{heading}")?;
    }
    Ok(())
}
