use super::AnalysisResult;
use crate::Result;
use core::fmt::Write;

pub fn generate<W: Write>(result: &AnalysisResult, writer: &mut W) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string_pretty(result)?)?;
    Ok(())
}
