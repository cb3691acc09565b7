//! Recommendation formatting utilities

use crate::engine::Recommendation;
use crate::error::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::fmt;

/// Output formats supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Text,
    Json,
}

pub trait ReportFormatter: Send + Sync {
    fn output_format(&self) -> OutputFormat;
    fn format_recommendation(&self, recommendation: &Recommendation) -> Result<String>;
    fn format_error(&self, error: &str) -> String;
}

fn bullet_section(f: &mut fmt::Formatter<'_>, title: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "\n{title}:")?;
    for item in items {
        writeln!(f, "  - {item}")?;
    }
    Ok(())
}

fn extracted_sections(f: &mut fmt::Formatter<'_>, rec: &Recommendation) -> fmt::Result {
    bullet_section(f, "Key insights", &rec.key_insights)?;
    bullet_section(f, "Opportunities", &rec.opportunities)?;
    bullet_section(f, "Risk factors", &rec.risk_factors)
}

struct TextReport<'a>(&'a Recommendation);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.0;
        writeln!(f, "{}", rec.headline())?;
        if rec.was_moderated() {
            writeln!(f, "Moderated from {} by dissenting agents", rec.base_signal)?;
        }
        writeln!(f, "\n{}", rec.summary)?;

        extracted_sections(f, rec)?;

        if !rec.agent_errors.is_empty() {
            writeln!(f, "\nUnavailable agents:")?;
            for (agent, error) in &rec.agent_errors {
                writeln!(f, "  - {}: {error}", agent.display_name())?;
            }
        }
        Ok(())
    }
}

struct TableReport<'a>(&'a Recommendation);

impl fmt::Display for TableReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.0;
        writeln!(f, "{}", TableFormatter::agent_table(rec))?;
        writeln!(f, "\n{}", rec.headline())?;
        if rec.was_moderated() {
            writeln!(f, "Base signal {} moderated by dissent", rec.base_signal)?;
        }
        extracted_sections(f, rec)
    }
}

/// Plain text report
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::Text
    }

    fn format_recommendation(&self, rec: &Recommendation) -> Result<String> {
        Ok(TextReport(rec).to_string())
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {error}")
    }
}

/// Per-agent table followed by the consensus verdict
pub struct TableFormatter;

impl TableFormatter {
    fn agent_table(rec: &Recommendation) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Agent", "Weight", "Score", "Signal", "Confidence", "Status"]);

        for agent in &rec.active_agents {
            let Some(result) = rec.agent_results.get(agent) else {
                table.add_row(vec![
                    agent.display_name().to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                    "not registered".to_string(),
                ]);
                continue;
            };

            let status = result
                .error()
                .map_or_else(|| "ok".to_string(), |err| format!("failed: {err}"));
            table.add_row(vec![
                agent.display_name().to_string(),
                format!("{:.2}", result.weight()),
                format!("{:.3}", result.overall_score()),
                result.signal().to_string(),
                format!("{:.2}", result.confidence()),
                status,
            ]);
        }

        table
    }
}

impl ReportFormatter for TableFormatter {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::Table
    }

    fn format_recommendation(&self, rec: &Recommendation) -> Result<String> {
        Ok(TableReport(rec).to_string())
    }

    fn format_error(&self, error: &str) -> String {
        format!("❌ Error: {error}")
    }
}

/// Pretty-printed JSON
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn output_format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn format_recommendation(&self, rec: &Recommendation) -> Result<String> {
        Ok(serde_json::to_string_pretty(rec)?)
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}

pub struct FormatterFactory;

impl FormatterFactory {
    pub fn create(format: OutputFormat) -> Box<dyn ReportFormatter> {
        match format {
            OutputFormat::Table => Box::new(TableFormatter),
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentWeights;
    use crate::engine::Aggregator;
    use agent_core::{AgentId, AgentResult, AnalysisContext, SignalThresholds, SubScoreSet};
    use std::collections::BTreeMap;

    fn recommendation() -> Recommendation {
        let mut results = BTreeMap::new();
        results.insert(
            AgentId::Technical,
            AgentResult::new(
                AgentId::Technical,
                0.25,
                SubScoreSet::new().with("trend_score", 0.8),
                &SignalThresholds::default(),
            )
            .with_rationale("Uptrend intact."),
        );
        results.insert(
            AgentId::RiskAssessment,
            AgentResult::failed(AgentId::RiskAssessment, 0.15, "no data"),
        );

        Aggregator::default().aggregate(
            &AnalysisContext::new("ACME", "technical", Default::default()),
            &results,
            &[AgentId::Technical, AgentId::RiskAssessment],
            &AgentWeights::default(),
        )
    }

    #[test]
    fn test_text_report() {
        let text = TextFormatter.format_recommendation(&recommendation()).unwrap();
        assert!(text.starts_with("ACME: STRONG_BUY"));
        assert!(text.contains("Technical: Uptrend intact."));
        assert!(text.contains("Opportunities:\n  - Strong uptrend in place"));
        assert!(text.contains("Risk Assessment: no data"));
    }

    #[test]
    fn test_text_report_layout() {
        let rec = recommendation();
        let text = TextFormatter.format_recommendation(&rec).unwrap();

        let expected_head = format!("{}\n\n{}\n", rec.headline(), rec.summary);
        assert!(text.starts_with(&expected_head));
        assert!(text.ends_with("Unavailable agents:\n  - Risk Assessment: no data\n"));
        assert_eq!(text, TextReport(&rec).to_string());
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let mut rec = recommendation();
        rec.key_insights.clear();
        rec.opportunities.clear();
        rec.risk_factors.clear();

        let table = TableFormatter.format_recommendation(&rec).unwrap();
        assert!(!table.contains("Key insights:"));
        assert!(!table.contains("Opportunities:"));
        assert!(table.ends_with(&format!("\n{}\n", rec.headline())));
    }

    #[test]
    fn test_table_report() {
        let table = TableFormatter.format_recommendation(&recommendation()).unwrap();
        assert!(table.contains("Agent"));
        assert!(table.contains("Technical"));
        assert!(table.contains("failed: no data"));
        assert!(table.contains("ACME: STRONG_BUY"));
    }

    #[test]
    fn test_json_report() {
        let json = JsonFormatter.format_recommendation(&recommendation()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["signal"], "STRONG_BUY");
        assert_eq!(value["agent_scores"]["technical"], 0.8);
        assert_eq!(value["agent_errors"]["risk_assessment"], "no data");
    }

    #[test]
    fn test_factory() {
        assert_eq!(
            FormatterFactory::create(OutputFormat::Json).output_format(),
            OutputFormat::Json
        );
        assert_eq!(
            FormatterFactory::create(OutputFormat::default()).output_format(),
            OutputFormat::Table
        );
    }
}
