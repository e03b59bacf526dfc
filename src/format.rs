use crate::error::LogError;
use crate::hooks::LogFormatHook;
use crate::level::{LevelColors, LevelStyle};
use crate::record::{LogRecord, Metadata};
use crate::splat;
use crate::transform::TransformPipeline;
use chrono::{SecondsFormat, Utc};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

/// Who reads the output of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// CloudWatch and other log processors: one JSON object per line.
    Machine,
    /// A developer terminal: colorized, timestamped, delimiter-separated.
    Human,
}

/// Options of the human renderer.
#[derive(Debug, Clone)]
pub struct HumanStyle {
    pub delimiter: String,
    pub colors: LevelColors,
    pub colorize: bool,
}

#[derive(Debug, Clone)]
pub enum Renderer {
    Structured,
    Human(HumanStyle),
}

/// Pick the renderer for `audience`. The style is ignored for machine output.
pub fn select_renderer(audience: Audience, style: HumanStyle) -> Renderer {
    match audience {
        Audience::Machine => Renderer::Structured,
        Audience::Human => Renderer::Human(style),
    }
}

#[derive(Serialize)]
struct StructuredLine<'a> {
    level: &'a str,
    service: String,
    message: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    rest: Option<Metadata>,
}

fn non_empty(rest: Metadata) -> Option<Metadata> {
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

impl Renderer {
    pub fn audience(&self) -> Audience {
        match self {
            Renderer::Structured => Audience::Machine,
            Renderer::Human(_) => Audience::Human,
        }
    }

    pub fn render(&self, record: &LogRecord) -> Result<String, LogError> {
        match self {
            Renderer::Structured => render_structured(record),
            Renderer::Human(style) => render_human(style, record),
        }
    }
}

fn render_structured(record: &LogRecord) -> Result<String, LogError> {
    let line = StructuredLine {
        level: record.level.as_str(),
        service: record.service(),
        message: record.message.to_value(),
        rest: non_empty(record.rest()),
    };
    Ok(serde_json::to_string(&line)?)
}

// [LEVEL][timestamp] label[instance]: message | {rest}
fn render_human(style: &HumanStyle, record: &LogRecord) -> Result<String, LogError> {
    let tag = format!("[{}]", record.level.as_str().to_uppercase());
    let mut line = match style.colors.get(&record.level) {
        Some(level_style) if style.colorize => paint(level_style, &tag),
        _ => tag,
    };

    if let Some(timestamp) = &record.timestamp {
        let stamp = format!("[{}]", timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
        line.push_str(&yellow(style, stamp));
    }

    let label = match &record.instance {
        Some(instance) => Some(format!("{}[{}]:", record.label, instance)),
        None if !record.label.is_empty() => Some(format!("{}:", record.label)),
        None => None,
    };
    if let Some(label) = label {
        line.push(' ');
        line.push_str(&yellow(style, label));
    }

    line.push(' ');
    line.push_str(&record.message.display());

    if let Some(rest) = non_empty(record.rest()) {
        let rest = serde_json::to_string_pretty(&rest)?;
        line.push_str(&format!(" {} {}", yellow(style, style.delimiter.clone()), rest));
    }
    Ok(line)
}

fn paint(level_style: &LevelStyle, text: &str) -> String {
    level_style.paint(text).to_string()
}

fn yellow(style: &HumanStyle, text: String) -> String {
    if style.colorize {
        text.yellow().to_string()
    } else {
        text
    }
}

/// Turns a record into the final line of one transport.
///
/// Runs the transport's transform pipeline, interpolates the splat, stamps the
/// time for human output, renders, and finally hands the record to the
/// `on_log_format` hook.
#[derive(Clone)]
pub struct Formatter {
    pipeline: TransformPipeline,
    renderer: Renderer,
    on_log_format: LogFormatHook,
}

impl Formatter {
    pub fn new(pipeline: TransformPipeline, renderer: Renderer, on_log_format: LogFormatHook) -> Self {
        Self {
            pipeline,
            renderer,
            on_log_format,
        }
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn format(&self, record: LogRecord) -> Result<String, LogError> {
        let mut record = self.pipeline.apply(record)?;
        splat::apply(&mut record);
        if self.renderer.audience() == Audience::Human {
            record.timestamp.get_or_insert_with(Utc::now);
        }
        let formatted = self.renderer.render(&record)?;
        tracing::trace!(level = %record.level, line = %formatted, "rendered log record");
        record.formatted = Some(formatted);
        Ok((self.on_log_format)(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{default_colors, Level};
    use crate::record::Arg;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn plain() -> HumanStyle {
        HumanStyle {
            delimiter: "|".to_string(),
            colors: default_colors(),
            colorize: false,
        }
    }

    fn record() -> LogRecord {
        let mut record = LogRecord::new(Level::Info, "Testing!");
        record.label = "svc".to_string();
        record
    }

    #[test]
    fn structured_omits_empty_rest() {
        let line = Renderer::Structured.render(&record()).unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, json!({"level": "info", "service": "svc", "message": "Testing!"}));
        assert!(!line.contains("rest"));
    }

    #[test]
    fn structured_collects_rest_and_qualifies_service() {
        let mut record = record();
        record.instance = Some("child".into());
        record.metadata.insert("one".into(), json!("two"));
        record.metadata.insert("instance".into(), json!("child"));
        let parsed: Value = serde_json::from_str(&Renderer::Structured.render(&record).unwrap()).unwrap();
        assert_eq!(parsed["service"], json!("svc.child"));
        assert_eq!(parsed["rest"], json!({"one": "two"}));
    }

    #[test]
    fn human_line_without_optional_parts() {
        let line = Renderer::Human(plain()).render(&record()).unwrap();
        assert_eq!(line, "[INFO] svc: Testing!");
    }

    #[test]
    fn human_line_with_every_part() {
        let mut record = record();
        record.timestamp = Some(Utc.with_ymd_and_hms(2021, 6, 5, 15, 47, 10).unwrap());
        record.instance = Some("worker".into());
        record.metadata.insert("some".into(), json!("metadata"));
        let line = Renderer::Human(plain()).render(&record).unwrap();
        assert_eq!(
            line,
            "[INFO][2021-06-05T15:47:10.000Z] svc[worker]: Testing! | {\n  \"some\": \"metadata\"\n}"
        );
    }

    fn structural_only() -> LogRecord {
        let mut record = record();
        record.timestamp = Some(Utc.with_ymd_and_hms(2021, 6, 5, 15, 47, 10).unwrap());
        record.instance = Some("worker".into());
        record.metadata.insert("instance".into(), json!("worker"));
        record.metadata.insert("timestamp".into(), json!("2021-06-05T15:47:10.000Z"));
        record.metadata.insert("label".into(), json!("svc"));
        record
    }

    #[test]
    fn structured_omits_rest_when_only_structural_keys_remain() {
        let line = Renderer::Structured.render(&structural_only()).unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(
            parsed,
            json!({"level": "info", "service": "svc.worker", "message": "Testing!"})
        );
        assert!(parsed.get("rest").is_none());
    }

    #[test]
    fn human_line_has_no_suffix_when_only_structural_keys_remain() {
        let line = Renderer::Human(plain()).render(&structural_only()).unwrap();
        assert_eq!(line, "[INFO][2021-06-05T15:47:10.000Z] svc[worker]: Testing!");
        assert!(!line.contains(" | "));
        assert!(!line.contains("{}"));
    }

    #[test]
    fn human_line_keeps_level_tag_when_colorized() {
        let style = HumanStyle {
            colorize: true,
            ..plain()
        };
        let line = Renderer::Human(style).render(&record()).unwrap();
        assert!(line.contains("[INFO]"));
        assert!(line.contains("svc"));
    }

    #[test]
    fn selector_follows_audience() {
        assert_eq!(select_renderer(Audience::Machine, plain()).audience(), Audience::Machine);
        assert_eq!(select_renderer(Audience::Human, plain()).audience(), Audience::Human);
    }

    #[test]
    fn formatter_stamps_human_records_and_runs_the_hook() {
        let hook: LogFormatHook = Arc::new(|record: &LogRecord| {
            format!("{}!", record.formatted.clone().unwrap_or_default())
        });
        let formatter = Formatter::new(TransformPipeline::default(), Renderer::Human(plain()), hook);
        let mut record = record();
        record.message = Arg::from("Testing %s");
        record.splat = vec![Arg::from("1 2 3")];
        let line = formatter.format(record).unwrap();
        assert!(line.starts_with("[INFO]["));
        assert!(line.ends_with("svc: Testing 1 2 3!"));
    }
}
