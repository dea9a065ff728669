//! Minijinja template rendering for action messages.
//!
//! An action node's `message_template` is rendered against the fields of
//! the reading that triggered it. Templates are arbitrary strings (not
//! pre-registered), so a fresh [`minijinja::Environment`] is created per
//! render call.

use serde::Serialize;

use nexus_core::SensorReading;

use crate::traits::NotifyError;

/// Fields of a triggering reading exposed to message templates by name.
#[derive(Debug, Clone, Serialize)]
pub struct AlertContext {
    pub equipment_id: String,
    pub equipment_type: String,
    pub sensor: String,
    pub value: f64,
    pub unit: String,
    pub tick: u64,
    /// ISO 8601 timestamp of the reading.
    pub timestamp: String,
    pub operator: String,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_high: Option<f64>,
}

impl AlertContext {
    /// Context for the reading that tripped a condition.
    pub fn from_reading(
        reading: &SensorReading,
        operator: impl Into<String>,
        threshold: f64,
        threshold_high: Option<f64>,
    ) -> Self {
        Self {
            equipment_id: reading.equipment_id.clone(),
            equipment_type: reading.equipment_type.to_string(),
            sensor: reading.sensor_name.clone(),
            value: reading.value,
            unit: reading.unit.clone(),
            tick: reading.tick_index,
            timestamp: reading.timestamp.to_rfc3339(),
            operator: operator.into(),
            threshold,
            threshold_high,
        }
    }

    /// Default subject line for channels that carry one.
    pub fn subject(&self) -> String {
        format!("[ALERT] {} - {}", self.equipment_id, self.sensor)
    }
}

/// Renders action message templates using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("round", round_filter);
        env
    }

    /// Render a template string with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, ctx: &AlertContext) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Validate that a template string parses without errors.
    ///
    /// Does not evaluate the template — only checks syntax. Called during
    /// graph load so a broken action template aborts the run up front.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

/// Custom filter: round a float to N decimal places.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nexus_core::EquipmentType;

    fn sample_context() -> AlertContext {
        let reading = SensorReading {
            equipment_id: "cf-01".to_string(),
            equipment_type: EquipmentType::Centrifuge,
            sensor_name: "rpm".to_string(),
            value: 4512.3456,
            unit: "RPM".to_string(),
            tick_index: 17,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap(),
        };
        AlertContext::from_reading(&reading, ">", 4400.0, None)
    }

    #[test]
    fn render_reading_fields_by_name() {
        let renderer = TemplateRenderer::new();
        let template = "{{ equipment_id }}: {{ sensor }} = {{ value | round(1) }} {{ unit }}";
        let result = renderer.render(template, &sample_context()).unwrap();
        assert_eq!(result, "cf-01: rpm = 4512.3 RPM");
    }

    #[test]
    fn render_threshold_and_operator() {
        let renderer = TemplateRenderer::new();
        let template = "{{ sensor }} {{ operator }} {{ threshold }} at tick {{ tick }}";
        let result = renderer.render(template, &sample_context()).unwrap();
        assert_eq!(result, "rpm > 4400.0 at tick 17");
    }

    #[test]
    fn render_timestamp_is_rfc3339() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render("{{ timestamp }}", &sample_context()).unwrap();
        assert_eq!(result, "2026-08-25T12:00:00+00:00");
    }

    #[test]
    fn invalid_template_produces_error() {
        let renderer = TemplateRenderer::new();
        let result = renderer.render("{{ unclosed", &sample_context());
        match result.unwrap_err() {
            NotifyError::Template(msg) => assert!(!msg.is_empty()),
            other => panic!("expected Template error, got: {other:?}"),
        }
    }

    #[test]
    fn validate_checks_syntax_only() {
        let renderer = TemplateRenderer::new();
        assert!(renderer.validate("{{ anything_goes }}").is_ok());
        assert!(renderer.validate("{% for x in %}").is_err());
    }

    #[test]
    fn subject_names_equipment_and_sensor() {
        assert_eq!(sample_context().subject(), "[ALERT] cf-01 - rpm");
    }
}
