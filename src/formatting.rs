//! Per-category message formatting.
//!
//! Pure, stateless mapping from a raw sub-alert document to the
//! `(host, subject, body)` triple that gets delivered or parked in the
//! unsent queue. One exhaustive match arm per [`AlertCategory`].

use crate::core::{AlertCategory, MalformedAlert};
use serde_json::Value;

/// The output of formatting one sub-alert.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedAlert {
    pub host: String,
    pub subject: String,
    pub body: String,
}

/// Decorative banner prepended at send time. Presentation only; it is never
/// stored in the unsent queue.
const BANNER: &str = ":rotating_light::rotating_light::rotating_light:";

/// Formats one sub-alert document for its category.
///
/// Fails with [`MalformedAlert`] only when a field the category actually
/// needs is absent or of the wrong type; unused fields are never inspected.
pub fn format_sub_alert(
    category: AlertCategory,
    doc: &Value,
) -> Result<FormattedAlert, MalformedAlert> {
    let host = str_field(category, doc, &["host", "name"])?.to_string();

    let (subject, body) = match category {
        AlertCategory::LogErrors => (
            str_field(category, doc, &["log", "file", "path"])?.to_string(),
            str_field(category, doc, &["message"])?.to_string(),
        ),
        AlertCategory::DiskSpace => {
            let mount = str_field(category, doc, &["system", "filesystem", "mount_point"])?;
            let pct = num_field(category, doc, &["system", "filesystem", "used", "pct"])?;
            (format!("High disk usage on {}", mount), pct_body(pct))
        }
        AlertCategory::MemoryUsage => {
            let pct = num_field(category, doc, &["system", "memory", "used", "pct"])?;
            ("High memory usage".to_string(), pct_body(pct))
        }
        AlertCategory::Systemd => {
            let name = str_field(category, doc, &["service", "name"])?;
            let state = str_field(category, doc, &["service", "state"])?;
            (
                "Down systemd service".to_string(),
                format!("{} is {}", name, state),
            )
        }
        AlertCategory::DockerUnhealthyContainer => {
            let name = str_field(category, doc, &["container", "name"])?;
            let status = str_field(category, doc, &["container", "status"])?;
            (
                "Unhealthy docker container".to_string(),
                format!("{} is {}", name, status),
            )
        }
    };

    Ok(FormattedAlert {
        host,
        subject,
        body,
    })
}

/// Renders the final message text posted to the channel.
pub fn render_text(host: &str, subject: &str, message: &str) -> String {
    format!("{}\n*{}*\nhost: {}\n{}", BANNER, subject, host, message)
}

fn pct_body(pct: f64) -> String {
    format!("{}%", (pct * 100.0).round())
}

fn str_field<'a>(
    category: AlertCategory,
    doc: &'a Value,
    path: &[&str],
) -> Result<&'a str, MalformedAlert> {
    lookup(doc, path)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(category, path))
}

fn num_field(category: AlertCategory, doc: &Value, path: &[&str]) -> Result<f64, MalformedAlert> {
    lookup(doc, path)
        .and_then(Value::as_f64)
        .ok_or_else(|| missing(category, path))
}

fn lookup<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = doc;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

fn missing(category: AlertCategory, path: &[&str]) -> MalformedAlert {
    MalformedAlert {
        category,
        detail: format!("missing or invalid field {}", path.join(".")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_errors_uses_file_path_and_raw_message() {
        let doc = json!({
            "host": {"name": "web-1"},
            "log": {"file": {"path": "/var/log/nginx/error.log"}},
            "message": "upstream timed out"
        });
        let formatted = format_sub_alert(AlertCategory::LogErrors, &doc).unwrap();
        assert_eq!(formatted.host, "web-1");
        assert_eq!(formatted.subject, "/var/log/nginx/error.log");
        assert_eq!(formatted.body, "upstream timed out");
    }

    #[test]
    fn disk_space_reports_mount_point_and_percentage() {
        let doc = json!({
            "host": {"name": "db-1"},
            "system": {"filesystem": {"mount_point": "/var", "used": {"pct": 0.92}}}
        });
        let formatted = format_sub_alert(AlertCategory::DiskSpace, &doc).unwrap();
        assert_eq!(formatted.subject, "High disk usage on /var");
        assert_eq!(formatted.body, "92%");
    }

    #[test]
    fn memory_usage_has_fixed_subject() {
        let doc = json!({
            "host": {"name": "db-1"},
            "system": {"memory": {"used": {"pct": 0.9}}}
        });
        let formatted = format_sub_alert(AlertCategory::MemoryUsage, &doc).unwrap();
        assert_eq!(formatted.subject, "High memory usage");
        assert_eq!(formatted.body, "90%");
    }

    #[test]
    fn systemd_reports_service_name_and_state() {
        let doc = json!({
            "host": {"name": "app-2"},
            "service": {"name": "nginx", "state": "failed"}
        });
        let formatted = format_sub_alert(AlertCategory::Systemd, &doc).unwrap();
        assert_eq!(formatted.subject, "Down systemd service");
        assert_eq!(formatted.body, "nginx is failed");
    }

    #[test]
    fn docker_reports_container_name_and_status() {
        let doc = json!({
            "host": {"name": "app-2"},
            "container": {"name": "redis", "status": "unhealthy"}
        });
        let formatted =
            format_sub_alert(AlertCategory::DockerUnhealthyContainer, &doc).unwrap();
        assert_eq!(formatted.subject, "Unhealthy docker container");
        assert_eq!(formatted.body, "redis is unhealthy");
    }

    #[test]
    fn unused_fields_are_ignored() {
        // A systemd sub-alert carrying unrelated filesystem data must still
        // format fine.
        let doc = json!({
            "host": {"name": "app-2"},
            "service": {"name": "nginx", "state": "failed"},
            "system": {"filesystem": {"used": {"pct": "not-a-number"}}}
        });
        assert!(format_sub_alert(AlertCategory::Systemd, &doc).is_ok());
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let doc = json!({
            "host": {"name": "db-1"},
            "system": {"filesystem": {"mount_point": "/var"}}
        });
        let err = format_sub_alert(AlertCategory::DiskSpace, &doc).unwrap_err();
        assert!(err
            .to_string()
            .contains("missing or invalid field system.filesystem.used.pct"));
    }

    #[test]
    fn missing_host_is_malformed_for_every_category() {
        for category in AlertCategory::ALL {
            let err = format_sub_alert(category, &json!({})).unwrap_err();
            assert_eq!(err.category, category);
        }
    }

    #[test]
    fn render_text_applies_banner_and_subject() {
        let text = render_text("db-1", "High memory usage", "90%");
        assert!(text.starts_with(BANNER));
        assert!(text.contains("*High memory usage*"));
        assert!(text.contains("host: db-1"));
        assert!(text.ends_with("90%"));
    }
}
