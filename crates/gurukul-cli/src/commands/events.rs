//! The `gurukul log-event` and `gurukul events` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use gurukul_core::model::{FieldValue, Fields};

use super::Session;

pub async fn log(
    config: Option<PathBuf>,
    user: String,
    event_type: String,
    data: Vec<String>,
) -> Result<()> {
    let fields = parse_data(&data)?;
    let session = Session::open(config)?;
    let id = session.events().log_event(&user, &event_type, fields).await?;
    session.persist()?;
    println!("Logged {event_type} event {id}");
    Ok(())
}

pub async fn list(
    config: Option<PathBuf>,
    user: String,
    event_type: Option<String>,
    limit: usize,
) -> Result<()> {
    let session = Session::open(config)?;
    let events = session
        .events()
        .user_events(&user, event_type.as_deref(), limit)
        .await?;

    if events.is_empty() {
        println!("No events for {user}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["When", "Type", "Id", "Data"]);
    for event in &events {
        table.add_row(vec![
            Cell::new(event.created_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(&event.event_type),
            Cell::new(&event.id),
            Cell::new(render_data(&event.event_data)),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Parse `key=value` pairs. Values that read as a bool or a number are
/// stored typed; everything else is a string.
fn parse_data(pairs: &[String]) -> Result<Fields> {
    let mut fields = Fields::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("event data must be key=value, got `{pair}`");
        };
        anyhow::ensure!(!key.is_empty(), "event data key is empty in `{pair}`");
        fields.insert(key.to_string(), typed_value(value));
    }
    Ok(fields)
}

fn typed_value(raw: &str) -> FieldValue {
    if let Ok(b) = raw.parse::<bool>() {
        FieldValue::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        FieldValue::Integer(i)
    } else if let Some(d) = raw.parse::<f64>().ok().filter(|d| d.is_finite()) {
        FieldValue::Double(d)
    } else {
        FieldValue::from(raw)
    }
}

fn render_data(fields: &Fields) -> String {
    fields
        .iter()
        .map(|(key, value)| match value {
            FieldValue::String(s) => format!("{key}={s}"),
            FieldValue::Integer(i) => format!("{key}={i}"),
            FieldValue::Double(d) => format!("{key}={d}"),
            FieldValue::Bool(b) => format!("{key}={b}"),
            other => format!("{key}={other:?}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
