//! Create record command implementation.

use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use clap::Args;
use serde_json::{Map, Value};

use leadflow_core::{ActorId, NewRecord, Status, WorkflowConfig};

use crate::output;
use crate::profile;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Collection name (e.g., leads)
    pub collection: String,

    /// Initial status (defaults to the first lead status, "new")
    #[arg(long)]
    pub status: Option<String>,

    /// Assign the record to this actor
    #[arg(long)]
    pub assign_to: Option<String>,

    /// Payload field as key=value; values that parse as JSON are kept typed
    #[arg(long = "field", value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// JSON object file with payload fields (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,

    /// Fail unless this payload field is present and non-blank
    #[arg(long = "require", value_name = "FIELD")]
    pub required: Vec<String>,
}

pub async fn run(args: CreateArgs, store: Option<&str>) -> Result<()> {
    let config = WorkflowConfig {
        required_fields: args.required.clone(),
        ..WorkflowConfig::default()
    };
    let workflow = profile::workflow(store, &args.collection, config)?;

    let mut new = NewRecord {
        fields: read_base(args.json.as_deref())?,
        ..NewRecord::default()
    };
    for pair in &args.fields {
        let (key, value) = parse_field(pair)?;
        new.fields.insert(key, value);
    }
    if let Some(status) = &args.status {
        new = new.with_status(Status::new(status).context("Invalid status")?);
    }
    if let Some(actor) = &args.assign_to {
        new = new.assigned_to(ActorId::new(actor).context("Invalid assignee")?);
    }

    let id = workflow
        .create_record(new)
        .await
        .context("Failed to create record")?;

    println!("{}", id);
    output::success(&format!("Created record {} in {}", id, workflow.collection()));

    Ok(())
}

fn read_base(source: Option<&str>) -> Result<Map<String, Value>> {
    let Some(path) = source else {
        return Ok(Map::new());
    };

    let content = if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).context("Failed to read JSON file")?
    };

    match serde_json::from_str(&content).context("Invalid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("Record JSON must be an object"),
    }
}

fn parse_field(pair: &str) -> Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .with_context(|| format!("Field '{}' is not in key=value form", pair))?;
    if key.is_empty() {
        bail!("Field '{}' has an empty key", pair);
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_field_keeps_json_types() {
        assert_eq!(parse_field("score=5").unwrap(), ("score".into(), json!(5)));
        assert_eq!(parse_field("vip=true").unwrap(), ("vip".into(), json!(true)));
        assert_eq!(
            parse_field("title=Grade 9 maths").unwrap(),
            ("title".into(), json!("Grade 9 maths"))
        );
    }

    #[test]
    fn test_parse_field_splits_on_first_equals() {
        assert_eq!(
            parse_field("note=a=b").unwrap(),
            ("note".into(), json!("a=b"))
        );
    }

    #[test]
    fn test_parse_field_rejects_malformed() {
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_leading_zero_phone_stays_text() {
        assert_eq!(
            parse_field("phone=0123456").unwrap(),
            ("phone".into(), json!("0123456"))
        );
    }
}
