//! Schema command

use anyhow::Result;
use pve_sdn_core::ZONE_FIELDS;
use serde_json::json;

/// Prints the declared attribute schema
pub struct SchemaCommand;

impl SchemaCommand {
    pub fn render(format: &str) -> Result<String> {
        match format {
            "json" => {
                let fields: Vec<_> = ZONE_FIELDS
                    .iter()
                    .map(|field| {
                        json!({
                            "name": field.name,
                            "kind": field.kind(),
                            "required": field.required,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&fields)?)
            }
            "text" => {
                let mut out = format!("{:<28} {:<8} {}\n", "Attribute", "Kind", "Required");
                out.push_str(&"-".repeat(46));
                out.push('\n');
                for field in ZONE_FIELDS {
                    out.push_str(&format!(
                        "{:<28} {:<8} {}\n",
                        field.name,
                        field.kind().to_string(),
                        if field.required { "yes" } else { "no" }
                    ));
                }
                Ok(out)
            }
            other => anyhow::bail!("Unsupported output format '{}'", other),
        }
    }

    pub fn execute(format: &str) -> Result<()> {
        print!("{}", Self::render(format)?);
        Ok(())
    }
}
