use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use teratap_schema::{FieldDef, ProtocolData};

use crate::cmd::{resolve_revision, SchemaArgs};
use crate::exit::{schema_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct CatalogEntry<'a> {
    name: &'a str,
    opcode: Option<String>,
    fields: Option<usize>,
}

#[derive(Serialize)]
struct CatalogOutput<'a> {
    revision: &'a str,
    revisions: Vec<&'a str>,
    messages: Vec<CatalogEntry<'a>>,
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    r#type: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    elements: Vec<FieldOutput<'a>>,
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    name: &'a str,
    opcode: Option<String>,
    fields: Vec<FieldOutput<'a>>,
}

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let data =
        ProtocolData::load(&args.data).map_err(|err| schema_error("protocol bundle", err))?;
    let revision = resolve_revision(&data, args.revision.as_deref())?;
    let opcodes = data
        .opcode_table(&revision)
        .map_err(|err| schema_error("protocol bundle", err))?;
    let catalog = data.catalog();

    if let Some(name) = &args.message {
        let schema = catalog
            .get(name)
            .ok_or_else(|| CliError::new(USAGE, format!("no definition for {name}")))?;
        let layout = LayoutOutput {
            name,
            opcode: opcodes.id_of(name).map(|op| format!("{op:#06x}")),
            fields: schema.fields.iter().map(field_output).collect(),
        };
        print_layout(&layout, format);
        return Ok(SUCCESS);
    }

    // One row per name the revision maps or the bundle defines.
    let mut names: Vec<&str> = catalog.names();
    for name in opcodes.names() {
        if !catalog.contains(name) {
            names.push(name);
        }
    }
    names.sort_unstable();

    let messages: Vec<CatalogEntry> = names
        .into_iter()
        .map(|name| CatalogEntry {
            name,
            opcode: opcodes.id_of(name).map(|op| format!("{op:#06x}")),
            fields: catalog.get(name).map(|schema| schema.fields.len()),
        })
        .collect();

    let output = CatalogOutput {
        revision: &revision,
        revisions: data.revisions(),
        messages,
    };
    print_catalog(&output, format);
    Ok(SUCCESS)
}

fn field_output(field: &FieldDef) -> FieldOutput<'_> {
    FieldOutput {
        name: &field.name,
        r#type: field.tag.as_str(),
        elements: field.elements.iter().map(field_output).collect(),
    }
}

fn print_catalog(output: &CatalogOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            println!(
                "revision {} ({} messages)\n",
                output.revision,
                output.messages.len()
            );
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["NAME", "OPCODE", "FIELDS"]);
            for entry in &output.messages {
                table.add_row(vec![
                    entry.name.to_string(),
                    entry.opcode.clone().unwrap_or_else(|| "-".to_string()),
                    entry
                        .fields
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("revision {} ({} messages)", output.revision, output.messages.len());
            for entry in &output.messages {
                println!(
                    "  {:<40} {:>8} {}",
                    entry.name,
                    entry.opcode.as_deref().unwrap_or("-"),
                    entry
                        .fields
                        .map(|n| format!("{n} fields"))
                        .unwrap_or_else(|| "no def".to_string()),
                );
            }
        }
        OutputFormat::Raw => {
            for entry in &output.messages {
                println!("{}", entry.name);
            }
        }
    }
}

fn print_layout(output: &LayoutOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            println!(
                "{} {}\n",
                output.name,
                output.opcode.as_deref().unwrap_or("(unmapped)")
            );
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "TYPE"]);
            for field in &output.fields {
                table.add_row(vec![field.name.to_string(), field.r#type.to_string()]);
                for element in &field.elements {
                    table.add_row(vec![
                        format!("  - {}", element.name),
                        element.r#type.to_string(),
                    ]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} {}",
                output.name,
                output.opcode.as_deref().unwrap_or("(unmapped)")
            );
            for field in &output.fields {
                println!("  {}: {}", field.name, field.r#type);
                for element in &field.elements {
                    println!("    - {}: {}", element.name, element.r#type);
                }
            }
        }
        OutputFormat::Raw => {
            for field in &output.fields {
                println!("{}", field.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use teratap_schema::SchemaCatalog;

    use super::*;

    #[test]
    fn layout_serializes_nested_array_elements() {
        let catalog = SchemaCatalog::compile([(
            "S_TEST.def".to_string(),
            "uint32 id\narray targets\n- uint64 target\n- int32 damage\n".to_string(),
        )]);
        let schema = catalog.get("S_TEST").unwrap();

        let layout = LayoutOutput {
            name: "S_TEST",
            opcode: Some("0x0001".to_string()),
            fields: schema.fields.iter().map(field_output).collect(),
        };

        let json = serde_json::to_string(&layout).expect("layout should serialize");
        assert!(json.contains("\"name\":\"targets\""));
        assert!(json.contains("\"type\":\"array\""));
        assert!(json.contains("\"name\":\"damage\""));
        // The synthetic link field precedes the array itself.
        assert!(json.contains("targets_ref"));
    }
}
