/*!
`list.rs`

Implements `kali-mcp-server list <tools|prompts|categories> [--json]`.

Everything listed comes from the same definitions the MCP server registers,
so the output matches what `tools/list` and `prompts/list` return.

JSON output shape (tools):
{
  "status": "ok",
  "subject": "tools",
  "count": 27,
  "tools": [ { "name": "...", "description": "...", "class": "shell", "params": ["url:string", ...] } ]
}
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji, table, truncate_ellipsis};
use crate::cmd::shared::param_summary;
use crate::cmd::subject::Subject;
use crate::mcp::{KaliServer, SERVER_NAME, VERSION, prompts};
use crate::tools::{SECURITY_CATEGORIES, lookup};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Subject to list (tools|prompts|categories)
    pub subject: Subject,

    /// Output JSON instead of human-readable text
    #[arg(long)]
    pub json: bool,
}

pub fn execute_list(args: ListArgs) -> Result<()> {
    let (items, rows, headers) = match args.subject {
        Subject::Tools => tool_rows(),
        Subject::Prompts => prompt_rows(),
        Subject::Categories => category_rows(),
    };

    if args.json {
        let mut out = json!({
            "status": "ok",
            "subject": args.subject.as_str(),
            "count": items.len(),
        });
        out[args.subject.as_str()] = Value::Array(items);
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let style = StyleOptions::detect();
    let tag = match args.subject {
        Subject::Prompts => "prompt",
        Subject::Tools => "tool",
        Subject::Categories => "list",
    };
    let title = format!(
        "{} {} ({})",
        emoji(tag, &style),
        capitalize(args.subject.as_str()),
        rows.len()
    );
    let subtitle = format!("{SERVER_NAME} {VERSION}");
    println!("{}", box_header(title.trim(), Some(&subtitle), &style));
    println!("{}", table(&headers, &rows, &style));
    if matches!(args.subject, Subject::Tools) {
        println!(
            "\n{} {}",
            emoji("info", &style),
            color(
                Role::Dim,
                "Use `kali-mcp-server call <tool> --param KEY=VALUE` to invoke a tool",
                &style
            )
        );
    }
    Ok(())
}

type Listing = (Vec<Value>, Vec<Vec<String>>, Vec<&'static str>);

fn tool_rows() -> Listing {
    let mut items = Vec::new();
    let mut rows = Vec::new();
    for (idx, tool) in KaliServer::tool_definitions().iter().enumerate() {
        let name = tool.name.to_string();
        let description = tool.description.as_deref().unwrap_or("").replace('\n', " ");
        let class = lookup(&name).map(|d| d.class.as_str()).unwrap_or("-");
        let params = param_summary(&tool.input_schema);

        rows.push(vec![
            (idx + 1).to_string(),
            name.clone(),
            class.to_string(),
            if params.is_empty() {
                "-".to_string()
            } else {
                truncate_ellipsis(&params.join(", "), 48)
            },
            description.clone(),
        ]);
        items.push(json!({
            "name": name,
            "description": description,
            "class": class,
            "params": params,
        }));
    }
    (items, rows, vec!["#", "NAME", "CLASS", "PARAMS", "DESCRIPTION"])
}

fn prompt_rows() -> Listing {
    let mut items = Vec::new();
    let mut rows = Vec::new();
    for (idx, def) in prompts::PROMPTS.iter().enumerate() {
        let args: Vec<&str> = def.arguments.iter().map(|(name, _)| *name).collect();
        rows.push(vec![
            (idx + 1).to_string(),
            def.name.to_string(),
            args.join(", "),
            def.description.to_string(),
        ]);
        items.push(json!({
            "name": def.name,
            "description": def.description,
            "arguments": args,
        }));
    }
    (items, rows, vec!["#", "NAME", "ARGUMENTS", "DESCRIPTION"])
}

fn category_rows() -> Listing {
    let items = SECURITY_CATEGORIES.iter().map(|c| json!(c)).collect();
    let rows = SECURITY_CATEGORIES
        .iter()
        .enumerate()
        .map(|(idx, c)| vec![(idx + 1).to_string(), c.to_string()])
        .collect();
    (items, rows, vec!["#", "CATEGORY"])
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
