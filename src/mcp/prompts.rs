//! Prompt templates served through `prompts/list` and `prompts/get`.
//!
//! Rendering is plain string formatting over the supplied arguments.

use rmcp::ErrorData as McpError;
use rmcp::model::{
    GetPromptResult, JsonObject, ListPromptsResult, Prompt, PromptArgument, PromptMessage,
    PromptMessageRole,
};

const DEFAULT_TARGET: &str = "https://example.com";
const DEFAULT_SCAN_TYPE: &str = "passive";

/// Static description of one template.
#[derive(Debug, Clone, Copy)]
pub struct PromptDef {
    pub name: &'static str,
    pub description: &'static str,
    /// (name, description) pairs; every argument is optional.
    pub arguments: &'static [(&'static str, &'static str)],
}

pub const PROMPTS: &[PromptDef] = &[
    PromptDef {
        name: "pentest_role",
        description: "Penetration testing role-play prompt",
        arguments: &[("target", "System under test (default https://example.com)")],
    },
    PromptDef {
        name: "burp_assistant",
        description: "Burp Suite assistant prompt for AI-assisted web security testing",
        arguments: &[
            ("target", "Web application under test (default https://example.com)"),
            ("scan_type", "Scan type to plan for (default passive)"),
        ],
    },
];

fn pentest_role(target: &str) -> String {
    format!(
        "system: You play a security engineer; I play a system operator.

Your tasks:
1. Assess the security posture of the target system {target}
2. Identify potential vulnerabilities and risks
3. Recommend focused security tests
4. Verify findings with the available penetration testing tools

Available tool categories:
- Information gathering
- Vulnerability scanning
- Web application testing
- Password attacks
- Network sniffing
- Wireless attacks
- Exploitation
- Post-exploitation
- Forensics
- Reporting

Workflow:
1. Start with information gathering to learn the basics of the target
2. Run vulnerability scans to surface potential issues
3. Pick suitable tools for deeper testing based on the scan results
4. Finish with a detailed penetration test report

Notes:
- All testing must be authorized
- Follow the law and professional ethics
- Record every test step and its result
"
    )
}

fn burp_assistant(target: &str, scan_type: &str) -> String {
    format!(
        "system: You are a Burp Suite security testing assistant helping the user test web applications.

Target: {target}
Scan type: {scan_type}

Your tasks:
1. Use Burp Suite tools for security testing
2. Analyze HTTP requests and responses
3. Identify common vulnerabilities
4. Recommend fixes

Available Burp Suite features:
- Proxy: intercept and modify HTTP traffic
- Repeater: test HTTP requests by hand
- Intruder: automated fuzzing
- Scanner: automated vulnerability scanning
- Decoder: encode and decode data
- Comparer: compare responses

Workflow:
1. Configure the Burp Suite proxy
2. Intercept the target application's HTTP traffic
3. Send requests to Repeater for testing
4. Fuzz with Intruder
5. Run Scanner to find vulnerabilities
6. Analyze the results and write a report

Notes:
- Stay within the authorized scope
- Follow responsible disclosure
- Keep test data secure
"
    )
}

/// Non-blank string argument, if supplied.
fn arg<'a>(args: Option<&'a JsonObject>, name: &str) -> Option<&'a str> {
    args?
        .get(name)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn find(name: &str) -> Option<&'static PromptDef> {
    PROMPTS.iter().find(|p| p.name == name)
}

/// Render a template to text. `None` for an unknown name.
pub fn render_text(name: &str, args: Option<&JsonObject>) -> Option<String> {
    let target = arg(args, "target").unwrap_or(DEFAULT_TARGET);
    match name {
        "pentest_role" => Some(pentest_role(target)),
        "burp_assistant" => Some(burp_assistant(
            target,
            arg(args, "scan_type").unwrap_or(DEFAULT_SCAN_TYPE),
        )),
        _ => None,
    }
}

pub fn list() -> ListPromptsResult {
    let prompts = PROMPTS
        .iter()
        .map(|def| {
            let arguments = def
                .arguments
                .iter()
                .map(|(name, description)| PromptArgument {
                    name: name.to_string(),
                    title: None,
                    description: Some(description.to_string()),
                    required: Some(false),
                })
                .collect();
            Prompt::new(def.name, Some(def.description), Some(arguments))
        })
        .collect();
    ListPromptsResult::with_all_items(prompts)
}

pub fn get(name: &str, args: Option<&JsonObject>) -> Result<GetPromptResult, McpError> {
    let def = find(name)
        .ok_or_else(|| McpError::invalid_params(format!("Unknown prompt: {name}"), None))?;
    let text = render_text(def.name, args)
        .ok_or_else(|| McpError::invalid_params(format!("Unknown prompt: {name}"), None))?;
    Ok(GetPromptResult {
        description: Some(def.description.to_string()),
        messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
    })
}
