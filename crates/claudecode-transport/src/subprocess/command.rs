//! Command line construction for a single CLI invocation

use claudecode_protocol::{PermissionMode, QueryOptions};
use serde_json::json;

/// Build the argument vector for one query
///
/// Groups appear in a fixed order: output format, system prompts, tool
/// filters, limits and model, session continuation, MCP servers, and the
/// prompt itself last, after a `--` separator so it is never read as a flag.
pub fn build_args(prompt: &str, options: &QueryOptions) -> Vec<String> {
    let mut args: Vec<String> = ["--output-format", "stream-json", "--verbose", "--print"]
        .into_iter()
        .map(String::from)
        .collect();

    if let Some(system_prompt) = &options.system_prompt {
        args.push("--system-prompt".into());
        args.push(system_prompt.clone());
    }
    if let Some(append) = &options.append_system_prompt {
        args.push("--append-system-prompt".into());
        args.push(append.clone());
    }

    if !options.allowed_tools.is_empty() {
        args.push("--allowedTools".into());
        args.push(options.allowed_tools.join(","));
    }
    if !options.disallowed_tools.is_empty() {
        args.push("--disallowedTools".into());
        args.push(options.disallowed_tools.join(","));
    }

    if let Some(turns) = options.max_turns {
        args.push("--max-turns".into());
        args.push(turns.to_string());
    }
    if let Some(tokens) = options.max_thinking_tokens {
        args.push("--max-thinking-tokens".into());
        args.push(tokens.to_string());
    }
    if let Some(model) = &options.model {
        args.push("--model".into());
        args.push(model.clone());
    }
    if options.permission_mode != PermissionMode::Default {
        args.push("--permission-mode".into());
        args.push(options.permission_mode.as_str().into());
    }

    if options.continue_conversation {
        args.push("--continue".into());
    }
    if let Some(session) = &options.resume {
        args.push("--resume".into());
        args.push(session.clone());
    }

    if !options.mcp_servers.is_empty() {
        args.push("--mcp-config".into());
        args.push(json!({ "mcpServers": &options.mcp_servers }).to_string());
    }

    // End of options
    args.push("--".into());
    args.push(prompt.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use claudecode_protocol::McpServerConfig;
    use rstest::rstest;

    const BASE: [&str; 4] = ["--output-format", "stream-json", "--verbose", "--print"];

    #[test]
    fn test_minimal_invocation() {
        let args = build_args("Hi", &QueryOptions::default());
        let mut expected: Vec<&str> = BASE.to_vec();
        expected.extend(["--", "Hi"]);
        assert_eq!(args, expected);
    }

    #[test]
    fn test_full_invocation_order() {
        let options = QueryOptions::new()
            .with_system_prompt("sys")
            .with_append_system_prompt("more")
            .with_allowed_tools(["Read", "Write"])
            .with_disallowed_tools(["Bash"])
            .with_max_turns(3)
            .with_max_thinking_tokens(2048)
            .with_model("sonnet")
            .with_permission_mode(PermissionMode::AcceptEdits)
            .with_continue_conversation(true)
            .with_resume("sess-1");

        let args = build_args("do it", &options);
        let mut expected: Vec<&str> = BASE.to_vec();
        expected.extend([
            "--system-prompt",
            "sys",
            "--append-system-prompt",
            "more",
            "--allowedTools",
            "Read,Write",
            "--disallowedTools",
            "Bash",
            "--max-turns",
            "3",
            "--max-thinking-tokens",
            "2048",
            "--model",
            "sonnet",
            "--permission-mode",
            "acceptEdits",
            "--continue",
            "--resume",
            "sess-1",
            "--",
            "do it",
        ]);
        assert_eq!(args, expected);
    }

    #[rstest]
    #[case(PermissionMode::Default, None)]
    #[case(PermissionMode::AcceptEdits, Some("acceptEdits"))]
    #[case(PermissionMode::BypassPermissions, Some("bypassPermissions"))]
    fn test_permission_mode_flag(#[case] mode: PermissionMode, #[case] expected: Option<&str>) {
        let args = build_args("p", &QueryOptions::new().with_permission_mode(mode));
        let value = args
            .iter()
            .position(|a| a == "--permission-mode")
            .map(|i| args[i + 1].as_str());
        assert_eq!(value, expected);
    }

    #[test]
    fn test_mcp_config_is_json() {
        let options = QueryOptions::new()
            .add_mcp_server("fs", McpServerConfig::stdio("npx", ["server-fs"]));
        let args = build_args("p", &options);
        let index = args.iter().position(|a| a == "--mcp-config").unwrap();
        let config: serde_json::Value = serde_json::from_str(&args[index + 1]).unwrap();
        assert_eq!(config["mcpServers"]["fs"]["type"], "stdio");
        assert_eq!(config["mcpServers"]["fs"]["command"], "npx");
        assert_eq!(args.last().map(String::as_str), Some("p"));
    }

    #[rstest]
    #[case("-p")]
    #[case("--help me")]
    #[case("--")]
    fn test_dash_prompt_follows_separator(#[case] prompt: &str) {
        let args = build_args(prompt, &QueryOptions::new().with_model("m"));
        let n = args.len();
        assert_eq!(args[n - 2], "--");
        assert_eq!(args[n - 1], prompt);
        assert_eq!(args.iter().filter(|a| *a == "--print").count(), 1);
    }
}
