//! Human-readable error descriptions and structured JSON error formatting.

use ramen_core::MachineError;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(me) = err.downcast_ref::<MachineError>() {
        return match me {
            MachineError::Config(msg) => format!(
                "What happened: A pin was used in a role it is not configured for ({msg}).\nLikely causes: A station command arrived before its `setting`, or the pin map in the TOML is wrong.\nHow to fix: Send a `setting` line for the category first, or fix the [pins] table."
            ),
            MachineError::HardwareFault(msg) => format!(
                "What happened: A GPIO operation failed ({msg}).\nLikely causes: Missing GPIO permissions, or the pin is claimed by another process.\nHow to fix: Check /dev/gpiomem permissions and that no other controller is running."
            ),
            MachineError::Hardware(msg) => format!(
                "What happened: The hardware layer reported an error ({msg}).\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
            MachineError::State(msg) => format!(
                "What happened: The engine refused an inconsistent state transition ({msg}).\nHow to fix: Re-run with --log-level=debug for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("config") && (lower.contains("parsing") || lower.contains("reading")) {
        return format!(
            "What happened: The config file could not be loaded.\nLikely causes: Malformed TOML or a wrong --config path.\nHow to fix: Fix the file or omit --config to use built-in defaults. Original: {msg}"
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.chain().nth(1) {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = match err.downcast_ref::<MachineError>() {
        Some(MachineError::Config(_)) => "Config",
        Some(MachineError::HardwareFault(_)) => "HardwareFault",
        Some(MachineError::Hardware(_)) => "Hardware",
        Some(MachineError::State(_)) => "State",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
