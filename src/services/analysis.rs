//! Development-context analysis: a one-shot assistant run with a fixed
//! structured prompt.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::errors::ToolResult;
use crate::domain::ports::LanguageModel;
use crate::infrastructure::llm::AssistantRunRequest;

/// Arguments for `analyze_development_context`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevContextArgs {
    pub current_task: String,
    #[serde(default)]
    pub code_context: Option<String>,
    #[serde(default)]
    pub system_area: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

/// Run the analysis through the assistant and return its structured text.
pub async fn analyze_development_context(
    llm: &dyn LanguageModel,
    assistant_id: &str,
    vector_store_ids: Vec<String>,
    args: DevContextArgs,
) -> ToolResult<Value> {
    let system_area = args.system_area.as_deref().unwrap_or("backend");
    let urgency = args.urgency.as_deref().unwrap_or("medium");

    let mut message = format!(
        "Analyze this development context against AOMA operational knowledge.\n\n\
         Current task: {}\nSystem area: {system_area}\nUrgency: {urgency}\n",
        args.current_task
    );
    if let Some(code_context) = &args.code_context {
        message.push_str(&format!("\nCode context:\n{code_context}\n"));
    }
    message.push_str(
        "\nRespond with:\n\
         1. Assessment of the task and its blast radius\n\
         2. Relevant AOMA knowledge and prior incidents\n\
         3. Risks and operational constraints\n\
         4. Recommended next steps, ordered",
    );

    let analysis = llm
        .assistant_run(AssistantRunRequest {
            assistant_id: assistant_id.to_string(),
            user_message: message,
            additional_instructions: None,
            vector_store_ids,
        })
        .await?;

    Ok(json!({
        "analysis": analysis,
        "systemArea": system_area,
        "urgency": urgency,
        "task": args.current_task,
    }))
}
