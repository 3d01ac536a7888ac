/// Built-in demo workflows
///
/// The three canned product demos the chat bar plays when no definitions file is
/// configured, each paired with its own background image.

use crate::workflow::{
    registry::WorkflowRegistry,
    types::{Step, Workflow},
};
use anyhow::Result;

/// Background rotation used by the built-in workflows
pub const BACKGROUND_IMAGES: [&str; 3] = [
    "imgs/Runners.jpg",
    "imgs/ChildCare1.jpg",
    "imgs/Weather2.jpeg",
];

/// Registry with the built-in workflows and background rotation
pub fn builtin_registry() -> Result<WorkflowRegistry> {
    WorkflowRegistry::new(
        builtin_workflows(),
        BACKGROUND_IMAGES.iter().map(|image| image.to_string()).collect(),
    )
}

pub fn builtin_workflows() -> Vec<Workflow> {
    vec![
        Workflow::new(
            "Running Trends",
            demo_steps(
                vec![
                    Step::type_text("What are the latest trends in "),
                    Step::slash_select(0, "checkroom", "Running Shoes"),
                    Step::type_text(" for Q2 2026?"),
                    Step::pause(400),
                ],
                "Analyzing...",
            ),
        )
        .with_category("Athletic Footwear Trends")
        .with_background("imgs/Runners.jpg"),
        Workflow::new(
            "Childcare Analysis",
            demo_steps(
                vec![
                    Step::type_text("Analyze consumer sentiment for "),
                    Step::slash_select(2, "child_care", "Baby Products"),
                    Step::pause(300),
                ],
                "Analyzing...",
            ),
        )
        .with_category("Childcare Product Sales")
        .with_background("imgs/ChildCare1.jpg"),
        Workflow::new(
            "Weather Impact",
            demo_steps(
                vec![
                    Step::type_text("How does weather affect sales of "),
                    Step::slash_select(1, "checkroom", "Outdoor Apparel"),
                    Step::type_text("?"),
                    Step::pause(300),
                ],
                "Processing...",
            ),
        )
        .with_category("Weather & Retail Impact")
        .with_background("imgs/Weather2.jpeg"),
    ]
}

/// Wrap the typing part of a demo in the shared intro and "thinking" outro
fn demo_steps(typing: Vec<Step>, second_status: &str) -> Vec<Step> {
    let mut steps = vec![
        Step::SetBackground { image: None },
        Step::SetCategory { text: None },
        Step::Clear,
        Step::status("Typing..."),
    ];
    steps.extend(typing);
    steps.extend([
        Step::status("Searching..."),
        Step::Send,
        Step::pause(1500),
        Step::status(second_status),
        Step::pause(1500),
        Step::status("Generating..."),
        Step::pause(1500),
        Step::status("Complete"),
        // chart appears after the text card, then stays up for a few seconds
        Step::pause(7000),
        Step::ClearStatus,
        Step::HideOutput,
        Step::Clear,
        Step::pause(300),
    ]);
    steps
}
