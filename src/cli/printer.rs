//! Console rendering of loop progress.

use colored::*;
use tokio::sync::mpsc::UnboundedReceiver;

use triad::refine::{LoopEvent, Outcome, Stage, Verdict};

const PREVIEW_CHARS: usize = 200;
const DECISION_PREVIEW_CHARS: usize = 150;
const RULE_WIDTH: usize = 80;

/// First `max` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Worker => "WORKER - creating the work...",
        Stage::Critic => "CRITIC - reviewing the work...",
        Stage::Validator => "VALIDATOR - making the final decision...",
    }
}

/// Lines to print for one event.
pub fn render(event: &LoopEvent) -> Vec<String> {
    match event {
        LoopEvent::RoundStarted { round, max_rounds } => vec![
            String::new(),
            format!("ROUND {}/{}", round, max_rounds).bold().to_string(),
            "-".repeat(50),
        ],
        LoopEvent::StageStarted { stage, .. } => {
            vec![String::new(), stage_title(*stage).cyan().to_string()]
        }
        LoopEvent::StageCompleted { stage, output, .. } => match stage {
            Stage::Validator => vec![
                format!("{} Validator made decision", "ok".green()),
                format!("Decision: {}", preview(output, DECISION_PREVIEW_CHARS)),
            ],
            _ => vec![
                format!("{} {} completed", "ok".green(), stage),
                format!("Length: {} characters", output.chars().count()),
                format!("Preview: {}", preview(output, PREVIEW_CHARS)),
            ],
        },
        LoopEvent::RoundCompleted(round) => match round.verdict {
            Verdict::Approved => vec![],
            Verdict::Rejected => vec![format!("Round {} complete - needs improvement", round.round)
                .yellow()
                .to_string()],
            Verdict::Ambiguous => vec!["Validator response unclear, treating as rejected"
                .yellow()
                .to_string()],
        },
        LoopEvent::Finished(outcome) => render_outcome(outcome),
    }
}

fn render_outcome(outcome: &Outcome) -> Vec<String> {
    let mut lines = vec![String::new()];
    match outcome {
        Outcome::Approved { artifact, rounds_used } => {
            lines.push(
                format!("SUCCESS! Task approved after {} round(s)", rounds_used)
                    .green()
                    .bold()
                    .to_string(),
            );
            lines.extend(framed("FINAL APPROVED WORK:", artifact));
        }
        Outcome::Exhausted { artifact, rounds_used } => {
            lines.push(format!("Maximum rounds ({}) reached", rounds_used).yellow().to_string());
            lines.extend(framed("FINAL WORK (NOT APPROVED):", artifact));
        }
        Outcome::Failed {
            stage,
            message,
            last_artifact,
        } => {
            lines.push(format!("{} {} failed: {}", "error:".red(), stage, message));
            if let Some(artifact) = last_artifact {
                lines.extend(framed("LAST WORK:", artifact));
            }
        }
        Outcome::Cancelled {
            rounds_completed,
            last_artifact,
        } => {
            lines.push(format!("Cancelled after {} round(s)", rounds_completed).yellow().to_string());
            if let Some(artifact) = last_artifact {
                lines.extend(framed("LAST WORK:", artifact));
            }
        }
    }
    lines
}

fn framed(title: &str, body: &str) -> Vec<String> {
    vec![
        rule(),
        title.bold().to_string(),
        rule(),
        body.to_string(),
        String::new(),
        rule(),
    ]
}

/// Print events until the sender is dropped.
pub async fn print_events(mut rx: UnboundedReceiver<LoopEvent>) {
    while let Some(event) = rx.recv().await {
        for line in render(&event) {
            println!("{}", line);
        }
    }
}
