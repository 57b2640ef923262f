//! Prompt templates for the three roles.

/// System message for the worker role.
pub const WORKER_SYSTEM: &str = "You are a skilled professional who creates high-quality work.
Be thorough, clear, and practical. Include examples when helpful.";

/// System message for the critic role.
pub const CRITIC_SYSTEM: &str = "You are an experienced reviewer who provides balanced, helpful feedback.
Be thorough but fair. Point out both strengths and areas for improvement.";

/// System message for the validator role.
pub const VALIDATOR_SYSTEM: &str = "You are the final authority on quality. Make clear decisions.
If work is solid and addresses the task well, approve it. If there are significant
issues that impact usefulness, reject it with specific guidance.";

/// First-round worker prompt.
pub fn initial_worker_prompt(task: &str) -> String {
    format!("Complete this task thoroughly and professionally: {}", task)
}

/// Worker prompt for rounds after the first, carrying the rejected work and
/// the critic's review.
pub fn revision_worker_prompt(task: &str, previous_work: &str, feedback: &str) -> String {
    format!(
        "TASK: {task}

PREVIOUS WORK:
{previous_work}

FEEDBACK TO ADDRESS:
{feedback}

Please create an improved version that addresses all the feedback points."
    )
}

pub fn critic_prompt(task: &str, work: &str) -> String {
    format!(
        "Please carefully review this work for the task: \"{task}\"

WORK TO REVIEW:
{work}

Provide detailed feedback covering:
1. Overall quality (rate 1-10)
2. Completeness - does it fully address the task?
3. Specific strengths
4. Areas needing improvement
5. Missing elements

Be constructive and specific. If it's good quality (8+), say so clearly."
    )
}

pub fn validator_prompt(task: &str, work: &str, review: &str) -> String {
    format!(
        "TASK: {task}

WORKER'S SUBMISSION:
{work}

CRITIC'S REVIEW:
{review}

As the final validator, decide if this work is acceptable. Consider:
- Does it complete the task requirements?
- Is the quality good enough (7+ out of 10)?
- Are the critic's concerns serious enough to require revision?

Respond with EXACTLY one of these formats:
\"APPROVED: [brief reason why it's acceptable]\"
\"REJECTED: [specific issues that must be fixed]\"

Be decisive. Start with either APPROVED or REJECTED."
    )
}
