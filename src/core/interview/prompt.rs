//! Chat completion messages for the interviewer persona.

use serde::{Deserialize, Serialize};

use super::context::{ChatContext, InterviewTemplate};

/// Upper bound on question length, repeated throughout the prompt because
/// models tend to drift into long questions otherwise.
pub const MAX_QUESTION_WORDS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

fn or<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    value.as_deref().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn system_prompt(ctx: &ChatContext, template: &InterviewTemplate) -> String {
    let interviewer = ctx.settings.interviewer_name();
    let candidate = or(&ctx.user_details.name, "there");
    let total = template.number_of_questions.unwrap_or(4);
    let duration = template.duration_minutes.unwrap_or(60);
    let history =
        serde_json::to_string(&ctx.interview_history).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = format!(
        "You are an experienced technical interviewer conducting a software engineering \
interview. Be friendly and professional, build rapport, and keep a high technical bar.

Interview setup:
- Interviewer: {interviewer}
- Candidate: {candidate}
- Progress: question {current} of {total}
- Duration: {duration} minutes planned

Position:
- Company: {company}
- Role: {role}
- Level: {level}
- Interview type: {topic}
- Difficulty: {difficulty}
- Template: {name}
",
        current = ctx.interview_history.len() + 1,
        company = or(&template.company, "Not specified"),
        role = or(&template.role, "Software Engineer"),
        level = or(&template.level, "Not specified"),
        topic = or(&template.topic, "Technical"),
        difficulty = or(&template.difficulty, "Medium"),
        name = or(&template.name, "Software Engineering Interview"),
    );

    if let Some(description) = template.description.as_deref().filter(|d| !d.is_empty()) {
        prompt.push_str(&format!("\nPosition description:\n{description}\n"));
    }
    if let Some(level) = template.level.as_deref().filter(|l| !l.is_empty()) {
        prompt.push_str(&format!("\nAdjust questions to {level} seniority.\n"));
    }
    if let Some(company) = template.company.as_deref().filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\nThis is a {company} interview.\n"));
    }

    prompt.push_str(&format!(
        "
Style:
- Warm and welcoming, especially at the start
- Reference previous answers and use natural transitions
- Acknowledge good answers; guide the candidate when they struggle

Rules:
- The first message introduces yourself and sets expectations
- Ask exactly one question at a time, at most {MAX_QUESTION_WORDS} words
- Follow up on what the candidate actually said and adapt difficulty
- Do not repeat topics unless clarification is needed
- Mix technical and behavioral questions

Previous Q&A history: {history}

Every question must be {MAX_QUESTION_WORDS} words or fewer."
    ));

    prompt
}

fn opening_instruction(ctx: &ChatContext, template: &InterviewTemplate) -> String {
    let interviewer = ctx.settings.interviewer_name();
    let candidate = or(&ctx.user_details.name, "there");
    let topic = or(&template.topic, "technical");
    let company = template
        .company
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| format!(" for {c}"))
        .unwrap_or_default();

    format!(
        "Start the interview:
1. Greet the candidate by name if known, otherwise say \"Hi there\"
2. Introduce yourself as {interviewer}
3. Say this is a {topic} interview{company}
4. Mention the role ({role}) and level ({level})
5. Ask your first question in at most {MAX_QUESTION_WORDS} words

Example: \"Hi {candidate}! I'm {interviewer}, and I'll be conducting your {topic} interview{company} today. \
We'll focus on the {role} position. [first question]\"",
        role = or(&template.role, "Software Engineer"),
        level = or(&template.level, "not specified"),
    )
}

/// Build the completion messages for the next interviewer turn.
///
/// The system prompt is followed by the history as alternating assistant
/// (question) and user (answer) messages, then either the candidate's new
/// message, an opening instruction for a fresh interview, or a continue
/// instruction.
pub fn build_chat_messages(ctx: &ChatContext) -> Vec<ChatMessage> {
    let template = ctx.template.clone().unwrap_or_default();
    let mut messages = vec![ChatMessage::new(
        ChatRole::System,
        system_prompt(ctx, &template),
    )];

    for turn in &ctx.interview_history {
        if let Some(question) = turn.question.as_deref().filter(|q| !q.is_empty()) {
            messages.push(ChatMessage::new(ChatRole::Assistant, question));
        }
        if let Some(answer) = turn.answer.as_deref().filter(|a| !a.is_empty()) {
            messages.push(ChatMessage::new(ChatRole::User, answer));
        }
    }

    let last = match ctx.user_message.as_deref().filter(|m| !m.is_empty()) {
        Some(message) => message.to_string(),
        None if ctx.interview_history.is_empty() => opening_instruction(ctx, &template),
        None => format!(
            "Continue as {}. Ask your next question based on the previous answer, \
at most {MAX_QUESTION_WORDS} words, without extra context.",
            ctx.settings.interviewer_name()
        ),
    };
    messages.push(ChatMessage::new(ChatRole::User, last));

    messages
}
